mod common;

use common::TestApp;
use http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_health_and_fallback() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());

    let (status, body) = app.get("/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Route not found");
    assert_eq!(body["error"]["path"], "/api/nope");
}

#[tokio::test]
async fn test_otp_verifies_once() {
    let app = TestApp::new();
    let (_, sent) = app
        .post(
            "/api/auth/send-otp",
            None,
            json!({ "phoneNumber": "(555) 123-4567", "userType": "restaurant" }),
        )
        .await;
    assert_eq!(sent["message"], "OTP sent successfully.");
    assert_eq!(sent["phoneNumber"], "+15551234567");
    let otp = sent["otp"].as_str().unwrap().to_string();
    assert_eq!(otp.len(), 6);

    let verify = json!({ "phoneNumber": "+15551234567", "otp": otp });
    let (status, session) = app.post("/api/auth/verify-otp", None, verify.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["message"], "Login successful.");
    assert_eq!(session["user"]["role"], "owner");
    assert_eq!(session["user"]["restaurantName"], "Restaurant 4567");

    let (status, again) = app.post("/api/auth/verify-otp", None, verify).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(again["error"]["message"], "Invalid or expired OTP.");
}

#[tokio::test]
async fn test_wrong_codes_discard_pending_otp() {
    let app = TestApp::new();
    let (_, sent) = app
        .post("/api/auth/send-otp", None, json!({ "phoneNumber": "+15557654321" }))
        .await;
    let otp = sent["otp"].as_str().unwrap().to_string();
    let wrong = if otp == "000000" { "111111" } else { "000000" };

    for _ in 0..5 {
        let (status, _) = app
            .post(
                "/api/auth/verify-otp",
                None,
                json!({ "phoneNumber": "+15557654321", "otp": wrong }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, body) = app
        .post(
            "/api/auth/verify-otp",
            None,
            json!({ "phoneNumber": "+15557654321", "otp": otp }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid or expired OTP.");
}

#[tokio::test]
async fn test_profile_requires_token() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/auth/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Access denied. No token provided.");

    let (status, _) = app.get("/api/auth/profile", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (token, id) = app.owner("+15551234567").await;
    let (status, body) = app.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id.as_str());
    assert_eq!(body["user"]["restaurantName"], "Cafe Uno");

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/auth/profile",
            Some(&token),
            Some(json!({ "settings": { "autoNotifications": false } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile updated successfully.");
    assert_eq!(body["user"]["settings"]["autoNotifications"], false);

    let (status, body) = app.post("/api/auth/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful.");
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let app = TestApp::new();
    let body = json!({
        "restaurantName": "Cafe Dos",
        "phoneNumber": "5559876543",
        "password": "hunter22"
    });

    let (status, created) = app.post("/api/auth/register", None, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Registration successful.");
    assert!(created["token"].is_string());
    assert!(created["user"].get("passwordHash").is_none());

    let (status, dup) = app.post("/api/auth/register", None, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        dup["error"]["message"],
        "User with this phone number already exists."
    );

    let (status, missing) = app
        .post("/api/auth/register", None, json!({ "phoneNumber": "5550000000" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        missing["error"]["message"],
        "Restaurant name and phone number are required."
    );
}

#[tokio::test]
async fn test_customer_cannot_manage_orders() {
    let app = TestApp::new();
    let session = app.login("+15551230000", "customer").await;
    assert_eq!(session["user"]["role"], "customer");
    let token = session["token"].as_str().unwrap();

    let (status, body) = app.get("/api/orders", Some(token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"]["message"],
        "Access denied. Insufficient permissions."
    );
}

#[tokio::test]
async fn test_send_otp_is_rate_limited() {
    let app = TestApp::new();
    let body = json!({ "phoneNumber": "+15551234567" });
    for _ in 0..5 {
        let (status, _) = app.post("/api/auth/send-otp", None, body.clone()).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, limited) = app.post("/api/auth/send-otp", None, body).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        limited["error"]["message"],
        "Too many requests, please try again later."
    );
}

#[tokio::test]
async fn test_malformed_body_uses_envelope() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/verify-otp",
            None,
            Some(json!({ "phoneNumber": 5551234567u64 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body")
    );
}
