mod common;

use common::{TestApp, order_body};
use http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_inactive_qr_image_is_404() {
    let app = TestApp::new();
    let (token, _) = app.owner("+15550002222").await;

    let (status, created) = app
        .post("/api/qr", Some(&token), json!({ "name": "Front counter" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = created["qrCode"]["code"].as_str().unwrap().to_string();

    let (status, image) = app
        .get(&format!("/api/qr/{code}/image?size=5000&format=svg"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        image["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,")
    );
    assert_eq!(image["url"], created["qrCode"]["url"]);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/qr/{code}"),
            Some(&token),
            Some(json!({ "isActive": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&format!("/api/qr/{code}/image"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "QR code not found or inactive.");
}

#[tokio::test]
async fn test_public_scan_and_opt_in() {
    let app = TestApp::new();
    let (token, _) = app.owner("+15550002222").await;
    let (_, created) = app
        .post(
            "/api/qr",
            Some(&token),
            json!({ "name": "Table 4", "settings": { "message": "Ping me when ready" } }),
        )
        .await;
    let code = created["qrCode"]["code"].as_str().unwrap().to_string();

    let (status, scanned) = app.get(&format!("/api/qr/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scanned["qrCode"]["name"], "Table 4");
    assert_eq!(scanned["qrCode"]["restaurantName"], "Cafe Uno");
    assert_eq!(scanned["qrCode"]["settings"]["message"], "Ping me when ready");

    let (status, opted) = app
        .post(
            &format!("/api/qr/{code}/opt-in"),
            None,
            json!({ "phoneNumber": "5551112222", "customerName": "Bo" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(opted["phoneNumber"], "+15551112222");

    let (status, stats) = app.get("/api/qr/stats/overview", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["stats"]["totalCodes"], 1);
    assert_eq!(stats["stats"]["totalScans"], 1);
    assert_eq!(stats["stats"]["totalOptIns"], 1);
    assert_eq!(stats["recentScans"][0]["name"], "Table 4");

    let (status, _) = app.get("/api/qr", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_qr_edit_is_owner_scoped() {
    let app = TestApp::new();
    let (owner_a, _) = app.owner("+15550002222").await;
    let (owner_b, _) = app.owner("+15550003333").await;
    let (_, created) = app
        .post("/api/qr", Some(&owner_a), json!({ "name": "Bar" }))
        .await;
    let id = created["qrCode"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/qr/{id}"), Some(&owner_b), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "QR code not found.");

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/qr/{id}"), Some(&owner_a), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "QR code deleted successfully.");
}

#[tokio::test]
async fn test_empty_dashboard_is_zero() {
    let app = TestApp::new();
    let (token, _) = app.owner("+15550004444").await;

    let (status, body) = app
        .get("/api/analytics/dashboard?period=today", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "today");
    assert_eq!(body["orderStats"], json!({}));
    assert_eq!(body["revenue"]["totalRevenue"], 0.0);
    assert_eq!(body["revenue"]["totalOrders"], 0);
    assert_eq!(body["notifications"]["totalNotifications"], 0);
    assert_eq!(body["qrCodes"]["totalCodes"], 0);
    assert_eq!(body["recentOrders"], json!([]));
    assert_eq!(body["avgPrepTime"], 0.0);

    let (status, _) = app
        .get("/api/analytics/dashboard?period=decade", Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_trends_performance() {
    let app = TestApp::new();
    let (token, _) = app.owner("+15550004444").await;
    for id in ["F1", "F2"] {
        app.post("/api/orders", Some(&token), order_body(id)).await;
    }
    app.request(
        Method::PATCH,
        "/api/orders/F1",
        Some(&token),
        Some(json!({ "status": "completed" })),
    )
    .await;

    let (_, dash) = app.get("/api/analytics/dashboard", Some(&token)).await;
    assert_eq!(dash["orderStats"]["completed"]["count"], 1);
    assert_eq!(dash["orderStats"]["pending"]["avgAmount"], 17.0);
    assert_eq!(dash["revenue"]["totalRevenue"], 17.0);
    assert_eq!(dash["recentOrders"].as_array().unwrap().len(), 2);

    let (status, trends) = app
        .get("/api/analytics/orders/trends?days=3", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let days = trends["trends"].as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["totalOrders"], 2);
    assert_eq!(days[0]["totalAmount"], 34.0);

    let (status, perf) = app.get("/api/analytics/performance", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(perf["period"], "month");
    assert_eq!(perf["satisfaction"]["totalOrders"], 2);
    assert_eq!(perf["satisfaction"]["completedOrders"], 1);
    assert_eq!(perf["satisfaction"]["completionRate"], 50.0);
}
