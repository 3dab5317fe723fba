//! In-process harness: full router, in-memory store, demo gateway

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use readyping_server::notify::Notifier;
use readyping_server::{AppState, Config, api};
use serde_json::{Value, json};
use tower::ServiceExt;

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config::for_tests();
        let notifier = Notifier::from_config(&config);
        let state = AppState::in_memory(config, notifier);
        let router = api::build_app(state.clone());
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// OTP login; returns the verify-otp response body
    pub async fn login(&self, phone: &str, user_type: &str) -> Value {
        let (status, sent) = self
            .post(
                "/api/auth/send-otp",
                None,
                json!({ "phoneNumber": phone, "restaurantName": "Cafe Uno", "userType": user_type }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{sent}");
        let otp = sent["otp"].as_str().unwrap().to_string();

        let (status, session) = self
            .post(
                "/api/auth/verify-otp",
                None,
                json!({ "phoneNumber": phone, "otp": otp }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{session}");
        session
    }

    /// Owner session: (token, restaurant id)
    pub async fn owner(&self, phone: &str) -> (String, String) {
        let session = self.login(phone, "restaurant").await;
        (
            session["token"].as_str().unwrap().to_string(),
            session["user"]["id"].as_str().unwrap().to_string(),
        )
    }
}

pub fn order_body(order_id: &str) -> Value {
    json!({
        "orderId": order_id,
        "customerName": "Ana",
        "phoneNumber": "+15551234567",
        "items": [{ "name": "Burger", "quantity": 2, "price": 8.5 }],
        "totalAmount": 17.0
    })
}
