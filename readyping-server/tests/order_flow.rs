mod common;

use common::{TestApp, order_body};
use http::{Method, StatusCode};
use readyping_server::live::RoomMessage;
use serde_json::json;
use shared::live::ServerEvent;
use shared::models::OrderStatus;

#[tokio::test]
async fn test_ready_notifies_and_broadcasts() {
    let app = TestApp::new();
    let (token, restaurant_id) = app.owner("+15550001111").await;
    let mut room = app.state.hub.subscribe(&restaurant_id);

    let (status, _) = app.post("/api/orders", Some(&token), order_body("A100")).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = room.recv().await.unwrap();
    assert_eq!(created.event.name(), "order-created");

    let (status, body) = app
        .request(
            Method::PATCH,
            "/api/orders/A100",
            Some(&token),
            Some(json!({ "status": "ready" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order status updated successfully.");
    assert_eq!(body["order"]["status"], "ready");
    assert!(body["order"]["readyAt"].is_i64());
    assert_eq!(body["order"]["notificationSent"], true);
    assert_eq!(body["order"]["notificationHistory"][0]["status"], "sent");
    assert_eq!(body["notification"]["to"], "+15551234567");

    match room.recv().await.unwrap() {
        RoomMessage {
            event:
                ServerEvent::OrderStatusUpdated {
                    order_id,
                    status,
                    old_status,
                    ready_at,
                    ..
                },
            origin: None,
        } => {
            assert_eq!(order_id, "A100");
            assert_eq!(status, OrderStatus::Ready);
            assert_eq!(old_status, OrderStatus::Pending);
            assert!(ready_at.is_some());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let app = TestApp::new();
    let (token, _) = app.owner("+15550001111").await;

    let (status, created) = app.post("/api/orders", Some(&token), order_body("B7")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Order created successfully.");

    let (status, body) = app.get("/api/orders/B7", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let order = &body["order"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["estimatedTime"], 15);
    assert_eq!(order["totalAmount"], 17.0);
    assert_eq!(order["items"][0]["name"], "Burger");
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["notificationSent"], false);
    assert_eq!(order["age"], 0);
    assert!(order["timeSinceReady"].is_null());

    let (status, dup) = app.post("/api/orders", Some(&token), order_body("B7")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(dup["error"]["message"], "Order ID already exists.");
}

#[tokio::test]
async fn test_complete_without_ready() {
    let app = TestApp::new();
    let (token, _) = app.owner("+15550001111").await;
    app.post("/api/orders", Some(&token), order_body("C1")).await;

    let (status, body) = app
        .request(
            Method::PATCH,
            "/api/orders/C1/status",
            Some(&token),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["order"]["completedAt"].is_i64());
    assert!(body["order"]["readyAt"].is_null());
    assert!(body.get("notification").is_none());
}

#[tokio::test]
async fn test_orders_require_token() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn test_validation_and_missing_orders() {
    let app = TestApp::new();
    let (token, _) = app.owner("+15550001111").await;

    let (status, body) = app
        .post("/api/orders", Some(&token), json!({ "orderId": "X" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "Order ID, customer name, and phone number are required."
    );

    let (status, body) = app.get("/api/orders/ghost", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Order not found.");

    let (status, _) = app
        .request(Method::DELETE, "/api/orders/ghost", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_update_delete() {
    let app = TestApp::new();
    let (token, _) = app.owner("+15550001111").await;
    for id in ["D1", "D2", "D3"] {
        app.post("/api/orders", Some(&token), order_body(id)).await;
    }

    let (status, page) = app
        .get("/api/orders?limit=2&sort=orderId", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["orders"].as_array().unwrap().len(), 2);
    assert_eq!(page["orders"][0]["orderId"], "D1");
    assert_eq!(page["pagination"]["totalOrders"], 3);
    assert_eq!(page["pagination"]["totalPages"], 2);
    assert_eq!(page["pagination"]["hasNext"], true);

    let (status, updated) = app
        .request(
            Method::PUT,
            "/api/orders/D2",
            Some(&token),
            Some(json!({ "notes": "no onions", "priority": "high" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["order"]["notes"], "no onions");
    assert_eq!(updated["order"]["priority"], "high");

    let (status, deleted) = app
        .request(Method::DELETE, "/api/orders/D3", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Order deleted successfully.");

    let (_, filtered) = app.get("/api/orders?status=pending", Some(&token)).await;
    assert_eq!(filtered["pagination"]["totalOrders"], 2);

    let (status, _) = app.get("/api/orders?status=shipped", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_status() {
    let app = TestApp::new();
    let (token, _) = app.owner("+15550001111").await;
    for id in ["E1", "E2"] {
        app.post("/api/orders", Some(&token), order_body(id)).await;
    }

    let (status, body) = app
        .post(
            "/api/orders/bulk/status",
            Some(&token),
            json!({ "orderIds": ["E1", "E2"], "status": "ready" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Updated 2 orders to ready.");
    assert_eq!(body["updatedCount"], 2);
    assert_eq!(body["notifications"].as_array().unwrap().len(), 2);

    let (_, overview) = app.get("/api/orders/stats/overview", Some(&token)).await;
    assert_eq!(overview["stats"]["ready"]["count"], 2);
    assert_eq!(overview["totalOrders"], 2);
    assert_eq!(overview["period"], "today");
}
