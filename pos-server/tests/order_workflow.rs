//! End-to-end order workflow against the real router and an on-disk database

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use pos_server::{Config, ServerState, build_app};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-that-is-long-enough";

struct TestServer {
    app: Router,
    state: ServerState,
    _dir: tempfile::TempDir,
}

impl TestServer {
    fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests(dir.path().to_string_lossy(), SECRET);
        let state = ServerState::initialize(&config).unwrap();
        let app = build_app(&state);
        Self {
            app,
            state,
            _dir: dir,
        }
    }

    fn token(&self, user_id: &str, role: &str) -> String {
        self.state
            .jwt_service()
            .generate_token(user_id, user_id, role, &[], Some("r-1"))
            .unwrap()
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

async fn seed(server: &TestServer) {
    let admin = server.token("admin-1", "admin");
    let (status, _) = server
        .call(
            "PUT",
            "/api/tables/t-1",
            Some(&admin),
            Some(json!({"area_id": "main", "name": "T-1", "capacity": 4})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .call(
            "PUT",
            "/api/catalog/products/steak",
            Some(&admin),
            Some(json!({
                "name": "Steak",
                "price": "22.00",
                "tax_rate": 10,
                "sizes": [{"id": "xl", "name": "XL", "price": "28.00"}],
                "addons": [{"id": "pepper", "name": "Pepper sauce", "price": "1.50"}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_public_and_orders_are_not() {
    let server = TestServer::start();

    let (status, body) = server.call("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = server.call("GET", "/api/orders/o-1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, _) = server
        .call("GET", "/api/orders/o-1", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_table_t1_through_kitchen_and_checkout() {
    let server = TestServer::start();
    seed(&server).await;
    let waiter = server.token("waiter-1", "waiter");
    let chef = server.token("chef-1", "chef");
    let cashier = server.token("cashier-1", "cashier");

    // Four items for table T-1
    let (status, order) = server
        .call(
            "POST",
            "/api/orders",
            Some(&waiter),
            Some(json!({
                "order_type": "dine_in",
                "table_id": "t-1",
                "items": [
                    {"product_id": "steak"},
                    {"product_id": "steak", "size_id": "xl"},
                    {"product_id": "steak", "addons": [{"addon_id": "pepper"}]},
                    {"product_id": "steak", "quantity": 1, "notes": "rare"}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", order);
    let id = order["order_id"].as_str().unwrap().to_string();
    assert_eq!(order["items"].as_array().unwrap().len(), 4);
    // 22 + 28 + 23.50 + 22 = 95.50, tax 9.55
    assert_eq!(order["subtotal"], "95.50");
    assert_eq!(order["total"], "105.05");

    // The table is held
    let (status, body) = server
        .call(
            "POST",
            "/api/orders",
            Some(&waiter),
            Some(json!({"order_type": "dine_in", "table_id": "t-1", "items": [{"product_id": "steak"}]})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 7002);

    let (status, feed) = server
        .call("GET", "/api/kitchen-orders", Some(&chef), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["poll_interval_secs"], 10);
    assert_eq!(feed["orders"][0]["order_id"], id.as_str());

    let kitchen_uri = format!("/api/orders/{}/kitchen-status", id);
    for (expected, target) in [("pending", "preparing"), ("preparing", "ready")] {
        let (status, body) = server
            .call(
                "POST",
                &kitchen_uri,
                Some(&chef),
                Some(json!({"expected": expected, "target": target})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["kitchen_status"], target);
    }

    // Duplicate "ready" tap
    let (status, body) = server
        .call(
            "POST",
            &kitchen_uri,
            Some(&chef),
            Some(json!({"expected": "ready", "target": "ready"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 4008);

    // Stale screen
    let (status, body) = server
        .call(
            "POST",
            &kitchen_uri,
            Some(&chef),
            Some(json!({"expected": "pending", "target": "preparing"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "This order was updated by someone else. Refresh and try again."
    );

    // Waiters cannot move the kitchen
    let (status, _) = server
        .call(
            "POST",
            &kitchen_uri,
            Some(&waiter),
            Some(json!({"expected": "ready", "target": "completed"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, receipt) = server
        .call(
            "POST",
            &format!("/api/orders/{}/checkout", id),
            Some(&cashier),
            Some(json!({"method": "cash", "amount": "105.05", "tendered": "110.00"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", receipt);
    assert_eq!(receipt["order"]["status"], "paid");
    assert_eq!(receipt["payment"]["change"], "4.95");

    let (_, tables) = server.call("GET", "/api/tables", Some(&waiter), None).await;
    assert_eq!(tables[0]["status"], "available");

    // Paid orders are frozen
    let (status, _) = server
        .call(
            "POST",
            &format!("/api/orders/{}/items", id),
            Some(&waiter),
            Some(json!({"items": [{"product_id": "steak"}]})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server
        .call(
            "POST",
            &kitchen_uri,
            Some(&chef),
            Some(json!({"expected": "ready", "target": "completed"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, feed) = server
        .call("GET", "/api/kitchen-orders", Some(&chef), None)
        .await;
    assert!(feed["orders"].as_array().unwrap().is_empty());

    let (_, payments) = server
        .call("GET", &format!("/api/orders/{}/payments", id), Some(&cashier), None)
        .await;
    assert_eq!(payments[0]["state"], "accepted");
}

#[tokio::test]
async fn test_rejected_payment_and_cancel_release() {
    let server = TestServer::start();
    seed(&server).await;
    let waiter = server.token("waiter-1", "waiter");
    let cashier = server.token("cashier-1", "cashier");

    let (_, order) = server
        .call(
            "POST",
            "/api/orders",
            Some(&waiter),
            Some(json!({"order_type": "dine_in", "table_id": "t-1", "items": [{"product_id": "steak"}]})),
        )
        .await;
    let id = order["order_id"].as_str().unwrap().to_string();

    // Card without a terminal approval reference
    let (status, body) = server
        .call(
            "POST",
            &format!("/api/orders/{}/checkout", id),
            Some(&cashier),
            Some(json!({"method": "card", "amount": order["total"].clone()})),
        )
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], 5001);

    let (_, current) = server
        .call("GET", &format!("/api/orders/{}", id), Some(&waiter), None)
        .await;
    assert_eq!(current["status"], "pending");
    let (_, tables) = server.call("GET", "/api/tables", Some(&waiter), None).await;
    assert_eq!(tables[0]["status"], "occupied");

    // Staff cannot free a held table
    let (status, _) = server
        .call(
            "POST",
            "/api/tables/t-1/status",
            Some(&waiter),
            Some(json!({"expected": "occupied", "target": "available"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, cancelled) = server
        .call(
            "POST",
            &format!("/api/orders/{}/status", id),
            Some(&waiter),
            Some(json!({"expected": "pending", "target": "cancelled", "reason": "wrong table"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["cancel_reason"], "wrong table");

    let (_, tables) = server.call("GET", "/api/tables", Some(&waiter), None).await;
    assert_eq!(tables[0]["status"], "available");
}

#[tokio::test]
async fn test_restaurant_scope_isolation() {
    let server = TestServer::start();
    seed(&server).await;
    let waiter = server.token("waiter-1", "waiter");

    let (_, order) = server
        .call(
            "POST",
            "/api/orders",
            Some(&waiter),
            Some(json!({"order_type": "takeaway", "items": [{"product_id": "steak"}]})),
        )
        .await;
    let id = order["order_id"].as_str().unwrap();

    let other = server
        .state
        .jwt_service()
        .generate_token("waiter-9", "waiter-9", "waiter", &[], Some("r-2"))
        .unwrap();
    let (status, _) = server
        .call("GET", &format!("/api/orders/{}", id), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unscoped = server
        .state
        .jwt_service()
        .generate_token("waiter-8", "waiter-8", "waiter", &[], None)
        .unwrap();
    let (status, body) = server
        .call("GET", &format!("/api/orders/{}", id), Some(&unscoped), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 3001);
}

#[tokio::test]
async fn test_catalog_changes_do_not_touch_existing_lines() {
    let server = TestServer::start();
    seed(&server).await;
    let admin = server.token("admin-1", "admin");
    let waiter = server.token("waiter-1", "waiter");

    let (_, order) = server
        .call(
            "POST",
            "/api/orders",
            Some(&waiter),
            Some(json!({"order_type": "takeaway", "items": [{"product_id": "steak"}]})),
        )
        .await;
    let id = order["order_id"].as_str().unwrap();

    // Waiters cannot manage the menu
    let (status, _) = server
        .call("DELETE", "/api/catalog/products/steak", Some(&waiter), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .call("DELETE", "/api/catalog/products/steak", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, current) = server
        .call("GET", &format!("/api/orders/{}", id), Some(&waiter), None)
        .await;
    assert_eq!(current["items"][0]["unit_price"], "22.00");

    let (status, _) = server
        .call(
            "POST",
            &format!("/api/orders/{}/items", id),
            Some(&waiter),
            Some(json!({"items": [{"product_id": "steak"}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
