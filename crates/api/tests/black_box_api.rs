use reqwest::StatusCode;
use serde_json::{Value, json};

use unitrack_infra::ServiceConfig;

const UNIT: &str = "W036825014001";
const PRODUCT: &str = "E0869V00";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod with an in-memory store, bound to an ephemeral port.
        let config = ServiceConfig::from_lookup(|_| None).expect("default config");
        let app = unitrack_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    async fn import(&self, location: &str) {
        let res = self
            .post(
                "/events/product-imported",
                json!({
                    "unit_number": UNIT,
                    "product_code": PRODUCT,
                    "location": location,
                    "is_labeled": true,
                    "is_licensed": true,
                }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    async fn quarantine(&self, action: &str, extern_id: i64, reason: &str) -> reqwest::Response {
        self.post(
            "/events/quarantine-requested",
            json!({
                "unit_number": UNIT,
                "product_code": PRODUCT,
                "action": action,
                "extern_id": extern_id,
                "reason": reason,
                "comments": "lab review",
            }),
        )
        .await
    }

    async fn unit(&self) -> Value {
        let res = self.get(&format!("/units/{UNIT}/{PRODUCT}")).await;
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn listed_unit_eventually(server: &TestServer, version: u64) -> Value {
    // The read model is fed by the bus; poll briefly until it catches up.
    for _ in 0..50 {
        let res = server.get("/units").await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        if let Some(view) = body
            .as_array()
            .and_then(|views| views.iter().find(|v| v["version"] == json!(version)))
        {
            return view.clone();
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("unit did not reach version {version} in the read model");
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = server.get("/health").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn imported_unit_is_readable() {
    let server = TestServer::spawn().await;
    server.import("DOCK").await;

    let unit = server.unit().await;
    assert_eq!(unit["version"], json!(1));
    assert_eq!(unit["status"], json!("AVAILABLE"));
    assert_eq!(unit["location"], json!("DOCK"));
    assert_eq!(unit["available"], json!(true));
    assert_eq!(unit["quarantined"], json!(false));
    assert_eq!(unit["key"]["unit_number"], json!(UNIT));
}

#[tokio::test]
async fn removing_last_quarantine_restores_previous_status() {
    let server = TestServer::spawn().await;
    server.import("DOCK").await;

    let res = server.quarantine("ADD", 1, "Contamination").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["changed"], json!(true));
    assert_eq!(body["unit"]["status"], json!("QUARANTINED"));

    let unit = server.unit().await;
    assert_eq!(unit["status"], json!("QUARANTINED"));
    assert_eq!(unit["quarantines"].as_array().unwrap().len(), 1);

    let res = server.quarantine("REMOVE", 1, "").await;
    assert_eq!(res.status(), StatusCode::OK);

    let unit = server.unit().await;
    assert_eq!(unit["status"], json!("AVAILABLE"));
    assert!(unit["quarantines"].as_array().unwrap().is_empty());
    assert_eq!(unit["version"], json!(3));
}

#[tokio::test]
async fn replayed_quarantine_is_unchanged_and_conflicting_one_is_rejected() {
    let server = TestServer::spawn().await;
    server.import("DOCK").await;
    server.quarantine("ADD", 1, "Contamination").await;

    let res = server.quarantine("ADD", 1, "Contamination").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["changed"], json!(false));
    assert_eq!(body["version"], json!(2));

    let res = server.quarantine("ADD", 1, "OTHER").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], json!("duplicate"));
}

#[tokio::test]
async fn received_quarantine_flag_blocks_shipping() {
    let server = TestServer::spawn().await;
    server.import("DOCK").await;

    let res = server
        .post(
            "/events/unit-received",
            json!({
                "unit_number": UNIT,
                "product_code": PRODUCT,
                "location": "LOCATION_1",
                "has_quarantine": true,
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let unit = server.unit().await;
    assert_eq!(unit["quarantined"], json!(true));
    assert_eq!(unit["location"], json!("LOCATION_1"));

    let res = server
        .get(&format!("/units/{UNIT}/{PRODUCT}/ship-check?location=LOCATION_1"))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["can_ship"], json!(false));
    assert_eq!(body["notifications"][0]["code"], json!(4));
    assert_eq!(body["notifications"][0]["kind"], json!("INVENTORY_IS_QUARANTINED"));
}

#[tokio::test]
async fn ship_check_at_other_location_reports_not_found_in_location() {
    let server = TestServer::spawn().await;
    server.import("DOCK").await;

    let res = server
        .get(&format!("/units/{UNIT}/{PRODUCT}/ship-check?location=ELSEWHERE"))
        .await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["can_ship"], json!(false));
    assert_eq!(body["notifications"][0]["kind"], json!("INVENTORY_NOT_FOUND_IN_LOCATION"));

    let res = server
        .get(&format!("/units/{UNIT}/{PRODUCT}/ship-check?location=DOCK"))
        .await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["can_ship"], json!(true));
    assert!(body["notifications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_unit_is_not_found() {
    let server = TestServer::spawn().await;

    let res = server.get(&format!("/units/{UNIT}/{PRODUCT}")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], json!("not_found"));

    let res = server.quarantine("ADD", 1, "Contamination").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_unit_number_is_rejected() {
    let server = TestServer::spawn().await;

    let res = server
        .post(
            "/events/product-imported",
            json!({
                "unit_number": "  ",
                "product_code": PRODUCT,
                "location": "DOCK",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], json!("validation_error"));
}

#[tokio::test]
async fn discarded_unit_reaches_read_model() {
    let server = TestServer::spawn().await;
    server.import("DOCK").await;

    let res = server
        .post(
            "/events/product-discarded",
            json!({
                "unit_number": UNIT,
                "product_code": PRODUCT,
                "reason": "EXPIRED",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let view = listed_unit_eventually(&server, 2).await;
    assert_eq!(view["status"], json!("DISCARDED"));
    assert_eq!(view["status_reason"], json!("EXPIRED"));
}
