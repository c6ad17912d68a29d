use async_trait::async_trait;
use okr_core::db::open_db_in_memory;
use okr_core::{GenerateOkrsRequest, GeneratedKeyResult, GeneratedObjective, KeyResultType};
use okr_server::{
    build_router, AppState, GeneratorError, OkrGenerator, UnavailableGenerator,
};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;

struct FixedGenerator {
    proposals: Vec<GeneratedObjective>,
}

#[async_trait]
impl OkrGenerator for FixedGenerator {
    async fn generate(
        &self,
        _request: &GenerateOkrsRequest,
    ) -> Result<Vec<GeneratedObjective>, GeneratorError> {
        Ok(self.proposals.clone())
    }
}

struct FailingGenerator;

#[async_trait]
impl OkrGenerator for FailingGenerator {
    async fn generate(
        &self,
        _request: &GenerateOkrsRequest,
    ) -> Result<Vec<GeneratedObjective>, GeneratorError> {
        Err(GeneratorError::Upstream("connection reset".to_string()))
    }
}

struct TestServer {
    http: Client,
    base_url: String,
}

impl TestServer {
    async fn start(generator: Arc<dyn OkrGenerator>) -> Self {
        let conn = open_db_in_memory().expect("open in-memory db");
        let app = build_router(AppState::new(conn, generator));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        Self {
            http: Client::new(),
            base_url: format!("http://{addr}"),
        }
    }

    async fn basic() -> Self {
        Self::start(Arc::new(UnavailableGenerator)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.http.get(self.url(path)).send().await.expect("GET");
        read(response).await
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .http
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("POST");
        read(response).await
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .http
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("PUT");
        read(response).await
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let response = self.http.delete(self.url(path)).send().await.expect("DELETE");
        read(response).await
    }

    async fn create_objective(&self, title: &str) -> String {
        let (status, body) = self.post("/api/objectives", json!({ "title": title })).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["id"].as_str().expect("objective id").to_string()
    }
}

async fn read(response: reqwest::Response) -> (StatusCode, Value) {
    let status = response.status();
    let text = response.text().await.expect("body");
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).expect("JSON body")
    };
    (status, body)
}

#[tokio::test]
async fn health_reports_healthy() {
    let server = TestServer::basic().await;
    let (status, body) = server.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn created_objective_appears_on_dashboard() {
    let server = TestServer::basic().await;
    let (status, created) = server
        .post(
            "/api/objectives",
            json!({ "title": "Expand to EU", "deadline": "2026-12-31T00:00:00" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["progress"], 0.0);
    assert_eq!(created["deadline"], "2026-12-31");
    assert_eq!(created["status"], "active");
    assert_eq!(created["key_results"], json!([]));

    let (status, dashboard) = server.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["total_objectives"], 1);
    assert_eq!(dashboard["avg_progress"], 0.0);
    assert_eq!(dashboard["objectives"][0]["id"], created["id"]);
    assert_eq!(dashboard["objectives"][0]["key_results_count"], 0);
}

#[tokio::test]
async fn key_result_progress_flows_to_objective() {
    let server = TestServer::basic().await;
    let objective_id = server.create_objective("Grow").await;

    let (status, created) = server
        .post(
            &format!("/api/objectives/{objective_id}/key-results"),
            json!({ "title": "Customers", "start_value": 0, "target_value": 50 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    assert_eq!(created["type"], "metric");
    assert_eq!(created["progress"], 0.0);
    let key_result_id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = server
        .put(
            &format!("/api/key-results/{key_result_id}/progress"),
            json!({ "current_value": 25 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["progress"], 50.0);
    assert_eq!(updated["objective"]["progress"], 50.0);
    assert_eq!(updated["objective"]["key_results"][0]["current_value"], 25.0);

    let (_, tree) = server.get(&format!("/api/objectives/{objective_id}")).await;
    assert_eq!(tree["progress"], 50.0);
}

#[tokio::test]
async fn binary_key_result_uses_completed_flag() {
    let server = TestServer::basic().await;
    let objective_id = server.create_objective("Ship").await;

    let (status, created) = server
        .post(
            &format!("/api/objectives/{objective_id}/key-results"),
            json!({ "title": "Launch", "type": "binary", "completed": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["progress"], 0.0);
    assert_eq!(created["completed"], false);

    let key_result_id = created["id"].as_str().unwrap();
    let (status, updated) = server
        .put(
            &format!("/api/key-results/{key_result_id}"),
            json!({ "title": "Launch", "type": "binary", "completed": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["progress"], 100.0);
    assert_eq!(updated["objective"]["progress"], 100.0);
}

#[tokio::test]
async fn binary_completed_flag_wins_over_descending_values() {
    let server = TestServer::basic().await;
    let objective_id = server.create_objective("Stabilize").await;

    let (status, created) = server
        .post(
            &format!("/api/objectives/{objective_id}/key-results"),
            json!({
                "title": "Zero open incidents",
                "type": "binary",
                "start_value": 1,
                "target_value": 0,
                "completed": false
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    assert_eq!(created["progress"], 0.0);
    assert_eq!(created["completed"], false);
    assert_eq!(created["objective"]["progress"], 0.0);

    let (status, body) = server
        .post(
            &format!("/api/objectives/{objective_id}/key-results"),
            json!({ "title": "Flat", "type": "binary", "start_value": 0, "target_value": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["field"], "target_value");
}

#[tokio::test]
async fn descending_metric_reports_completion_only_at_target() {
    let server = TestServer::basic().await;
    let objective_id = server.create_objective("Reduce churn").await;
    let (_, created) = server
        .post(
            &format!("/api/objectives/{objective_id}/key-results"),
            json!({ "title": "Churn", "start_value": 10, "target_value": 5 }),
        )
        .await;
    let key_result_id = created["id"].as_str().unwrap();
    let path = format!("/api/key-results/{key_result_id}/progress");

    let (_, partial) = server.put(&path, json!({ "current_value": 9 })).await;
    assert_eq!(partial["progress"], 20.0);
    assert_eq!(partial["completed"], false);

    let (_, done) = server.put(&path, json!({ "current_value": 4 })).await;
    assert_eq!(done["progress"], 100.0);
    assert_eq!(done["completed"], true);
}

#[tokio::test]
async fn initiatives_round_trip_through_key_results() {
    let server = TestServer::basic().await;
    let objective_id = server.create_objective("Grow").await;
    let (_, key_result) = server
        .post(
            &format!("/api/objectives/{objective_id}/key-results"),
            json!({ "title": "Leads" }),
        )
        .await;
    let key_result_id = key_result["id"].as_str().unwrap();

    let (status, created) = server
        .post(
            &format!("/api/key-results/{key_result_id}/initiatives"),
            json!({ "title": "Cold email" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    assert_eq!(created["status"], "not_started");
    assert_eq!(created["key_result_id"], key_result_id);
    assert_eq!(
        created["objective"]["key_results"][0]["initiatives"][0]["title"],
        "Cold email"
    );

    let initiative_id = created["id"].as_str().unwrap();
    let (status, updated) = server
        .put(
            &format!("/api/initiatives/{initiative_id}"),
            json!({ "title": "Cold email", "status": "completed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["objective"]["progress"], 0.0);

    let (status, body) = server
        .delete(&format!("/api/initiatives/{initiative_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Initiative deleted successfully");
}

#[tokio::test]
async fn deleted_objective_is_gone() {
    let server = TestServer::basic().await;
    let objective_id = server.create_objective("Temporary").await;
    let (_, key_result) = server
        .post(
            &format!("/api/objectives/{objective_id}/key-results"),
            json!({ "title": "Leads" }),
        )
        .await;
    let key_result_id = key_result["id"].as_str().unwrap();

    let (status, _) = server
        .delete(&format!("/api/objectives/{objective_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.get(&format!("/api/objectives/{objective_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server
        .put(
            &format!("/api/key-results/{key_result_id}/progress"),
            json!({ "current_value": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, dashboard) = server.get("/api/dashboard").await;
    assert_eq!(dashboard["total_objectives"], 0);
}

#[tokio::test]
async fn error_kinds_map_to_status_codes() {
    let server = TestServer::basic().await;

    let (status, body) = server.post("/api/objectives", json!({ "title": "  " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["field"], "title");

    let missing = uuid::Uuid::new_v4();
    let (status, body) = server
        .post(
            &format!("/api/objectives/{missing}/key-results"),
            json!({ "title": "Orphan" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = server.get("/api/objectives/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "id");

    let response = server
        .http
        .post(server.url("/api/objectives"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    let (status, body) = read(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let objective_id = server.create_objective("Grow").await;
    let (status, body) = server
        .post(
            &format!("/api/objectives/{objective_id}/key-results"),
            json!({ "title": "Flat", "start_value": 5, "target_value": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["field"], "target_value");
}

#[tokio::test]
async fn generation_without_upstream_is_unavailable() {
    let server = TestServer::basic().await;

    let (status, body) = server
        .post("/api/generate-okrs", json!({ "context": "B2B SaaS" }))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "generator_unavailable");

    let (status, body) = server
        .post("/api/generate-okrs", json!({ "context": "" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["field"], "context");
}

#[tokio::test]
async fn upstream_generator_failure_is_bad_gateway() {
    let server = TestServer::start(Arc::new(FailingGenerator)).await;
    let (status, body) = server
        .post("/api/generate-and-create-okrs", json!({ "context": "Retail" }))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "upstream_error");

    let (_, dashboard) = server.get("/api/dashboard").await;
    assert_eq!(dashboard["total_objectives"], 0);
}

#[tokio::test]
async fn generated_okrs_are_returned_and_persisted() {
    let proposals = vec![GeneratedObjective {
        title: "Delight customers".to_string(),
        description: "Raise satisfaction".to_string(),
        key_results: vec![
            GeneratedKeyResult {
                title: "NPS".to_string(),
                start_value: Some(20.0),
                target_value: Some(50.0),
                ..GeneratedKeyResult::default()
            },
            GeneratedKeyResult {
                title: "Launch help center".to_string(),
                kind: KeyResultType::Binary,
                ..GeneratedKeyResult::default()
            },
        ],
    }];
    let server = TestServer::start(Arc::new(FixedGenerator { proposals })).await;
    let request = json!({
        "context": "Customer support tooling",
        "company_size": "50",
        "industry": "SaaS",
        "time_period": "Q3"
    });

    let (status, preview) = server.post("/api/generate-okrs", request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["generated_okrs"][0]["title"], "Delight customers");
    let (_, dashboard) = server.get("/api/dashboard").await;
    assert_eq!(dashboard["total_objectives"], 0);

    let (status, created) = server
        .post("/api/generate-and-create-okrs", request)
        .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    let objectives = created["created_objectives"].as_array().unwrap();
    assert_eq!(objectives.len(), 1);
    assert_eq!(objectives[0]["key_results"].as_array().unwrap().len(), 2);
    assert_eq!(objectives[0]["key_results"][1]["type"], "binary");

    let (_, dashboard) = server.get("/api/dashboard").await;
    assert_eq!(dashboard["total_objectives"], 1);
    assert_eq!(dashboard["objectives"][0]["key_results_count"], 2);
}

#[tokio::test]
async fn cors_headers_are_permissive() {
    let server = TestServer::basic().await;

    let response = server
        .http
        .request(reqwest::Method::OPTIONS, server.url("/api/objectives"))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );

    let response = server.http.get(server.url("/api/health")).send().await.unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}
