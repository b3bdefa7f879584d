use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};

use daily_jobs_service::clients::{RemoteConfigClient, RetryPolicy};
use daily_jobs_service::{
    ConfigTuner, DailyKpi, KpiSource, TemplateStore, TuneOutcome, DEFAULT_CTR_WINDOW, DEFAULT_DIVERSITY_WINDOW,
};

#[derive(Default)]
struct FakeKpis {
    by_date: HashMap<NaiveDate, DailyKpi>,
    requested: Mutex<Vec<NaiveDate>>,
}

#[async_trait]
impl KpiSource for FakeKpis {
    async fn daily_kpi(&self, date: NaiveDate) -> daily_jobs_service::Result<Option<DailyKpi>> {
        self.requested.lock().unwrap().push(date);
        Ok(self.by_date.get(&date).cloned())
    }
}

#[derive(Clone)]
struct MockState {
    template: Arc<Mutex<Value>>,
    published: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    auth_seen: Arc<Mutex<Vec<String>>>,
    deny: bool,
}

impl MockState {
    fn new(template: Value) -> Self {
        Self {
            template: Arc::new(Mutex::new(template)),
            published: Default::default(),
            auth_seen: Default::default(),
            deny: false,
        }
    }
}

async fn mock_get(State(state): State<MockState>, headers: HeaderMap) -> axum::response::Response {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.auth_seen.lock().unwrap().push(auth.to_string());
    }
    if state.deny {
        return (StatusCode::FORBIDDEN, axum::Json(json!({"error": {"code": 403}}))).into_response();
    }
    let body = state.template.lock().unwrap().clone();
    (StatusCode::OK, [("etag", "etag-1")], axum::Json(body)).into_response()
}

async fn mock_put(State(state): State<MockState>, headers: HeaderMap, body: axum::Json<Value>) -> axum::response::Response {
    let if_match = headers.get("if-match").and_then(|v| v.to_str().ok()).map(|s| s.to_string());
    state.published.lock().unwrap().push((if_match, body.0.clone()));
    *state.template.lock().unwrap() = body.0.clone();
    (StatusCode::OK, [("etag", "etag-2")], axum::Json(body.0)).into_response()
}

async fn spawn_mock(state: MockState) -> String {
    let app = Router::new()
        .route("/v1/projects/{project}/remoteConfig", get(mock_get).put(mock_put))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap(); });
    format!("http://{}", addr)
}

fn template_store(base: &str) -> Arc<dyn TemplateStore> {
    Arc::new(RemoteConfigClient::new(
        reqwest::Client::new(),
        base,
        "demo-project",
        "access-token".to_string(),
        RetryPolicy { max_retries: 0, base_backoff_ms: 1 },
    ))
}

fn existing_template() -> Value {
    json!({
        "conditions": [{ "name": "android", "expression": "device.os == 'android'" }],
        "parameters": {
            "welcomeMessage": { "defaultValue": { "value": "hi" } },
            "targetCtrLow": { "defaultValue": { "value": "0.01" } }
        },
        "version": { "versionNumber": "12" }
    })
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
}

fn yesterday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
}

fn param(template: &Value, name: &str) -> f64 {
    template["parameters"][name]["defaultValue"]["value"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn tuner_publishes_windows_from_yesterdays_kpi() {
    let state = MockState::new(existing_template());
    let base = spawn_mock(state.clone()).await;
    let mut kpis = FakeKpis::default();
    kpis.by_date.insert(yesterday(), DailyKpi { ctr: Some(0.20), diversity: Some(0.60), impressions: Some(1000), clicks: Some(200) });
    let kpis = Arc::new(kpis);
    let tuner = ConfigTuner::new(kpis.clone(), Some(template_store(&base)));

    let outcome = tuner.tune(today()).await.unwrap();
    assert!(matches!(outcome, TuneOutcome::Published { .. }));
    assert_eq!(*kpis.requested.lock().unwrap(), vec![yesterday()]);

    let published = state.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    let (if_match, body) = &published[0];
    assert_eq!(if_match.as_deref(), Some("etag-1"));
    assert!((param(body, "targetCtrLow") - 0.19).abs() < 1e-9);
    assert!((param(body, "targetCtrHigh") - 0.21).abs() < 1e-9);
    assert!((param(body, "targetDivLow") - 0.55).abs() < 1e-9);
    assert!((param(body, "targetDivHigh") - 0.65).abs() < 1e-9);
    // unrelated template content survives
    assert_eq!(body["parameters"]["welcomeMessage"]["defaultValue"]["value"], "hi");
    assert_eq!(body["conditions"][0]["name"], "android");
    assert_eq!(body["version"]["versionNumber"], "12");
    assert_eq!(*state.auth_seen.lock().unwrap(), vec!["Bearer access-token".to_string()]);
}

#[tokio::test]
async fn tuner_falls_back_to_defaults_without_snapshot() {
    let state = MockState::new(existing_template());
    let base = spawn_mock(state.clone()).await;
    let tuner = ConfigTuner::new(Arc::new(FakeKpis::default()), Some(template_store(&base)));

    let outcome = tuner.tune(today()).await.unwrap();
    assert_eq!(outcome.windows().ctr, DEFAULT_CTR_WINDOW);
    assert_eq!(outcome.windows().diversity, DEFAULT_DIVERSITY_WINDOW);

    let published = state.published.lock().unwrap();
    let body = &published[0].1;
    assert_eq!(body["parameters"]["targetCtrLow"]["defaultValue"]["value"], "0.12");
    assert_eq!(body["parameters"]["targetCtrHigh"]["defaultValue"]["value"], "0.16");
    assert_eq!(body["parameters"]["targetDivLow"]["defaultValue"]["value"], "0.55");
    assert_eq!(body["parameters"]["targetDivHigh"]["defaultValue"]["value"], "0.7");
}

#[tokio::test]
async fn tuner_ignores_implausible_ctr() {
    let state = MockState::new(json!({ "parameters": {} }));
    let base = spawn_mock(state.clone()).await;
    let mut kpis = FakeKpis::default();
    kpis.by_date.insert(yesterday(), DailyKpi { ctr: Some(0.95), ..Default::default() });
    let tuner = ConfigTuner::new(Arc::new(kpis), Some(template_store(&base)));

    let outcome = tuner.tune(today()).await.unwrap();
    assert_eq!(outcome.windows().ctr, DEFAULT_CTR_WINDOW);
    assert_eq!(state.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn tuner_without_remote_config_skips_publish() {
    let tuner = ConfigTuner::new(Arc::new(FakeKpis::default()), None);
    let outcome = tuner.tune(today()).await.unwrap();
    assert!(matches!(outcome, TuneOutcome::Skipped { .. }));
    assert_eq!(outcome.windows().ctr, DEFAULT_CTR_WINDOW);
}

#[tokio::test]
async fn tuner_propagates_template_read_failure() {
    let mut state = MockState::new(existing_template());
    state.deny = true;
    let base = spawn_mock(state.clone()).await;
    let tuner = ConfigTuner::new(Arc::new(FakeKpis::default()), Some(template_store(&base)));

    let err = tuner.tune(today()).await.unwrap_err();
    assert!(err.to_string().contains("get template failed"), "unexpected error: {}", err);
    assert!(state.published.lock().unwrap().is_empty());
}
