//! Integration tests for the LaMetric relay.
//!
//! Most tests run the real Mixpanel and GitHub clients against a local stub
//! server. The live test needs real credentials:
//! Run with: cargo test --test integration -- --ignored

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use lametric_relay::api::{collect_frames, create_router, AppState};
use lametric_relay::config::Config;
use lametric_relay::frames::{DisplayFrame, FrameResponse};

/// How the stub Mixpanel endpoint answers.
#[derive(Debug, Clone, Copy)]
enum MixpanelMode {
    Ok,
    ServerError,
    Slow,
}

/// Shared state of the stub upstream server.
#[derive(Debug, Clone)]
struct Stub {
    mode: MixpanelMode,
    mixpanel_calls: Arc<AtomicUsize>,
    github_calls: Arc<AtomicUsize>,
    last_mixpanel_auth: Arc<Mutex<Option<String>>>,
    last_mixpanel_query: Arc<Mutex<Vec<(String, String)>>>,
    last_github: Arc<Mutex<Option<(String, String, String)>>>,
}

impl Stub {
    fn new(mode: MixpanelMode) -> Self {
        Self {
            mode,
            mixpanel_calls: Arc::new(AtomicUsize::new(0)),
            github_calls: Arc::new(AtomicUsize::new(0)),
            last_mixpanel_auth: Arc::new(Mutex::new(None)),
            last_mixpanel_query: Arc::new(Mutex::new(Vec::new())),
            last_github: Arc::new(Mutex::new(None)),
        }
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn insights(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    stub.mixpanel_calls.fetch_add(1, Ordering::SeqCst);
    *stub.last_mixpanel_auth.lock().unwrap() = header(&headers, "authorization");
    *stub.last_mixpanel_query.lock().unwrap() = query;

    match stub.mode {
        MixpanelMode::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
        }
        MixpanelMode::Slow => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "series": {} })).into_response()
        }
        MixpanelMode::Ok => Json(json!({
            "computed_at": "2026-10-19T08:00:00+00:00",
            "date_range": { "from_date": "2026-10-13", "to_date": "2026-10-19" },
            "series": {
                "dau": {
                    "2026-10-18T00:00:00+00:00": 111,
                    "2026-10-19T00:00:00+00:00": 120
                },
                "wau": { "all": 500 },
                "pipeline_runs": {
                    "2026-10-17T00:00:00+00:00": 3,
                    "2026-10-18T00:00:00+00:00": 4,
                    "2026-10-19T00:00:00+00:00": 5
                }
            }
        }))
        .into_response(),
    }
}

async fn repository(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path((owner, repo)): Path<(String, String)>,
) -> Json<Value> {
    stub.github_calls.fetch_add(1, Ordering::SeqCst);
    *stub.last_github.lock().unwrap() = Some((
        owner.clone(),
        repo.clone(),
        header(&headers, "authorization").unwrap_or_default(),
    ));

    Json(json!({
        "full_name": format!("{owner}/{repo}"),
        "stargazers_count": 4_150,
        "forks_count": 470,
        "open_issues_count": 88
    }))
}

/// Start the stub upstream and return its base URL.
async fn spawn_stub(stub: Stub) -> String {
    let app = Router::new()
        .route("/api/query/insights", get(insights))
        .route("/repos/:owner/:repo", get(repository))
        .with_state(stub);

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn config(base_url: &str, token: Option<&str>) -> Config {
    config_with_frames(base_url, token, "dau=i1,wau=i2,github:stars=i3")
}

fn config_with_frames(base_url: &str, token: Option<&str>, frames: &str) -> Config {
    let mut vars: Vec<(String, String)> = vec![
        ("MIXPANEL_PROJECT_ID".into(), "12345".into()),
        ("MIXPANEL_SERVICE_ACCOUNT_USERNAME".into(), "relay.sa".into()),
        ("MIXPANEL_SERVICE_ACCOUNT_SECRET".into(), "s3cret".into()),
        ("MIXPANEL_BOOKMARK_ID".into(), "67890".into()),
        ("MIXPANEL_API_URL".into(), format!("{base_url}/api/query")),
        ("GITHUB_API_URL".into(), base_url.to_string()),
        ("GITHUB_OWNER".into(), "zenml-io".into()),
        ("GITHUB_REPO".into(), "zenml".into()),
        ("FRAMES".into(), frames.into()),
        ("HTTP_TIMEOUT_MS".into(), "300".into()),
    ];
    if let Some(token) = token {
        vars.push(("GITHUB_TOKEN".into(), token.into()));
    }
    Config::from_vars(vars).unwrap()
}

async fn poll(config: &Config) -> (StatusCode, FrameResponse) {
    let app = create_router(AppState::from_config(config).unwrap());
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn serves_frames_from_both_upstreams() {
    let stub = Stub::new(MixpanelMode::Ok);
    let base = spawn_stub(stub.clone()).await;

    let (status, body) = poll(&config(&base, Some("ghp_test"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.frames,
        vec![
            DisplayFrame::new("i1", "120"),
            DisplayFrame::new("i2", "500"),
            DisplayFrame::new("i3", "4150"),
        ]
    );
    assert_eq!(stub.mixpanel_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.github_calls.load(Ordering::SeqCst), 1);

    // "relay.sa:s3cret"
    assert_eq!(
        stub.last_mixpanel_auth.lock().unwrap().as_deref(),
        Some("Basic cmVsYXkuc2E6czNjcmV0")
    );
    let query = stub.last_mixpanel_query.lock().unwrap().clone();
    assert!(query.contains(&("project_id".to_string(), "12345".to_string())));
    assert!(query.contains(&("bookmark_id".to_string(), "67890".to_string())));

    let (owner, repo, auth) = stub.last_github.lock().unwrap().clone().unwrap();
    assert_eq!((owner.as_str(), repo.as_str()), ("zenml-io", "zenml"));
    assert_eq!(auth, "Bearer ghp_test");
}

#[tokio::test]
async fn window_totals_and_missing_series_share_one_report() {
    let stub = Stub::new(MixpanelMode::Ok);
    let base = spawn_stub(stub.clone()).await;
    let config = config_with_frames(
        &base,
        None,
        "sum:pipeline_runs=i4,pipeline_runs=i5,signups=i6,dau=i1",
    );

    let (status, body) = poll(&config).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.frames,
        vec![
            DisplayFrame::new("i4", "12"),
            DisplayFrame::new("i5", "5"),
            DisplayFrame::new("i6", "N/A"),
            DisplayFrame::new("i1", "120"),
        ]
    );
    assert_eq!(stub.mixpanel_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.github_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn analytics_500_still_returns_200_with_placeholders() {
    let stub = Stub::new(MixpanelMode::ServerError);
    let base = spawn_stub(stub.clone()).await;

    let (status, body) = poll(&config(&base, Some("ghp_test"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.frames,
        vec![
            DisplayFrame::new("i1", "N/A"),
            DisplayFrame::new("i2", "N/A"),
            DisplayFrame::new("i3", "4150"),
        ]
    );
}

#[tokio::test]
async fn analytics_timeout_still_returns_200_with_placeholders() {
    let stub = Stub::new(MixpanelMode::Slow);
    let base = spawn_stub(stub.clone()).await;

    let (status, body) = poll(&config(&base, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.frames.len(), 3);
    assert_eq!(body.frames[0].text, "N/A");
    assert_eq!(body.frames[1].text, "N/A");
    assert_eq!(body.frames[2].text, "OFF");
}

#[tokio::test]
async fn no_token_means_no_github_call() {
    let stub = Stub::new(MixpanelMode::Ok);
    let base = spawn_stub(stub.clone()).await;
    let config = config(&base, None);

    for _ in 0..3 {
        let (_, body) = poll(&config).await;
        assert_eq!(body.frames[2], DisplayFrame::new("i3", "OFF"));
    }

    assert_eq!(stub.mixpanel_calls.load(Ordering::SeqCst), 3);
    assert_eq!(stub.github_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn liveness_never_touches_upstreams() {
    let stub = Stub::new(MixpanelMode::Ok);
    let base = spawn_stub(stub.clone()).await;
    let app = create_router(AppState::from_config(&config(&base, Some("ghp_test"))).unwrap());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(stub.mixpanel_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.github_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_credentials_fail_startup() {
    let vars = vec![("MIXPANEL_PROJECT_ID".to_string(), "12345".to_string())];
    assert!(Config::from_vars(vars).is_err());
}

/// Fetch frames from the real upstreams configured in the environment.
#[tokio::test]
#[ignore = "requires MIXPANEL_* credentials"]
async fn live_frames_from_environment() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            println!("Skipping: {}", e);
            return;
        }
    };

    let state = AppState::from_config(&config).unwrap();
    let response = collect_frames(&state).await;

    assert_eq!(response.frames.len(), state.layout.len());
    println!("{}", serde_json::to_string_pretty(&response).unwrap());
}
