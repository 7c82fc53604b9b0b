#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use dashboard_sync::charts::DashboardChartData;
use dashboard_sync::dom::{CSRF_FIELD_NAME, ElementSpec};
use dashboard_sync::models::Severity;
use dashboard_sync::prompt::ScriptedPrompt;
use dashboard_sync::storage::Preferences;
use dashboard_sync::{Dashboard, PageSnapshot, RemoteActionClient};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const CSRF_TOKEN: &str = "tok-abc";

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING);
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub csrf: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct StubState {
    requests: Vec<RecordedRequest>,
    responses: HashMap<(String, String), (u16, String)>,
}

/// In-process stand-in for the finance endpoints. Answers 200 with an empty
/// body unless told otherwise, and records every request it sees.
#[derive(Clone)]
pub struct StubServer {
    pub base_url: String,
    state: Arc<Mutex<StubState>>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(StubState::default()));
        let app = Router::new().fallback(record).with_state(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });

        Self {
            base_url: format!("http://{addr}/"),
            state,
        }
    }

    pub async fn respond(&self, method: &str, path: &str, status: u16, body: &str) {
        self.state
            .lock()
            .await
            .responses
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }
}

async fn record(
    State(state): State<Arc<Mutex<StubState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut state = state.lock().await;
    let csrf = headers
        .get("x-csrftoken")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.requests.push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        csrf,
        body,
    });

    let key = (method.to_string(), uri.path().to_string());
    let (status, body) = state.responses.get(&key).cloned().unwrap_or((200, String::new()));
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, body).into_response()
}

/// An address nothing listens on.
pub fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}

pub fn unique_prefs_path() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("dashboard_sync_prefs_{}_{}.json", std::process::id(), nanos));
    path
}

pub fn dashboard(base_url: &str, answers: &[Option<&str>]) -> Dashboard {
    init_tracing();
    let client = RemoteActionClient::new(base_url).expect("client");
    let prompt = ScriptedPrompt::new(answers.iter().copied());
    Dashboard::new(client, Box::new(prompt), Preferences::default(), None)
}

pub async fn loaded_dashboard(base_url: &str, answers: &[Option<&str>]) -> Dashboard {
    let dash = dashboard(base_url, answers);
    dash.load_page(&dashboard_page()).await;
    dash
}

pub async fn toasts(dash: &Dashboard) -> Vec<(Severity, String)> {
    dash.report()
        .await
        .toasts
        .into_iter()
        .map(|toast| (toast.severity, toast.text))
        .collect()
}

fn csrf_input() -> ElementSpec {
    ElementSpec::input(CSRF_FIELD_NAME, CSRF_TOKEN).with_attr("type", "hidden")
}

fn bill(id: &str, name: &str) -> ElementSpec {
    ElementSpec::new("li")
        .with_class("bill-item")
        .with_child(ElementSpec::new("span").with_text(name))
        .with_child(
            ElementSpec::new("button")
                .with_class("mark-paid-btn")
                .with_data("bill-id", id)
                .with_child(ElementSpec::new("i").with_class("fa-check")),
        )
}

/// The profile dashboard as the server renders it: two bills, one goal, both
/// modals and the three charts.
pub fn dashboard_page() -> PageSnapshot {
    let body = ElementSpec::new("body")
        .with_child(csrf_input())
        .with_child(ElementSpec::new("button").with_id("darkModeToggle"))
        .with_child(
            ElementSpec::new("ul")
                .with_id("bills")
                .with_child(bill("42", "Electricity"))
                .with_child(bill("7", "Water")),
        )
        .with_child(
            ElementSpec::new("div")
                .with_class("goal-card")
                .with_child(ElementSpec::new("button").with_class("add-savings-btn").with_data("goal-id", "3"))
                .with_child(ElementSpec::new("button").with_class("adjust-goal-btn").with_data("goal-id", "3")),
        )
        .with_child(ElementSpec::new("button").with_class("new-goal-btn"))
        .with_child(
            ElementSpec::new("div")
                .with_id("addBillModal")
                .with_class("modal")
                .with_class("show")
                .with_child(
                    ElementSpec::new("form")
                        .with_id("addBillForm")
                        .with_child(csrf_input())
                        .with_child(ElementSpec::input("name", "Rent"))
                        .with_child(ElementSpec::input("amount", "450000"))
                        .with_child(ElementSpec::input("due_date", "2026-11-01")),
                ),
        )
        .with_child(
            ElementSpec::new("div")
                .with_id("addSavingsGoalModal")
                .with_class("modal")
                .with_child(ElementSpec::new("h5").with_class("modal-title").with_text("Add Savings Goal"))
                .with_child(
                    ElementSpec::new("form")
                        .with_id("savingsGoalForm")
                        .with_attr("action", "/users/savings/goal/add/")
                        .with_child(csrf_input())
                        .with_child(ElementSpec::input("name", ""))
                        .with_child(ElementSpec::input("target_amount", ""))
                        .with_child(ElementSpec::input("current_savings", ""))
                        .with_child(ElementSpec::input("target_date", "")),
                ),
        )
        .with_child(ElementSpec::new("canvas").with_id("categoryDonutChart"))
        .with_child(ElementSpec::new("canvas").with_id("trendChart"))
        .with_child(ElementSpec::new("canvas").with_id("budgetComparisonChart"));

    PageSnapshot {
        body,
        chart_data: Some(DashboardChartData {
            categories: vec!["Food".into(), "Rent".into(), "Transport".into()],
            amounts: vec![320_000.0, 450_000.0, 90_000.0],
            colors: vec!["#667eea".into(), "#ed8936".into(), "#48bb78".into()],
            months: vec!["Aug".into(), "Sep".into(), "Oct".into()],
            spending_trend: vec![810_000.0, 905_000.0, 860_000.0],
            budget_amounts: vec![300_000.0, 450_000.0, 120_000.0],
        }),
    }
}
