//! Axum application for the stocktake inventory orchestrator.
//!
//! Wires the in-memory stores, the robot client and the capture and
//! recognition stages into one `InventoryApi`, then serves the inventory
//! HTTP surface plus the robot status ingress.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use stocktake_api::{InventoryApi, RobotReportRequest, StartInventoryRequest};
use stocktake_config::StocktakeConfig;
use stocktake_core::executor::{ExecutorConfig, WorkflowExecutor};
use stocktake_core::store::{AuditLog, InventoryStore, SignalChannel};
use stocktake_robot::{HttpRobotCommander, RobotClientConfig};
use stocktake_stages::{HttpRecognition, RecognitionClientConfig, ScriptCapture};
use stocktake_stores::{InMemoryAuditLog, InMemoryInventoryStore, InProcessSignalChannel};

#[derive(Clone)]
struct AppState {
    api: InventoryApi,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressQuery {
    task_no: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailQuery {
    task_no: String,
    bin_location: String,
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

/// Build the service facade from configuration.
pub fn build_api(config: &StocktakeConfig) -> anyhow::Result<InventoryApi> {
    let store: Arc<dyn InventoryStore> = Arc::new(InMemoryInventoryStore::new());
    let signals: Arc<dyn SignalChannel> = Arc::new(InProcessSignalChannel::with_poll_interval(
        Duration::from_millis(config.workflow.poll_interval_ms),
    ));
    let audit: Arc<dyn AuditLog> = Arc::new(InMemoryAuditLog::new());

    let commander = HttpRobotCommander::new(RobotClientConfig {
        base_url: config.robot.base_url.clone(),
        prefix: config.robot.prefix.clone(),
        request_id: config.robot.request_id.clone(),
        timeout_secs: config.robot.request_timeout_secs,
    })
    .context("build robot client failed")?;

    let mut capture = ScriptCapture::new(config.capture.scripts.clone())
        .with_step_delay(Duration::from_millis(config.capture.step_delay_ms));
    if let Some(secs) = config.capture.script_timeout_secs {
        capture = capture.with_script_timeout(Duration::from_secs(secs));
    }

    let recognition = HttpRecognition::new(RecognitionClientConfig {
        base_url: config.recognition.base_url.clone(),
        timeout_secs: config.recognition.request_timeout_secs,
    })
    .context("build recognition client failed")?;

    let executor = WorkflowExecutor::with_config(
        store.clone(),
        signals.clone(),
        Arc::new(capture),
        Arc::new(recognition),
        Arc::new(commander),
        audit.clone(),
        ExecutorConfig {
            arrival_timeout: Duration::from_secs(config.workflow.arrival_timeout_secs),
        },
    );

    Ok(InventoryApi::new(executor, store, signals, audit))
}

pub async fn run_server(config: StocktakeConfig, listen: SocketAddr) -> anyhow::Result<()> {
    let api = build_api(&config)?;
    let state = AppState { api };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/inventory/start-inventory", post(start_inventory))
        .route("/api/inventory/progress", get(progress))
        .route("/api/inventory/task-detail", get(task_detail))
        .route("/api/operation/logs/recent", get(recent_operations))
        .route("/api/robot/reporter/task", post(robot_report))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .context("bind server listener failed")?;
    tracing::info!(listen = %listen, "stocktake-server listening");
    axum::serve(listener, app)
        .await
        .context("server terminated with error")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status":"ok"}))
}

async fn start_inventory(
    State(state): State<AppState>,
    Json(payload): Json<StartInventoryRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let resp = state
        .api
        .start_inventory(payload)
        .await
        .map_err(map_api_error)?;
    Ok(Json(resp))
}

async fn progress(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let view = state
        .api
        .progress(&query.task_no)
        .await
        .map_err(map_api_error)?;
    Ok(Json(view))
}

async fn task_detail(
    State(state): State<AppState>,
    Query(query): Query<DetailQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let detail = state
        .api
        .task_detail(&query.task_no, &query.bin_location)
        .await
        .map_err(map_api_error)?;
    Ok(Json(detail))
}

async fn recent_operations(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let view = state
        .api
        .recent_operations(query.limit)
        .await
        .map_err(map_api_error)?;
    Ok(Json(view))
}

async fn robot_report(
    State(state): State<AppState>,
    Json(payload): Json<RobotReportRequest>,
) -> Json<stocktake_api::RobotReportAck> {
    Json(state.api.report_robot_status(payload).await)
}

fn map_api_error(err: stocktake_api::ApiError) -> (StatusCode, Json<ErrorBody>) {
    let (status, code) = match err.code() {
        stocktake_api::ErrorCode::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        stocktake_api::ErrorCode::Conflict => (StatusCode::CONFLICT, "conflict"),
        stocktake_api::ErrorCode::InvalidArgument => (StatusCode::BAD_REQUEST, "invalid_argument"),
        stocktake_api::ErrorCode::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    (
        status,
        Json(ErrorBody {
            code: code.to_string(),
            message: err.to_string(),
        }),
    )
}
