//! HTTP server exposing the training and replay pipeline.
//!
//! This module provides an HTTP server that:
//! - Trains a classifier over time windows via POST /train-model
//! - Replays a window as paced prediction events via GET /simulate
//! - Manages the active dataset via POST /upload-dataset and /validate-dates
//!
//! # Architecture
//!
//! ```text
//! Dashboard ──→ POST /train-model ──→ trainer ──→ model artifact
//!           ──→ GET  /simulate    ──→ replay  ──→ SSE event stream
//! ```

use crate::config::Config;
use crate::data::{ensure_timestamp, format_timestamp, Dataset, Value, Window, LABEL_COLUMN};
use crate::error::PipelineError;
use crate::replay::Replay;
use crate::train::{train, EvaluationReport, TrainWindows};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Rows sampled from the head of an upload when estimating the pass rate.
const PASS_RATE_SAMPLE: usize = 1000;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Pipeline configuration (paths, backend, pacing)
    pub pipeline: Config,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, pipeline: Config) -> Self {
        Self { port, pipeline }
    }
}

/// Shared server state
pub struct ServerState {
    config: Config,
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            config: config.pipeline.clone(),
        }
    }
}

/// Training request; every field is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainModelRequest {
    pub train_start: Option<String>,
    pub train_end: Option<String>,
    pub test_start: Option<String>,
    pub test_end: Option<String>,
}

/// Replay window query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulateQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadQuery {
    /// Display name recorded in the summary
    pub name: Option<String>,
}

/// The three periods a dashboard wants checked before training.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeRequest {
    pub training_start: Option<String>,
    pub training_end: Option<String>,
    pub testing_start: Option<String>,
    pub testing_end: Option<String>,
    pub simulation_start: Option<String>,
    pub simulation_end: Option<String>,
}

/// Summary returned after a dataset upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub file_name: String,
    pub total_records: usize,
    pub total_columns: usize,
    /// Percentage of sampled rows whose label is 0
    pub pass_rate: f64,
    pub start_date: String,
    pub end_date: String,
}

/// Outcome of a date-range validation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateValidation {
    pub is_valid: bool,
    pub message: String,
    pub training_records: usize,
    pub testing_records: usize,
    pub simulation_records: usize,
}

impl DateValidation {
    fn invalid(message: &str) -> Self {
        Self {
            is_valid: false,
            message: message.to_string(),
            training_records: 0,
            testing_records: 0,
            simulation_records: 0,
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn pipeline_error(err: PipelineError) -> HandlerError {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("{err}");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

fn missing_field(name: &str) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: format!("{name} required"),
            code: "missing_field".to_string(),
        }),
    )
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, HandlerError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing_field(name))
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /train-model
///
/// Runs a full windowed training call against the active dataset and
/// returns the evaluation report.
async fn train_model(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<TrainModelRequest>,
) -> Result<Json<EvaluationReport>, HandlerError> {
    let train_start = require(&request.train_start, "trainStart")?;
    let train_end = require(&request.train_end, "trainEnd")?;
    let test_start = require(&request.test_start, "testStart")?;
    let test_end = require(&request.test_end, "testEnd")?;

    let windows = TrainWindows {
        train: Window::parse(train_start, train_end).map_err(pipeline_error)?,
        test: Window::parse(test_start, test_end).map_err(pipeline_error)?,
    };

    let dataset = Dataset::from_csv_path(&state.config.dataset_path).map_err(pipeline_error)?;
    tracing::info!(backend = %state.config.backend, rows = dataset.len(), "training model");

    let report = train(
        &dataset,
        &windows,
        state.config.backend,
        &state.config.model_path,
    )
    .map_err(pipeline_error)?;

    tracing::info!(accuracy = report.accuracy, "training finished");
    Ok(Json(report))
}

/// GET /simulate
///
/// Replays the requested window as server-sent events, one prediction per
/// matched row. The stream is driven by the client pulling, so a dropped
/// connection stops it.
async fn simulate(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<SimulateQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, HandlerError> {
    let start = require(&query.start, "start")?;
    let end = require(&query.end, "end")?;
    let window = Window::parse(start, end).map_err(pipeline_error)?;

    let replay = Replay::prepare(
        &state.config.dataset_path,
        &state.config.model_path,
        &window,
        state.config.pacing,
    )
    .map_err(pipeline_error)?;
    tracing::info!(events = replay.len(), "starting replay stream");

    let stream = replay.into_stream().map(|event| {
        let sse = Event::default().json_data(&event).unwrap_or_else(|e| {
            tracing::warn!("failed to encode event: {e}");
            Event::default().data("{}")
        });
        Ok::<_, Infallible>(sse)
    });
    Ok(Sse::new(stream))
}

/// POST /upload-dataset
///
/// Accepts CSV text as the request body, persists it as the active dataset
/// (materializing the timestamp column when absent), and returns a summary.
async fn upload_dataset(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<UploadQuery>,
    body: String,
) -> Result<Json<DatasetSummary>, HandlerError> {
    let parsed = Dataset::from_csv_str(&body).map_err(pipeline_error)?;
    let timed = ensure_timestamp(parsed).map_err(pipeline_error)?;

    if let Some(parent) = state.config.dataset_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| pipeline_error(PipelineError::Io(e.to_string())))?;
    }
    let csv_out = timed.data.to_csv_string().map_err(pipeline_error)?;
    std::fs::write(&state.config.dataset_path, csv_out)
        .map_err(|e| pipeline_error(PipelineError::Io(e.to_string())))?;

    let start_date = timed.timestamps.iter().min().map(format_timestamp);
    let end_date = timed.timestamps.iter().max().map(format_timestamp);
    let summary = DatasetSummary {
        file_name: query.name.unwrap_or_else(|| "dataset.csv".to_string()),
        total_records: timed.len(),
        total_columns: timed.data.columns.len(),
        pass_rate: pass_rate(&timed.data),
        start_date: start_date.unwrap_or_default(),
        end_date: end_date.unwrap_or_default(),
    };
    tracing::info!(records = summary.total_records, "dataset stored");
    Ok(Json(summary))
}

/// Percentage of sampled rows whose label reads 0.
fn pass_rate(data: &Dataset) -> f64 {
    let idx = match data.column_index(LABEL_COLUMN) {
        Some(idx) => idx,
        None => return 0.0,
    };
    let mut sampled = 0usize;
    let mut passing = 0usize;
    for row in data.rows.iter().take(PASS_RATE_SAMPLE) {
        sampled += 1;
        if let Some(Value::Number(n)) = row.get(idx) {
            if *n == 0.0 {
                passing += 1;
            }
        }
    }
    if sampled == 0 {
        0.0
    } else {
        passing as f64 * 100.0 / sampled as f64
    }
}

/// POST /validate-dates
///
/// Checks that the three periods are individually ordered, do not overlap,
/// and each match at least one row of the active dataset.
async fn validate_dates(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DateRangeRequest>,
) -> Result<Json<DateValidation>, HandlerError> {
    let training = Window::parse(
        require(&request.training_start, "trainingStart")?,
        require(&request.training_end, "trainingEnd")?,
    )
    .map_err(pipeline_error)?;
    let testing = Window::parse(
        require(&request.testing_start, "testingStart")?,
        require(&request.testing_end, "testingEnd")?,
    )
    .map_err(pipeline_error)?;
    let simulation = Window::parse(
        require(&request.simulation_start, "simulationStart")?,
        require(&request.simulation_end, "simulationEnd")?,
    )
    .map_err(pipeline_error)?;

    if !training.is_ordered() || !testing.is_ordered() || !simulation.is_ordered() {
        return Ok(Json(DateValidation::invalid(
            "Each period must have a start date before end date",
        )));
    }
    if training.end > testing.start {
        return Ok(Json(DateValidation::invalid(
            "Training period must end before testing period starts",
        )));
    }
    if testing.end > simulation.start {
        return Ok(Json(DateValidation::invalid(
            "Testing period must end before simulation period starts",
        )));
    }

    let dataset = Dataset::from_csv_path(&state.config.dataset_path).map_err(pipeline_error)?;
    let timed = ensure_timestamp(dataset).map_err(pipeline_error)?;

    let training_records = timed.count_in(&training);
    let testing_records = timed.count_in(&testing);
    let simulation_records = timed.count_in(&simulation);
    if training_records == 0 || testing_records == 0 || simulation_records == 0 {
        return Ok(Json(DateValidation::invalid(
            "One or more periods contain no data",
        )));
    }

    Ok(Json(DateValidation {
        is_valid: true,
        message: "Date ranges validated successfully".to_string(),
        training_records,
        testing_records,
        simulation_records,
    }))
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config));

    let app = Router::new()
        .route("/health", get(health))
        .route("/train-model", post(train_model))
        .route("/simulate", get(simulate))
        .route("/upload-dataset", post(upload_dataset))
        .route("/validate-dates", post(validate_dates))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Sensor replay server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_missing_and_blank() {
        assert!(require(&None, "trainStart").is_err());
        assert!(require(&Some("  ".to_string()), "trainStart").is_err());
        assert_eq!(
            require(&Some("2021-01-01".to_string()), "trainStart").unwrap(),
            "2021-01-01"
        );
    }

    #[test]
    fn test_pass_rate_counts_zero_labels() {
        let data = Dataset::from_csv_str("Response,x\n0,1\n0,2\n1,3\n,4\n").unwrap();
        // Four sampled rows, two of them labelled 0.
        assert_eq!(pass_rate(&data), 50.0);
    }

    #[test]
    fn test_pass_rate_without_label_column() {
        let data = Dataset::from_csv_str("a\n1\n").unwrap();
        assert_eq!(pass_rate(&data), 0.0);
    }

    #[test]
    fn test_error_mapping_distinguishes_client_and_server() {
        let (status, _) = pipeline_error(PipelineError::MissingLabel);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = pipeline_error(PipelineError::Io("disk".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
