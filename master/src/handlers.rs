use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::{
    CoordError, JobView, ReportAck, SubmitRequest, SubmitResponse, TaskPollResponse, WorkerReport,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;
use crate::{aggregator, orchestrator};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/jobs", post(submit_job).get(list_jobs))
        .route("/jobs/:id", get(job_status))
        .route("/jobs/:id/cancel", post(cancel_job))
        .route("/tasks/next", post(next_task))
        .route("/reports", post(ingest_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Mapea la taxonomía de errores a códigos HTTP.
fn error_response(e: &CoordError) -> (StatusCode, Json<Value>) {
    let status = match e {
        CoordError::NotFound(_) => StatusCode::NOT_FOUND,
        CoordError::InvalidDataset(_)
        | CoordError::InvalidArtifact(_)
        | CoordError::InvalidReport(_) => StatusCode::BAD_REQUEST,
        // contención pasajera: el caller reintenta / redelivera
        CoordError::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoordError::Dispatch(_)
        | CoordError::DuplicateJob(_)
        | CoordError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Crea un job nuevo: particiona, despacha y devuelve 201 con el id
async fn submit_job(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), (StatusCode, Json<Value>)> {
    match orchestrator::submit(&state, &req.dataset_ref, req.chunk_count) {
        Ok(job_id) => Ok((StatusCode::CREATED, Json(SubmitResponse { job_id }))),
        Err(e) => {
            warn!("submit rechazado para {}: {}", req.dataset_ref, e);
            Err(error_response(&e))
        }
    }
}

// Devuelve la proyección de estado de un job
async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, (StatusCode, Json<Value>)> {
    match orchestrator::status(&state, &id) {
        Ok(view) => Ok(Json(view)),
        Err(e) => Err(error_response(&e)),
    }
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobView>> {
    Json(state.store.list_views())
}

// Cancela un job (no-op idempotente si ya es terminal)
async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, (StatusCode, Json<Value>)> {
    match orchestrator::cancel(&state, &id) {
        Ok(view) => Ok(Json(view)),
        Err(e) => Err(error_response(&e)),
    }
}

// Entrega la siguiente tarea pendiente a un worker que hace poll
async fn next_task(State(state): State<AppState>) -> Json<TaskPollResponse> {
    Json(TaskPollResponse {
        task: state.transport.poll(),
    })
}

// Reporte de un worker: una transición atómica sobre el job
async fn ingest_report(
    State(state): State<AppState>,
    Json(report): Json<WorkerReport>,
) -> Result<Json<ReportAck>, (StatusCode, Json<Value>)> {
    match aggregator::on_report(
        &state.store,
        state.transport.as_ref(),
        state.config.max_chunk_attempts,
        &report,
    ) {
        Ok(_) => Ok(Json(ReportAck { ok: true })),
        Err(e) => {
            warn!(
                "reporte {} del job {} rechazado: {}",
                report.report_id, report.job_id, e
            );
            Err(error_response(&e))
        }
    }
}
