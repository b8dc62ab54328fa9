use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showpipe_pipeline::{PipelineError, RunStage, RunStatus, StatusPoll};
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct TriggerQuery {
    pub years: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct TriggerData {
    run_id: Uuid,
    status: &'static str,
    lookback_years: u16,
    message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusQuery {
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunStatusData {
    run_id: Uuid,
    stage: RunStage,
    running: bool,
    step: String,
    progress: u8,
    error: Option<String>,
    updated_at: DateTime<Utc>,
    signature: String,
}

impl RunStatusData {
    fn new(status: RunStatus, signature: String) -> Self {
        Self {
            run_id: status.run_id,
            stage: status.stage,
            running: status.running,
            step: status.step,
            progress: status.progress,
            error: status.error,
            updated_at: status.updated_at,
            signature,
        }
    }
}

pub(super) async fn trigger_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<TriggerQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TriggerData>>), ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(req_id.clone(), e.body_text()))?;
    let ctx = match Arc::clone(&state.pipeline).start(query.years).await {
        Ok(ctx) => ctx,
        Err(PipelineError::InvalidLookback(e)) => {
            return Err(ApiError::validation(req_id, e.to_string()));
        }
        Err(e) => return Err(ApiError::internal(req_id, "failed to start pipeline", &e)),
    };

    Ok((
        StatusCode::ACCEPTED,
        ApiResponse::new(
            TriggerData {
                run_id: ctx.run_id,
                status: "accepted",
                lookback_years: ctx.lookback_years,
                message: format!("Pipeline started for {} years", ctx.lookback_years),
            },
            req_id,
        ),
    ))
}

/// Returns 304 with no body when `signature` matches the current snapshot.
pub(super) async fn get_run_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    run_id: Result<Path<Uuid>, PathRejection>,
    Query(query): Query<StatusQuery>,
) -> Result<Response, ApiError> {
    let Path(run_id) = run_id.map_err(|e| ApiError::validation(req_id.clone(), e.body_text()))?;
    let poll = state
        .pipeline
        .tracker()
        .poll(run_id, query.signature.as_deref())
        .await
        .map_err(|e| ApiError::internal(req_id.clone(), "failed to read run status", &e))?;

    match poll {
        StatusPoll::NotFound => Err(ApiError::not_found(
            req_id,
            format!("no pipeline run with id {run_id}"),
        )),
        StatusPoll::Unchanged => Ok(StatusCode::NOT_MODIFIED.into_response()),
        StatusPoll::Changed { status, signature } => {
            Ok(ApiResponse::new(RunStatusData::new(status, signature), req_id).into_response())
        }
    }
}
