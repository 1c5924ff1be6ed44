//! Dashboard API handlers.
//!
//! Store access is blocking, so each handler moves its query onto tokio's
//! blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use llmdash_usage::{
    ErrorKind, ModelFilter, UsageError, UsageFilter, UsageQuery, parse_query_date,
};
use tracing::{debug, error, warn};

use crate::router::AppState;
use crate::types::{
    DateBoundsResponse, DiagnosticsResponse, ErrorResponse, HealthResponse, ModelsResponse,
    TopCostResponse, UsageParams, UsageResponse,
};

/// Build a [`UsageFilter`] from request parameters.
///
/// Both dates are required and must be `YYYY-MM-DD`; the start may not come
/// after the end.
pub fn parse_filter(params: &UsageParams) -> Result<UsageFilter, UsageError> {
    let start = params.start_date.as_deref().filter(|s| !s.trim().is_empty());
    let end = params.end_date.as_deref().filter(|s| !s.trim().is_empty());
    let (Some(start), Some(end)) = (start, end) else {
        return Err(UsageError::MissingDates);
    };

    let start = parse_query_date("start_date", start)?;
    let end = parse_query_date("end_date", end)?;
    if start > end {
        return Err(UsageError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    Ok(UsageFilter::new(start, end).with_model(ModelFilter::from_param(params.model.as_deref())))
}

/// Unwrap query parameters, turning a rejected query string into a client error.
pub fn query_params(
    params: Result<Query<UsageParams>, QueryRejection>,
) -> Result<UsageParams, UsageError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| UsageError::InvalidQuery {
            message: rejection.body_text(),
        })
}

/// Map a pipeline error to a status code and JSON body.
pub fn error_response(err: &UsageError) -> Response {
    let status = match err.kind() {
        ErrorKind::Client => {
            debug!(error = %err, "Rejected request");
            StatusCode::BAD_REQUEST
        }
        ErrorKind::StoreUnavailable => {
            warn!(error = %err, "Log store unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::Internal => {
            error!(error = %err, "Query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, UsageError>
where
    T: Send + 'static,
    F: FnOnce(&UsageQuery) -> Result<T, UsageError> + Send + 'static,
{
    let query = Arc::clone(&state.query);
    tokio::task::spawn_blocking(move || f(&query))
        .await
        .map_err(|e| UsageError::TaskJoin(e.to_string()))?
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        success: true,
    })
}

/// GET /date-bounds
pub async fn get_date_bounds(State(state): State<AppState>) -> Response {
    match run_blocking(&state, |q| q.date_bounds()).await {
        Ok(bounds) => Json(DateBoundsResponse {
            bounds,
            success: true,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /models
pub async fn get_models(State(state): State<AppState>) -> Response {
    match run_blocking(&state, |q| q.models()).await {
        Ok(models) => Json(ModelsResponse {
            models,
            success: true,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /usage
pub async fn get_usage(
    State(state): State<AppState>,
    params: Result<Query<UsageParams>, QueryRejection>,
) -> Response {
    let filter = match query_params(params).and_then(|params| parse_filter(&params)) {
        Ok(filter) => filter,
        Err(e) => return error_response(&e),
    };

    match run_blocking(&state, move |q| q.usage_report(&filter)).await {
        Ok(summary) => Json(UsageResponse {
            report: summary.report,
            skipped_records: summary.skipped.total(),
            success: true,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /top-cost-records
pub async fn get_top_cost_records(
    State(state): State<AppState>,
    params: Result<Query<UsageParams>, QueryRejection>,
) -> Response {
    let filter = match query_params(params).and_then(|params| parse_filter(&params)) {
        Ok(filter) => filter,
        Err(e) => return error_response(&e),
    };

    match run_blocking(&state, move |q| q.top_cost_records(&filter)).await {
        Ok(records) => Json(TopCostResponse {
            records,
            success: true,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /debug-info
pub async fn get_debug_info(State(state): State<AppState>) -> Response {
    match run_blocking(&state, |q| q.diagnostics()).await {
        Ok(diagnostics) => Json(DiagnosticsResponse {
            diagnostics,
            success: true,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}
