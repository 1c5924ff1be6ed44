//! Request and response types for the dashboard API.

use llmdash_usage::{DateBounds, Diagnostics, TopCostRecord, UsageReport};
use serde::{Deserialize, Serialize};

/// Query string accepted by the usage and top-cost endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct UsageParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub model: Option<String>,
}

/// `GET /date-bounds`
#[derive(Debug, Serialize)]
pub struct DateBoundsResponse {
    #[serde(flatten)]
    pub bounds: DateBounds,
    pub success: bool,
}

/// `GET /models`
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub success: bool,
}

/// `GET /usage`
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    #[serde(flatten)]
    pub report: UsageReport,

    /// Rows left out because their timestamp or JSON could not be read
    pub skipped_records: u64,
    pub success: bool,
}

/// `GET /top-cost-records`
#[derive(Debug, Serialize)]
pub struct TopCostResponse {
    pub records: Vec<TopCostRecord>,
    pub success: bool,
}

/// `GET /debug-info`
#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    pub success: bool,
}

/// `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub success: bool,
}

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            success: false,
        }
    }
}
