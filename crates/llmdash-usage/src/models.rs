//! Data models for usage extraction and aggregation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel accepted in place of a model name to mean "every model".
pub const ALL_MODELS: &str = "all";

/// A raw row from the `responses` table.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Row identifier as text (integer or ULID)
    pub id: String,

    /// Model name as logged
    pub model: String,

    /// Timestamp text, format not guaranteed
    pub timestamp_raw: String,

    /// Serialized response object
    pub response_json: String,
}

/// Token and cost usage pulled out of one usage-bearing [`LogRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageRecord {
    /// Source row identifier
    pub id: String,

    /// Model name
    pub model: String,

    /// Normalized calendar date
    pub date: NaiveDate,

    /// Timestamp as stored, kept for display
    pub timestamp_raw: String,

    /// Prompt (input) tokens
    pub prompt_tokens: u64,

    /// Completion (output) tokens
    pub completion_tokens: u64,

    /// Total tokens as reported by the provider
    pub total_tokens: u64,

    /// Cost in USD
    pub cost: f64,
}

impl UsageRecord {
    /// Create a record with zero usage.
    pub fn new(id: impl Into<String>, model: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            date,
            timestamp_raw: date.format("%Y-%m-%d").to_string(),
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            cost: 0.0,
        }
    }

    /// Set token counts.
    pub fn with_tokens(mut self, prompt: u64, completion: u64, total: u64) -> Self {
        self.prompt_tokens = prompt;
        self.completion_tokens = completion;
        self.total_tokens = total;
        self
    }

    /// Set cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Set the raw timestamp.
    pub fn with_timestamp(mut self, raw: impl Into<String>) -> Self {
        self.timestamp_raw = raw.into();
        self
    }
}

/// Usage aggregated by model.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelSummary {
    pub model: String,
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub avg_cost_per_request: f64,
    pub cost_per_1k_tokens: f64,
}

/// Usage aggregated by calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateSummary {
    pub date: NaiveDate,
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub avg_cost_per_request: f64,
    pub cost_per_1k_tokens: f64,
}

/// Totals across every record in a report.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OverallStats {
    pub total_requests: u64,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub avg_cost_per_request: f64,
}

/// Aggregated view of a set of usage records.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UsageReport {
    /// One row per model, ordered by model name
    pub model_data: Vec<ModelSummary>,

    /// One row per date, ascending
    pub date_data: Vec<DateSummary>,

    /// Totals
    pub overall_stats: OverallStats,
}

/// A high-cost record with a display timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopCostRecord {
    pub id: String,
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub cost: f64,

    /// `YYYY-MM-DD HH:MM:SS` when the stored timestamp parses, otherwise as stored
    pub datetime: String,
}

/// First and last usage dates available in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateBounds {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,

    /// Raw timestamp behind `min_date`, absent when the fallback window was used
    pub raw_min_date: Option<String>,

    /// Raw timestamp behind `max_date`, absent when the fallback window was used
    pub raw_max_date: Option<String>,
}

/// Which models a query covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelFilter {
    /// Every model
    #[default]
    All,
    /// Only rows whose model matches exactly
    Exact(String),
}

impl ModelFilter {
    /// Build a filter from an optional query parameter.
    ///
    /// Absent, blank and the `all` sentinel all mean [`ModelFilter::All`].
    /// Any other value is kept verbatim for exact matching.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            None => ModelFilter::All,
            Some(model) if matches!(model.trim(), "" | ALL_MODELS) => ModelFilter::All,
            Some(model) => ModelFilter::Exact(model.to_string()),
        }
    }

    /// Model name when filtering.
    pub fn as_model(&self) -> Option<&str> {
        match self {
            ModelFilter::All => None,
            ModelFilter::Exact(model) => Some(model),
        }
    }

    /// Check whether a model passes the filter.
    pub fn matches(&self, model: &str) -> bool {
        match self {
            ModelFilter::All => true,
            ModelFilter::Exact(wanted) => wanted == model,
        }
    }
}

/// Date range and model selection for a usage query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageFilter {
    /// First date included
    pub start: NaiveDate,

    /// Last date included
    pub end: NaiveDate,

    pub model: ModelFilter,
}

impl UsageFilter {
    /// Create a filter covering every model.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            model: ModelFilter::All,
        }
    }

    /// Restrict to a model.
    pub fn with_model(mut self, model: ModelFilter) -> Self {
        self.model = model;
        self
    }

    /// Check whether a date falls inside the range (inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
