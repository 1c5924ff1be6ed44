//! Usage extraction from logged responses.
//!
//! Usage-bearing responses carry an OpenAI-style `usage` object:
//!
//! ```json
//! {"object": "chat.completion.chunk",
//!  "usage": {"prompt_tokens": 12, "completion_tokens": 40, "total_tokens": 52, "cost": 0.0021}}
//! ```
//!
//! Rows whose timestamp or JSON cannot be read are skipped and counted; they
//! never abort a batch.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::dates::normalize_date;
use crate::error::Result;
use crate::models::{LogRecord, UsageFilter, UsageRecord};
use crate::store::LogStore;

/// Why rows were left out of an extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    /// Timestamp matched no date strategy
    pub invalid_date: u64,

    /// Response body was not valid JSON
    pub invalid_json: u64,
}

impl SkipCounts {
    /// Total number of skipped rows.
    pub fn total(&self) -> u64 {
        self.invalid_date + self.invalid_json
    }
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Records inside the requested range, in store order
    pub records: Vec<UsageRecord>,

    /// Rows dropped because they could not be read
    pub skipped: SkipCounts,
}

/// Token and cost fields of a `usage` object.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageFields {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub cost: f64,
}

/// Pulls usage records for a filter out of a [`LogStore`].
pub struct RecordExtractor<'a> {
    store: &'a LogStore,
}

impl<'a> RecordExtractor<'a> {
    /// Create an extractor over a store.
    pub fn new(store: &'a LogStore) -> Self {
        Self { store }
    }

    /// Query the store once and extract every matching record.
    pub fn extract(&self, filter: &UsageFilter) -> Result<Extraction> {
        let rows = self.store.usage_bearing_records(filter.model.as_model())?;
        let fetched = rows.len();
        let extraction = extract_records(rows, filter, self.store.marker());

        if extraction.skipped.total() > 0 {
            warn!(
                invalid_date = extraction.skipped.invalid_date,
                invalid_json = extraction.skipped.invalid_json,
                "Skipped unreadable log records"
            );
        }
        info!(
            fetched,
            kept = extraction.records.len(),
            start = %filter.start,
            end = %filter.end,
            "Extracted usage records"
        );

        Ok(extraction)
    }
}

/// Extract usage records from rows already read from the store.
pub fn extract_records<I>(rows: I, filter: &UsageFilter, marker: &str) -> Extraction
where
    I: IntoIterator<Item = LogRecord>,
{
    let mut extraction = Extraction::default();

    for row in rows {
        if !row.response_json.contains(marker) || !filter.model.matches(&row.model) {
            continue;
        }

        let Some(date) = normalize_date(&row.timestamp_raw) else {
            debug!(id = %row.id, raw = %row.timestamp_raw, "Skipping record with unparseable date");
            extraction.skipped.invalid_date += 1;
            continue;
        };

        if !filter.contains(date) {
            continue;
        }

        let value: Value = match serde_json::from_str(&row.response_json) {
            Ok(value) => value,
            Err(e) => {
                debug!(id = %row.id, error = %e, "Skipping record with invalid JSON");
                extraction.skipped.invalid_json += 1;
                continue;
            }
        };

        let usage = parse_usage(&value);
        extraction.records.push(UsageRecord {
            id: row.id,
            model: row.model,
            date,
            timestamp_raw: row.timestamp_raw,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            cost: usage.cost,
        });
    }

    extraction
}

/// Read the top-level `usage` object of a response.
///
/// Missing fields, a missing or non-object `usage`, negative and non-numeric
/// values all read as zero.
pub fn parse_usage(response: &Value) -> UsageFields {
    let Some(usage) = response.get("usage").filter(|u| u.is_object()) else {
        return UsageFields::default();
    };

    UsageFields {
        prompt_tokens: token_count(usage.get("prompt_tokens")),
        completion_tokens: token_count(usage.get("completion_tokens")),
        total_tokens: token_count(usage.get("total_tokens")),
        cost: usage
            .get("cost")
            .and_then(|v| v.as_f64())
            .filter(|c| c.is_finite() && *c >= 0.0)
            .unwrap_or(0.0),
    }
}

fn token_count(value: Option<&Value>) -> u64 {
    let Some(value) = value else {
        return 0;
    };
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
        .unwrap_or(0)
}
