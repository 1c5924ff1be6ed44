//! Query functions behind the dashboard endpoints.

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregator;
use crate::dates::{format_display_timestamp, normalize_date};
use crate::error::Result;
use crate::extractor::{RecordExtractor, SkipCounts};
use crate::models::{DateBounds, LogRecord, TopCostRecord, UsageFilter, UsageReport};
use crate::store::{LogStore, RESPONSES_TABLE};

/// Number of raw timestamps sampled by [`UsageQuery::diagnostics`].
const DIAGNOSTIC_SAMPLES: usize = 5;

/// Characters of `response_json` kept in [`SampleRecord`].
pub const SAMPLE_JSON_CHARS: usize = 500;

/// Limits and fallbacks for queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    /// Records returned by [`UsageQuery::top_cost_records`]
    pub top_records_limit: usize,

    /// Width of the fallback window returned by [`UsageQuery::date_bounds`]
    pub fallback_window_days: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            top_records_limit: 10,
            fallback_window_days: 30,
        }
    }
}

/// Aggregated usage plus the rows that could not be read.
#[derive(Debug, Clone, Default)]
pub struct UsageSummary {
    pub report: UsageReport,
    pub skipped: SkipCounts,
}

/// Parse outcome for one sampled timestamp.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateParseCheck {
    pub original: String,
    pub parsed: Option<NaiveDate>,
    pub success: bool,
}

/// One usage-bearing row, with its JSON cut to [`SAMPLE_JSON_CHARS`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SampleRecord {
    pub id: String,
    pub model: String,
    pub datetime_utc: String,
    pub response_json: String,
}

impl From<LogRecord> for SampleRecord {
    fn from(record: LogRecord) -> Self {
        Self {
            id: record.id,
            model: record.model,
            datetime_utc: record.timestamp_raw,
            response_json: record.response_json.chars().take(SAMPLE_JSON_CHARS).collect(),
        }
    }
}

/// Store health report for troubleshooting date formats.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct Diagnostics {
    pub db_path: String,
    pub db_exists: bool,
    pub tables: Vec<String>,
    pub sample_dates: Vec<String>,
    pub date_parsing_tests: Vec<DateParseCheck>,
    pub usage_record_count: Option<i64>,
    pub raw_min_date: Option<String>,
    pub raw_max_date: Option<String>,
    pub min_date_parsed: Option<NaiveDate>,
    pub max_date_parsed: Option<NaiveDate>,
    pub sample_record: Option<SampleRecord>,
}

/// Query interface over a [`LogStore`].
#[derive(Debug, Clone)]
pub struct UsageQuery {
    store: LogStore,
    settings: QuerySettings,
}

impl UsageQuery {
    /// Create a query interface.
    pub fn new(store: LogStore, settings: QuerySettings) -> Self {
        Self { store, settings }
    }

    /// The underlying store.
    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Query settings.
    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// First and last dates with usage data.
    ///
    /// Falls back to the last `fallback_window_days` ending today when no
    /// usage-bearing row has a parseable timestamp.
    pub fn date_bounds(&self) -> Result<DateBounds> {
        self.date_bounds_at(Utc::now().date_naive())
    }

    /// [`Self::date_bounds`] with an explicit "today".
    pub fn date_bounds_at(&self, today: NaiveDate) -> Result<DateBounds> {
        let timestamps = self.store.usage_bearing_timestamps()?;

        let mut min: Option<(NaiveDate, String)> = None;
        let mut max: Option<(NaiveDate, String)> = None;
        for raw in timestamps {
            let Some(date) = normalize_date(&raw) else {
                continue;
            };
            if min.as_ref().is_none_or(|(d, _)| date < *d) {
                min = Some((date, raw.clone()));
            }
            if max.as_ref().is_none_or(|(d, _)| date > *d) {
                max = Some((date, raw));
            }
        }

        match (min, max) {
            (Some((min_date, raw_min)), Some((max_date, raw_max))) => Ok(DateBounds {
                min_date,
                max_date,
                raw_min_date: Some(raw_min),
                raw_max_date: Some(raw_max),
            }),
            _ => {
                let window = Days::new(u64::from(self.settings.fallback_window_days));
                info!(
                    days = self.settings.fallback_window_days,
                    "No parseable usage dates, using fallback window"
                );
                Ok(DateBounds {
                    min_date: today.checked_sub_days(window).unwrap_or(NaiveDate::MIN),
                    max_date: today,
                    raw_min_date: None,
                    raw_max_date: None,
                })
            }
        }
    }

    /// Distinct models with usage data, alphabetical.
    pub fn models(&self) -> Result<Vec<String>> {
        let models = self.store.usage_bearing_models()?;
        debug!(count = models.len(), "Listed models");
        Ok(models)
    }

    /// Aggregated usage for a filter.
    pub fn usage_report(&self, filter: &UsageFilter) -> Result<UsageSummary> {
        let extraction = RecordExtractor::new(&self.store).extract(filter)?;
        Ok(UsageSummary {
            report: aggregator::aggregate(&extraction.records),
            skipped: extraction.skipped,
        })
    }

    /// The most expensive records for a filter, highest cost first.
    pub fn top_cost_records(&self, filter: &UsageFilter) -> Result<Vec<TopCostRecord>> {
        let extraction = RecordExtractor::new(&self.store).extract(filter)?;
        let top = aggregator::top_by_cost(&extraction.records, self.settings.top_records_limit);

        Ok(top
            .into_iter()
            .map(|r| TopCostRecord {
                datetime: format_display_timestamp(&r.timestamp_raw),
                id: r.id,
                model: r.model,
                prompt_tokens: r.prompt_tokens,
                completion_tokens: r.completion_tokens,
                total_tokens: r.total_tokens,
                cost: r.cost,
            })
            .collect())
    }

    /// Inspect the store: tables, sample timestamps and how they parse.
    ///
    /// A missing database file is reported, not treated as an error.
    pub fn diagnostics(&self) -> Result<Diagnostics> {
        let path = self.store.path();
        let mut diagnostics = Diagnostics {
            db_path: path.display().to_string(),
            db_exists: path.exists(),
            ..Diagnostics::default()
        };

        if !diagnostics.db_exists {
            return Ok(diagnostics);
        }

        diagnostics.tables = self.store.table_names()?;
        if !diagnostics.tables.iter().any(|t| t == RESPONSES_TABLE) {
            return Ok(diagnostics);
        }

        diagnostics.sample_dates = self.store.sample_timestamps(DIAGNOSTIC_SAMPLES)?;
        diagnostics.date_parsing_tests = diagnostics
            .sample_dates
            .iter()
            .map(|raw| {
                let parsed = normalize_date(raw);
                DateParseCheck {
                    original: raw.clone(),
                    parsed,
                    success: parsed.is_some(),
                }
            })
            .collect();

        diagnostics.usage_record_count = Some(self.store.count_usage_bearing()?);

        let (raw_min, raw_max) = self.store.raw_timestamp_range()?;
        diagnostics.min_date_parsed = raw_min.as_deref().and_then(normalize_date);
        diagnostics.max_date_parsed = raw_max.as_deref().and_then(normalize_date);
        diagnostics.raw_min_date = raw_min;
        diagnostics.raw_max_date = raw_max;
        diagnostics.sample_record = self.store.first_usage_bearing()?.map(SampleRecord::from);

        Ok(diagnostics)
    }
}
