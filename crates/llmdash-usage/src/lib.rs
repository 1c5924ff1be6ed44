//! # llmdash-usage
//!
//! Usage extraction and aggregation over the `llm` command-line tool's log
//! database.
//!
//! This crate provides:
//! - [`LogStore`] - Read-only access to the `responses` table
//! - [`RecordExtractor`] - Turn usage-bearing rows into [`UsageRecord`]s
//! - [`aggregator`] - Per-model, per-date and overall summaries
//! - [`UsageQuery`] - Query functions backing the dashboard endpoints
//!
//! ## Example
//!
//! ```no_run
//! use llmdash_usage::{LogStore, QuerySettings, UsageFilter, UsageQuery};
//!
//! fn main() -> llmdash_usage::Result<()> {
//!     let store = LogStore::new("/home/me/.config/io.datasette.llm/logs.db", "chat.completion.chunk");
//!     let query = UsageQuery::new(store, QuerySettings::default());
//!
//!     let bounds = query.date_bounds()?;
//!     let summary = query.usage_report(&UsageFilter::new(bounds.min_date, bounds.max_date))?;
//!     println!("Total cost: ${:.4}", summary.report.overall_stats.total_cost);
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod dates;
pub mod error;
pub mod extractor;
pub mod models;
pub mod query;
pub mod store;

// Re-export main types
pub use dates::{normalize_date, parse_query_date};
pub use error::{ErrorKind, Result, UsageError};
pub use extractor::{Extraction, RecordExtractor, SkipCounts};
pub use models::{
    ALL_MODELS, DateBounds, DateSummary, LogRecord, ModelFilter, ModelSummary, OverallStats,
    TopCostRecord, UsageFilter, UsageRecord, UsageReport,
};
pub use query::{
    DateParseCheck, Diagnostics, QuerySettings, SampleRecord, UsageQuery, UsageSummary,
};
pub use store::LogStore;
