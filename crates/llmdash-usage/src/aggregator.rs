//! In-memory aggregation of usage records.
//!
//! Records are grouped by model and by date with the same reduction; derived
//! per-unit costs are zero whenever their denominator is zero.
//!
//! ## Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use llmdash_usage::{UsageRecord, aggregator};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let records = vec![
//!     UsageRecord::new("1", "gpt-4", day).with_tokens(60, 40, 100).with_cost(1.5),
//!     UsageRecord::new("2", "gpt-4", day).with_tokens(120, 80, 200).with_cost(2.5),
//! ];
//!
//! let report = aggregator::aggregate(&records);
//! assert_eq!(report.model_data[0].requests, 2);
//! assert_eq!(report.overall_stats.total_tokens, 300);
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DateSummary, ModelSummary, OverallStats, UsageRecord, UsageReport};

/// Running sums for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Totals {
    requests: u64,
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
    cost: f64,
}

impl Totals {
    fn add(&mut self, record: &UsageRecord) {
        self.requests += 1;
        self.prompt_tokens += record.prompt_tokens;
        self.completion_tokens += record.completion_tokens;
        self.total_tokens += record.total_tokens;
        self.cost += record.cost;
    }

    fn avg_cost_per_request(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.cost / self.requests as f64
        }
    }

    fn cost_per_1k_tokens(&self) -> f64 {
        if self.total_tokens == 0 {
            0.0
        } else {
            self.cost / self.total_tokens as f64 * 1000.0
        }
    }
}

fn group_by<K, F>(records: &[UsageRecord], key: F) -> BTreeMap<K, Totals>
where
    K: Ord,
    F: Fn(&UsageRecord) -> K,
{
    let mut groups: BTreeMap<K, Totals> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().add(record);
    }
    groups
}

/// Aggregate records into model, date and overall views.
pub fn aggregate(records: &[UsageRecord]) -> UsageReport {
    UsageReport {
        model_data: summarize_by_model(records),
        date_data: summarize_by_date(records),
        overall_stats: overall_stats(records),
    }
}

/// One summary per model, ordered by model name.
pub fn summarize_by_model(records: &[UsageRecord]) -> Vec<ModelSummary> {
    group_by(records, |r| r.model.clone())
        .into_iter()
        .map(|(model, t)| ModelSummary {
            model,
            requests: t.requests,
            prompt_tokens: t.prompt_tokens,
            completion_tokens: t.completion_tokens,
            total_tokens: t.total_tokens,
            total_cost: t.cost,
            avg_cost_per_request: t.avg_cost_per_request(),
            cost_per_1k_tokens: t.cost_per_1k_tokens(),
        })
        .collect()
}

/// One summary per date, ascending.
pub fn summarize_by_date(records: &[UsageRecord]) -> Vec<DateSummary> {
    group_by::<NaiveDate, _>(records, |r| r.date)
        .into_iter()
        .map(|(date, t)| DateSummary {
            date,
            requests: t.requests,
            prompt_tokens: t.prompt_tokens,
            completion_tokens: t.completion_tokens,
            total_tokens: t.total_tokens,
            total_cost: t.cost,
            avg_cost_per_request: t.avg_cost_per_request(),
            cost_per_1k_tokens: t.cost_per_1k_tokens(),
        })
        .collect()
}

/// Totals across every record.
pub fn overall_stats(records: &[UsageRecord]) -> OverallStats {
    let mut totals = Totals::default();
    for record in records {
        totals.add(record);
    }

    OverallStats {
        total_requests: totals.requests,
        total_prompt_tokens: totals.prompt_tokens,
        total_completion_tokens: totals.completion_tokens,
        total_tokens: totals.total_tokens,
        total_cost: totals.cost,
        avg_cost_per_request: totals.avg_cost_per_request(),
    }
}

/// The `limit` most expensive records, highest cost first.
///
/// Equal costs keep their input order.
pub fn top_by_cost(records: &[UsageRecord], limit: usize) -> Vec<UsageRecord> {
    let mut sorted: Vec<&UsageRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.cost.total_cmp(&a.cost));
    sorted.into_iter().take(limit).cloned().collect()
}
