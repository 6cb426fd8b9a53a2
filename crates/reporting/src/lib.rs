//! Marketing performance reporting: load a campaign dataset, filter it by
//! campaign and channel, aggregate it along time, region and segment, and pick
//! the best performers.

pub mod aggregate;
pub mod dashboard;
pub mod export;
pub mod filter;
pub mod insight;
pub mod store;

pub use aggregate::{
    aggregate_by, average, total, AggregateRow, AggregateTable, Column, DerivedMetric,
    MetricSpec, Reduction,
};
pub use dashboard::{DashboardSnapshot, HeadlineMetrics};
pub use filter::{filter, FilterSpec, FilteredView};
pub use insight::{best_key, InsightPanel, Insights};
pub use store::{Dataset, RecordStore};
