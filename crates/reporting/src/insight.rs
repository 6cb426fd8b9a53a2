//! Insight selector: "best of" facts picked from aggregate tables.

use crate::aggregate::{aggregate_by, AggregateTable, Column, MetricSpec};
use crate::filter::FilteredView;
use marketing_core::{DashboardError, DashboardResult, Dimension, Field, GroupKey};
use serde::Serialize;
use tracing::warn;

/// Key of the row with the largest value in `column`.
///
/// Ties go to the row that comes first in the table's current order, so the
/// result only depends on the table's contents. NaN never wins over a number.
pub fn best_key<'t>(table: &'t AggregateTable, column: &Column) -> DashboardResult<&'t GroupKey> {
    let index = table.column_index(column)?;
    let mut best: Option<(&GroupKey, f64)> = None;
    for row in table.rows() {
        let value = row.values[index];
        let better = match best {
            None => true,
            Some((_, current)) => value > current || (current.is_nan() && !value.is_nan()),
        };
        if better {
            best = Some((&row.key, value));
        }
    }
    best.map(|(key, _)| key)
        .ok_or_else(|| DashboardError::EmptyTable {
            dimension: table.dimension().to_string(),
        })
}

/// The three headline facts of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    /// Campaign with the highest total revenue.
    pub best_campaign: GroupKey,
    /// Channel with the highest mean ROI.
    pub best_channel: GroupKey,
    /// Segment with the most conversions.
    pub best_segment: GroupKey,
}

impl Insights {
    /// Fails with [`DashboardError::EmptyTable`] when `view` is empty.
    pub fn compute(view: &FilteredView<'_>) -> DashboardResult<Self> {
        let pick = |dimension: Dimension, metric: MetricSpec| -> DashboardResult<GroupKey> {
            let table = aggregate_by(view, dimension, &[metric]);
            best_key(&table, &metric.into()).cloned()
        };

        let insights = Self {
            best_campaign: pick(Dimension::Campaign, MetricSpec::sum(Field::Revenue))?,
            best_channel: pick(Dimension::Channel, MetricSpec::mean(Field::ReturnOnInvestment))?,
            best_segment: pick(Dimension::Segment, MetricSpec::sum(Field::Conversions))?,
        };
        Ok(insights)
    }
}

/// Insight area of the dashboard: either the facts or an explicit no-data
/// state for a filter that selects nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsightPanel {
    Available(Insights),
    NoData { reason: String },
}

impl InsightPanel {
    pub fn from_view(view: &FilteredView<'_>) -> DashboardResult<Self> {
        match Insights::compute(view) {
            Ok(insights) => Ok(Self::Available(insights)),
            Err(e) if e.is_empty_table() => {
                warn!(error = %e, "Insights unavailable for current filter");
                Ok(Self::NoData {
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn insights(&self) -> Option<&Insights> {
        match self {
            Self::Available(insights) => Some(insights),
            Self::NoData { .. } => None,
        }
    }
}
