//! Dashboard snapshot: every view the dashboard shows, recomputed in one
//! synchronous pass whenever the filter changes.

use crate::aggregate::{aggregate_by, average, total, AggregateTable, DerivedMetric, MetricSpec};
use crate::filter::{filter, FilterSpec, FilteredView};
use crate::insight::InsightPanel;
use crate::store::Dataset;
use chrono::{DateTime, Utc};
use marketing_core::{DashboardResult, Dimension, Field};
use serde::Serialize;
use tracing::info;

/// Headline metric cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub total_revenue: f64,
    /// `None` when the filter selects nothing.
    pub average_roi: Option<f64>,
    pub total_conversions: u64,
    /// `None` when the filter selects nothing.
    pub average_ctr: Option<f64>,
    pub record_count: usize,
}

impl HeadlineMetrics {
    pub fn from_view(view: &FilteredView<'_>) -> Self {
        Self {
            total_revenue: total(view, Field::Revenue),
            average_roi: average(view, Field::ReturnOnInvestment),
            total_conversions: view
                .iter()
                .map(|r| r.conversions)
                .fold(0u64, u64::saturating_add),
            average_ctr: average(view, Field::ClickThroughRate),
            record_count: view.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub filter: FilterSpec,
    pub headline: HeadlineMetrics,
    /// Revenue per campaign, highest first.
    pub revenue_by_campaign: AggregateTable,
    /// Mean ROI per channel, highest first.
    pub roi_by_channel: AggregateTable,
    /// Revenue, conversions and mean ROI per day, oldest first.
    pub daily_trend: AggregateTable,
    pub segment_performance: AggregateTable,
    /// Cost and revenue per region with derived profit.
    pub region_performance: AggregateTable,
    pub insights: InsightPanel,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn build(dataset: &Dataset, spec: &FilterSpec) -> DashboardResult<Self> {
        let view = filter(dataset, spec);

        let revenue = MetricSpec::sum(Field::Revenue);
        let cost = MetricSpec::sum(Field::Cost);
        let conversions = MetricSpec::sum(Field::Conversions);
        let roi = MetricSpec::mean(Field::ReturnOnInvestment);

        let revenue_by_campaign =
            aggregate_by(&view, Dimension::Campaign, &[revenue]).sorted_desc(&revenue.into())?;
        let roi_by_channel =
            aggregate_by(&view, Dimension::Channel, &[roi]).sorted_desc(&roi.into())?;
        let daily_trend = aggregate_by(&view, Dimension::Date, &[revenue, conversions, roi]);
        let segment_performance =
            aggregate_by(&view, Dimension::Segment, &[revenue, conversions, roi]);
        let region_performance = aggregate_by(&view, Dimension::Region, &[cost, revenue])
            .derive(DerivedMetric::profit())?;

        let snapshot = Self {
            filter: spec.clone(),
            headline: HeadlineMetrics::from_view(&view),
            revenue_by_campaign,
            roi_by_channel,
            daily_trend,
            segment_performance,
            region_performance,
            insights: InsightPanel::from_view(&view)?,
            generated_at: Utc::now(),
        };

        info!(
            records = snapshot.headline.record_count,
            campaigns = snapshot.revenue_by_campaign.len(),
            days = snapshot.daily_trend.len(),
            "Dashboard snapshot built"
        );
        Ok(snapshot)
    }
}
