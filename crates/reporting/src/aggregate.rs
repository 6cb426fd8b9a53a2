//! Aggregator: grouped summary tables and whole-view rollups over a
//! [`FilteredView`].

use crate::filter::FilteredView;
use chrono::NaiveDate;
use marketing_core::{DashboardError, DashboardResult, Dimension, Field, GroupKey, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ─── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    Sum,
    Mean,
}

impl Reduction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
        }
    }
}

/// One reduced column of an [`AggregateTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricSpec {
    pub field: Field,
    pub reduction: Reduction,
}

impl MetricSpec {
    pub fn sum(field: Field) -> Self {
        Self {
            field,
            reduction: Reduction::Sum,
        }
    }

    pub fn mean(field: Field) -> Self {
        Self {
            field,
            reduction: Reduction::Mean,
        }
    }

    /// `<field>_<reduction>`, e.g. `revenue_sum`.
    pub fn column_name(&self) -> String {
        format!("{}_{}", self.field.as_str(), self.reduction.as_str())
    }
}

impl fmt::Display for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.reduction.as_str())
    }
}

/// Parses `field:reduction` (`revenue:sum`, `roi:mean`). A bare field name
/// means `sum`.
impl FromStr for MetricSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, reduction) = s.split_once(':').unwrap_or((s, "sum"));
        let field = field.parse::<Field>()?;
        match reduction.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::sum(field)),
            "mean" | "avg" | "average" => Ok(Self::mean(field)),
            other => Err(format!("unknown reduction `{other}`")),
        }
    }
}

/// A column computed from two already-aggregated columns of the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub name: String,
    pub minuend: MetricSpec,
    pub subtrahend: MetricSpec,
}

impl DerivedMetric {
    /// `revenue_sum - cost_sum`.
    pub fn profit() -> Self {
        Self {
            name: "profit".into(),
            minuend: MetricSpec::sum(Field::Revenue),
            subtrahend: MetricSpec::sum(Field::Cost),
        }
    }
}

/// Reference to a column of an [`AggregateTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Metric(MetricSpec),
    Derived(String),
}

impl Column {
    pub fn name(&self) -> String {
        match self {
            Self::Metric(metric) => metric.column_name(),
            Self::Derived(name) => name.clone(),
        }
    }
}

impl From<MetricSpec> for Column {
    fn from(metric: MetricSpec) -> Self {
        Self::Metric(metric)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    /// Number of records in the group, always at least one.
    pub count: usize,
    /// Metric columns in request order, then derived columns.
    pub values: Vec<f64>,
}

/// Grouped summary statistics. Rows are in ascending key order, which is
/// chronological for [`Dimension::Date`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    dimension: Dimension,
    metrics: Vec<MetricSpec>,
    derived: Vec<DerivedMetric>,
    rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn metrics(&self) -> &[MetricSpec] {
        &self.metrics
    }

    pub fn derived(&self) -> &[DerivedMetric] {
        &self.derived
    }

    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.rows.iter().map(|r| &r.key)
    }

    /// Column names in value order.
    pub fn columns(&self) -> Vec<String> {
        self.metrics
            .iter()
            .map(MetricSpec::column_name)
            .chain(self.derived.iter().map(|d| d.name.clone()))
            .collect()
    }

    /// Position of `column` within each row's `values`.
    pub fn column_index(&self, column: &Column) -> DashboardResult<usize> {
        let found = match column {
            Column::Metric(metric) => self.metrics.iter().position(|m| m == metric),
            Column::Derived(name) => self
                .derived
                .iter()
                .position(|d| &d.name == name)
                .map(|i| self.metrics.len() + i),
        };
        found.ok_or_else(|| DashboardError::UnknownColumn {
            column: column.name(),
        })
    }

    pub fn get(&self, key: &GroupKey) -> Option<&AggregateRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Value of `column` for the group `key`, if both exist.
    pub fn value(&self, key: &GroupKey, column: &Column) -> Option<f64> {
        let index = self.column_index(column).ok()?;
        self.get(key).map(|row| row.values[index])
    }

    /// Append a derived column computed from each row's existing values.
    pub fn derive(mut self, derived: DerivedMetric) -> DashboardResult<Self> {
        let minuend = self.column_index(&Column::Metric(derived.minuend))?;
        let subtrahend = self.column_index(&Column::Metric(derived.subtrahend))?;
        for row in &mut self.rows {
            let value = row.values[minuend] - row.values[subtrahend];
            row.values.push(value);
        }
        self.derived.push(derived);
        Ok(self)
    }

    /// Default display order: descending by `column`. Ties keep their
    /// natural (key) order; NaN sorts first.
    pub fn sorted_desc(mut self, column: &Column) -> DashboardResult<Self> {
        let index = self.column_index(column)?;
        self.rows
            .sort_by(|a, b| b.values[index].total_cmp(&a.values[index]));
        Ok(self)
    }
}

// ─── Grouping ───────────────────────────────────────────────────────────────

/// Borrowed group key, so grouping allocates once per group, not per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum KeyRef<'a> {
    Label(&'a str),
    Date(NaiveDate),
}

impl<'a> KeyRef<'a> {
    fn of(record: &'a Record, dimension: Dimension) -> Self {
        match record.label(dimension) {
            Some(label) => Self::Label(label),
            None => Self::Date(record.date),
        }
    }

    fn to_owned_key(self) -> GroupKey {
        match self {
            Self::Label(label) => GroupKey::Label(label.to_string()),
            Self::Date(date) => GroupKey::Date(date),
        }
    }
}

struct Accumulator {
    count: usize,
    sums: Vec<f64>,
}

impl Accumulator {
    fn new(width: usize) -> Self {
        Self {
            count: 0,
            sums: vec![0.0; width],
        }
    }

    fn add(&mut self, record: &Record, metrics: &[MetricSpec]) {
        self.count += 1;
        for (sum, metric) in self.sums.iter_mut().zip(metrics) {
            *sum += record.value(metric.field);
        }
    }

    fn finish(self, key: GroupKey, metrics: &[MetricSpec]) -> AggregateRow {
        let count = self.count;
        let values = self
            .sums
            .into_iter()
            .zip(metrics)
            .map(|(sum, metric)| match metric.reduction {
                Reduction::Sum => sum,
                Reduction::Mean => sum / count as f64,
            })
            .collect();
        AggregateRow { key, count, values }
    }
}

/// Group `view` by `dimension` and reduce each requested metric per group.
/// Only values present in the view become keys.
pub fn aggregate_by(
    view: &FilteredView<'_>,
    dimension: Dimension,
    metrics: &[MetricSpec],
) -> AggregateTable {
    let mut groups: BTreeMap<KeyRef<'_>, Accumulator> = BTreeMap::new();
    for record in view.iter() {
        groups
            .entry(KeyRef::of(record, dimension))
            .or_insert_with(|| Accumulator::new(metrics.len()))
            .add(record, metrics);
    }

    let rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key.to_owned_key(), metrics))
        .collect();

    debug!(
        dimension = %dimension,
        metrics = metrics.len(),
        groups = rows.len(),
        records = view.len(),
        "Aggregated view"
    );

    AggregateTable {
        dimension,
        metrics: metrics.to_vec(),
        derived: Vec::new(),
        rows,
    }
}

// ─── Rollups ────────────────────────────────────────────────────────────────

/// Sum of `field` over the whole view; 0 when the view is empty.
pub fn total(view: &FilteredView<'_>, field: Field) -> f64 {
    view.iter().map(|r| r.value(field)).sum()
}

/// Mean of `field` over the whole view; `None` when the view is empty.
pub fn average(view: &FilteredView<'_>, field: Field) -> Option<f64> {
    if view.is_empty() {
        return None;
    }
    Some(total(view, field) / view.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter, FilterSpec};
    use crate::store::Dataset;

    fn record(
        campaign: &str,
        channel: &str,
        region: &str,
        day: u32,
        revenue: f64,
        cost: f64,
        roi: f64,
    ) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            campaign: campaign.into(),
            channel: channel.into(),
            segment: "X".into(),
            region: region.into(),
            revenue,
            cost,
            conversions: 2,
            click_through_rate: 3.0,
            return_on_investment: roi,
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(
            "test",
            vec![
                record("B", "Email", "North", 2, 100.0, 40.0, 150.0),
                record("A", "Social", "South", 1, 200.0, 50.0, 300.0),
                record("B", "Social", "North", 1, 50.0, 80.0, -37.5),
                record("C", "Email", "East", 3, 10.0, 5.0, 100.0),
            ],
        )
    }

    #[test]
    fn test_sum_and_mean_per_group() {
        let data = dataset();
        let view = filter(&data, &FilterSpec::select_all(&data));
        let table = aggregate_by(
            &view,
            Dimension::Campaign,
            &[
                MetricSpec::sum(Field::Revenue),
                MetricSpec::mean(Field::ReturnOnInvestment),
            ],
        );
        assert_eq!(table.len(), 3);
        let b = table.get(&GroupKey::from("B")).unwrap();
        assert_eq!(b.count, 2);
        assert_eq!(b.values, vec![150.0, 56.25]);
        assert_eq!(
            table.columns(),
            vec!["revenue_sum", "return_on_investment_mean"]
        );
    }

    #[test]
    fn test_rows_in_key_order() {
        let data = dataset();
        let view = filter(&data, &FilterSpec::select_all(&data));
        let by_campaign = aggregate_by(&view, Dimension::Campaign, &[]);
        let keys: Vec<String> = by_campaign.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);

        let by_date = aggregate_by(&view, Dimension::Date, &[MetricSpec::sum(Field::Revenue)]);
        let keys: Vec<String> = by_date.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(by_date.rows()[0].values, vec![250.0]);
    }

    #[test]
    fn test_no_phantom_keys_after_filter() {
        let data = dataset();
        let view = filter(&data, &FilterSpec::new(["B"], ["Email", "Social"]));
        let table = aggregate_by(&view, Dimension::Region, &[MetricSpec::sum(Field::Cost)]);
        let keys: Vec<String> = table.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["North"]);
        assert_eq!(table.rows()[0].values, vec![120.0]);
    }

    #[test]
    fn test_empty_view_yields_empty_table() {
        let data = dataset();
        let view = filter(&data, &FilterSpec::new(["A"], ["Email"]));
        let table = aggregate_by(&view, Dimension::Channel, &[MetricSpec::sum(Field::Revenue)]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_profit_derivation() {
        let data = dataset();
        let view = filter(&data, &FilterSpec::select_all(&data));
        let table = aggregate_by(
            &view,
            Dimension::Region,
            &[MetricSpec::sum(Field::Cost), MetricSpec::sum(Field::Revenue)],
        )
        .derive(DerivedMetric::profit())
        .unwrap();
        assert_eq!(table.columns(), vec!["cost_sum", "revenue_sum", "profit"]);
        let profit = Column::Derived("profit".into());
        assert_eq!(table.value(&GroupKey::from("North"), &profit), Some(30.0));
        assert_eq!(table.value(&GroupKey::from("South"), &profit), Some(150.0));
    }

    #[test]
    fn test_derivation_requires_inputs() {
        let data = dataset();
        let view = filter(&data, &FilterSpec::select_all(&data));
        let err = aggregate_by(&view, Dimension::Region, &[MetricSpec::sum(Field::Revenue)])
            .derive(DerivedMetric::profit())
            .unwrap_err();
        assert!(matches!(err, DashboardError::UnknownColumn { column } if column == "cost_sum"));
    }

    #[test]
    fn test_sorted_desc_is_stable() {
        let data = Dataset::new(
            "ties",
            vec![
                record("A", "Email", "North", 1, 10.0, 0.0, 0.0),
                record("B", "Email", "North", 1, 30.0, 0.0, 0.0),
                record("C", "Email", "North", 1, 10.0, 0.0, 0.0),
            ],
        );
        let view = filter(&data, &FilterSpec::select_all(&data));
        let revenue = MetricSpec::sum(Field::Revenue);
        let table = aggregate_by(&view, Dimension::Campaign, &[revenue])
            .sorted_desc(&revenue.into())
            .unwrap();
        let keys: Vec<String> = table.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_rollups() {
        let data = dataset();
        let view = filter(&data, &FilterSpec::select_all(&data));
        assert_eq!(total(&view, Field::Revenue), 360.0);
        assert_eq!(total(&view, Field::Conversions), 8.0);
        assert_eq!(average(&view, Field::ClickThroughRate), Some(3.0));

        let empty = filter(&data, &FilterSpec::default());
        assert_eq!(total(&empty, Field::Revenue), 0.0);
        assert_eq!(average(&empty, Field::ReturnOnInvestment), None);
    }

    #[test]
    fn test_metric_spec_parsing() {
        assert_eq!(
            "revenue:sum".parse::<MetricSpec>().unwrap(),
            MetricSpec::sum(Field::Revenue)
        );
        assert_eq!(
            "roi:mean".parse::<MetricSpec>().unwrap(),
            MetricSpec::mean(Field::ReturnOnInvestment)
        );
        assert_eq!(
            "cost".parse::<MetricSpec>().unwrap(),
            MetricSpec::sum(Field::Cost)
        );
        assert!("revenue:max".parse::<MetricSpec>().is_err());
    }
}
