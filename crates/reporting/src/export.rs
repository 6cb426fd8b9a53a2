//! CSV and JSON export of aggregate tables and filtered rows.

use crate::aggregate::AggregateTable;
use crate::filter::FilteredView;
use marketing_core::{DashboardError, DashboardResult};
use serde::Serialize;
use serde_json::{Map, Value};

pub fn table_to_csv(table: &AggregateTable) -> DashboardResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let mut header = vec![table.dimension().to_string(), "count".to_string()];
    header.extend(table.columns());
    wtr.write_record(&header)?;

    for row in table.rows() {
        let mut cells = vec![row.key.to_string(), row.count.to_string()];
        cells.extend(row.values.iter().map(ToString::to_string));
        wtr.write_record(&cells)?;
    }
    finish(wtr)
}

/// One JSON object per row, keyed by column name.
pub fn table_to_records(table: &AggregateTable) -> Vec<Map<String, Value>> {
    let columns = table.columns();
    table
        .rows()
        .iter()
        .map(|row| {
            let mut record = Map::new();
            record.insert(table.dimension().to_string(), Value::String(row.key.to_string()));
            record.insert("count".into(), Value::from(row.count));
            for (column, value) in columns.iter().zip(&row.values) {
                record.insert(column.clone(), Value::from(*value));
            }
            record
        })
        .collect()
}

const RECORD_HEADER: [&str; 10] = [
    "date",
    "campaign",
    "channel",
    "segment",
    "region",
    "revenue",
    "cost",
    "conversions",
    "click_through_rate",
    "return_on_investment",
];

/// Filtered detail rows with canonical headers.
pub fn view_to_csv(view: &FilteredView<'_>) -> DashboardResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    // serialize() only emits the header alongside the first row
    if view.is_empty() {
        wtr.write_record(RECORD_HEADER)?;
    }
    for record in view.iter() {
        wtr.serialize(record)?;
    }
    finish(wtr)
}

pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> DashboardResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> DashboardResult<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| DashboardError::Io(std::io::Error::new(e.error().kind(), e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::Io(std::io::Error::other(e)))
}
