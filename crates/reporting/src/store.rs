//! Record store: one-pass CSV load into an immutable, typed dataset.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use marketing_core::{DashboardError, DashboardResult, Dimension, GroupKey, Record};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

// ─── Schema ─────────────────────────────────────────────────────────────────

/// A required input column: canonical name plus its Portuguese-language
/// header, as found in exports from the legacy dashboard.
#[derive(Debug, Clone, Copy)]
struct Column {
    slot: usize,
    name: &'static str,
    alias: &'static str,
}

const fn column(slot: usize, name: &'static str, alias: &'static str) -> Column {
    Column { slot, name, alias }
}

const DATE: Column = column(0, "date", "Data");
const CAMPAIGN: Column = column(1, "campaign", "Campanha");
const CHANNEL: Column = column(2, "channel", "Canal");
const SEGMENT: Column = column(3, "segment", "Segmento_Alvo");
const REGION: Column = column(4, "region", "Regiao");
const REVENUE: Column = column(5, "revenue", "Receita");
const COST: Column = column(6, "cost", "Custo");
const CONVERSIONS: Column = column(7, "conversions", "Conversoes");
const CTR: Column = column(8, "click_through_rate", "Taxa_Cliques");
const ROI: Column = column(9, "return_on_investment", "Retorno_Sobre_Investimento");

const REQUIRED: [Column; 10] = [
    DATE, CAMPAIGN, CHANNEL, SEGMENT, REGION, REVENUE, COST, CONVERSIONS, CTR, ROI,
];

/// Date formats tried in order when no explicit format is configured.
/// Slash dates are month-first; day-first input needs `data.date_format`.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Header position of every required column.
struct ColumnIndex([usize; REQUIRED.len()]);

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> DashboardResult<Self> {
        let mut positions = [0usize; REQUIRED.len()];
        for column in REQUIRED {
            positions[column.slot] = headers
                .iter()
                .position(|h| {
                    let h = h.trim();
                    h.eq_ignore_ascii_case(column.name) || h == column.alias
                })
                .ok_or_else(|| DashboardError::MissingColumn {
                    column: column.name.to_string(),
                })?;
        }
        Ok(Self(positions))
    }

    fn get<'r>(&self, row: &'r csv::StringRecord, column: Column) -> &'r str {
        row.get(self.0[column.slot]).unwrap_or_default().trim()
    }
}

// ─── Dataset ────────────────────────────────────────────────────────────────

/// Immutable, ordered set of records loaded once per session.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: String,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(source: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    /// Name of the source the dataset was read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct values of `dimension`, in order of first appearance.
    pub fn distinct(&self, dimension: Dimension) -> Vec<GroupKey> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.key(dimension))
            .filter(|k| seen.insert(k.clone()))
            .collect()
    }

    /// Campaign names available for filtering.
    pub fn campaigns(&self) -> Vec<String> {
        self.distinct_labels(Dimension::Campaign)
    }

    /// Channel names available for filtering.
    pub fn channels(&self) -> Vec<String> {
        self.distinct_labels(Dimension::Channel)
    }

    fn distinct_labels(&self, dimension: Dimension) -> Vec<String> {
        self.distinct(dimension)
            .into_iter()
            .filter_map(|k| match k {
                GroupKey::Label(label) => Some(label),
                GroupKey::Date(_) => None,
            })
            .collect()
    }
}

// ─── Record Store ───────────────────────────────────────────────────────────

/// Loads a [`Dataset`] from CSV. Any malformed row fails the whole load.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    date_format: Option<String>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a single explicit `chrono` format for the date column.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn load(&self, path: impl AsRef<Path>) -> DashboardResult<Dataset> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let file = File::open(path).map_err(|e| DashboardError::Load {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        self.load_reader(source_name, file)
    }

    pub fn load_reader<R: Read>(
        &self,
        source_name: impl Into<String>,
        reader: R,
    ) -> DashboardResult<Dataset> {
        let source_name = source_name.into();
        let load_error = |e: csv::Error| DashboardError::Load {
            source_name: source_name.clone(),
            reason: e.to_string(),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers = rdr.headers().map_err(load_error)?.clone();
        if headers.is_empty() {
            return Err(DashboardError::Load {
                source_name: source_name.clone(),
                reason: "no header row".into(),
            });
        }
        let index = ColumnIndex::resolve(&headers)?;
        debug!(source = %source_name, columns = headers.len(), "Header resolved");

        let mut records = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            let row = row.map_err(load_error)?;
            records.push(self.parse_row(i + 1, &row, &index)?);
        }

        info!(source = %source_name, rows = records.len(), "Dataset loaded");
        Ok(Dataset::new(source_name, records))
    }

    fn parse_row(
        &self,
        row_number: usize,
        row: &csv::StringRecord,
        index: &ColumnIndex,
    ) -> DashboardResult<Record> {
        let text = |column: Column| index.get(row, column).to_string();
        Ok(Record {
            date: self.parse_date(row_number, index.get(row, DATE))?,
            campaign: text(CAMPAIGN),
            channel: text(CHANNEL),
            segment: text(SEGMENT),
            region: text(REGION),
            revenue: parse_number(row_number, REVENUE, index.get(row, REVENUE))?,
            cost: parse_number(row_number, COST, index.get(row, COST))?,
            conversions: parse_count(row_number, index.get(row, CONVERSIONS))?,
            click_through_rate: parse_number(row_number, CTR, index.get(row, CTR))?,
            return_on_investment: parse_number(row_number, ROI, index.get(row, ROI))?,
        })
    }

    fn parse_date(&self, row_number: usize, value: &str) -> DashboardResult<NaiveDate> {
        let parsed = match &self.date_format {
            Some(format) => parse_date_with(value, format),
            None => DATE_FORMATS
                .iter()
                .chain(DATETIME_FORMATS.iter())
                .find_map(|format| parse_date_with(value, format))
                .or_else(|| {
                    DateTime::parse_from_rfc3339(value)
                        .ok()
                        .map(|dt| dt.date_naive())
                }),
        };
        parsed.ok_or_else(|| DashboardError::Parse {
            row: row_number,
            column: DATE.name.into(),
            value: value.into(),
            reason: "unrecognized date format".into(),
        })
    }
}

fn parse_date_with(value: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, format)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, format)
                .ok()
                .map(|dt| dt.date())
        })
}

fn parse_number(row_number: usize, column: Column, value: &str) -> DashboardResult<f64> {
    value.parse::<f64>().map_err(|e| DashboardError::Parse {
        row: row_number,
        column: column.name.into(),
        value: value.into(),
        reason: e.to_string(),
    })
}

fn parse_count(row_number: usize, value: &str) -> DashboardResult<u64> {
    value.parse::<u64>().map_err(|e| DashboardError::Parse {
        row: row_number,
        column: CONVERSIONS.name.into(),
        value: value.into(),
        reason: e.to_string(),
    })
}
