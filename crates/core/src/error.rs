use thiserror::Error;

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Failed to load dataset from {source_name}: {reason}")]
    Load { source_name: String, reason: String },

    #[error("Dataset is missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("Row {row}: cannot parse `{value}` in column `{column}`: {reason}")]
    Parse {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("No data for current filter: {dimension} table is empty")]
    EmptyTable { dimension: String },

    #[error("Table has no column named `{column}`")]
    UnknownColumn { column: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DashboardError {
    /// True for errors that mean "the current filter selects nothing",
    /// which callers render as a no-data state instead of failing.
    pub fn is_empty_table(&self) -> bool {
        matches!(self, Self::EmptyTable { .. })
    }
}
