use thiserror::Error;

use crate::model::Source;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad threshold, empty filter, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A source table has no header row.
    #[error("source '{table}': missing header row")]
    EmptyHeader { table: Source },
    /// Missing required column in a source table.
    #[error("source '{table}': missing column '{column}'")]
    MissingColumn { table: Source, column: String },
    /// IO error surfaced by the ingestion collaborator.
    #[error("IO error: {0}")]
    Io(String),
}

impl ReconError {
    /// The source a fatal ingestion error is attributed to, if any.
    pub fn table(&self) -> Option<Source> {
        match self {
            Self::EmptyHeader { table } | Self::MissingColumn { table, .. } => Some(*table),
            _ => None,
        }
    }
}
