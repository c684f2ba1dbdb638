use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Error type that captures ledger validation and persistence failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid date `{0}`: expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid amount `{0}`")]
    InvalidAmount(String),
    #[error("Unknown schedule `{0}`")]
    UnknownSchedule(String),
    #[error("Definition {definition_id} has no occurrence on {date}")]
    MissingOccurrence {
        definition_id: Uuid,
        date: NaiveDate,
    },
    #[error("Definition not found: {0}")]
    DefinitionNotFound(Uuid),
    #[error("Entry not found: {0}")]
    EntryNotFound(Uuid),
    #[error("Id already in use: {0}")]
    DuplicateId(Uuid),
    #[error("Invalid window: {start} is after {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
