use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Missing description (use: AMOUNT DESCRIPTION [MODIFIERS])")]
    MissingDescription,

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("No transaction with ID {0}")]
    NotFound(i64),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TrackError>;
