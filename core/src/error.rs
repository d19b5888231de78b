use thiserror::Error;

/// Errors surfaced by the tracker core.
///
/// `Validation`, `NotFound` and `UnknownGoal` are caller errors; the remaining
/// variants wrap storage and serialization failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range input. Raised before any write happens.
    #[error("{0}")]
    Validation(String),

    /// The targeted record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A goal label outside the six known goals.
    #[error("Unknown goal '{0}'")]
    UnknownGoal(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation<T: std::fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    pub fn not_found<T: std::fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// True for errors caused by the caller's input rather than the store.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound(_) | Error::UnknownGoal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
