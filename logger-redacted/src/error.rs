use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter `{directive}`: {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

pub type LoggingResult<T> = Result<T, LoggingError>;
