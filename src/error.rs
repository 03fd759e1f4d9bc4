use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("issue source error: {0}")]
    SourceFetch(String),
    #[error("issue {key} has an unparseable created date: '{value}'")]
    DateParse { key: String, value: String },
    #[error("report rendering error: {0}")]
    Render(String),
    #[error("failed to send report to {recipients}: {reason}")]
    Dispatch { recipients: String, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
