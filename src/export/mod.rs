//! File exports of invoice lists. Writers only serialize what they are
//! given; selecting and ordering records is up to the caller.

use thiserror::Error;

pub mod csv;
pub mod pdf;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("render error: {0}")]
    Render(String),
    #[error("malformed export data: {0}")]
    Format(String),
}

impl From<::csv::Error> for ExportError {
    fn from(e: ::csv::Error) -> Self {
        match e.into_kind() {
            ::csv::ErrorKind::Io(io) => ExportError::Io(io),
            other => ExportError::Format(format!("{:?}", other)),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Format(e.to_string())
    }
}
