use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtlasError {
    /// The gazetteer file is missing, unreadable or corrupt. Fails the whole session.
    #[error("Gazetteer unavailable at {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AtlasError {
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AtlasError::DataUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
