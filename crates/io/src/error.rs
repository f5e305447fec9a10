use std::path::Path;

use thiserror::Error;
use vinmerge_recon::ReconError;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {path}: {message}")]
    Read { path: String, message: String },
    #[error("{path}: malformed CSV: {message}")]
    Csv { path: String, message: String },
    #[error("unknown encoding label '{0}'")]
    Encoding(String),
    #[error("cannot write {path}: {message}")]
    Write { path: String, message: String },
}

impl IoError {
    pub(crate) fn read(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn csv(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Csv {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<IoError> for ReconError {
    fn from(err: IoError) -> Self {
        ReconError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_engine_error() {
        let err: ReconError = IoError::Encoding("klingon".into()).into();
        assert!(matches!(err, ReconError::Io(ref m) if m.contains("klingon")));
        assert_eq!(err.table(), None);
    }
}
