//! Error types shared across planning, reporting and configuration.
//!
//! Per-item rename failures are deliberately not part of this taxonomy: the
//! apply engine records them as [`crate::apply::RenameFailure`] values and
//! keeps going.

use crate::config::ConfigError;
use crate::plan::EntryKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole run.
#[derive(Error, Debug)]
pub enum TidyError {
    /// A sibling group holds more names than three digits can number.
    #[error("{kind} group in {} has {count} entries; at most 1000 can be numbered (000-999)", .dir.display())]
    CapacityExceeded {
        dir: PathBuf,
        kind: EntryKind,
        count: usize,
    },

    /// Directory traversal failed at the walk root.
    #[error("Failed to walk directory tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// Reading or writing a file the tool owns failed.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `--execute` was requested without a prepared plan.
    #[error("Plan file not found: {}", .0.display())]
    PlanFileMissing(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An include/exclude glob did not compile.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl TidyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for tidy-tree operations.
pub type Result<T> = std::result::Result<T, TidyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_names_group() {
        let err = TidyError::CapacityExceeded {
            dir: PathBuf::from("archive"),
            kind: EntryKind::File,
            count: 1000,
        };
        let message = err.to_string();
        assert!(message.contains("File group in archive"));
        assert!(message.contains("1000"));
    }

    #[test]
    fn test_plan_missing_message() {
        let err = TidyError::PlanFileMissing(PathBuf::from("standardization_plan.md"));
        assert_eq!(
            err.to_string(),
            "Plan file not found: standardization_plan.md"
        );
    }
}
