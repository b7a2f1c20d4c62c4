//! Errors that stop a run.
//!
//! Per-branch git failures are not errors at this level; they are collected
//! as [`crate::outcome::StepFailure`] values and the run carries on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropagateError {
    #[error("Directory {} is not a Git repository.", .0.display())]
    InvalidRepository(PathBuf),

    #[error("Directory {} does not exist.", .0.display())]
    InvalidSource(PathBuf),

    #[error(
        "Directory {} is the repository or one of its parents; it cannot be copied into it.",
        .0.display()
    )]
    SourceContainsRepository(PathBuf),

    #[error("Failed to copy {}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PropagateError {
    pub fn copy(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Copy {
            path: path.into(),
            source,
        }
    }
}
