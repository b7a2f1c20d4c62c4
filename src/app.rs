use std::path;
use std::path::Path;

use crate::clients::git::GitOps;
use crate::config::Config;
use crate::error::PropagateError;

/// Owns the target working tree for the duration of a run.
pub struct App<G: GitOps> {
    pub config: Config,
    pub repo: path::PathBuf,
    pub git: G,
}

impl<G: GitOps> App<G> {
    pub fn new(config: Config, repo: path::PathBuf, git: G) -> Self {
        Self { config, repo, git }
    }
}

/// Check both inputs before anything is touched.
pub fn validate_inputs(repo: &Path, source: &Path) -> Result<(), PropagateError> {
    // A worktree or submodule has a `.git` file rather than a directory
    if !repo.is_dir() || !repo.join(".git").exists() {
        return Err(PropagateError::InvalidRepository(repo.to_path_buf()));
    }
    if !source.is_dir() {
        return Err(PropagateError::InvalidSource(source.to_path_buf()));
    }

    // Copying the repository, or a parent of it, into itself destroys the
    // source or recurses without end
    let repo_real = repo
        .canonicalize()
        .map_err(|_| PropagateError::InvalidRepository(repo.to_path_buf()))?;
    let source_real = source
        .canonicalize()
        .map_err(|_| PropagateError::InvalidSource(source.to_path_buf()))?;
    if repo_real.starts_with(&source_real) {
        return Err(PropagateError::SourceContainsRepository(source.to_path_buf()));
    }
    Ok(())
}
