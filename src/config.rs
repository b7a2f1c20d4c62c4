use anyhow::Result;

use crate::clients::git::GitOps;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Branch processed first and checked out again when the run ends.
    pub default_branch: String,
    /// Remote every branch is pushed to.
    pub remote: String,
}

impl Config {
    /// Load config from the target repository's git config, falling back to
    /// `main` and `origin`.
    pub async fn load(git: &impl GitOps) -> Result<Self> {
        let default_branch = git
            .get_config("propagate.defaultBranch")
            .await?
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        let remote = git
            .get_config("propagate.remote")
            .await?
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_REMOTE.to_string());

        Ok(Self {
            default_branch,
            remote,
        })
    }

    /// Create a new config with explicit values (useful for tests)
    pub fn new(default_branch: String, remote: String) -> Self {
        Self {
            default_branch,
            remote,
        }
    }

    /// Default config for tests
    pub fn default_for_tests() -> Self {
        Self::new(DEFAULT_BRANCH.to_string(), DEFAULT_REMOTE.to_string())
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, default_branch: Option<String>, remote: Option<String>) -> Self {
        if let Some(default_branch) = default_branch {
            self.default_branch = default_branch;
        }
        if let Some(remote) = remote {
            self.remote = remote;
        }
        self
    }
}
