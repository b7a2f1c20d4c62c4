#![allow(async_fn_in_trait)]

use std::fmt::Display;
use std::path;
use std::process::Output;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use tokio::process::Command;
use tracing::instrument;

// -----------------------------------------------------------------------------
// GitOps trait

/// Operations the propagator needs from the version-control backend.
#[cfg_attr(test, automock)]
pub trait GitOps {
    /// List local branch names, in the order git reports them.
    async fn list_branches(&self) -> Result<Vec<String>>;
    async fn checkout(&self, branch: &str) -> Result<()>;
    async fn stage_all(&self) -> Result<()>;

    /// Commit whatever is staged.
    /// An empty index is reported as [`CommitStatus::NothingToCommit`], not as an error.
    async fn commit(&self, message: &str) -> Result<CommitStatus>;
    async fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// Read a single git config value, `None` if unset.
    async fn get_config(&self, key: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    Created,
    NothingToCommit,
}

impl Display for CommitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::NothingToCommit => f.write_str("nothing to commit"),
        }
    }
}

// -----------------------------------------------------------------------------
// GitClient

/// Git client bound to a single working tree.
pub struct GitClient {
    path: path::PathBuf,
}

impl GitClient {
    pub fn new(path: path::PathBuf) -> Self {
        Self { path }
    }

    async fn output(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .current_dir(&self.path)
            .args(args)
            .output()
            .await
            .context("Failed to execute git command")
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;

        if !output.status.success() {
            bail!(
                "git command failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

impl GitOps for GitClient {
    #[instrument(skip(self))]
    async fn list_branches(&self) -> Result<Vec<String>> {
        let output = self
            .run(&["branch", "--format=%(refname:short)"])
            .await?;

        // Detached HEAD shows up as "(HEAD detached at ...)"
        let branches = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('('))
            .map(|line| line.to_string())
            .collect();

        Ok(branches)
    }

    #[instrument(skip(self))]
    async fn checkout(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", branch]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stage_all(&self) -> Result<()> {
        self.run(&["add", "-A"]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn commit(&self, message: &str) -> Result<CommitStatus> {
        let output = self.output(&["commit", "-m", message]).await?;

        if output.status.success() {
            return Ok(CommitStatus::Created);
        }

        // git reports an empty index on stdout with exit status 1
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.contains("nothing to commit") || stdout.contains("nothing added to commit") {
            return Ok(CommitStatus::NothingToCommit);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        bail!("git command failed: {}", detail);
    }

    #[instrument(skip(self))]
    async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
        self.run(&["push", remote, &refspec]).await?;
        Ok(())
    }

    async fn get_config(&self, key: &str) -> Result<Option<String>> {
        let output = self.output(&["config", "--get", key]).await?;

        // Exit code 1 means the key is not set
        match output.status.code() {
            Some(0) => Ok(Some(String::from_utf8(output.stdout)?.trim().to_string())),
            Some(1) => Ok(None),
            _ => bail!(
                "git command failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }
    }
}
