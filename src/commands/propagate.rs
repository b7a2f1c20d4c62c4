use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::App;
use crate::Config;
use crate::app::validate_inputs;
use crate::clients::git::CommitStatus;
use crate::clients::git::GitClient;
use crate::clients::git::GitOps;
use crate::outcome::BranchOutcome;
use crate::outcome::BranchStage;
use crate::outcome::RunReport;
use crate::outcome::Step;
use crate::overlay::overlay_entries;

/// Validate the inputs, load config from the repository, and propagate
/// `source` onto every local branch of `repo`.
pub async fn propagate(
    repo: &Path,
    source: &Path,
    stdout: &mut impl std::io::Write,
) -> Result<RunReport> {
    validate_inputs(repo, source)?;
    let git = GitClient::new(repo.to_path_buf());
    let config = Config::load(&git).await?;
    let app = App::new(config, repo.to_path_buf(), git);
    app.cmd_propagate(source, stdout).await
}

impl<G: GitOps> App<G> {
    /// Overlay `source` onto every local branch.
    ///
    /// 1. Switch to the default branch and take a snapshot of the branch list.
    /// 2. Apply to the default branch, then to every other branch in the order
    ///    git lists them.
    /// 3. Switch back to the default branch.
    ///
    /// Git failures are recorded per branch and never stop the run; a
    /// filesystem error while copying does.
    pub async fn cmd_propagate(
        &self,
        source: &Path,
        stdout: &mut impl std::io::Write,
    ) -> Result<RunReport> {
        let default_branch = &self.config.default_branch;

        match self.git.checkout(default_branch).await {
            Ok(()) => writeln!(stdout, "Switched to {} branch", default_branch)?,
            // Reported again by apply_to_branch below
            Err(e) => warn!("Could not switch to {}: {:#}", default_branch, e),
        }

        let branches = self
            .git
            .list_branches()
            .await
            .context("Failed to list local branches")?;
        info!("Found {} local branches", branches.len());

        let mut outcomes = vec![self.apply_to_branch(default_branch, source, stdout).await?];
        for branch in branches.iter().filter(|branch| *branch != default_branch) {
            outcomes.push(self.apply_to_branch(branch, source, stdout).await?);
        }

        let returned_to_default = match self.git.checkout(default_branch).await {
            Ok(()) => true,
            Err(e) => {
                writeln!(
                    stdout,
                    "Failed to return to branch {}: {:#}",
                    default_branch, e
                )?;
                false
            }
        };

        let report = RunReport {
            default_branch: default_branch.clone(),
            outcomes,
            returned_to_default,
        };

        writeln!(stdout)?;
        for outcome in &report.outcomes {
            writeln!(stdout, "{}", outcome)?;
        }
        writeln!(stdout, "All done!")?;

        Ok(report)
    }

    /// Check out `branch`, overlay `source` onto the working tree, then
    /// stage, commit and push. Stage, commit and push are each attempted even
    /// if an earlier one failed.
    #[instrument(skip(self, source, stdout))]
    pub async fn apply_to_branch(
        &self,
        branch: &str,
        source: &Path,
        stdout: &mut impl std::io::Write,
    ) -> Result<BranchOutcome> {
        let mut outcome = BranchOutcome::new(branch);

        writeln!(stdout, "Switching to branch: {}", branch)?;
        if let Err(e) = self.git.checkout(branch).await {
            writeln!(stdout, "Failed to checkout branch {}: {:#}", branch, e)?;
            outcome.fail(Step::Checkout, &e);
            return Ok(outcome);
        }
        outcome.advance(BranchStage::CheckedOut);

        let from = source.to_path_buf();
        let to = self.repo.clone();
        outcome.copied = tokio::task::spawn_blocking(move || overlay_entries(&from, &to))
            .await
            .context("Copy task did not complete")??;
        if outcome.copied.is_empty() {
            writeln!(stdout, "Nothing to copy into {}", branch)?;
        } else {
            writeln!(stdout, "Copied {} into {}", outcome.copied.join(", "), branch)?;
        }
        outcome.advance(BranchStage::Copied);

        if let Err(e) = self.git.stage_all().await {
            writeln!(stdout, "Failed to stage changes on {}: {:#}", branch, e)?;
            outcome.fail(Step::Stage, &e);
        }

        let message = format!("Add new folders from {} to {}", source.display(), branch);
        match self.git.commit(&message).await {
            Ok(status) => {
                match status {
                    CommitStatus::Created => writeln!(stdout, "Committed to {}", branch)?,
                    CommitStatus::NothingToCommit => {
                        writeln!(stdout, "Nothing to commit on {}", branch)?
                    }
                }
                outcome.commit = Some(status);
                outcome.advance(BranchStage::Committed);
            }
            Err(e) => {
                writeln!(stdout, "Failed to commit on {}: {:#}", branch, e)?;
                outcome.fail(Step::Commit, &e);
            }
        }

        match self.git.push(&self.config.remote, branch).await {
            Ok(()) => {
                writeln!(stdout, "Pushed {} to {}", branch, self.config.remote)?;
                outcome.advance(BranchStage::Pushed);
            }
            Err(e) => {
                writeln!(stdout, "Failed to push {}: {:#}", branch, e)?;
                outcome.fail(Step::Push, &e);
            }
        }

        Ok(outcome)
    }
}
