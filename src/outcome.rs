use std::fmt::Display;

use colored::Colorize;
use serde::Serialize;

use crate::clients::git::CommitStatus;

/// How far a branch got through its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStage {
    Pending,
    CheckedOut,
    Copied,
    Committed,
    Pushed,
}

impl BranchStage {
    fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::CheckedOut),
            Self::CheckedOut => Some(Self::Copied),
            Self::Copied => Some(Self::Committed),
            Self::Committed => Some(Self::Pushed),
            Self::Pushed => None,
        }
    }
}

/// Git step that can fail without stopping the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Checkout,
    Stage,
    Commit,
    Push,
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checkout => f.write_str("checkout"),
            Self::Stage => f.write_str("stage"),
            Self::Commit => f.write_str("commit"),
            Self::Push => f.write_str("push"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: Step,
    pub message: String,
}

/// Result of applying the overlay to one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchOutcome {
    pub branch: String,
    /// Furthest stage reached without a failure in between.
    pub stage: BranchStage,
    pub commit: Option<CommitStatus>,
    pub copied: Vec<String>,
    pub failures: Vec<StepFailure>,
}

impl BranchOutcome {
    pub fn new(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            stage: BranchStage::Pending,
            commit: None,
            copied: vec![],
            failures: vec![],
        }
    }

    /// Move to `stage` if it directly follows the current one. A later step
    /// succeeding after an earlier one failed does not move the stage.
    pub fn advance(&mut self, stage: BranchStage) {
        if self.stage.next() == Some(stage) {
            self.stage = stage;
        }
    }

    pub fn fail(&mut self, step: Step, err: &anyhow::Error) {
        self.failures.push(StepFailure {
            step,
            message: format!("{:#}", err),
        });
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Display for BranchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.failures.first() {
            None => write!(f, "{} {}", "✓".green(), self.branch),
            Some(failure) => write!(
                f,
                "{} {} ({}: {})",
                "✗".red(),
                self.branch,
                failure.step,
                failure.message
            ),
        }
    }
}

/// Summary of a whole run, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub default_branch: String,
    pub outcomes: Vec<BranchOutcome>,
    pub returned_to_default: bool,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &BranchOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some() || !self.returned_to_default
    }

    pub fn branches(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .map(|outcome| outcome.branch.as_str())
            .collect()
    }
}
