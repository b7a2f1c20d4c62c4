#![allow(dead_code)]

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Runs git in `dir`, failing on a non-zero exit, and returns trimmed stdout.
pub async fn git(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .await?;
    anyhow::ensure!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Creates a git repository in the given directory, on branch `main`.
///
/// This initializes the repo and sets basic git config needed for commits.
/// The directory should already exist.
pub async fn create_git_repo(dir: &Path) -> anyhow::Result<()> {
    git(dir, &["init"]).await?;
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]).await?;

    // Set git config for commits
    git(dir, &["config", "user.name", "Test User"]).await?;
    git(dir, &["config", "user.email", "test@example.com"]).await?;
    git(dir, &["config", "commit.gpgsign", "false"]).await?;

    Ok(())
}

/// Creates a bare repository to act as the push remote.
pub async fn create_bare_repo(dir: &Path) -> anyhow::Result<()> {
    git(dir, &["init", "--bare"]).await?;
    Ok(())
}

/// Sets up a git remote origin for the repository.
pub async fn setup_git_remote(dir: &Path, remote_url: &str) -> anyhow::Result<()> {
    git(dir, &["remote", "add", "origin", remote_url]).await?;
    Ok(())
}

/// Writes a file (creating parent directories) and commits it.
pub async fn commit_file(
    dir: &Path,
    filename: &str,
    contents: &str,
    message: &str,
) -> anyhow::Result<()> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&file_path, contents).await?;

    git(dir, &["add", filename]).await?;
    git(dir, &["commit", "-m", message]).await?;

    Ok(())
}

pub async fn create_branch(dir: &Path, branch: &str) -> anyhow::Result<()> {
    git(dir, &["branch", branch]).await?;
    Ok(())
}

pub async fn checkout(dir: &Path, branch: &str) -> anyhow::Result<()> {
    git(dir, &["checkout", "-q", branch]).await?;
    Ok(())
}

pub async fn current_branch(dir: &Path) -> anyhow::Result<String> {
    git(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await
}

pub async fn rev_parse(dir: &Path, rev: &str) -> anyhow::Result<String> {
    git(dir, &["rev-parse", rev]).await
}

/// Contents of `path` as committed at `rev`.
pub async fn show_file(dir: &Path, rev: &str, path: &str) -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(["show", &format!("{}:{}", rev, path)])
        .current_dir(dir)
        .output()
        .await?;
    anyhow::ensure!(output.status.success(), "git show {rev}:{path} failed");

    // Not trimmed; byte-for-byte comparison
    Ok(String::from_utf8(output.stdout)?)
}

/// All file paths committed at `rev`.
pub async fn ls_tree(dir: &Path, rev: &str) -> anyhow::Result<Vec<String>> {
    let output = git(dir, &["ls-tree", "-r", "--name-only", rev]).await?;
    Ok(output.lines().map(str::to_string).collect())
}

/// Commit subjects reachable from `rev`, newest first.
pub async fn log_subjects(dir: &Path, rev: &str) -> anyhow::Result<String> {
    git(dir, &["log", "--format=%s", rev]).await
}

pub fn setup_logging() -> anyhow::Result<()> {
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let format = tracing_subscriber::fmt::format().with_timer(timer);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;
    let subscriber = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_test_writer()
        .with_filter(filter);
    tracing_subscriber::registry().with(subscriber).init();
    Ok(())
}

pub enum TestDir {
    Temp(tempfile::TempDir),
    Kept(std::path::PathBuf),
}

impl TestDir {
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;

        if std::env::var("DEBUG_TESTS").is_ok() {
            let path = temp_dir.keep();
            eprintln!("Test directory kept at: {}", path.display());
            Ok(TestDir::Kept(path))
        } else {
            Ok(TestDir::Temp(temp_dir))
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            TestDir::Temp(t) => t.path(),
            TestDir::Kept(p) => p.as_path(),
        }
    }
}

/// A repository with branches `main` and `feature-a`, a bare remote, and a
/// source folder holding `assets/` and `notes.txt`.
pub struct Scenario {
    pub dir: TestDir,
    pub repo: std::path::PathBuf,
    pub remote: std::path::PathBuf,
    pub source: std::path::PathBuf,
}

impl Scenario {
    pub async fn new() -> anyhow::Result<Self> {
        let dir = TestDir::new()?;
        let root = dir.path();

        let remote = root.join("remote.git");
        tokio::fs::create_dir(&remote).await?;
        create_bare_repo(&remote).await?;

        let repo = root.join("repo");
        tokio::fs::create_dir(&repo).await?;
        create_git_repo(&repo).await?;
        commit_file(&repo, "README.md", "readme\n", "Initial commit").await?;
        create_branch(&repo, "feature-a").await?;
        checkout(&repo, "feature-a").await?;
        commit_file(&repo, "assets/old.svg", "old\n", "Add old assets").await?;
        checkout(&repo, "main").await?;

        let source = root.join("source");
        tokio::fs::create_dir_all(source.join("assets/icons")).await?;
        tokio::fs::write(source.join("assets/logo.svg"), "<svg/>\n").await?;
        tokio::fs::write(source.join("assets/icons/add.svg"), "<svg>+</svg>\n").await?;
        tokio::fs::write(source.join("notes.txt"), "notes\n").await?;

        Ok(Self {
            dir,
            repo,
            remote,
            source,
        })
    }

    pub async fn with_remote(self) -> anyhow::Result<Self> {
        setup_git_remote(&self.repo, &self.remote.display().to_string()).await?;
        Ok(self)
    }

    /// Insta filters that hide the temporary directory.
    pub fn filters(&self) -> Vec<(&'static str, &'static str)> {
        let root: &'static str =
            Box::leak(regex::escape(&self.dir.path().display().to_string()).into_boxed_str());
        vec![(root, "[TMP]")]
    }
}
