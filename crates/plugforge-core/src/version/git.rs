//! Git queries backing the `Git` version strategy.
//!
//! Each invocation shells out to `git` in the configured repository root and
//! carries a hard timeout so a wedged repository cannot stall the build.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::{format_version, GitVersionConfig, ResolvedVersion};
use crate::domain::error::{PlugforgeError, Result};

const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run one git command, returning its stdout with trailing whitespace removed.
async fn run_git(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let child = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| PlugforgeError::Git(format!("failed to run git: {e}")))?;

    let output = tokio::time::timeout(GIT_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| {
            PlugforgeError::Git(format!(
                "git {} timed out after {} seconds",
                args.join(" "),
                GIT_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| PlugforgeError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PlugforgeError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

/// Check whether a directory is inside a git work tree.
pub async fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check whether the working tree has uncommitted changes.
pub async fn is_working_tree_dirty(repo_dir: &Path) -> Result<bool> {
    let status = run_git(repo_dir, &["status", "--porcelain"]).await?;
    Ok(!status.trim().is_empty())
}

/// Number of commits reachable from HEAD.
pub async fn commit_depth(repo_dir: &Path) -> Result<u64> {
    let depth = run_git(repo_dir, &["rev-list", "--count", "HEAD"]).await?;
    depth.trim().parse().map_err(|_| {
        PlugforgeError::Git(format!("unexpected rev-list output: {depth:?}"))
    })
}

/// Abbreviated HEAD hash of the requested length.
pub async fn abbreviated_hash(repo_dir: &Path, length: u32) -> Result<String> {
    let arg = format!("--short={length}");
    let hash = run_git(repo_dir, &["rev-parse", &arg, "HEAD"]).await?;
    Ok(hash.trim().to_string())
}

/// Full HEAD hash.
pub async fn full_hash(repo_dir: &Path) -> Result<String> {
    let hash = run_git(repo_dir, &["rev-parse", "HEAD"]).await?;
    Ok(hash.trim().to_string())
}

/// Compute the git-derived version for a repository.
///
/// Fails with [`PlugforgeError::RepositoryState`] when the working tree is
/// dirty and the config does not allow it. The caller persists the result as
/// a two-line record via [`ResolvedVersion::write_record`].
pub async fn generate(config: &GitVersionConfig) -> Result<ResolvedVersion> {
    if config.abbrev_hash_length == 0 {
        return Err(PlugforgeError::Configuration(
            "abbreviated hash length must be greater than zero".into(),
        ));
    }
    let root = config.repository_root.as_path();
    if !is_git_repo(root).await {
        return Err(PlugforgeError::Git(format!(
            "not a git repository: {}",
            root.display()
        )));
    }
    if !config.allow_dirty && is_working_tree_dirty(root).await? {
        return Err(PlugforgeError::RepositoryState(
            "working tree has uncommitted changes; commit or stash them, \
             or allow a dirty tree"
                .into(),
        ));
    }

    let depth = commit_depth(root).await?;
    let abbrev = abbreviated_hash(root, config.abbrev_hash_length).await?;
    let full = full_hash(root).await?;

    let formatted = format_version(&config.format_template, depth, &abbrev)?;
    let value = format!("{}{}", config.prefix, formatted);
    debug!(version = %value, depth, hash = %full, "generated git version");

    Ok(ResolvedVersion {
        value,
        full_hash: Some(full),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git_sync(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git_sync(dir.path(), &["init"]);
        run_git_sync(dir.path(), &["config", "user.name", "test-user"]);
        run_git_sync(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git_sync(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[tokio::test]
    async fn test_is_git_repo() {
        let repo = make_git_repo();
        assert!(is_git_repo(repo.path()).await);

        let plain = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(plain.path()).await);
    }

    #[tokio::test]
    async fn test_commit_depth_counts_commits() {
        let repo = make_git_repo();
        assert_eq!(commit_depth(repo.path()).await.unwrap(), 1);

        run_git_sync(repo.path(), &["commit", "--allow-empty", "-m", "second"]);
        assert_eq!(commit_depth(repo.path()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_abbreviated_hash_prefixes_full_hash() {
        let repo = make_git_repo();
        let full = full_hash(repo.path()).await.unwrap();
        let abbrev = abbreviated_hash(repo.path(), 12).await.unwrap();
        assert_eq!(full.len(), 40);
        assert!(full.starts_with(&abbrev));
        assert!(abbrev.len() >= 12, "abbrev too short: {abbrev}");
    }

    #[tokio::test]
    async fn test_generate_formats_depth_and_hash() {
        let repo = make_git_repo();
        let config = GitVersionConfig::new(repo.path());
        let resolved = generate(&config).await.unwrap();

        let full = resolved.full_hash.as_deref().unwrap();
        let (depth, hash) = resolved.value.split_once('.').unwrap();
        assert_eq!(depth, "1");
        assert!(full.starts_with(hash));
    }

    #[tokio::test]
    async fn test_generate_applies_prefix() {
        let repo = make_git_repo();
        let mut config = GitVersionConfig::new(repo.path());
        config.prefix = "mailer-".into();
        let resolved = generate(&config).await.unwrap();
        assert!(resolved.value.starts_with("mailer-1."));
    }

    #[tokio::test]
    async fn test_generate_rejects_dirty_tree() {
        let repo = make_git_repo();
        std::fs::write(repo.path().join("untracked.txt"), "dirty").unwrap();

        let config = GitVersionConfig::new(repo.path());
        match generate(&config).await {
            Err(PlugforgeError::RepositoryState(msg)) => {
                assert!(msg.contains("uncommitted"));
            }
            other => panic!("expected RepositoryState error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_allows_dirty_tree_when_configured() {
        let repo = make_git_repo();
        std::fs::write(repo.path().join("untracked.txt"), "dirty").unwrap();

        let mut config = GitVersionConfig::new(repo.path());
        config.allow_dirty = true;
        assert!(generate(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_generate_fails_outside_repo() {
        let plain = tempfile::tempdir().unwrap();
        let config = GitVersionConfig::new(plain.path());
        assert!(matches!(
            generate(&config).await,
            Err(PlugforgeError::Git(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_template_at_resolution_time() {
        let repo = make_git_repo();
        let mut config = GitVersionConfig::new(repo.path());
        config.format_template = "%s.%d".into();
        assert!(matches!(
            generate(&config).await,
            Err(PlugforgeError::Configuration(_))
        ));
    }
}
