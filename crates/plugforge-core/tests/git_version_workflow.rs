//! Git version generation against real repositories: generate, persist the
//! two-line record, and resolve through the version strategies.

use std::path::Path;
use std::process::Command;

use chrono::{TimeZone, Utc};

use plugforge_core::version::{decorate_snapshot, git, resolve};
use plugforge_core::{GitVersionConfig, PlugforgeError, ResolvedVersion, VersionSpec};

fn run_git(repo_dir: &Path, args: &[&str]) {
    let output = Command::new("git")
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

fn make_git_repo(commits: usize) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init"]);
    run_git(dir.path(), &["config", "user.name", "test-user"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    for n in 0..commits {
        let msg = format!("commit {n}");
        run_git(dir.path(), &["commit", "--allow-empty", "-m", &msg]);
    }
    dir
}

#[tokio::test]
async fn generate_then_record_roundtrip() {
    let repo = make_git_repo(3);
    let out = tempfile::tempdir().unwrap();
    let record_path = out.path().join("generated/version/version.txt");

    let config = GitVersionConfig::new(repo.path());
    let resolved = git::generate(&config).await.unwrap();
    resolved.write_record(&record_path).unwrap();

    // Two lines: version, then the full commit hash.
    let text = std::fs::read_to_string(&record_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], resolved.value);
    assert_eq!(lines[1].len(), 40);

    let read_back = ResolvedVersion::read_record(&record_path).unwrap();
    assert_eq!(read_back, resolved);
}

#[tokio::test]
async fn depth_grows_with_history() {
    let repo = make_git_repo(1);
    let config = GitVersionConfig::new(repo.path());

    let first = git::generate(&config).await.unwrap();
    assert!(first.value.starts_with("1."));

    run_git(repo.path(), &["commit", "--allow-empty", "-m", "more"]);
    let second = git::generate(&config).await.unwrap();
    assert!(second.value.starts_with("2."));
    assert_ne!(first.full_hash, second.full_hash);
}

#[tokio::test]
async fn git_strategy_falls_back_to_project_version_outside_repo() {
    let plain = tempfile::tempdir().unwrap();
    let spec = VersionSpec::git(GitVersionConfig::new(plain.path()));

    let version = resolve(&spec, "1.0-SNAPSHOT", None).unwrap();
    assert_eq!(version, "1.0-SNAPSHOT");
}

#[tokio::test]
async fn git_strategy_prefers_persisted_record() {
    let plain = tempfile::tempdir().unwrap();
    let spec = VersionSpec::git(GitVersionConfig::new(plain.path()));
    let prior = ResolvedVersion {
        value: "42.abc123def456".into(),
        full_hash: Some("abc123def4567890abc123def4567890abc123de".into()),
    };

    let version = resolve(&spec, "1.0-SNAPSHOT", Some(&prior)).unwrap();
    assert_eq!(version, "42.abc123def456");
}

#[test]
fn fixed_strategy_requires_a_value() {
    let spec = VersionSpec {
        strategy: plugforge_core::VersionStrategy::Fixed,
        fixed_value: None,
        git: None,
    };
    assert!(matches!(
        resolve(&spec, "1.0", None),
        Err(PlugforgeError::Configuration(_))
    ));
}

#[test]
fn snapshot_decoration_is_stable_for_a_fixed_instant() {
    let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
    let decorated = decorate_snapshot("1.0-SNAPSHOT", now, "jsmith");
    assert_eq!(decorated, decorate_snapshot("1.0-SNAPSHOT", now, "jsmith"));
    assert!(decorated.contains("jsmith"));
    assert!(decorated.starts_with("1.0-SNAPSHOT (private-"));

    // Non-snapshot versions pass through untouched.
    assert_eq!(decorate_snapshot("2.0", now, "jsmith"), "2.0");
}
