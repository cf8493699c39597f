//! plugforge - build-time metadata for packaged plugin artifacts.
//!
//! The `plugforge` command is a thin stand-in for the host build
//! orchestrator, wiring the three cores together:
//!
//! - `git-version`: compute and persist the git-derived version record
//! - `manifest`: run the fragment producers and assemble the final manifest
//! - `verify`: fan out isolated access-modifier checks over compilation units

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};

use plugforge_core::accmod::verifier::{AccessModifierVerifier, ProcessChecker};
use plugforge_core::scan::{dependencies, dynamic_loading, entry_class};
use plugforge_core::version::git;
use plugforge_core::{
    merge, BuildConfig, ClasspathEntry, CompilationUnit, ManifestFragment, PluginMetadata,
    ResolvedVersion, VersionSpec,
};

#[derive(Parser)]
#[command(name = "plugforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build-time metadata for packaged plugin artifacts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to a plugforge.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the effective version comes from.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum VersionSourceArg {
    Project,
    Fixed,
    Git,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the git-derived version and persist the two-line record
    GitVersion {
        /// Git repository root (default: current directory)
        #[arg(default_value = ".")]
        repo: PathBuf,
    },

    /// Run the fragment producers and assemble the final manifest
    Manifest {
        /// Plugin metadata file (JSON)
        #[arg(short, long)]
        metadata: PathBuf,

        /// Resolved compile classpath file (JSON), for the dependency producer
        #[arg(long)]
        classpath: Option<PathBuf>,

        /// Compiled-output directories to scan (repeatable)
        #[arg(long = "classes-dir")]
        classes_dirs: Vec<PathBuf>,

        /// Project version supplied by the orchestrator
        #[arg(long, default_value = "1.0-SNAPSHOT")]
        project_version: String,

        /// Version source
        #[arg(long, value_enum, default_value = "project")]
        version_source: VersionSourceArg,

        /// Fixed version string (required with --version-source fixed)
        #[arg(long)]
        fixed_version: Option<String>,

        /// Output path for the rendered manifest
        #[arg(short, long, default_value = "generated/manifest/plugin.mf")]
        output: PathBuf,
    },

    /// Fan out isolated access-modifier checks over compilation units
    Verify {
        /// Compilation directories to check (repeatable)
        #[arg(long = "unit", required = true)]
        units: Vec<PathBuf>,

        /// Compile classpath entries shared by all units (repeatable)
        #[arg(long = "classpath-entry")]
        classpath: Vec<PathBuf>,

        /// Log violations instead of failing the build
        #[arg(long)]
        ignore_failures: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(level)
            .init();
    } else {
        tracing_subscriber::fmt().with_max_level(level).init();
    }

    let config = match &cli.config {
        Some(path) => BuildConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BuildConfig::default(),
    };

    match cli.command {
        Commands::GitVersion { repo } => git_version(&config, repo).await,
        Commands::Manifest {
            metadata,
            classpath,
            classes_dirs,
            project_version,
            version_source,
            fixed_version,
            output,
        } => {
            manifest(
                &config,
                metadata,
                classpath,
                classes_dirs,
                &project_version,
                version_source,
                fixed_version,
                output,
            )
            .await
        }
        Commands::Verify {
            units,
            classpath,
            ignore_failures,
        } => verify(&config, units, classpath, ignore_failures).await,
    }
}

async fn git_version(config: &BuildConfig, repo: PathBuf) -> Result<()> {
    let git_config = config.git_version_config(&repo);
    let resolved = git::generate(&git_config)
        .await
        .context("git version generation failed")?;
    resolved
        .write_record(&config.version_file)
        .with_context(|| format!("failed to write {}", config.version_file.display()))?;

    info!(
        version = %resolved.value,
        record = %config.version_file.display(),
        "generated git version"
    );
    println!("{}", resolved.value);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn manifest(
    config: &BuildConfig,
    metadata_path: PathBuf,
    classpath_path: Option<PathBuf>,
    classes_dirs: Vec<PathBuf>,
    project_version: &str,
    version_source: VersionSourceArg,
    fixed_version: Option<String>,
    output: PathBuf,
) -> Result<()> {
    let metadata: PluginMetadata = read_json(&metadata_path)?;
    let classpath: Vec<ClasspathEntry> = match &classpath_path {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    // Resolve the effective version once, then pass it explicitly.
    let spec = match version_source {
        VersionSourceArg::Project => VersionSpec::project(),
        VersionSourceArg::Fixed => VersionSpec {
            strategy: plugforge_core::VersionStrategy::Fixed,
            fixed_value: fixed_version,
            git: None,
        },
        VersionSourceArg::Git => VersionSpec::git(config.git_version_config(std::path::Path::new("."))),
    };
    let prior = ResolvedVersion::read_record(&config.version_file).ok();
    let version = plugforge_core::version::resolve(&spec, project_version, prior.as_ref())
        .context("version resolution failed")?;
    let version = plugforge_core::version::decorate_snapshot(&version, Utc::now(), &username());

    // The three producers are independent; each reads immutable compiled
    // output and owns its fragment until the merge.
    let entry = match &config.plugin_base_type {
        Some(base_type) => entry_class::produce(&classes_dirs, base_type)?,
        None => ManifestFragment::new(entry_class::PRODUCER),
    };
    let dynamic = dynamic_loading::produce(&classes_dirs)?;
    let deps = dependencies::produce(&classpath)?;

    let final_manifest = merge(&[entry, dynamic, deps], &version, &metadata)?;
    final_manifest
        .write_to(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(manifest = %output.display(), "wrote final manifest");
    Ok(())
}

async fn verify(
    config: &BuildConfig,
    unit_dirs: Vec<PathBuf>,
    classpath: Vec<PathBuf>,
    ignore_failures: bool,
) -> Result<()> {
    let units: Vec<CompilationUnit> = unit_dirs
        .into_iter()
        .map(|directory| CompilationUnit {
            directory,
            classpath: classpath.clone(),
        })
        .collect();

    let checker = Arc::new(ProcessChecker::new(&config.checker_executable));
    let verifier = AccessModifierVerifier::new(checker, &config.report_dir)
        .with_properties(BTreeMap::new());

    let ignore = ignore_failures || config.ignore_failures;
    let reports = verifier
        .verify(&units, ignore)
        .await
        .context("access modifier verification failed")?;

    info!(
        units = reports.len(),
        clean = reports.iter().filter(|r| r.passed()).count(),
        "access modifier verification finished"
    );
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
