//! Fan-out of isolated per-unit access checks.
//!
//! Each unit is checked in its own execution context behind the
//! [`IsolatedChecker`] seam: a narrow, serializable request in, one report
//! artifact out. Runs do not share mutable state and do not block each
//! other; build cancellation kills outstanding checker processes rather
//! than awaiting them.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::report::{CompilationUnit, ViolationReport};
use crate::domain::error::{PlugforgeError, Result};

/// Serializable request handed to one isolated check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckRequest {
    /// The directory whose classes are inspected.
    pub dir_to_check: PathBuf,

    /// Union of all compilation directories plus the unit's own compile
    /// classpath; the isolated context sees nothing else.
    pub classpath_to_scan: Vec<PathBuf>,

    /// Checker tool properties, forwarded verbatim.
    pub properties: BTreeMap<String, String>,

    /// Where the isolated run writes its report artifact.
    pub output_file: PathBuf,
}

/// The process-isolation seam.
///
/// `check` returns `Ok(())` when the isolated run executed and wrote its
/// report artifact, violations or not. A run that failed to execute is a
/// [`PlugforgeError::ToolExecution`], distinct from content findings.
#[async_trait]
pub trait IsolatedChecker: Send + Sync {
    async fn check(&self, request: &CheckRequest) -> Result<()>;
}

/// Production checker: spawns the configured checker executable as a child
/// process with the serialized request as its sole argument.
pub struct ProcessChecker {
    executable: PathBuf,
}

impl ProcessChecker {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

#[async_trait]
impl IsolatedChecker for ProcessChecker {
    async fn check(&self, request: &CheckRequest) -> Result<()> {
        let unit = request.dir_to_check.display().to_string();
        let tool_error = |detail: String| PlugforgeError::ToolExecution {
            unit: unit.clone(),
            detail,
        };

        let request_file = request.output_file.with_extension("request.json");
        if let Some(parent) = request_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&request_file, serde_json::to_vec_pretty(request)?)?;

        let child = Command::new(&self.executable)
            .arg(&request_file)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| tool_error(format!("failed to spawn {}: {e}", self.executable.display())))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| tool_error(format!("checker did not complete: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(tool_error(format!(
                "checker exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Fans out one isolated check per compilation unit and aggregates the
/// violation reports.
pub struct AccessModifierVerifier {
    checker: Arc<dyn IsolatedChecker>,
    report_dir: PathBuf,
    properties: BTreeMap<String, String>,
}

impl AccessModifierVerifier {
    pub fn new(checker: Arc<dyn IsolatedChecker>, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            checker,
            report_dir: report_dir.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Forward additional properties to the checker tool.
    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Verify all units, in parallel, one isolated run each.
    ///
    /// Returns every unit's report in unit order. When any report is
    /// non-empty and `ignore_failures` is false, fails with
    /// [`PlugforgeError::AccessViolation`] carrying all offending reports;
    /// with `ignore_failures` true, violations are logged and the call
    /// succeeds with the reports still written and readable. No retries: an
    /// isolated run that crashed is a [`PlugforgeError::ToolExecution`].
    pub async fn verify(
        &self,
        units: &[CompilationUnit],
        ignore_failures: bool,
    ) -> Result<Vec<ViolationReport>> {
        fs::create_dir_all(&self.report_dir)?;

        let all_dirs: Vec<PathBuf> = units.iter().map(|u| u.directory.clone()).collect();

        let mut tasks = Vec::with_capacity(units.len());
        for unit in units {
            let request = CheckRequest {
                dir_to_check: unit.directory.clone(),
                classpath_to_scan: scan_classpath(&all_dirs, &unit.classpath),
                properties: self.properties.clone(),
                output_file: self.report_dir.join(unit.report_file_name()),
            };
            let checker = Arc::clone(&self.checker);
            let unit = unit.clone();
            tasks.push(tokio::spawn(async move {
                debug!(unit = %unit.directory.display(), "running isolated access check");
                checker.check(&request).await?;
                let content = fs::read_to_string(&request.output_file).map_err(|e| {
                    PlugforgeError::ToolExecution {
                        unit: unit.directory.display().to_string(),
                        detail: format!(
                            "checker wrote no report at {}: {e}",
                            request.output_file.display()
                        ),
                    }
                })?;
                Ok::<ViolationReport, PlugforgeError>(ViolationReport::parse_content(unit, &content))
            }));
        }

        let mut reports = Vec::with_capacity(tasks.len());
        for task in tasks {
            let report = task.await.map_err(|e| PlugforgeError::ToolExecution {
                unit: "<scheduler>".into(),
                detail: format!("check task aborted: {e}"),
            })??;
            reports.push(report);
        }

        let offending: Vec<ViolationReport> = reports
            .iter()
            .filter(|r| !r.passed())
            .cloned()
            .collect();

        if offending.is_empty() {
            info!(units = reports.len(), "access modifier check clean");
            return Ok(reports);
        }

        if ignore_failures {
            for report in &offending {
                for violation in &report.violations {
                    warn!(
                        unit = %report.unit.directory.display(),
                        symbol = %violation.symbol,
                        reason = %violation.reason,
                        "access violation (ignored)"
                    );
                }
            }
            return Ok(reports);
        }

        Err(PlugforgeError::AccessViolation { reports: offending })
    }
}

/// Minimal classpath for one isolated run: every compilation directory plus
/// the unit's own compile classpath, deduplicated, order preserved.
fn scan_classpath(all_dirs: &[PathBuf], unit_classpath: &[PathBuf]) -> Vec<PathBuf> {
    let mut classpath = Vec::with_capacity(all_dirs.len() + unit_classpath.len());
    for path in all_dirs.iter().chain(unit_classpath) {
        if !classpath.contains(path) {
            classpath.push(path.clone());
        }
    }
    classpath
}
