//! Compilation units and their violation reports.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Fallback directory name when a unit has no usable file or parent name.
const FALLBACK_DIR_NAME: &str = "classes";

/// One compiled-output directory to be verified, with its own compile
/// classpath. The set of units is immutable for a build invocation; units
/// are read-only views shared with the verifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompilationUnit {
    /// The compiled-output directory.
    pub directory: PathBuf,

    /// The unit's own compile classpath.
    pub classpath: Vec<PathBuf>,
}

impl CompilationUnit {
    /// Unit for a directory with an empty classpath.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            classpath: Vec::new(),
        }
    }

    /// Deterministic report artifact name: `{dir_name}-{parent_name}.txt`.
    ///
    /// The parent name disambiguates units sharing a simple name (e.g.
    /// `classes/java/main` vs `classes/groovy/main`).
    pub fn report_file_name(&self) -> String {
        let dir_name = self
            .directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_DIR_NAME.to_string());
        let parent_name = self
            .directory
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_DIR_NAME.to_string());
        format!("{dir_name}-{parent_name}.txt")
    }
}

/// One access violation found in a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    /// The referenced restricted symbol.
    pub symbol: String,

    /// Why the reference is illegal.
    pub reason: String,
}

/// Per-unit check lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Running,
    Passed,
    Violated,
}

/// Aggregate outcome over all units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerifyOutcome {
    AllClean,
    SomeViolated,
}

/// Result of one unit's isolated check. Empty violations means the unit
/// passed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViolationReport {
    /// The unit that was checked.
    pub unit: CompilationUnit,

    /// Violations in report order.
    pub violations: Vec<Violation>,
}

impl ViolationReport {
    /// Whether the unit passed.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Terminal state of this unit's check.
    pub fn state(&self) -> UnitState {
        if self.passed() {
            UnitState::Passed
        } else {
            UnitState::Violated
        }
    }

    /// Render the report artifact content: one `symbol: reason` line per
    /// violation, empty content for a clean unit.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for violation in &self.violations {
            out.push_str(&violation.symbol);
            out.push_str(": ");
            out.push_str(&violation.reason);
            out.push('\n');
        }
        out
    }

    /// Parse report artifact content back into a report for the given unit.
    pub fn parse_content(unit: CompilationUnit, content: &str) -> Self {
        let violations = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let (symbol, reason) = line.split_once(": ").unwrap_or((line, ""));
                Violation {
                    symbol: symbol.to_string(),
                    reason: reason.to_string(),
                }
            })
            .collect();
        Self { unit, violations }
    }

    /// Aggregate outcome over a set of reports.
    pub fn outcome(reports: &[ViolationReport]) -> VerifyOutcome {
        if reports.iter().all(ViolationReport::passed) {
            VerifyOutcome::AllClean
        } else {
            VerifyOutcome::SomeViolated
        }
    }
}
