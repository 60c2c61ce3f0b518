//! Validation reports
//!
//! Validation failure is a normal, fully described result, not an
//! error: every violated constraint becomes one entry, and a report
//! passes iff no entry has violation severity.

use semagraph_core::descriptor::ConstraintKind;
use serde::{Deserialize, Serialize};

/// Severity of one validation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Violation,
    Warning,
}

/// One violated or flagged constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Dotted/indexed field path, e.g. `addresses[1].state`
    pub path: String,
    pub kind: ConstraintKind,
    pub severity: Severity,
    pub message: String,
}

impl ValidationResult {
    pub fn violation<P: Into<String>, M: Into<String>>(
        path: P,
        kind: ConstraintKind,
        message: M,
    ) -> Self {
        ValidationResult {
            path: path.into(),
            kind,
            severity: Severity::Violation,
            message: message.into(),
        }
    }

    pub fn warning<P: Into<String>, M: Into<String>>(
        path: P,
        kind: ConstraintKind,
        message: M,
    ) -> Self {
        ValidationResult {
            path: path.into(),
            kind,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Ordered sequence of validation results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn new() -> Self {
        ValidationReport::default()
    }

    /// A report passes iff it carries no violation-severity entry;
    /// warnings never block
    pub fn conforms(&self) -> bool {
        !self
            .results
            .iter()
            .any(|r| r.severity == Severity::Violation)
    }

    pub fn violation_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Violation)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .count()
    }

    /// Human-readable rendering
    pub fn to_simple_string(&self) -> String {
        let mut output = format!(
            "Validation Report: {}\n",
            if self.conforms() {
                "CONFORMS"
            } else {
                "DOES NOT CONFORM"
            }
        );
        for (i, result) in self.results.iter().enumerate() {
            output.push_str(&format!(
                "Result {}: [{:?}] {} at '{}': {}\n",
                i + 1,
                result.severity,
                result.kind,
                result.path,
                result.message
            ));
        }
        output
    }
}
