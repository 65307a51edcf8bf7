//! Core types for lint violations and results.

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for lint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in file (for miette integration).
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }
}

/// A suggested fix for a violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Human-readable description of the fix.
    pub message: String,
}

impl Suggestion {
    /// Creates a new suggestion.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A lint violation found during analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code (e.g., "SK001").
    pub code: String,
    /// Rule name (e.g., "doc-nullable-type").
    pub rule: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Primary location of the violation.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// A mechanical fix exists for this violation.
    #[serde(default)]
    pub fixable: bool,
    /// The fix was applied.
    #[serde(default)]
    pub fixed: bool,
    /// Optional suggestion for fixing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            location,
            message: message.into(),
            fixable: false,
            fixed: false,
            suggestion: None,
        }
    }

    /// Marks this violation as fixable.
    #[must_use]
    pub fn mark_fixable(mut self) -> Self {
        self.fixable = true;
        self
    }

    /// Adds a suggestion to this violation.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.code,
            self.rule,
            self.location.file.display(),
            self.location.line,
            self.location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if self.fixed {
            let _ = writeln!(output, "  = fixed");
        } else if self.fixable {
            let _ = writeln!(output, "  = fixable with --fix");
        }
        if let Some(suggestion) = &self.suggestion {
            let _ = writeln!(output, "  = help: {}", suggestion.message);
        }
        output
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.code,
            self.message
        )?;
        if self.fixed {
            write!(f, " (fixed)")?;
        } else if self.fixable {
            write!(f, " (fixable)")?;
        }
        Ok(())
    }
}

/// A violation rendered with its source snippet by `miette`.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ViolationDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[source_code]
    source_code: NamedSource<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl ViolationDiagnostic {
    /// Builds a diagnostic for `violation` against the file's `source`.
    #[must_use]
    pub fn new(violation: &Violation, source: impl Into<String>) -> Self {
        let source = source.into();
        let offset = violation.location.offset.min(source.len());
        let length = violation
            .location
            .length
            .min(source.len().saturating_sub(offset));
        Self {
            message: format!("[{}] {}", violation.code, violation.message),
            help: violation.suggestion.as_ref().map(|s| s.message.clone()),
            source_code: NamedSource::new(violation.location.file.display().to_string(), source),
            span: SourceSpan::from((offset, length)),
            label_message: violation.rule.clone(),
        }
    }
}

/// Why a rule failed outside of normal reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleFailureKind {
    /// Configuration problem; the rule was disabled for the rest of the run.
    Config,
    /// Internal invariant; only the failing invocation was skipped.
    Invariant,
}

/// A rule failure, recorded once per rule and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    /// Rule name.
    pub rule: String,
    /// Rule code.
    pub code: String,
    /// Failure class.
    pub kind: RuleFailureKind,
    /// Error message.
    pub message: String,
    /// File being analyzed when the failure first occurred.
    pub file: PathBuf,
}

/// Fix outcome for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileOutcome {
    /// File path.
    pub file: PathBuf,
    /// Fix passes that committed at least one changeset.
    pub passes: usize,
    /// A fix pass committed nothing before the pass ceiling was reached.
    pub converged: bool,
    /// Patched source, present when at least one fix was applied.
    #[serde(skip)]
    pub fixed_source: Option<String>,
}

/// Result of running lint analysis.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All violations found, fixed ones included.
    pub violations: Vec<Violation>,
    /// Number of files checked.
    pub files_checked: usize,
    /// Per-file fix outcomes.
    #[serde(default)]
    pub files: Vec<FileOutcome>,
    /// Rules that failed with a configuration or invariant error.
    #[serde(default)]
    pub rule_errors: Vec<RuleFailure>,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Violations that remain after fixing.
    pub fn unfixed(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.fixed)
    }

    /// Number of applied fixes.
    #[must_use]
    pub fn fixed_count(&self) -> usize {
        self.violations.iter().filter(|v| v.fixed).count()
    }

    /// Returns true if there are any unfixed errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_violations_at(Severity::Error)
    }

    /// Counts unfixed violations by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |severity| self.unfixed().filter(|v| v.severity == severity).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Checks if any unfixed violations meet or exceed the given severity.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.unfixed().any(|v| v.severity >= severity)
    }

    /// Files whose fix loop hit the pass ceiling.
    pub fn unconverged(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.converged)
    }

    /// Formats unfixed violations as a multi-line report.
    ///
    /// Suitable for `panic!()` messages in tests.
    #[must_use]
    pub fn format_test_report(&self, fail_on: Severity) -> String {
        use std::fmt::Write;

        let failing: Vec<&Violation> = self.unfixed().filter(|v| v.severity >= fail_on).collect();

        let mut report = String::new();
        let _ = writeln!(
            report,
            "\n=== sniffkit: {} violation(s) ===\n",
            failing.len()
        );

        for v in &failing {
            let _ = writeln!(
                report,
                "{} [{}] at {}:{}:{}",
                v.rule,
                v.code,
                v.location.file.display(),
                v.location.line,
                v.location.column,
            );
            let _ = writeln!(report, "  {}: {}", v.severity, v.message);
            if let Some(suggestion) = &v.suggestion {
                let _ = writeln!(report, "  = help: {}", suggestion.message);
            }
            let _ = writeln!(report);
        }

        for failure in &self.rule_errors {
            let _ = writeln!(
                report,
                "rule {} [{}] failed: {}",
                failure.rule, failure.code, failure.message
            );
        }

        let (errors, warnings, infos) = self.count_by_severity();
        let _ = writeln!(
            report,
            "Total: {} error(s), {} warning(s), {} info(s) in {} file(s), {} fixed",
            errors,
            warnings,
            infos,
            self.files_checked,
            self.fixed_count()
        );

        report
    }

    /// Records a rule failure unless the same rule already failed with the
    /// same message. Returns true when the failure is new.
    pub fn record_rule_error(&mut self, failure: RuleFailure) -> bool {
        let seen = self
            .rule_errors
            .iter()
            .any(|f| f.rule == failure.rule && f.message == failure.message);
        if !seen {
            self.rule_errors.push(failure);
        }
        !seen
    }

    /// Adds violations and outcomes from another result.
    pub fn extend(&mut self, other: Self) {
        self.violations.extend(other.violations);
        self.files_checked += other.files_checked;
        self.files.extend(other.files);
        for failure in other.rule_errors {
            let _ = self.record_rule_error(failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(severity: Severity) -> Violation {
        Violation::new(
            "SK006",
            "cast-spacing",
            severity,
            Location::new(PathBuf::from("src/Foo.php"), 42, 10),
            "Expected 1 space after cast, found 0",
        )
    }

    #[test]
    fn violation_display_marks_fix_state() {
        let v = make_violation(Severity::Error);
        assert!(!format!("{v}").contains("fix"));
        let v = v.mark_fixable();
        assert!(format!("{v}").ends_with("(fixable)"));
        let mut v = v;
        v.fixed = true;
        assert!(format!("{v}").ends_with("(fixed)"));
        assert!(v.format().contains("= fixed"));
    }

    #[test]
    fn fixed_violations_do_not_fail() {
        let mut result = LintResult::new();
        let mut fixed = make_violation(Severity::Error).mark_fixable();
        fixed.fixed = true;
        result.violations.push(fixed);
        result.violations.push(make_violation(Severity::Warning));

        assert!(!result.has_errors());
        assert!(result.has_violations_at(Severity::Warning));
        assert_eq!(result.count_by_severity(), (0, 1, 0));
        assert_eq!(result.fixed_count(), 1);
    }

    #[test]
    fn format_test_report_filters_by_severity() {
        let mut result = LintResult::new();
        result.files_checked = 5;
        result.violations.push(make_violation(Severity::Warning));
        result.violations.push(
            make_violation(Severity::Error).with_suggestion(Suggestion::new("Add a space")),
        );

        let report = result.format_test_report(Severity::Error);
        assert!(report.contains("1 violation(s)"));
        assert!(report.contains("1 error(s)"));
        assert!(report.contains("1 warning(s)"));
        assert!(report.contains("= help: Add a space"));
    }

    #[test]
    fn rule_errors_are_recorded_once() {
        let failure = RuleFailure {
            rule: "psr4-autoload-consistency".into(),
            code: "SK007".into(),
            kind: RuleFailureKind::Config,
            message: "composer.json not found".into(),
            file: PathBuf::from("a.php"),
        };
        let mut result = LintResult::new();
        assert!(result.record_rule_error(failure.clone()));
        assert!(!result.record_rule_error(RuleFailure {
            file: PathBuf::from("b.php"),
            ..failure
        }));
        assert_eq!(result.rule_errors.len(), 1);
    }

    #[test]
    fn diagnostic_clamps_span() {
        let v = make_violation(Severity::Error);
        let v = Violation {
            location: v.location.clone().with_span(100, 5),
            ..v
        };
        let diagnostic = ViolationDiagnostic::new(&v, "<?php\n");
        assert_eq!(diagnostic.span, SourceSpan::from((6, 0)));
    }
}
