//! Helpers for rule unit tests.

use sniffkit_core::{Analyzer, LintResult, Rule, Violation};

fn run(rule: impl Rule + 'static, src: &str, fix: bool) -> LintResult {
    Analyzer::builder()
        .root(".")
        .rule(rule)
        .fix(fix)
        .build()
        .expect("Failed to build analyzer")
        .analyze_source("test.php", src)
}

/// Violations reported in report mode.
pub fn check(rule: impl Rule + 'static, src: &str) -> Vec<Violation> {
    run(rule, src, false).violations
}

/// Source after fixing; the input itself when nothing was fixed.
pub fn fix(rule: impl Rule + 'static, src: &str) -> String {
    run(rule, src, true).files[0]
        .fixed_source
        .clone()
        .unwrap_or_else(|| src.to_string())
}
