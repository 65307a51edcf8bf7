//! Check command implementation.

use anyhow::{Context, Result};
use sniffkit_core::{Analyzer, Config, LintResult, RuleBox};
use sniffkit_rules::{all_rules, rule_by_name, rules_from_config};
use std::path::Path;

use crate::project::Project;
use crate::OutputFormat;

/// Options of the check command.
#[derive(Debug)]
pub struct CheckOptions {
    /// Apply fixes and write the patched files.
    pub fix: bool,
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule names or codes.
    pub rules_filter: Option<String>,
    /// Extra exclude patterns.
    pub exclude: Vec<String>,
}

/// Runs the check command.
///
/// Returns `false` when unfixed violations at or above the configured
/// `fail_on` severity remain, or a rule failed.
pub fn run(path: &Path, options: &CheckOptions, project: &Project) -> Result<bool> {
    let config = project.load_config()?;
    let fail_on = config.analyzer.fail_on;

    let rules = match &options.rules_filter {
        Some(filter) => {
            let names: Vec<&str> = filter.split(',').map(str::trim).collect();
            filter_rules(&names, &config)
        }
        None => rules_from_config(&config),
    };

    let mut builder = Analyzer::builder()
        .root(path)
        .config(config)
        .fix(options.fix)
        .excludes(options.exclude.iter().cloned());
    for rule in rules {
        builder = builder.rule_box(rule);
    }

    let analyzer = builder.build().context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {:?} with {} rules{}",
        path,
        analyzer.rule_count(),
        if options.fix { " (fixing)" } else { "" }
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    if options.fix {
        write_fixes(&result)?;
    }
    for outcome in result.unconverged() {
        tracing::warn!(
            "Fixes for {} did not converge after {} passes",
            outcome.file.display(),
            outcome.passes
        );
    }
    for failure in &result.rule_errors {
        tracing::error!(
            "Rule {} [{}] failed on {}: {}",
            failure.rule,
            failure.code,
            failure.file.display(),
            failure.message
        );
    }

    super::output::print(&result, options.format)?;

    Ok(!result.has_violations_at(fail_on) && result.rule_errors.is_empty())
}

fn write_fixes(result: &LintResult) -> Result<()> {
    for outcome in &result.files {
        let Some(fixed) = &outcome.fixed_source else {
            continue;
        };
        std::fs::write(&outcome.file, fixed)
            .with_context(|| format!("Failed to write {}", outcome.file.display()))?;
        tracing::debug!(
            "Wrote {} after {} fix pass(es)",
            outcome.file.display(),
            outcome.passes
        );
    }
    Ok(())
}

/// Builds the rules named (or coded) in `names`, with their configured
/// options.
fn filter_rules(names: &[&str], config: &Config) -> Vec<RuleBox> {
    let known = all_rules();
    let mut rules: Vec<RuleBox> = Vec::new();

    for name in names {
        let resolved = known
            .iter()
            .find(|r| r.name() == *name || r.code().eq_ignore_ascii_case(name))
            .map(|r| r.name());
        match resolved.and_then(|n| rule_by_name(n, config.rule_config(n))) {
            Some(rule) => rules.push(rule),
            None => tracing::warn!("Unknown rule: {}", name),
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(fix: bool) -> CheckOptions {
        CheckOptions {
            fix,
            format: OutputFormat::Compact,
            rules_filter: Some("cast-spacing,SK001".to_string()),
            exclude: Vec::new(),
        }
    }

    #[test]
    fn filter_accepts_names_and_codes() {
        let rules = filter_rules(&["cast-spacing", "sk004", "nope"], &Config::default());
        let names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["cast-spacing", "enum-case-pascal-case"]);
    }

    #[test]
    fn fix_writes_patched_files() {
        let dir = tempfile::Builder::new().prefix("sniffkit").tempdir().unwrap();
        let file = dir.path().join("a.php");
        std::fs::write(&file, "<?php\n$a = (int)$b;\n").unwrap();

        let project = Project::discover_with(dir.path(), None, None);
        let passed = run(dir.path(), &options(false), &project).unwrap();
        assert!(!passed);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "<?php\n$a = (int)$b;\n");

        let passed = run(dir.path(), &options(true), &project).unwrap();
        assert!(passed);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "<?php\n$a = (int) $b;\n");
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let project = Project::discover_with(dir.path(), Some(&missing), None);
        assert!(run(dir.path(), &options(false), &project).is_err());
    }
}
