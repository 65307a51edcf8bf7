//! Shared output formatting for lint results.

use anyhow::Result;
use sniffkit_core::{LintResult, Severity, Violation, ViolationDiagnostic};
use std::collections::HashMap;
use std::path::Path;

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
        OutputFormat::Pretty => print_pretty(result),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    let (errors, warnings, infos) = result.count_by_severity();

    for violation in result.unfixed() {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!(
            "{} {} at {}:{}:{}",
            violation.code,
            violation.rule,
            violation.location.file.display(),
            violation.location.line,
            violation.location.column,
        );
        println!("  {}: {}", severity_indicator, violation.message);
        if violation.fixable {
            println!("  = fixable with --fix");
        }
        if let Some(suggestion) = &violation.suggestion {
            println!("  = help: {}", suggestion.message);
        }
        println!();
    }

    print_summary(result, errors, warnings, infos);
}

fn print_summary(result: &LintResult, errors: usize, warnings: usize, infos: usize) {
    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} file(s); {} fixed\x1b[0m",
        summary_color,
        errors,
        warnings,
        infos,
        result.files_checked,
        result.fixed_count()
    );
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for violation in &result.violations {
        println!("{violation}");
    }
}

fn print_pretty(result: &LintResult) {
    let fixed: HashMap<&Path, &str> = result
        .files
        .iter()
        .filter_map(|f| Some((f.file.as_path(), f.fixed_source.as_deref()?)))
        .collect();
    let mut sources: HashMap<&Path, String> = HashMap::new();

    for violation in result.unfixed() {
        let file = violation.location.file.as_path();
        let source = sources.entry(file).or_insert_with(|| {
            fixed
                .get(file)
                .map(|s| (*s).to_string())
                .or_else(|| std::fs::read_to_string(file).ok())
                .unwrap_or_default()
        });
        print_diagnostic(violation, source);
    }

    let (errors, warnings, infos) = result.count_by_severity();
    print_summary(result, errors, warnings, infos);
}

fn print_diagnostic(violation: &Violation, source: &str) {
    let report = miette::Report::new(ViolationDiagnostic::new(violation, source));
    println!("{report:?}");
}
