//! Context types for rule execution.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fixer::Fixer;
use crate::rule::RuleError;
use crate::token::Tokens;
use crate::types::{Location, Severity, Suggestion, Violation};
use crate::utils::allowance::check_allow_with_reason;

/// Metadata about the file being analyzed.
///
/// Rebuilt for every pass, since `content` changes when fixes commit.
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    /// Path to the file.
    pub path: &'a Path,
    /// File contents for the current pass.
    pub content: &'a str,
    /// Whether this file is detected as a test file.
    pub is_test: bool,
    /// Path relative to the project root.
    pub relative_path: PathBuf,
}

impl<'a> FileContext<'a> {
    /// Creates a new file context.
    #[must_use]
    pub fn new(path: &'a Path, content: &'a str, root: &Path) -> Self {
        let is_test = Self::detect_test_file(path);
        let relative_path = path
            .strip_prefix(root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf);

        Self {
            path,
            content,
            is_test,
            relative_path,
        }
    }

    /// Detects if a file is a test file based on path conventions.
    fn detect_test_file(path: &Path) -> bool {
        for component in path.components() {
            if let std::path::Component::Normal(s) = component {
                let s = s.to_string_lossy();
                if s == "tests" || s == "test" || s == "Tests" {
                    return true;
                }
            }
        }

        path.file_stem()
            .and_then(|n| n.to_str())
            .is_some_and(|stem| stem.ends_with("Test") || stem.ends_with("TestCase"))
    }

    /// Calculates byte offset for a given line and column.
    ///
    /// `column` counts characters, matching token columns.
    /// Returns the end of the content when out of bounds.
    #[must_use]
    pub fn offset_for(&self, line: usize, column: usize) -> usize {
        if line == 0 {
            return 0;
        }

        let mut offset = 0;
        for (i, line_content) in self.content.split_inclusive('\n').enumerate() {
            if i + 1 == line {
                let within = line_content
                    .char_indices()
                    .nth(column.saturating_sub(1))
                    .map_or(line_content.len(), |(b, _)| b);
                return offset + within;
            }
            offset += line_content.len();
        }

        offset
    }
}

/// Identity of the rule currently being invoked.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActiveRule {
    pub(crate) name: &'static str,
    pub(crate) code: &'static str,
    pub(crate) severity: Severity,
}

/// Everything a rule invocation may read or change.
///
/// Tokens and file metadata are borrowed read-only; the only way to change
/// the file is through the [`Fixer`].
pub struct SniffContext<'a> {
    tokens: &'a Tokens,
    file: &'a FileContext<'a>,
    fixer: &'a mut Fixer,
    rule: ActiveRule,
    violations: Vec<Violation>,
}

impl<'a> SniffContext<'a> {
    /// Creates a context for one pass over a file.
    #[must_use]
    pub fn new(tokens: &'a Tokens, file: &'a FileContext<'a>, fixer: &'a mut Fixer) -> Self {
        Self {
            tokens,
            file,
            fixer,
            rule: ActiveRule {
                name: "",
                code: "",
                severity: Severity::Error,
            },
            violations: Vec::new(),
        }
    }

    /// The token sequence of this pass.
    #[must_use]
    pub fn tokens(&self) -> &'a Tokens {
        self.tokens
    }

    /// Metadata about the file.
    #[must_use]
    pub fn file(&self) -> &'a FileContext<'a> {
        self.file
    }

    /// The pass's edit buffer.
    pub fn fixer(&mut self) -> &mut Fixer {
        &mut *self.fixer
    }

    /// Returns true when fixes are being applied.
    #[must_use]
    pub fn is_fixing(&self) -> bool {
        self.fixer.is_enabled()
    }

    /// Location of the token at `index`.
    #[must_use]
    pub fn location(&self, index: usize) -> Location {
        let Some(token) = self.tokens.get(index) else {
            return Location::new(self.file.path.to_path_buf(), 0, 0);
        };
        let offset = self.file.offset_for(token.line, token.column);
        let length = token.content.trim_end().len();
        Location::new(self.file.path.to_path_buf(), token.line, token.column)
            .with_span(offset, length)
    }

    /// Reports a violation with no mechanical fix.
    ///
    /// Returns false when an allow directive suppressed the report.
    pub fn add_error(&mut self, index: usize, message: impl Into<String>) -> bool {
        self.push(index, message.into(), false, None).is_some()
    }

    /// Reports a violation with no mechanical fix and a hint for the user.
    pub fn add_error_with_help(
        &mut self,
        index: usize,
        message: impl Into<String>,
        help: impl Into<String>,
    ) -> bool {
        self.push(index, message.into(), false, Some(Suggestion::new(help)))
            .is_some()
    }

    /// Reports a fixable violation and, when fixing, runs `fix` inside a
    /// changeset.
    ///
    /// Returns `Ok(true)` only when the changeset committed. In report mode,
    /// for suppressed reports and for changesets discarded because they
    /// overlap an earlier fix, `fix` leaves no trace and `Ok(false)` is
    /// returned.
    ///
    /// # Errors
    ///
    /// Propagates errors from `fix`; its changeset is rolled back first.
    pub fn add_fixable<F>(
        &mut self,
        index: usize,
        message: impl Into<String>,
        fix: F,
    ) -> Result<bool, RuleError>
    where
        F: FnOnce(&mut Fixer) -> Result<(), RuleError>,
    {
        let Some(slot) = self.push(index, message.into(), true, None) else {
            return Ok(false);
        };
        if !self.fixer.is_enabled() {
            return Ok(false);
        }

        let committed = self.fixer.changeset(fix)?;
        self.violations[slot].fixed = committed;
        Ok(committed)
    }

    pub(crate) fn set_rule(&mut self, rule: ActiveRule) {
        self.rule = rule;
    }

    pub(crate) fn take_violations(&mut self) -> Vec<Violation> {
        std::mem::take(&mut self.violations)
    }

    pub(crate) fn push_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    fn push(
        &mut self,
        index: usize,
        message: String,
        fixable: bool,
        suggestion: Option<Suggestion>,
    ) -> Option<usize> {
        let location = self.location(index);
        let allow = check_allow_with_reason(
            self.file.content,
            location.line,
            &[self.rule.name, self.rule.code],
        );
        if allow.is_allowed() {
            debug!(
                rule = self.rule.name,
                line = location.line,
                reason = allow.reason().unwrap_or(""),
                "Suppressed by allow directive"
            );
            return None;
        }

        let mut violation = Violation::new(
            self.rule.code,
            self.rule.name,
            self.rule.severity,
            location,
            message,
        );
        violation.fixable = fixable;
        violation.suggestion = suggestion;
        self.violations.push(violation);
        Some(self.violations.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> ActiveRule {
        ActiveRule {
            name: "cast-spacing",
            code: "SK006",
            severity: Severity::Warning,
        }
    }

    #[test]
    fn test_detect_test_file() {
        assert!(FileContext::detect_test_file(Path::new("tests/Unit/FooTest.php")));
        assert!(FileContext::detect_test_file(Path::new("src/FooTest.php")));
        assert!(!FileContext::detect_test_file(Path::new("src/Foo.php")));
        assert!(!FileContext::detect_test_file(Path::new("src/Testing.php")));
    }

    #[test]
    fn test_offset_calculation() {
        let ctx = FileContext::new(Path::new("a.php"), "line1\nline2\nline3", Path::new("."));
        assert_eq!(ctx.offset_for(1, 1), 0);
        assert_eq!(ctx.offset_for(2, 1), 6);
        assert_eq!(ctx.offset_for(2, 3), 8);

        let ctx = FileContext::new(Path::new("a.php"), "é = 1\nx", Path::new("."));
        assert_eq!(ctx.offset_for(1, 2), 2);
        assert_eq!(ctx.offset_for(2, 1), 7);
    }

    #[test]
    fn test_relative_path() {
        let ctx = FileContext::new(Path::new("/proj/src/A.php"), "", Path::new("/proj"));
        assert_eq!(ctx.relative_path, PathBuf::from("src/A.php"));
    }

    #[test]
    fn test_add_fixable_commits_and_marks_fixed() {
        let src = "<?php\n$a = (int)$b;\n";
        let tokens = Tokens::tokenize(src);
        let file = FileContext::new(Path::new("a.php"), src, Path::new("."));
        let mut fixer = Fixer::new(&tokens, true);
        let mut ctx = SniffContext::new(&tokens, &file, &mut fixer);
        ctx.set_rule(active());

        let cast = tokens
            .find_next(crate::token::TokenKind::Cast, 0, None)
            .unwrap();
        let committed = ctx
            .add_fixable(cast, "Expected 1 space after cast", |f| {
                f.insert_after(cast, " ")?;
                Ok(())
            })
            .unwrap();
        assert!(committed);

        let violations = ctx.take_violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].fixable);
        assert!(violations[0].fixed);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert_eq!(violations[0].location.line, 2);
        assert_eq!(violations[0].location.offset, 11);
        assert_eq!(fixer.contents(), "<?php\n$a = (int) $b;\n");
    }

    #[test]
    fn test_report_mode_does_not_run_fix() {
        let src = "<?php\n$a = (int)$b;\n";
        let tokens = Tokens::tokenize(src);
        let file = FileContext::new(Path::new("a.php"), src, Path::new("."));
        let mut fixer = Fixer::new(&tokens, false);
        let mut ctx = SniffContext::new(&tokens, &file, &mut fixer);
        ctx.set_rule(active());

        let mut ran = false;
        let committed = ctx
            .add_fixable(1, "msg", |_| {
                ran = true;
                Ok(())
            })
            .unwrap();
        assert!(!committed);
        assert!(!ran);
        assert_eq!(ctx.take_violations().len(), 1);
    }

    #[test]
    fn test_allow_directive_suppresses() {
        let src = "<?php\n// sniffkit: allow(SK006)\n$a = (int)$b;\n";
        let tokens = Tokens::tokenize(src);
        let file = FileContext::new(Path::new("a.php"), src, Path::new("."));
        let mut fixer = Fixer::new(&tokens, true);
        let mut ctx = SniffContext::new(&tokens, &file, &mut fixer);
        ctx.set_rule(active());

        let cast = tokens
            .find_next(crate::token::TokenKind::Cast, 0, None)
            .unwrap();
        assert!(!ctx.add_error(cast, "suppressed"));
        assert!(!ctx
            .add_fixable(cast, "suppressed", |f| Ok(f.remove(cast)?))
            .unwrap());
        assert!(ctx.take_violations().is_empty());
        assert_eq!(fixer.contents(), src);
    }
}
