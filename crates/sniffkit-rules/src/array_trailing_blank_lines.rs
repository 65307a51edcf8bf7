//! Rule to forbid blank lines before a multi-line array's closing bracket.
//!
//! ```php
//! $letters = [
//!     'a',
//!     'b',
//!
//! ];
//! ```
//!
//! The fixer removes the blank lines and keeps the closing bracket's
//! indentation.

use sniffkit_core::{Rule, RuleError, Severity, SniffContext, TokenKind, TokenMatcher};

/// Rule code for array-trailing-blank-lines.
pub const CODE: &str = "SK003";

/// Rule name for array-trailing-blank-lines.
pub const NAME: &str = "array-trailing-blank-lines";

/// Forbids blank lines before the closing bracket of a short array.
#[derive(Debug, Clone)]
pub struct ArrayTrailingBlankLines {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for ArrayTrailingBlankLines {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrayTrailingBlankLines {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Rule for ArrayTrailingBlankLines {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Forbids blank lines before a multi-line array's closing bracket"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn fixable(&self) -> bool {
        true
    }

    fn register(&self) -> &'static [TokenKind] {
        &[TokenKind::OpenShortArray]
    }

    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
        let tokens = ctx.tokens();
        let Some(closer) = tokens[index].bracket_closer else {
            return Ok(());
        };
        if tokens[closer].line == tokens[index].line {
            return Ok(());
        }

        let Some(last) =
            tokens.find_previous(TokenKind::Whitespace.negate(), closer - 1, Some(index))
        else {
            return Ok(());
        };
        // Whitespace tokens end at a newline. The first one closes the last
        // content line unless that token already ended it; every other one
        // is a blank line. Counting tokens keeps multi-line strings and
        // heredocs from inflating the count.
        let skip = usize::from(!tokens[last].content.ends_with('\n'));
        let blanks: Vec<usize> = (last + 1..closer)
            .filter(|&i| tokens[i].kind == TokenKind::Whitespace && tokens[i].has_newline())
            .skip(skip)
            .collect();
        let blank_lines = blanks.len();
        if blank_lines == 0 {
            return Ok(());
        }

        ctx.add_fixable(
            closer,
            format!(
                "Expected 0 blank lines before the array's closing bracket; {blank_lines} found"
            ),
            |fixer| {
                for &i in &blanks {
                    fixer.remove(i)?;
                }
                Ok(())
            },
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check, fix};

    #[test]
    fn test_collapses_blank_lines() {
        let src = "<?php\n$a = ['a','b','c',\n\n];\n";
        let violations = check(ArrayTrailingBlankLines::new(), src);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.line, 4);
        assert_eq!(fix(ArrayTrailingBlankLines::new(), src), "<?php\n$a = ['a','b','c',\n];\n");
    }

    #[test]
    fn test_keeps_closer_indentation() {
        let src = "<?php\nfunction f() {\n    return [\n        'a',\n\n    \n    ];\n}\n";
        insta::assert_snapshot!(fix(ArrayTrailingBlankLines::new(), src), @r"
        <?php
        function f() {
            return [
                'a',
            ];
        }
        ");
    }

    #[test]
    fn test_nested_arrays_fix_independently() {
        let src = "<?php\n$a = [\n    [\n        1,\n\n    ],\n\n];\n";
        let fixed = fix(ArrayTrailingBlankLines::new(), src);
        assert_eq!(fixed, "<?php\n$a = [\n    [\n        1,\n    ],\n];\n");
        assert!(check(ArrayTrailingBlankLines::new(), &fixed).is_empty());
    }

    #[test]
    fn test_multi_line_last_element_is_not_blank() {
        let src = "<?php\n$a = [\n    'x',\n    'multi\nline'\n];\n$b = [\n    <<<EOT\n    x\n    EOT\n];\n";
        assert!(check(ArrayTrailingBlankLines::new(), src).is_empty());

        let src = "<?php\n$b = [\n    <<<EOT\n    x\n    EOT,\n\n];\n";
        let violations = check(ArrayTrailingBlankLines::new(), src);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.ends_with("; 1 found"));
        assert_eq!(
            fix(ArrayTrailingBlankLines::new(), src),
            "<?php\n$b = [\n    <<<EOT\n    x\n    EOT,\n];\n"
        );
    }

    #[test]
    fn test_ignores_compliant_arrays() {
        let src = "<?php\n$a = [];\n$b = [1, 2];\n$c = [\n    1,\n];\n$d = $c[0];\n";
        assert!(check(ArrayTrailingBlankLines::new(), src).is_empty());
    }
}
