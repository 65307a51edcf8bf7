//! Rule to disallow Yoda comparisons.
//!
//! # Detected Patterns
//!
//! ```php
//! if (null === $user) { ... }
//! return 'admin' == $role;
//! $full = self::LIMIT === $count;
//! ```
//!
//! # Good Patterns
//!
//! ```php
//! if ($user === null) { ... }
//! return $role == 'admin';
//! $full = $count === self::LIMIT;
//! ```
//!
//! The operands are swapped only when the right-hand side is a plain
//! variable, property or constant access. A call or any other expression
//! there is reported without a fix.

use sniffkit_core::locator::find_statement_bounds;
use sniffkit_core::{Rule, RuleError, Severity, SniffContext, TokenKind, Tokens};

/// Rule code for disallow-yoda-comparison.
pub const CODE: &str = "SK009";

/// Rule name for disallow-yoda-comparison.
pub const NAME: &str = "disallow-yoda-comparison";

/// Disallows comparisons with a literal or constant on the left.
#[derive(Debug, Clone)]
pub struct DisallowYodaComparison {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for DisallowYodaComparison {
    fn default() -> Self {
        Self::new()
    }
}

impl DisallowYodaComparison {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Tokens after which a new comparison operand starts.
const OPERAND_BOUNDARY: &[TokenKind] = &[
    TokenKind::OpenParenthesis,
    TokenKind::OpenSquareBracket,
    TokenKind::OpenShortArray,
    TokenKind::OpenCurlyBracket,
    TokenKind::BooleanAnd,
    TokenKind::BooleanOr,
    TokenKind::LogicalAnd,
    TokenKind::LogicalOr,
    TokenKind::LogicalXor,
    TokenKind::Equal,
    TokenKind::Return,
    TokenKind::Comma,
    TokenKind::InlineThen,
    TokenKind::Colon,
    TokenKind::DoubleArrow,
    TokenKind::Semicolon,
    TokenKind::OpenTag,
];

/// Tokens that end the right operand at nesting depth zero.
const OPERAND_END: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::Comma,
    TokenKind::CloseTag,
    TokenKind::BooleanAnd,
    TokenKind::BooleanOr,
    TokenKind::LogicalAnd,
    TokenKind::LogicalOr,
    TokenKind::LogicalXor,
    TokenKind::InlineThen,
    TokenKind::Colon,
    TokenKind::DoubleArrow,
];

fn is_constant_like(tokens: &Tokens, index: usize) -> bool {
    let token = &tokens[index];
    match token.kind {
        kind if kind.is_literal() => true,
        TokenKind::String => {
            let name = token.content.trim_start_matches('\\');
            let last = name.rsplit('\\').next().unwrap_or(name);
            last.chars().any(|c| c.is_ascii_uppercase())
                && last
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    }
}

/// First token of the constant operand ending at `end`, if it is one.
///
/// A class constant fetch such as `self::LIMIT` or `\App\Flag::ON` starts
/// at its class name.
fn constant_operand_start(tokens: &Tokens, end: usize) -> Option<usize> {
    match tokens[end].kind {
        TokenKind::CloseShortArray => tokens[end].bracket_opener,
        TokenKind::String if is_constant_like(tokens, end) => {
            let class = tokens
                .previous_effective(end)
                .filter(|&p| tokens[p].kind == TokenKind::DoubleColon)
                .and_then(|p| tokens.previous_effective(p))
                .filter(|&c| matches!(tokens[c].kind, TokenKind::String | TokenKind::Static));
            Some(class.unwrap_or(end))
        }
        _ if is_constant_like(tokens, end) => Some(end),
        _ => None,
    }
}

/// Last effective token of the operand starting after `operator`.
fn right_operand_end(tokens: &Tokens, operator: usize, limit: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut last = None;
    for i in operator + 1..=limit.min(tokens.len().saturating_sub(1)) {
        let kind = tokens[i].kind;
        if kind.is_empty() {
            continue;
        }
        if kind.is_opener() {
            depth += 1;
        } else if kind.is_closer() {
            if depth == 0 {
                break;
            }
            depth -= 1;
        } else if depth == 0 && (OPERAND_END.contains(&kind) || kind.is_equality()) {
            break;
        }
        last = Some(i);
    }
    last
}

/// Whether swapping the operand at `start..=end` keeps evaluation order and
/// meaning.
fn is_swappable(tokens: &Tokens, start: usize, end: usize) -> bool {
    (start..=end).all(|i| match tokens[i].kind {
        TokenKind::Variable
        | TokenKind::ObjectOperator
        | TokenKind::DoubleColon
        | TokenKind::OpenSquareBracket
        | TokenKind::CloseSquareBracket => true,
        TokenKind::String => tokens
            .next_effective(i)
            .map_or(true, |n| tokens[n].kind != TokenKind::OpenParenthesis),
        kind => kind.is_literal() || kind.is_whitespace(),
    })
}

impl Rule for DisallowYodaComparison {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Disallows comparisons with a literal or constant on the left"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn fixable(&self) -> bool {
        true
    }

    fn register(&self) -> &'static [TokenKind] {
        &[
            TokenKind::IsEqual,
            TokenKind::IsNotEqual,
            TokenKind::IsIdentical,
            TokenKind::IsNotIdentical,
        ]
    }

    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
        let tokens = ctx.tokens();
        let Some(left_end) = tokens.previous_effective(index) else {
            return Ok(());
        };
        let Some(left_start) = constant_operand_start(tokens, left_end) else {
            return Ok(());
        };

        let bounds = find_statement_bounds(tokens, index);
        let starts_operand = left_start <= bounds.start
            || tokens
                .previous_effective(left_start)
                .map_or(true, |p| OPERAND_BOUNDARY.contains(&tokens[p].kind));
        if !starts_operand {
            return Ok(());
        }

        let Some(right_start) = tokens.next_effective(index) else {
            return Ok(());
        };
        let Some(right_end) = right_operand_end(tokens, index, bounds.end) else {
            return Ok(());
        };
        if constant_operand_start(tokens, right_end) == Some(right_start) {
            return Ok(());
        }

        let message = format!(
            "Yoda comparison: move \"{}\" to the right of \"{}\"",
            tokens.content_between(left_start, left_end),
            tokens.content(index)
        );

        if !is_swappable(tokens, right_start, right_end) {
            ctx.add_error_with_help(
                left_start,
                message,
                "Swap the operands by hand; the right side is not a plain value",
            );
            return Ok(());
        }

        let left = tokens.content_between(left_start, left_end);
        let right = tokens.content_between(right_start, right_end);
        ctx.add_fixable(left_start, message, |fixer| {
            fixer.replace(left_start, right)?;
            for i in left_start + 1..=left_end {
                fixer.remove(i)?;
            }
            fixer.replace(right_start, left)?;
            for i in right_start + 1..=right_end {
                fixer.remove(i)?;
            }
            Ok(())
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check, fix};

    #[test]
    fn test_swaps_simple_operands() {
        let src = "<?php\nif (null === $user) {}\nreturn 'admin' == $this->role;\n";
        insta::assert_snapshot!(fix(DisallowYodaComparison::new(), src), @r"
        <?php
        if ($user === null) {}
        return $this->role == 'admin';
        ");
    }

    #[test]
    fn test_constant_and_array_operands() {
        let src = "<?php\n$b = PHP_EOL === $c[0];\n$d = [] === $list;\n";
        let fixed = fix(DisallowYodaComparison::new(), src);
        assert_eq!(fixed, "<?php\n$b = $c[0] === PHP_EOL;\n$d = $list === [];\n");
        assert!(check(DisallowYodaComparison::new(), &fixed).is_empty());
    }

    #[test]
    fn test_class_constant_operands() {
        let src = "<?php\n$a = self::LIMIT !== $n;\nif (\\App\\Flag::ON == $flag->value) {}\n";
        let violations = check(DisallowYodaComparison::new(), src);
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations[0].message,
            "Yoda comparison: move \"self::LIMIT\" to the right of \"!==\""
        );
        assert_eq!(violations[0].location.column, 6);

        let fixed = fix(DisallowYodaComparison::new(), src);
        assert_eq!(
            fixed,
            "<?php\n$a = $n !== self::LIMIT;\nif ($flag->value == \\App\\Flag::ON) {}\n"
        );
        assert!(check(DisallowYodaComparison::new(), &fixed).is_empty());
    }

    #[test]
    fn test_constant_against_constant_passes() {
        let src = "<?php\n$a = 1 === static::MAX;\n$b = Mode::ON !== [];\n";
        assert!(check(DisallowYodaComparison::new(), src).is_empty());
    }

    #[test]
    fn test_call_on_the_right_is_unfixable() {
        let src = "<?php\nif (0 === count($items)) {}\n";
        let violations = check(DisallowYodaComparison::new(), src);
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].fixable);
        assert_eq!(fix(DisallowYodaComparison::new(), src), src);
    }

    #[test]
    fn test_normal_comparisons_pass() {
        let src = "<?php\nif ($a === null && $b == 1) {}\n$x = $a + 1 === 2;\n$y = 1 === 2;\n";
        assert!(check(DisallowYodaComparison::new(), src).is_empty());
    }

    #[test]
    fn test_stops_at_logical_operators() {
        let src = "<?php\nif (1 === $a && $b) {}\n";
        assert_eq!(
            fix(DisallowYodaComparison::new(), src),
            "<?php\nif ($a === 1 && $b) {}\n"
        );
    }
}
