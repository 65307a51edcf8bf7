//! Rule to expand nullable shorthand in doc-comment types.
//!
//! # Detected Patterns
//!
//! ```php
//! /** @var ?string */
//! private $name;
//! ```
//!
//! # Fixed To
//!
//! ```php
//! /** @var string|null */
//! private $name;
//! ```

use sniffkit_core::doc::DocBlock;
use sniffkit_core::{Rule, RuleError, Severity, SniffContext, TokenKind};

/// Rule code for doc-nullable-type.
pub const CODE: &str = "SK001";

/// Rule name for doc-nullable-type.
pub const NAME: &str = "doc-nullable-type";

const TAGS: &[&str] = &["var", "param", "return"];

/// Requires `T|null` instead of `?T` in `@var`, `@param` and `@return`.
#[derive(Debug, Clone)]
pub struct DocNullableType {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for DocNullableType {
    fn default() -> Self {
        Self::new()
    }
}

impl DocNullableType {
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

impl Rule for DocNullableType {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires T|null instead of ?T in doc-comment types"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn fixable(&self) -> bool {
        true
    }

    fn register(&self) -> &'static [TokenKind] {
        &[TokenKind::DocCommentOpenTag]
    }

    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
        let Some(block) = DocBlock::read(ctx.tokens(), index) else {
            return Ok(());
        };

        for tag in &block.tags {
            let base = tag.base_name();
            let plain = base
                .strip_prefix("phpstan-")
                .or_else(|| base.strip_prefix("psalm-"))
                .unwrap_or(&base);
            if !TAGS.contains(&plain) || tag.multiline {
                continue;
            }

            let Some(value_index) = tag.value_index else {
                continue;
            };
            let Some(typed) = tag.value.typed() else {
                continue;
            };
            let Some(expanded) = typed.type_expr.expand_nullable() else {
                continue;
            };

            let message = format!(
                "Use \"{expanded}\" instead of \"{}\" in {}",
                typed.type_expr, tag.name
            );
            let replacement = tag.value.with_typed(typed.with_type(expanded)).to_string();
            ctx.add_fixable(tag.index, message, |fixer| {
                fixer.replace(value_index, replacement)?;
                Ok(())
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check, fix};

    #[test]
    fn test_expands_var_on_property() {
        let src = "<?php\nclass A\n{\n    /** @var ?string */\n    private $name;\n}\n";
        let violations = check(DocNullableType::new(), src);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, CODE);
        assert!(violations[0].fixable);

        let fixed = fix(DocNullableType::new(), src);
        assert_eq!(
            fixed,
            "<?php\nclass A\n{\n    /** @var string|null */\n    private $name;\n}\n"
        );
    }

    #[test]
    fn test_keeps_variable_and_description() {
        let src = "<?php\n/**\n * @param ?Foo $foo The foo.\n * @return ?array<int, string>\n */\nfunction f($foo) {}\n";
        insta::assert_snapshot!(fix(DocNullableType::new(), src), @r"
        <?php
        /**
         * @param Foo|null $foo The foo.
         * @return array<int, string>|null
         */
        function f($foo) {}
        ");
    }

    #[test]
    fn test_ignores_expanded_and_other_tags() {
        let src = "<?php\n/**\n * @var string|null\n * @throws ?Exception\n * @see ?foo\n */\n";
        assert!(check(DocNullableType::new(), src).is_empty());
    }

    #[test]
    fn test_fixed_output_is_clean() {
        let src = "<?php\n/** @return ?int */\nfunction f() {}\n";
        let fixed = fix(DocNullableType::new(), src);
        assert!(check(DocNullableType::new(), &fixed).is_empty());
    }
}
