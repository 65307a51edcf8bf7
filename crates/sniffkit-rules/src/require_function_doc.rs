//! Rule to require doc comments on functions and methods.
//!
//! # Rationale
//!
//! Untyped parameters and return values need a doc comment to say what
//! they hold. A function whose parameters and return value all carry
//! native types documents itself and is exempt.
//!
//! # Detected Patterns
//!
//! ```php
//! function total($items) { ... }
//! ```
//!
//! # Good Patterns
//!
//! ```php
//! function total(array $items): int { ... }
//!
//! /**
//!  * @param list<Item> $items
//!  */
//! function total($items) { ... }
//! ```

use sniffkit_core::locator::find_doc_comment;
use sniffkit_core::signature::function_signature;
use sniffkit_core::{Rule, RuleError, Severity, SniffContext, TokenKind};

/// Rule code for require-function-doc.
pub const CODE: &str = "SK005";

/// Rule name for require-function-doc.
pub const NAME: &str = "require-function-doc";

/// Requires a related doc comment on named functions.
#[derive(Debug, Clone)]
pub struct RequireFunctionDoc {
    /// Custom severity.
    pub severity: Severity,
    /// Exempt functions whose parameters and return value are all typed.
    pub skip_fully_typed: bool,
    /// Skip files under `tests/` or named `*Test.php`.
    pub allow_in_tests: bool,
}

impl Default for RequireFunctionDoc {
    fn default() -> Self {
        Self::new()
    }
}

impl RequireFunctionDoc {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
            skip_fully_typed: true,
            allow_in_tests: true,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets whether fully typed functions are exempt.
    #[must_use]
    pub fn skip_fully_typed(mut self, skip: bool) -> Self {
        self.skip_fully_typed = skip;
        self
    }

    /// Sets whether test files are exempt.
    #[must_use]
    pub fn allow_in_tests(mut self, allow: bool) -> Self {
        self.allow_in_tests = allow;
        self
    }
}

impl Rule for RequireFunctionDoc {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires doc comments on functions that are not fully typed"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn register(&self) -> &'static [TokenKind] {
        &[TokenKind::Function]
    }

    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
        if self.allow_in_tests && ctx.file().is_test {
            return Ok(());
        }
        let tokens = ctx.tokens();
        let Some(signature) = function_signature(tokens, index) else {
            return Ok(());
        };
        let Some(name) = signature.name.as_deref() else {
            return Ok(());
        };

        if find_doc_comment(tokens, index).is_some() {
            return Ok(());
        }
        if self.skip_fully_typed && signature.is_fully_typed() {
            return Ok(());
        }

        ctx.add_error_with_help(
            index,
            format!("Missing doc comment for function {name}()"),
            "Add a doc comment, or declare native types for every parameter and the return value",
        );
        Ok(())
    }
}
