//! Rule trait for defining sniffs.

use thiserror::Error;

use crate::context::SniffContext;
use crate::fixer::FixerError;
use crate::token::TokenKind;
use crate::types::Severity;

/// Failure of a single rule invocation.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule cannot run in this environment (missing or unreadable
    /// manifest, bad option). The rule is disabled for the rest of the run.
    #[error("configuration error: {0}")]
    Config(String),

    /// A "should not happen" condition. Only the current invocation is
    /// abandoned.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Changeset protocol misuse.
    #[error(transparent)]
    Fixer(#[from] FixerError),
}

impl RuleError {
    /// Returns true for [`RuleError::Config`].
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// A token-driven lint rule ("sniff").
///
/// The host calls [`Rule::process`] once for every token whose kind is in
/// [`Rule::register`], in source order. A rule inspects the tokens around
/// that position, reports violations through the context, and edits the
/// file only through changesets.
///
/// # Example
///
/// ```
/// use sniffkit_core::{Rule, RuleError, SniffContext, TokenKind};
///
/// pub struct NoShortOpenEcho;
///
/// impl Rule for NoShortOpenEcho {
///     fn name(&self) -> &'static str { "no-short-open-echo" }
///     fn code(&self) -> &'static str { "EX001" }
///
///     fn register(&self) -> &'static [TokenKind] {
///         &[TokenKind::OpenTag]
///     }
///
///     fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
///         if ctx.tokens().content(index) == "<?=" {
///             ctx.add_error(index, "Short echo tag is not allowed");
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "cast-spacing").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "SK006").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for violations from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Whether some violations of this rule can be fixed mechanically.
    fn fixable(&self) -> bool {
        false
    }

    /// Token kinds that trigger [`Rule::process`].
    fn register(&self) -> &'static [TokenKind];

    /// Inspects the token at `index`.
    ///
    /// # Errors
    ///
    /// [`RuleError::Config`] disables the rule for the rest of the run; any
    /// other error abandons only this invocation.
    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRule;

    impl Rule for TestRule {
        fn name(&self) -> &'static str {
            "test-rule"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn description(&self) -> &'static str {
            "A test rule"
        }
        fn register(&self) -> &'static [TokenKind] {
            &[TokenKind::Variable]
        }
        fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
            ctx.add_error(index, "Test violation");
            Ok(())
        }
    }

    #[test]
    fn test_rule_trait() {
        let rule = TestRule;
        assert_eq!(rule.name(), "test-rule");
        assert_eq!(rule.code(), "TEST001");
        assert_eq!(rule.default_severity(), Severity::Error);
        assert!(!rule.fixable());
        assert_eq!(rule.register(), &[TokenKind::Variable]);
    }

    #[test]
    fn test_fixer_errors_convert() {
        let err: RuleError = FixerError::NestedChangeset.into();
        assert!(!err.is_config());
        assert_eq!(err.to_string(), "a changeset is already open");
        assert!(RuleError::Config("x".into()).is_config());
    }
}
