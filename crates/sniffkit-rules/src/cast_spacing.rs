//! Rule to enforce the spacing after type casts.
//!
//! ```php
//! $count = (int)$value;    // reported, fixed to `(int) $value`
//! $count = (int)   $value; // reported, fixed to `(int) $value`
//! ```

use sniffkit_core::{Rule, RuleError, Severity, SniffContext, TokenKind};

/// Rule code for cast-spacing.
pub const CODE: &str = "SK006";

/// Rule name for cast-spacing.
pub const NAME: &str = "cast-spacing";

/// Requires a fixed number of spaces after a cast.
#[derive(Debug, Clone)]
pub struct CastSpacing {
    /// Custom severity.
    pub severity: Severity,
    /// Required spaces after the cast.
    pub spacing: usize,
}

impl Default for CastSpacing {
    fn default() -> Self {
        Self::new()
    }
}

impl CastSpacing {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
            spacing: 1,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the number of spaces required after a cast.
    #[must_use]
    pub fn spacing(mut self, spacing: usize) -> Self {
        self.spacing = spacing;
        self
    }
}

impl Rule for CastSpacing {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires exactly one space after a type cast"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn fixable(&self) -> bool {
        true
    }

    fn register(&self) -> &'static [TokenKind] {
        &[TokenKind::Cast]
    }

    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
        let tokens = ctx.tokens();
        let whitespace: Vec<usize> = (index + 1..tokens.len())
            .take_while(|&i| tokens[i].kind == TokenKind::Whitespace)
            .collect();
        if whitespace.len() == tokens.len().saturating_sub(index + 1) {
            // Cast at the end of the file.
            return Ok(());
        }

        let expected = " ".repeat(self.spacing);
        let found: String = whitespace.iter().map(|&i| tokens.content(i)).collect();
        if found == expected {
            return Ok(());
        }

        let found_desc = if found.contains('\n') {
            "newline".to_string()
        } else {
            found.len().to_string()
        };
        let message = format!(
            "Expected {} space(s) after cast statement; {} found",
            self.spacing, found_desc
        );

        ctx.add_fixable(index, message, |fixer| {
            match whitespace.split_first() {
                Some((&first, rest)) => {
                    fixer.replace(first, expected)?;
                    for &i in rest {
                        fixer.remove(i)?;
                    }
                }
                None => fixer.insert_after(index, &expected)?,
            }
            Ok(())
        })?;

        Ok(())
    }
}
