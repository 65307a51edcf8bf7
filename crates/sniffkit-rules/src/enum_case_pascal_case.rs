//! Rule to require PascalCase enum case names.
//!
//! All-caps single words (`case CTE`) are fixed to `case Cte`, and names
//! starting with a lowercase letter get their first letter uppercased.
//! Names with underscores (`case DISABLE_CONSTRAINT`) are reported without
//! a fix: where one word ends and the next begins cannot be recovered from
//! an all-caps name.
//!
//! Only the declaration is renamed; references such as `Status::CTE`
//! elsewhere are left to the author.

use sniffkit_core::locator::enclosing_scope_owner;
use sniffkit_core::{Rule, RuleError, Severity, SniffContext, TokenKind};

/// Rule code for enum-case-pascal-case.
pub const CODE: &str = "SK004";

/// Rule name for enum-case-pascal-case.
pub const NAME: &str = "enum-case-pascal-case";

/// Requires enum case names to be PascalCase.
#[derive(Debug, Clone)]
pub struct EnumCasePascalCase {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for EnumCasePascalCase {
    fn default() -> Self {
        Self::new()
    }
}

impl EnumCasePascalCase {
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

/// What to do with a case name.
#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Valid,
    Fixable(String),
    Unfixable,
}

fn judge(name: &str) -> Verdict {
    let Some(first) = name.chars().next() else {
        return Verdict::Valid;
    };
    if name.contains('_') {
        return Verdict::Unfixable;
    }

    let has_lower = name.chars().any(|c| c.is_ascii_lowercase());
    let letters = name.chars().filter(char::is_ascii_alphabetic).count();
    if !has_lower && letters > 1 {
        let mut fixed = first.to_ascii_uppercase().to_string();
        fixed.push_str(&name[first.len_utf8()..].to_ascii_lowercase());
        return Verdict::Fixable(fixed);
    }

    if first.is_ascii_lowercase() {
        let mut fixed = first.to_ascii_uppercase().to_string();
        fixed.push_str(&name[first.len_utf8()..]);
        return Verdict::Fixable(fixed);
    }

    Verdict::Valid
}

impl Rule for EnumCasePascalCase {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires enum case names to be PascalCase"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn fixable(&self) -> bool {
        true
    }

    fn register(&self) -> &'static [TokenKind] {
        &[TokenKind::Case]
    }

    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
        let tokens = ctx.tokens();
        let in_enum = enclosing_scope_owner(tokens, index)
            .is_some_and(|owner| tokens[owner].kind == TokenKind::Enum);
        if !in_enum {
            return Ok(());
        }
        let Some(name_index) = tokens.next_effective(index) else {
            return Ok(());
        };
        let name = tokens.content(name_index);
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Ok(());
        }

        match judge(name) {
            Verdict::Valid => {}
            Verdict::Fixable(fixed) => {
                let message =
                    format!("Enum case \"{name}\" is not PascalCase; expected \"{fixed}\"");
                ctx.add_fixable(name_index, message, |fixer| {
                    fixer.replace(name_index, fixed)?;
                    Ok(())
                })?;
            }
            Verdict::Unfixable => {
                ctx.add_error_with_help(
                    name_index,
                    format!("Enum case \"{name}\" is not PascalCase"),
                    "Rename the case by hand; word boundaries are ambiguous",
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check, fix};

    #[test]
    fn test_judge() {
        assert_eq!(judge("Active"), Verdict::Valid);
        assert_eq!(judge("HttpStatus"), Verdict::Valid);
        assert_eq!(judge("V2"), Verdict::Valid);
        assert_eq!(judge("CTE"), Verdict::Fixable("Cte".into()));
        assert_eq!(judge("active"), Verdict::Fixable("Active".into()));
        assert_eq!(judge("DISABLE_CONSTRAINT"), Verdict::Unfixable);
        assert_eq!(judge("Foo_Bar"), Verdict::Unfixable);
    }

    #[test]
    fn test_fixes_all_caps_case() {
        let src = "<?php\nenum Mode: string\n{\n    case CTE = 'cte';\n    case Plain = 'plain';\n}\n";
        insta::assert_snapshot!(fix(EnumCasePascalCase::new(), src), @r"
        <?php
        enum Mode: string
        {
            case Cte = 'cte';
            case Plain = 'plain';
        }
        ");
    }

    #[test]
    fn test_underscore_is_unfixable() {
        let src = "<?php\nenum Mode\n{\n    case DISABLE_CONSTRAINT;\n}\n";
        let violations = check(EnumCasePascalCase::new(), src);
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].fixable);
        assert!(violations[0].suggestion.is_some());
        assert_eq!(fix(EnumCasePascalCase::new(), src), src);
    }

    #[test]
    fn test_switch_cases_are_ignored() {
        let src = "<?php\nswitch ($a) {\n    case FOO_BAR:\n        break;\n}\n";
        assert!(check(EnumCasePascalCase::new(), src).is_empty());
    }
}
