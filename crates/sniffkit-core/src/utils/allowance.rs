//! Comment-based allowance directives.
//!
//! Supports directives like:
//! ```text
//! // sniffkit: allow(cast-spacing) reason="generated code"
//! # sniffkit: allow(SK006, license-header)
//! $x = (int)$y; /* sniffkit: allow(all) */
//! ```
//!
//! A directive applies to its own line and the line after it.

use std::collections::HashSet;

const DIRECTIVE: &str = "sniffkit:";

/// Result of checking for allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Rule is not allowed.
    Denied,
    /// Rule is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
pub struct AllowDirective {
    /// Rule names or codes that are allowed.
    pub rules: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

impl AllowDirective {
    fn covers(&self, names: &[&str]) -> bool {
        self.rules.contains("all") || names.iter().any(|n| self.rules.contains(*n))
    }
}

/// Checks source code for an allowance covering any of `names` (a rule's
/// name and code) on `line` (1-indexed) or the line before it.
#[must_use]
pub fn check_allow_with_reason(content: &str, line: usize, names: &[&str]) -> AllowCheck {
    if !content.contains(DIRECTIVE) {
        return AllowCheck::Denied;
    }

    for check_line in [line.saturating_sub(1), line] {
        if check_line == 0 {
            continue;
        }
        let Some(line_content) = content.lines().nth(check_line - 1) else {
            continue;
        };
        if let Some(directive) = parse_allow_directive(line_content) {
            if directive.covers(names) {
                return AllowCheck::Allowed {
                    reason: directive.reason,
                };
            }
        }
    }

    AllowCheck::Denied
}

/// Parses an allowance directive from a line containing a comment.
fn parse_allow_directive(line: &str) -> Option<AllowDirective> {
    let at = line.find(DIRECTIVE)?;
    let before = &line[..at];
    let in_comment = ["//", "#", "/*"].iter().any(|m| before.contains(m))
        || before.trim_start().starts_with('*');
    if !in_comment {
        return None;
    }

    let directive = line[at + DIRECTIVE.len()..].trim();
    let allow_content = directive.strip_prefix("allow(")?.trim();

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest.strip_prefix("reason=").and_then(|reason_part| {
        let quoted = reason_part.trim().strip_prefix('"')?;
        let end = quoted.find('"')?;
        Some(quoted[..end].to_string())
    });

    Some(AllowDirective { rules, reason })
}
