//! Rule to require a license header comment after the opening tag.
//!
//! The header text comes from the nearest `LICENSE_HEADER` (or
//! `.license-header`) file found walking up from the analyzed file's
//! directory, or from an inline `text` option. Plain text is wrapped in a
//! block comment:
//!
//! ```php
//! <?php
//! /*
//!  * Copyright (c) Acme
//!  */
//!
//! namespace Acme;
//! ```
//!
//! A missing header is inserted. A different block comment in the header
//! position is reported without a fix.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sniffkit_core::{Rule, RuleError, Severity, SniffContext, TokenKind, TokenMatcher};
use tracing::debug;

/// Rule code for license-header.
pub const CODE: &str = "SK008";

/// Rule name for license-header.
pub const NAME: &str = "license-header";

/// Requires every file to start with the project's license header.
#[derive(Debug)]
pub struct LicenseHeader {
    /// Custom severity.
    pub severity: Severity,
    /// Header file names searched for, in order, in each directory.
    pub file_names: Vec<String>,
    /// Header text used instead of searching for a file.
    pub text: Option<String>,
    cache: Mutex<HeaderCache>,
}

/// Header lookups per directory, valid for one working directory.
#[derive(Debug, Default)]
struct HeaderCache {
    cwd: PathBuf,
    dirs: HashMap<PathBuf, Option<String>>,
}

impl Default for LicenseHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl LicenseHeader {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
            file_names: vec!["LICENSE_HEADER".to_string(), ".license-header".to_string()],
            text: None,
            cache: Mutex::new(HeaderCache::default()),
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the header file names to search for.
    #[must_use]
    pub fn file_names(mut self, names: Vec<String>) -> Self {
        self.file_names = names;
        self
    }

    /// Sets the header text directly.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Expected header comment for a file, or `None` when the project has
    /// no header.
    fn expected_header(&self, file: &Path) -> Result<Option<String>, RuleError> {
        if let Some(text) = &self.text {
            return Ok(Some(as_comment(text)));
        }

        let cwd = std::env::current_dir()
            .map_err(|e| RuleError::Config(format!("cannot determine working directory: {e}")))?;
        let dir = cwd.join(file.parent().unwrap_or_else(|| Path::new("")));

        let mut cache = self
            .cache
            .lock()
            .map_err(|_| RuleError::Invariant("header cache poisoned".into()))?;
        if cache.cwd != cwd {
            cache.dirs.clear();
            cache.cwd = cwd;
        }
        if let Some(cached) = cache.dirs.get(&dir) {
            return Ok(cached.clone());
        }

        let header = self.search(&dir)?;
        cache.dirs.insert(dir, header.clone());
        Ok(header)
    }

    fn search(&self, dir: &Path) -> Result<Option<String>, RuleError> {
        for ancestor in dir.ancestors() {
            for name in &self.file_names {
                let candidate = ancestor.join(name);
                if !candidate.is_file() {
                    continue;
                }
                let text = std::fs::read_to_string(&candidate).map_err(|e| {
                    RuleError::Config(format!("cannot read {}: {e}", candidate.display()))
                })?;
                debug!(path = %candidate.display(), "Using license header");
                return Ok(Some(as_comment(&text)));
            }
        }
        Ok(None)
    }
}

/// Renders header text as a block comment; comments are used as-is.
fn as_comment(text: &str) -> String {
    let text = text.trim_end();
    if text.trim_start().starts_with("/*") {
        return text.trim_start().to_string();
    }

    let mut comment = String::from("/*\n");
    for line in text.lines() {
        if line.trim().is_empty() {
            comment.push_str(" *\n");
        } else {
            comment.push_str(" * ");
            comment.push_str(line.trim_end());
            comment.push('\n');
        }
    }
    comment.push_str(" */");
    comment
}

impl Rule for LicenseHeader {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires the project license header after the opening tag"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn fixable(&self) -> bool {
        true
    }

    fn register(&self) -> &'static [TokenKind] {
        &[TokenKind::OpenTag]
    }

    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
        let tokens = ctx.tokens();
        if index > 0
            && tokens
                .find_previous(TokenKind::OpenTag, index - 1, None)
                .is_some()
        {
            return Ok(());
        }
        let Some(expected) = self.expected_header(ctx.file().path)? else {
            return Ok(());
        };

        let first = tokens.find_next(TokenKind::Whitespace.negate(), index + 1, None);
        let existing = first.and_then(|i| match tokens[i].kind {
            TokenKind::Comment if tokens.content(i).starts_with("/*") => {
                Some(tokens.content(i).to_string())
            }
            TokenKind::DocCommentOpenTag => tokens[i]
                .comment_closer
                .map(|closer| tokens.content_between(i, closer)),
            _ => None,
        });

        match existing {
            Some(comment) if comment.trim_end() == expected => {}
            Some(_) => {
                ctx.add_error_with_help(
                    first.unwrap_or(index),
                    "File header comment does not match the license header",
                    "Replace the comment with the project's license header",
                );
            }
            None => {
                ctx.add_fixable(index, "Missing license header", |fixer| {
                    fixer.insert_after(index, &format!("\n{expected}\n"))?;
                    Ok(())
                })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check, fix};
    use sniffkit_core::{Analyzer, RuleFailureKind};

    const HEADER: &str = "Copyright (c) Acme\n\nMIT License\n";

    #[test]
    fn test_wraps_plain_text() {
        insta::assert_snapshot!(as_comment(HEADER), @r"
        /*
         * Copyright (c) Acme
         *
         * MIT License
         */
        ");
        assert_eq!(as_comment("/* keep */\n"), "/* keep */");
    }

    #[test]
    fn test_inserts_missing_header() {
        let rule = || LicenseHeader::new().text(HEADER);
        let src = "<?php\nnamespace Acme;\n";
        let fixed = fix(rule(), src);
        assert_eq!(
            fixed,
            "<?php\n/*\n * Copyright (c) Acme\n *\n * MIT License\n */\n\nnamespace Acme;\n"
        );
        assert!(check(rule(), &fixed).is_empty());
    }

    #[test]
    fn test_different_header_is_unfixable() {
        let rule = || LicenseHeader::new().text(HEADER);
        let src = "<?php\n/*\n * Copyright (c) Other\n */\n\nnamespace Acme;\n";
        let violations = check(rule(), src);
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].fixable);
        assert_eq!(fix(rule(), src), src);
    }

    #[test]
    fn test_only_first_open_tag() {
        let src = "<?php\n/* Header */\n?>\n<p>x</p>\n<?php echo 1;\n";
        assert!(check(LicenseHeader::new().text("/* Header */"), src).is_empty());
    }

    #[test]
    fn test_header_file_found_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LICENSE_HEADER"), HEADER).unwrap();
        let nested = dir.path().join("src/Models");
        std::fs::create_dir_all(&nested).unwrap();

        let analyzer = Analyzer::builder()
            .root(dir.path())
            .rule(LicenseHeader::new())
            .build()
            .unwrap();
        let result = analyzer.analyze_source(nested.join("User.php"), "<?php\nclass User {}\n");
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].message, "Missing license header");
    }

    #[test]
    fn test_no_header_file_means_no_check() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::builder()
            .root(dir.path())
            .rule(LicenseHeader::new().file_names(vec!["NO_SUCH_HEADER_FILE".into()]))
            .build()
            .unwrap();
        let result = analyzer.analyze_source(dir.path().join("a.php"), "<?php\n$a = 1;\n");
        assert!(result.violations.is_empty());
        assert!(result
            .rule_errors
            .iter()
            .all(|e| e.kind != RuleFailureKind::Config));
    }
}
