//! Transactional token edits.
//!
//! A [`Fixer`] holds the contents of every token of one pass. Rules stage
//! edits inside a changeset; committing applies all of them at once, and
//! rolling back (or never committing) applies none. After a commit the
//! token indices of the pass no longer describe the patched text: the host
//! re-tokenizes [`Fixer::contents`] before the next pass.
//!
//! # Example
//!
//! ```
//! use sniffkit_core::{Fixer, TokenKind, Tokens};
//!
//! let tokens = Tokens::tokenize("<?php\n$a = (int)$b;\n");
//! let mut fixer = Fixer::new(&tokens, true);
//! let cast = tokens.find_next(TokenKind::Cast, 0, None).unwrap();
//! let committed = fixer
//!     .changeset(|cs| cs.insert_after(cast, " "))
//!     .unwrap();
//! assert!(committed);
//! assert_eq!(fixer.contents(), "<?php\n$a = (int) $b;\n");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug;

use crate::token::Tokens;

/// Misuse of the changeset protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixerError {
    /// `begin_changeset` while another changeset is open.
    #[error("a changeset is already open")]
    NestedChangeset,

    /// An edit or `end_changeset` with no open changeset.
    #[error("no changeset is open")]
    NoChangeset,

    /// An edit targeting a token that does not exist.
    #[error("token index {0} is out of range")]
    OutOfRange(usize),
}

/// Per-pass edit buffer.
#[derive(Debug, Clone)]
pub struct Fixer {
    enabled: bool,
    contents: Vec<String>,
    touched: BTreeSet<usize>,
    staged: Option<BTreeMap<usize, String>>,
    commits: usize,
    conflicts: usize,
}

impl Fixer {
    /// Creates a buffer over the contents of `tokens`.
    ///
    /// With `enabled == false` (report mode) every changeset is discarded.
    #[must_use]
    pub fn new(tokens: &Tokens, enabled: bool) -> Self {
        Self {
            enabled,
            contents: tokens.iter().map(|t| t.content.clone()).collect(),
            touched: BTreeSet::new(),
            staged: None,
            commits: 0,
            conflicts: 0,
        }
    }

    /// Returns true when commits are applied.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true while a changeset is open.
    #[must_use]
    pub fn in_changeset(&self) -> bool {
        self.staged.is_some()
    }

    /// Number of changesets committed in this pass.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Number of changesets discarded because they overlapped an earlier
    /// commit.
    #[must_use]
    pub fn conflict_count(&self) -> usize {
        self.conflicts
    }

    /// Opens a changeset.
    ///
    /// # Errors
    ///
    /// Returns [`FixerError::NestedChangeset`] if one is already open.
    pub fn begin_changeset(&mut self) -> Result<(), FixerError> {
        if self.staged.is_some() {
            return Err(FixerError::NestedChangeset);
        }
        self.staged = Some(BTreeMap::new());
        Ok(())
    }

    /// Stages `text` as the new content of `index`.
    ///
    /// # Errors
    ///
    /// Fails when no changeset is open or `index` is out of range.
    pub fn replace(&mut self, index: usize, text: impl Into<String>) -> Result<(), FixerError> {
        let text = text.into();
        self.stage(index, |_| text)
    }

    /// Stages `text` before the current content of `index`.
    ///
    /// # Errors
    ///
    /// Fails when no changeset is open or `index` is out of range.
    pub fn insert_before(&mut self, index: usize, text: &str) -> Result<(), FixerError> {
        self.stage(index, |current| format!("{text}{current}"))
    }

    /// Stages `text` after the current content of `index`.
    ///
    /// # Errors
    ///
    /// Fails when no changeset is open or `index` is out of range.
    pub fn insert_after(&mut self, index: usize, text: &str) -> Result<(), FixerError> {
        self.stage(index, |current| format!("{current}{text}"))
    }

    /// Stages the removal of `index`; same as `replace(index, "")`.
    ///
    /// # Errors
    ///
    /// Fails when no changeset is open or `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Result<(), FixerError> {
        self.replace(index, String::new())
    }

    /// Content of `index` as the open changeset would leave it.
    #[must_use]
    pub fn current(&self, index: usize) -> &str {
        self.staged
            .as_ref()
            .and_then(|s| s.get(&index))
            .or_else(|| self.contents.get(index))
            .map_or("", String::as_str)
    }

    /// Commits the open changeset.
    ///
    /// Returns `Ok(false)` when the changeset was discarded: in report mode,
    /// when it staged nothing, or when it touches a token already changed by
    /// an earlier commit of this pass.
    ///
    /// # Errors
    ///
    /// Returns [`FixerError::NoChangeset`] if none is open.
    pub fn end_changeset(&mut self) -> Result<bool, FixerError> {
        let staged = self.staged.take().ok_or(FixerError::NoChangeset)?;
        if !self.enabled || staged.is_empty() {
            return Ok(false);
        }

        if let Some(index) = staged.keys().find(|i| self.touched.contains(i)) {
            debug!(
                index,
                edits = staged.len(),
                "Discarding changeset overlapping an earlier commit"
            );
            self.conflicts += 1;
            return Ok(false);
        }

        for (index, text) in staged {
            self.contents[index] = text;
            self.touched.insert(index);
        }
        self.commits += 1;
        Ok(true)
    }

    /// Discards the open changeset, if any.
    pub fn rollback_changeset(&mut self) {
        if let Some(staged) = self.staged.take() {
            debug!(edits = staged.len(), "Rolled back changeset");
        }
    }

    /// Runs `edit` inside a changeset.
    ///
    /// Commits when `edit` returns `Ok`, rolls back when it returns `Err`.
    /// Returns whether the changeset was committed.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error, or [`FixerError::NestedChangeset`]
    /// when called inside an open changeset.
    pub fn changeset<E, F>(&mut self, edit: F) -> Result<bool, E>
    where
        E: From<FixerError>,
        F: FnOnce(&mut Self) -> Result<(), E>,
    {
        self.begin_changeset()?;
        match edit(self) {
            Ok(()) => Ok(self.end_changeset()?),
            Err(err) => {
                self.rollback_changeset();
                Err(err)
            }
        }
    }

    /// Renders the committed contents.
    #[must_use]
    pub fn contents(&self) -> String {
        self.contents.concat()
    }

    fn stage(
        &mut self,
        index: usize,
        edit: impl FnOnce(&str) -> String,
    ) -> Result<(), FixerError> {
        let Some(base) = self.contents.get(index) else {
            return Err(FixerError::OutOfRange(index));
        };
        let staged = self.staged.as_mut().ok_or(FixerError::NoChangeset)?;
        let current = staged.get(&index).map_or(base.as_str(), String::as_str);
        let next = edit(current);
        staged.insert(index, next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "<?php\n$a = 1;\n";

    fn fixer() -> Fixer {
        Fixer::new(&Tokens::tokenize(SRC), true)
    }

    fn index_of(content: &str) -> usize {
        Tokens::tokenize(SRC)
            .iter()
            .position(|t| t.content == content)
            .unwrap()
    }

    #[test]
    fn test_commit_applies_all_edits() {
        let mut fixer = fixer();
        fixer.begin_changeset().unwrap();
        fixer.replace(index_of("$a"), "$b").unwrap();
        fixer.replace(index_of("1"), "2").unwrap();
        assert_eq!(fixer.contents(), SRC);
        assert!(fixer.end_changeset().unwrap());
        assert_eq!(fixer.contents(), "<?php\n$b = 2;\n");
        assert_eq!(fixer.commit_count(), 1);
    }

    #[test]
    fn test_nested_begin_is_an_error() {
        let mut fixer = fixer();
        fixer.begin_changeset().unwrap();
        assert_eq!(fixer.begin_changeset(), Err(FixerError::NestedChangeset));
        assert_eq!(
            fixer.changeset(|f| f.remove(1)),
            Err::<bool, _>(FixerError::NestedChangeset)
        );
    }

    #[test]
    fn test_edits_require_open_changeset() {
        let mut fixer = fixer();
        assert_eq!(fixer.replace(1, "x"), Err(FixerError::NoChangeset));
        assert_eq!(fixer.end_changeset(), Err(FixerError::NoChangeset));
        fixer.begin_changeset().unwrap();
        assert_eq!(fixer.replace(999, "x"), Err(FixerError::OutOfRange(999)));
    }

    #[test]
    fn test_abandoned_changeset_leaves_no_trace() {
        let mut fixer = fixer();
        fixer.begin_changeset().unwrap();
        fixer.remove(index_of("$a")).unwrap();
        fixer.rollback_changeset();
        assert_eq!(fixer.contents(), SRC);

        let result: Result<bool, FixerError> = fixer.changeset(|f| {
            f.remove(index_of("$a"))?;
            Err(FixerError::OutOfRange(42))
        });
        assert!(result.is_err());
        assert!(!fixer.in_changeset());
        assert_eq!(fixer.contents(), SRC);
    }

    #[test]
    fn test_inserts_compose_and_last_replace_wins() {
        let mut fixer = fixer();
        let one = index_of("1");
        fixer
            .changeset(|f| {
                f.replace(one, "2")?;
                f.replace(one, "3")?;
                f.insert_before(one, "(")?;
                f.insert_after(one, ")")
            })
            .unwrap();
        assert_eq!(fixer.contents(), "<?php\n$a = (3);\n");
    }

    #[test]
    fn test_overlapping_changeset_is_discarded() {
        let mut fixer = fixer();
        let a = index_of("$a");
        let one = index_of("1");
        assert!(fixer.changeset(|f| f.replace(a, "$first")).unwrap());
        assert!(!fixer
            .changeset(|f| {
                f.replace(one, "9")?;
                f.replace(a, "$second")
            })
            .unwrap());
        assert_eq!(fixer.contents(), "<?php\n$first = 1;\n");
        assert_eq!(fixer.conflict_count(), 1);
    }

    #[test]
    fn test_report_mode_discards() {
        let mut fixer = Fixer::new(&Tokens::tokenize(SRC), false);
        assert!(!fixer.changeset(|f| f.remove(1)).unwrap());
        assert_eq!(fixer.contents(), SRC);
        assert_eq!(fixer.commit_count(), 0);
    }

    #[test]
    fn test_current_sees_staged_content() {
        let mut fixer = fixer();
        let a = index_of("$a");
        fixer.begin_changeset().unwrap();
        fixer.insert_after(a, "x").unwrap();
        assert_eq!(fixer.current(a), "$ax");
        fixer.rollback_changeset();
        assert_eq!(fixer.current(a), "$a");
    }
}
