//! Navigation primitives over a [`Tokens`] sequence.
//!
//! Every search fails closed: it returns `None` instead of panicking when
//! nothing matches, when the range is empty, or when a bound lies outside
//! the sequence. Callers return early on `None`.
//!
//! ```ignore
//! let Some(name) = tokens.find_next_effective(function + 1, None) else {
//!     return Ok(());
//! };
//! ```

use crate::token::{Token, TokenKind, Tokens, EMPTY_KINDS};

/// Something that can decide whether a token matches a search.
pub trait TokenMatcher {
    /// Returns true if `token` matches.
    fn matches(&self, token: &Token) -> bool;

    /// Inverts the matcher ("first token NOT matching").
    #[must_use]
    fn negate(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not(self)
    }
}

impl TokenMatcher for TokenKind {
    fn matches(&self, token: &Token) -> bool {
        token.kind == *self
    }
}

impl TokenMatcher for &[TokenKind] {
    fn matches(&self, token: &Token) -> bool {
        self.contains(&token.kind)
    }
}

impl<const N: usize> TokenMatcher for [TokenKind; N] {
    fn matches(&self, token: &Token) -> bool {
        self.contains(&token.kind)
    }
}

/// Inverted matcher, built with [`TokenMatcher::negate`].
#[derive(Debug, Clone, Copy)]
pub struct Not<M>(M);

impl<M: TokenMatcher> TokenMatcher for Not<M> {
    fn matches(&self, token: &Token) -> bool {
        !self.0.matches(token)
    }
}

/// Matcher backed by a closure, built with [`predicate`].
#[derive(Debug, Clone, Copy)]
pub struct Predicate<F>(F);

impl<F: Fn(&Token) -> bool> TokenMatcher for Predicate<F> {
    fn matches(&self, token: &Token) -> bool {
        (self.0)(token)
    }
}

/// Wraps a closure as a [`TokenMatcher`].
pub fn predicate<F: Fn(&Token) -> bool>(f: F) -> Predicate<F> {
    Predicate(f)
}

impl Tokens {
    /// Finds the first token at or after `from` matching `matcher`.
    ///
    /// `to` is an exclusive upper bound; `None` scans to the end.
    #[must_use]
    pub fn find_next<M: TokenMatcher>(
        &self,
        matcher: M,
        from: usize,
        to: Option<usize>,
    ) -> Option<usize> {
        let end = to.map_or(self.len(), |t| t.min(self.len()));
        (from..end).find(|&i| matcher.matches(&self[i]))
    }

    /// Finds the last token at or before `from` matching `matcher`.
    ///
    /// `stop` is an inclusive lower bound; `None` scans to the start.
    /// A `from` past the end is clamped to the last token.
    #[must_use]
    pub fn find_previous<M: TokenMatcher>(
        &self,
        matcher: M,
        from: usize,
        stop: Option<usize>,
    ) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let from = from.min(self.len() - 1);
        let stop = stop.unwrap_or(0);
        if from < stop {
            return None;
        }
        (stop..=from).rev().find(|&i| matcher.matches(&self[i]))
    }

    /// Finds the next token that is neither whitespace nor a comment.
    #[must_use]
    pub fn find_next_effective(&self, from: usize, to: Option<usize>) -> Option<usize> {
        self.find_next(EMPTY_KINDS.negate(), from, to)
    }

    /// Finds the previous token that is neither whitespace nor a comment.
    #[must_use]
    pub fn find_previous_effective(&self, from: usize, stop: Option<usize>) -> Option<usize> {
        self.find_previous(EMPTY_KINDS.negate(), from, stop)
    }

    /// Effective token strictly before `index`.
    #[must_use]
    pub fn previous_effective(&self, index: usize) -> Option<usize> {
        self.find_previous_effective(index.checked_sub(1)?, None)
    }

    /// Effective token strictly after `index`.
    #[must_use]
    pub fn next_effective(&self, index: usize) -> Option<usize> {
        self.find_next_effective(index + 1, None)
    }

    /// Jumps over a balanced region in one step.
    ///
    /// For a bracket opener returns its closer; for a scope owner
    /// (`function`, `class`, ...) returns the closing brace; for a
    /// parenthesis owner without a body returns the closing parenthesis.
    #[must_use]
    pub fn skip_balanced(&self, index: usize) -> Option<usize> {
        let token = self.get(index)?;
        if token.kind.is_opener() {
            return token.bracket_closer;
        }
        token.scope_closer.or(token.parenthesis_closer)
    }

    /// Concatenated content of `start..=end`.
    #[must_use]
    pub fn content_between(&self, start: usize, end: usize) -> String {
        if start > end || start >= self.len() {
            return String::new();
        }
        let end = end.min(self.len() - 1);
        self.as_slice()[start..=end]
            .iter()
            .map(|t| t.content.as_str())
            .collect()
    }

    /// Index of the first token on the same line as `index`.
    #[must_use]
    pub fn first_on_line(&self, index: usize) -> usize {
        let Some(token) = self.get(index) else {
            return index;
        };
        let line = token.line;
        let mut first = index;
        while first > 0 && self[first - 1].line == line {
            first -= 1;
        }
        first
    }

    /// Leading whitespace of the line containing `index`.
    #[must_use]
    pub fn indentation(&self, index: usize) -> &str {
        let first = self.first_on_line(index);
        match self.get(first) {
            Some(t) if t.kind == TokenKind::Whitespace && !t.has_newline() => &t.content,
            _ => "",
        }
    }
}
