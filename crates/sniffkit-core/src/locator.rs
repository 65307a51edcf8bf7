//! Structural queries over the flat token sequence.
//!
//! Finds scope boundaries, statement boundaries and the doc comment related
//! to a declaration. Every query returns an explicit absent value instead of
//! failing; rules skip the occurrence when a structure is not found.

use crate::cursor::{predicate, TokenMatcher};
use crate::token::{TokenKind, Tokens};

/// Opening and closing brace of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeBounds {
    /// Index of `{`.
    pub open: usize,
    /// Index of `}`.
    pub close: usize,
}

/// First and last token of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementBounds {
    /// First effective token of the statement.
    pub start: usize,
    /// Terminator (`;`, `,`, close tag) or last effective token before an
    /// enclosing closer.
    pub end: usize,
}

/// Returns the first token of the declaration containing `index`.
///
/// Walks back over modifiers, property/parameter types, nullable markers
/// and attributes. `index` is the declaration keyword (`function`, `class`,
/// `const`, `case`) or a property's variable.
#[must_use]
pub fn declaration_start(tokens: &Tokens, index: usize) -> usize {
    let mut start = index;
    while let Some(prev) = tokens.previous_effective(start) {
        match tokens[prev].kind {
            TokenKind::AttributeClose => match tokens[prev].bracket_opener {
                Some(opener) => start = opener,
                None => break,
            },
            kind if kind.is_modifier() => start = prev,
            TokenKind::Nullable
            | TokenKind::String
            | TokenKind::Array
            | TokenKind::Null
            | TokenKind::True
            | TokenKind::False
            | TokenKind::BitwiseOr
            | TokenKind::BitwiseAnd
            | TokenKind::Const
                if tokens[index].kind == TokenKind::Variable
                    || tokens[index].kind == TokenKind::String =>
            {
                start = prev;
            }
            _ => break,
        }
    }
    start
}

/// Finds the doc comment related to the declaration at `declaration`.
///
/// Returns the index of the doc comment's closing token. The comment only
/// counts when its closer sits on the line immediately above the
/// declaration's first token; a blank line in between breaks the relation.
#[must_use]
pub fn find_doc_comment(tokens: &Tokens, declaration: usize) -> Option<usize> {
    let start = declaration_start(tokens, declaration);
    let prev = tokens.find_previous(TokenKind::Whitespace.negate(), start.checked_sub(1)?, None)?;
    let closer = &tokens[prev];
    (closer.kind == TokenKind::DocCommentCloseTag && tokens[start].line == closer.line + 1)
        .then_some(prev)
}

/// Finds the opener of the doc comment related to `declaration`.
#[must_use]
pub fn doc_comment_opener(tokens: &Tokens, declaration: usize) -> Option<usize> {
    let closer = find_doc_comment(tokens, declaration)?;
    tokens[closer].comment_opener
}

/// Returns the braces of a scope owner.
///
/// `None` for declarations without a body (interface or abstract methods).
#[must_use]
pub fn find_scope_bounds(tokens: &Tokens, index: usize) -> Option<ScopeBounds> {
    let token = tokens.get(index)?;
    Some(ScopeBounds {
        open: token.scope_opener?,
        close: token.scope_closer?,
    })
}

/// Returns the scope owner (`class`, `enum`, `function`, ...) whose braces
/// enclose `index`.
#[must_use]
pub fn enclosing_scope_owner(tokens: &Tokens, index: usize) -> Option<usize> {
    let opener = tokens.find_previous(
        predicate(|t| {
            t.kind == TokenKind::OpenCurlyBracket
                && t.scope_condition.is_some()
                && t.scope_closer.is_some_and(|c| c > index)
        }),
        index.checked_sub(1)?,
        None,
    )?;
    tokens[opener].scope_condition
}

/// Returns the start and end of the statement containing `index`.
///
/// Nesting depth rises on every opening bracket and falls on its closer, so
/// terminators inside nested calls, arrays and closures are ignored.
#[must_use]
pub fn find_statement_bounds(tokens: &Tokens, index: usize) -> StatementBounds {
    StatementBounds {
        start: find_statement_start(tokens, index),
        end: find_statement_end(tokens, index),
    }
}

fn find_statement_end(tokens: &Tokens, index: usize) -> usize {
    let mut depth = 0usize;
    let mut last = index;

    for i in index..tokens.len() {
        let kind = tokens[i].kind;
        if kind.is_opener() {
            depth += 1;
        } else if kind.is_closer() {
            if depth == 0 {
                return last;
            }
            depth -= 1;
        } else if depth == 0
            && matches!(
                kind,
                TokenKind::Semicolon | TokenKind::Comma | TokenKind::CloseTag
            )
        {
            return i;
        }

        if !kind.is_empty() {
            last = i;
        }
    }

    last
}

fn find_statement_start(tokens: &Tokens, index: usize) -> usize {
    let mut depth = 0usize;
    let mut start = index;
    let mut i = index;

    while i > 0 {
        i -= 1;
        let kind = tokens[i].kind;

        if kind == TokenKind::CloseCurlyBracket && depth == 0 && !is_expression_scope(tokens, i) {
            break;
        }

        if kind.is_closer() {
            depth += 1;
        } else if kind.is_opener() {
            if depth == 0 {
                break;
            }
            depth -= 1;
        } else if depth == 0
            && matches!(
                kind,
                TokenKind::Semicolon
                    | TokenKind::Comma
                    | TokenKind::Colon
                    | TokenKind::DoubleArrow
                    | TokenKind::OpenTag
                    | TokenKind::CloseTag
            )
        {
            break;
        }

        if depth == 0 && !kind.is_empty() {
            start = i;
        }
    }

    start
}

/// Returns true when the `}` at `closer` ends an expression (closure,
/// `match`, anonymous class, dynamic member access) rather than a block.
fn is_expression_scope(tokens: &Tokens, closer: usize) -> bool {
    match tokens[closer].scope_condition {
        Some(condition) => match tokens[condition].kind {
            TokenKind::Function => tokens
                .next_effective(condition)
                .is_some_and(|n| {
                    matches!(
                        tokens[n].kind,
                        TokenKind::OpenParenthesis | TokenKind::BitwiseAnd
                    )
                }),
            TokenKind::Match => true,
            TokenKind::Class => tokens
                .previous_effective(condition)
                .is_some_and(|p| tokens[p].kind == TokenKind::New),
            _ => false,
        },
        None => tokens[closer]
            .bracket_opener
            .and_then(|o| tokens.previous_effective(o))
            .is_some_and(|p| {
                matches!(
                    tokens[p].kind,
                    TokenKind::ObjectOperator | TokenKind::DoubleColon | TokenKind::Variable
                )
            }),
    }
}

/// Collects a doc tag's body across continuation lines.
///
/// Joins every doc string after `tag` up to the next tag or the comment
/// closer with single spaces. Used to reassemble type expressions that
/// span several lines.
#[must_use]
pub fn doc_tag_multiline_value(tokens: &Tokens, tag: usize) -> Option<String> {
    if tokens.get(tag)?.kind != TokenKind::DocCommentTag {
        return None;
    }
    let opener = tokens.find_previous(TokenKind::DocCommentOpenTag, tag, None)?;
    let closer = tokens[opener].comment_closer?;

    let mut parts = Vec::new();
    for token in &tokens.as_slice()[tag + 1..closer] {
        match token.kind {
            TokenKind::DocCommentTag => break,
            TokenKind::DocCommentString => parts.push(token.content.trim()),
            _ => {}
        }
    }
    Some(parts.join(" "))
}
