//! Token arena produced by the tokenizer.
//!
//! Tokens are addressed purely by their index into one file-scoped
//! [`Tokens`] sequence. Structural relationships (matching brackets, scope
//! braces, doc-comment boundaries) are index references resolved once by the
//! tokenizer; no token owns another.

use std::ops::Index;

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TokenKind {
    OpenTag,
    CloseTag,
    InlineHtml,
    Whitespace,
    Comment,

    DocCommentOpenTag,
    DocCommentCloseTag,
    DocCommentWhitespace,
    DocCommentStar,
    DocCommentTag,
    DocCommentString,

    Variable,
    /// Identifier or namespace-qualified name.
    String,
    /// Quoted string literal (single, double, backtick or heredoc).
    ConstantString,
    /// Integer literal.
    LNumber,
    /// Float literal.
    DNumber,
    True,
    False,
    Null,
    Cast,

    OpenParenthesis,
    CloseParenthesis,
    OpenCurlyBracket,
    CloseCurlyBracket,
    OpenSquareBracket,
    CloseSquareBracket,
    OpenShortArray,
    CloseShortArray,
    AttributeOpen,
    AttributeClose,

    Semicolon,
    Comma,
    Colon,
    DoubleColon,
    Equal,
    DoubleArrow,
    ObjectOperator,
    Nullable,
    InlineThen,
    BitwiseOr,
    BitwiseAnd,
    Ellipsis,
    IsEqual,
    IsNotEqual,
    IsIdentical,
    IsNotIdentical,
    BooleanAnd,
    BooleanOr,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Instanceof,
    /// Any other operator.
    Operator,

    Function,
    Fn,
    Class,
    Interface,
    Trait,
    Enum,
    Case,
    Extends,
    Implements,
    Abstract,
    Final,
    Public,
    Protected,
    Private,
    Static,
    Readonly,
    Var,
    Const,
    Return,
    Namespace,
    Use,
    New,
    If,
    Elseif,
    Else,
    While,
    For,
    Foreach,
    Switch,
    Match,
    Try,
    Catch,
    Finally,
    Array,

    Unknown,
}

/// Whitespace and comment kinds, skipped by "effective" searches.
pub const EMPTY_KINDS: &[TokenKind] = &[
    TokenKind::Whitespace,
    TokenKind::Comment,
    TokenKind::DocCommentOpenTag,
    TokenKind::DocCommentCloseTag,
    TokenKind::DocCommentWhitespace,
    TokenKind::DocCommentStar,
    TokenKind::DocCommentTag,
    TokenKind::DocCommentString,
];

/// Declaration modifiers that may precede a function, property or constant.
pub const MODIFIER_KINDS: &[TokenKind] = &[
    TokenKind::Abstract,
    TokenKind::Final,
    TokenKind::Public,
    TokenKind::Protected,
    TokenKind::Private,
    TokenKind::Static,
    TokenKind::Readonly,
    TokenKind::Var,
];

impl TokenKind {
    /// Returns true for whitespace and comment tokens.
    #[must_use]
    pub fn is_empty(self) -> bool {
        EMPTY_KINDS.contains(&self)
    }

    /// Returns true for plain whitespace.
    #[must_use]
    pub fn is_whitespace(self) -> bool {
        matches!(self, Self::Whitespace | Self::DocCommentWhitespace)
    }

    /// Returns true for any part of a comment.
    #[must_use]
    pub fn is_comment(self) -> bool {
        self.is_empty() && self != Self::Whitespace
    }

    /// Returns true for declaration modifiers.
    #[must_use]
    pub fn is_modifier(self) -> bool {
        MODIFIER_KINDS.contains(&self)
    }

    /// Returns true for opening brackets of any shape.
    #[must_use]
    pub fn is_opener(self) -> bool {
        matches!(
            self,
            Self::OpenParenthesis
                | Self::OpenCurlyBracket
                | Self::OpenSquareBracket
                | Self::OpenShortArray
                | Self::AttributeOpen
        )
    }

    /// Returns true for closing brackets of any shape.
    #[must_use]
    pub fn is_closer(self) -> bool {
        matches!(
            self,
            Self::CloseParenthesis
                | Self::CloseCurlyBracket
                | Self::CloseSquareBracket
                | Self::CloseShortArray
                | Self::AttributeClose
        )
    }

    /// Returns the closer kind paired with this opener.
    #[must_use]
    pub fn closer(self) -> Option<Self> {
        match self {
            Self::OpenParenthesis => Some(Self::CloseParenthesis),
            Self::OpenCurlyBracket => Some(Self::CloseCurlyBracket),
            Self::OpenSquareBracket => Some(Self::CloseSquareBracket),
            Self::OpenShortArray => Some(Self::CloseShortArray),
            Self::AttributeOpen => Some(Self::AttributeClose),
            _ => None,
        }
    }

    /// Returns true for scalar literal tokens.
    #[must_use]
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::ConstantString
                | Self::LNumber
                | Self::DNumber
                | Self::True
                | Self::False
                | Self::Null
        )
    }

    /// Returns true for `==`, `===`, `!=` and `!==`.
    #[must_use]
    pub fn is_equality(self) -> bool {
        matches!(
            self,
            Self::IsEqual | Self::IsNotEqual | Self::IsIdentical | Self::IsNotIdentical
        )
    }
}

/// A single lexical unit with its position and host-resolved links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lexical category.
    pub kind: TokenKind,
    /// Exact source text.
    pub content: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in characters).
    pub column: usize,
    /// Opening bracket of the pair this token belongs to.
    pub bracket_opener: Option<usize>,
    /// Closing bracket of the pair this token belongs to.
    pub bracket_closer: Option<usize>,
    /// Opening parenthesis (set on parentheses and their owner).
    pub parenthesis_opener: Option<usize>,
    /// Closing parenthesis (set on parentheses and their owner).
    pub parenthesis_closer: Option<usize>,
    /// Keyword owning a parenthesis pair (`function`, `if`, ...).
    pub parenthesis_owner: Option<usize>,
    /// Opening brace of a scope (set on the owner and both braces).
    pub scope_opener: Option<usize>,
    /// Closing brace of a scope (set on the owner and both braces).
    pub scope_closer: Option<usize>,
    /// Keyword owning a scope (set on both braces).
    pub scope_condition: Option<usize>,
    /// Doc-comment opener (set on the closer).
    pub comment_opener: Option<usize>,
    /// Doc-comment closer (set on the opener).
    pub comment_closer: Option<usize>,
    /// Tag token indices (set on the doc-comment opener).
    pub comment_tags: Vec<usize>,
}

impl Token {
    /// Creates an unlinked token.
    #[must_use]
    pub fn new(kind: TokenKind, content: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            content: content.into(),
            line,
            column,
            bracket_opener: None,
            bracket_closer: None,
            parenthesis_opener: None,
            parenthesis_closer: None,
            parenthesis_owner: None,
            scope_opener: None,
            scope_closer: None,
            scope_condition: None,
            comment_opener: None,
            comment_closer: None,
            comment_tags: Vec::new(),
        }
    }

    /// Returns true if the token is the given kind.
    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Returns true if the token content contains a newline.
    #[must_use]
    pub fn has_newline(&self) -> bool {
        self.content.contains('\n')
    }
}

/// The file-scoped token sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    tokens: Vec<Token>,
}

impl Tokens {
    /// Tokenizes source text and resolves structural links.
    #[must_use]
    pub fn tokenize(source: &str) -> Self {
        Self {
            tokens: crate::lexer::tokenize(source),
        }
    }

    /// Wraps an already linked token vector.
    #[must_use]
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if there are no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the token at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Returns the content at `index`, or `""` when out of range.
    #[must_use]
    pub fn content(&self, index: usize) -> &str {
        self.tokens.get(index).map_or("", |t| t.content.as_str())
    }

    /// Returns the kind at `index`, if any.
    #[must_use]
    pub fn kind(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(|t| t.kind)
    }

    /// Iterates over the tokens in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Returns the tokens as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    /// Reassembles the original source text.
    #[must_use]
    pub fn source(&self) -> String {
        self.tokens.iter().map(|t| t.content.as_str()).collect()
    }
}

impl Index<usize> for Tokens {
    type Output = Token;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a Tokens {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(TokenKind::Whitespace.is_empty());
        assert!(TokenKind::DocCommentStar.is_comment());
        assert!(!TokenKind::Whitespace.is_comment());
        assert!(TokenKind::Readonly.is_modifier());
        assert_eq!(
            TokenKind::OpenShortArray.closer(),
            Some(TokenKind::CloseShortArray)
        );
        assert!(TokenKind::IsNotIdentical.is_equality());
    }

    #[test]
    fn test_source_round_trip() {
        let src = "<?php\n$a = [1, 2];\n";
        let tokens = Tokens::tokenize(src);
        assert_eq!(tokens.source(), src);
        assert_eq!(tokens.content(9999), "");
    }
}
