//! Reference tokenizer for PHP-like source.
//!
//! Produces the flat token arena consumed by every rule. Lexing never fails:
//! bytes that do not start a known token become [`TokenKind::Unknown`].
//! After lexing, three passes resolve the structural links (brackets,
//! parenthesis owners, scopes).

use crate::token::{Token, TokenKind};

/// Type names accepted inside a cast, compared case-insensitively.
const CASTS: &[&str] = &[
    "int", "integer", "bool", "boolean", "float", "double", "real", "string", "binary", "array",
    "object", "unset", "void",
];

/// Multi-character operators, longest first.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("<=>", TokenKind::Operator),
    ("===", TokenKind::IsIdentical),
    ("!==", TokenKind::IsNotIdentical),
    ("**=", TokenKind::Operator),
    ("...", TokenKind::Ellipsis),
    ("<<=", TokenKind::Operator),
    (">>=", TokenKind::Operator),
    ("??=", TokenKind::Operator),
    ("?->", TokenKind::ObjectOperator),
    ("==", TokenKind::IsEqual),
    ("!=", TokenKind::IsNotEqual),
    ("<>", TokenKind::IsNotEqual),
    ("<=", TokenKind::Operator),
    (">=", TokenKind::Operator),
    ("&&", TokenKind::BooleanAnd),
    ("||", TokenKind::BooleanOr),
    ("??", TokenKind::Operator),
    ("->", TokenKind::ObjectOperator),
    ("=>", TokenKind::DoubleArrow),
    ("::", TokenKind::DoubleColon),
    ("++", TokenKind::Operator),
    ("--", TokenKind::Operator),
    ("+=", TokenKind::Operator),
    ("-=", TokenKind::Operator),
    ("*=", TokenKind::Operator),
    ("/=", TokenKind::Operator),
    (".=", TokenKind::Operator),
    ("%=", TokenKind::Operator),
    ("&=", TokenKind::Operator),
    ("|=", TokenKind::Operator),
    ("^=", TokenKind::Operator),
    ("**", TokenKind::Operator),
    ("<<", TokenKind::Operator),
    (">>", TokenKind::Operator),
];

/// Tokenizes `source` and resolves all structural links.
pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    lexer.run();

    let mut tokens = lexer.tokens;
    link_brackets(&mut tokens);
    link_parenthesis_owners(&mut tokens);
    link_scopes(&mut tokens);
    tokens
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    /// Kinds of the currently open `[`/`#[` brackets, to pick closer kinds.
    square_stack: Vec<TokenKind>,
    last_significant: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            square_stack: Vec::new(),
            last_significant: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn push(&mut self, kind: TokenKind, len: usize) {
        let end = self.pos + len;
        let content = &self.src[self.pos..end];
        self.tokens
            .push(Token::new(kind, content, self.line, self.column));

        for ch in content.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }

        if !kind.is_empty() {
            self.last_significant = Some(kind);
        }
        self.pos = end;
    }

    fn run(&mut self) {
        self.lex_html();
        while self.pos < self.src.len() {
            self.lex_php_token();
        }
    }

    fn lex_html(&mut self) {
        let rest = self.rest();
        if rest.is_empty() {
            return;
        }

        let lower = rest.to_ascii_lowercase();
        let open = [lower.find("<?php").map(|i| (i, 5)), rest.find("<?=").map(|i| (i, 3))]
            .into_iter()
            .flatten()
            .min_by_key(|(i, _)| *i);

        match open {
            Some((at, len)) => {
                if at > 0 {
                    self.push(TokenKind::InlineHtml, at);
                }
                self.push(TokenKind::OpenTag, len);
            }
            None => self.push(TokenKind::InlineHtml, rest.len()),
        }
    }

    fn lex_php_token(&mut self) {
        let rest = self.rest();
        let bytes = rest.as_bytes();

        match bytes[0] {
            b' ' | b'\t' | b'\r' | b'\n' => {
                let mut len = 0;
                while len < bytes.len() && matches!(bytes[len], b' ' | b'\t' | b'\r' | b'\n') {
                    len += 1;
                    if bytes[len - 1] == b'\n' {
                        break;
                    }
                }
                self.push(TokenKind::Whitespace, len);
            }
            b'?' if rest.starts_with("?>") => {
                self.push(TokenKind::CloseTag, 2);
                self.lex_html();
            }
            b'#' if rest.starts_with("#[") => {
                self.square_stack.push(TokenKind::AttributeOpen);
                self.push(TokenKind::AttributeOpen, 2);
            }
            b'#' => self.lex_line_comment(),
            b'/' if rest.starts_with("//") => self.lex_line_comment(),
            b'/' if rest.starts_with("/**") && !rest.starts_with("/**/") => {
                self.lex_doc_comment();
            }
            b'/' if rest.starts_with("/*") => {
                let len = rest[2..].find("*/").map_or(rest.len(), |i| i + 4);
                self.push(TokenKind::Comment, len);
            }
            b'$' if bytes.get(1).is_some_and(|b| is_ident_start(*b)) => {
                let len = 1 + bytes[1..].iter().take_while(|b| is_ident_byte(**b)).count();
                self.push(TokenKind::Variable, len);
            }
            quote @ (b'\'' | b'"' | b'`') => self.lex_quoted(quote),
            b'<' if rest.starts_with("<<<") => {
                if !self.lex_heredoc() {
                    self.lex_operator();
                }
            }
            b'0'..=b'9' => self.lex_number(),
            b'.' if bytes.get(1).is_some_and(u8::is_ascii_digit) => self.lex_number(),
            b'(' => match self.cast_len() {
                Some(len) => self.push(TokenKind::Cast, len),
                None => self.push(TokenKind::OpenParenthesis, 1),
            },
            b')' => self.push(TokenKind::CloseParenthesis, 1),
            b'{' => self.push(TokenKind::OpenCurlyBracket, 1),
            b'}' => self.push(TokenKind::CloseCurlyBracket, 1),
            b'[' => {
                let kind = match self.last_significant {
                    Some(
                        TokenKind::Variable
                        | TokenKind::CloseSquareBracket
                        | TokenKind::CloseShortArray
                        | TokenKind::CloseParenthesis
                        | TokenKind::CloseCurlyBracket
                        | TokenKind::String
                        | TokenKind::ConstantString,
                    ) => TokenKind::OpenSquareBracket,
                    _ => TokenKind::OpenShortArray,
                };
                self.square_stack.push(kind);
                self.push(kind, 1);
            }
            b']' => {
                let kind = match self.square_stack.pop() {
                    Some(TokenKind::OpenShortArray) => TokenKind::CloseShortArray,
                    Some(TokenKind::AttributeOpen) => TokenKind::AttributeClose,
                    _ => TokenKind::CloseSquareBracket,
                };
                self.push(kind, 1);
            }
            b';' => self.push(TokenKind::Semicolon, 1),
            b',' => self.push(TokenKind::Comma, 1),
            b if b == b'\\' || is_ident_start(b) => self.lex_word(),
            _ => self.lex_operator(),
        }
    }

    fn lex_line_comment(&mut self) {
        let rest = self.rest();
        let mut len = rest.find('\n').unwrap_or(rest.len());
        if let Some(close) = rest[..len].find("?>") {
            len = close;
        }
        if rest[..len].ends_with('\r') {
            len -= 1;
        }
        self.push(TokenKind::Comment, len);
    }

    fn lex_doc_comment(&mut self) {
        let rest = self.rest();
        let close = rest[3..].find("*/").map(|i| i + 3);
        let body_end = self.pos + close.unwrap_or(rest.len());

        let opener = self.tokens.len();
        self.push(TokenKind::DocCommentOpenTag, 3);

        let mut tags = Vec::new();
        let mut line_start = false;
        let mut line_has_content = false;

        while self.pos < body_end {
            let segment = &self.src[self.pos..body_end];
            let b = segment.as_bytes();

            match b[0] {
                b'\n' => {
                    self.push(TokenKind::DocCommentWhitespace, 1);
                    line_start = true;
                    line_has_content = false;
                }
                b'\r' if b.get(1) == Some(&b'\n') => {
                    self.push(TokenKind::DocCommentWhitespace, 2);
                    line_start = true;
                    line_has_content = false;
                }
                b' ' | b'\t' | b'\r' => {
                    let len = b
                        .iter()
                        .take_while(|c| matches!(c, b' ' | b'\t'))
                        .count()
                        .max(1);
                    self.push(TokenKind::DocCommentWhitespace, len);
                }
                b'*' if line_start => {
                    self.push(TokenKind::DocCommentStar, 1);
                    line_start = false;
                }
                b'@' if !line_has_content
                    && b.get(1).is_some_and(|c| c.is_ascii_alphabetic() || *c == b'\\') =>
                {
                    let len = 1 + b[1..]
                        .iter()
                        .take_while(|c| {
                            c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'\\' | b':')
                        })
                        .count();
                    tags.push(self.tokens.len());
                    self.push(TokenKind::DocCommentTag, len);
                    line_start = false;
                    line_has_content = true;
                }
                _ => {
                    let line_len = segment.find('\n').unwrap_or(segment.len());
                    let text = segment[..line_len].trim_end();
                    let len = if text.is_empty() {
                        segment.chars().next().map_or(1, char::len_utf8)
                    } else {
                        text.len()
                    };
                    self.push(TokenKind::DocCommentString, len);
                    line_start = false;
                    line_has_content = true;
                }
            }
        }

        if close.is_some() {
            let closer = self.tokens.len();
            self.push(TokenKind::DocCommentCloseTag, 2);
            self.tokens[closer].comment_opener = Some(opener);
            self.tokens[opener].comment_closer = Some(closer);
        }
        self.tokens[opener].comment_tags = tags;
    }

    fn lex_quoted(&mut self, quote: u8) {
        let bytes = self.rest().as_bytes();
        let mut len = bytes.len();
        let mut i = 1;
        while i < bytes.len() {
            if bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            if bytes[i] == quote {
                len = i + 1;
                break;
            }
            i += 1;
        }
        self.push(TokenKind::ConstantString, len);
    }

    /// Lexes a heredoc/nowdoc; returns false if the header is not one.
    fn lex_heredoc(&mut self) -> bool {
        let rest = self.rest();
        let Some(header_end) = rest.find('\n') else {
            return false;
        };
        let label = rest[3..header_end]
            .trim()
            .trim_matches(|c| c == '\'' || c == '"');
        if label.is_empty() || !label.bytes().all(is_ident_byte) {
            return false;
        }

        let mut offset = header_end + 1;
        for line in rest[offset..].split_inclusive('\n') {
            let trimmed = line.trim_start();
            if trimmed.starts_with(label)
                && !trimmed[label.len()..]
                    .bytes()
                    .next()
                    .is_some_and(is_ident_byte)
            {
                let end = offset + (line.len() - trimmed.len()) + label.len();
                self.push(TokenKind::ConstantString, end);
                return true;
            }
            offset += line.len();
        }

        self.push(TokenKind::ConstantString, rest.len());
        true
    }

    fn lex_number(&mut self) {
        let b = self.rest().as_bytes();
        let mut i = 0;
        let mut float = false;

        if b.len() > 1 && b[0] == b'0' && matches!(b[1], b'x' | b'X' | b'b' | b'B' | b'o' | b'O') {
            i = 2;
            while i < b.len() && (b[i].is_ascii_hexdigit() || b[i] == b'_') {
                i += 1;
            }
        } else {
            while i < b.len() && (b[i].is_ascii_digit() || b[i] == b'_') {
                i += 1;
            }
            if i < b.len() && b[i] == b'.' && b.get(i + 1).is_some_and(u8::is_ascii_digit) {
                float = true;
                i += 1;
                while i < b.len() && (b[i].is_ascii_digit() || b[i] == b'_') {
                    i += 1;
                }
            }
            if i < b.len() && matches!(b[i], b'e' | b'E') {
                let sign = usize::from(matches!(b.get(i + 1), Some(b'+' | b'-')));
                if b.get(i + 1 + sign).is_some_and(u8::is_ascii_digit) {
                    float = true;
                    i += 1 + sign;
                    while i < b.len() && b[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
        }

        let kind = if float {
            TokenKind::DNumber
        } else {
            TokenKind::LNumber
        };
        self.push(kind, i);
    }

    /// Returns the length of a cast like `(int)` or `( void )` at the cursor.
    fn cast_len(&self) -> Option<usize> {
        let rest = self.rest();
        let b = rest.as_bytes();
        let mut i = 1;
        while i < b.len() && matches!(b[i], b' ' | b'\t') {
            i += 1;
        }
        let start = i;
        while i < b.len() && b[i].is_ascii_alphabetic() {
            i += 1;
        }
        if start == i {
            return None;
        }
        let word = rest[start..i].to_ascii_lowercase();
        while i < b.len() && matches!(b[i], b' ' | b'\t') {
            i += 1;
        }
        (i < b.len() && b[i] == b')' && CASTS.contains(&word.as_str())).then_some(i + 1)
    }

    fn lex_word(&mut self) {
        let rest = self.rest();
        let b = rest.as_bytes();
        let mut i = usize::from(b[0] == b'\\');
        loop {
            while i < b.len() && is_ident_byte(b[i]) {
                i += 1;
            }
            if i + 1 < b.len() && b[i] == b'\\' && is_ident_start(b[i + 1]) {
                i += 1;
            } else {
                break;
            }
        }

        if i == usize::from(b[0] == b'\\') {
            self.push(TokenKind::Unknown, 1);
            return;
        }

        let word = &rest[..i];
        let kind = if word.contains('\\') {
            TokenKind::String
        } else {
            self.keyword(word, &rest[i..])
        };
        self.push(kind, i);
    }

    fn keyword(&self, word: &str, after: &str) -> TokenKind {
        if matches!(
            self.last_significant,
            Some(TokenKind::ObjectOperator | TokenKind::DoubleColon | TokenKind::Function)
        ) {
            return TokenKind::String;
        }

        match word.to_ascii_lowercase().as_str() {
            "function" => TokenKind::Function,
            "fn" => TokenKind::Fn,
            "class" => TokenKind::Class,
            "interface" => TokenKind::Interface,
            "trait" => TokenKind::Trait,
            "enum" if after.trim_start().bytes().next().is_some_and(is_ident_start) => {
                TokenKind::Enum
            }
            "case" => TokenKind::Case,
            "extends" => TokenKind::Extends,
            "implements" => TokenKind::Implements,
            "abstract" => TokenKind::Abstract,
            "final" => TokenKind::Final,
            "public" => TokenKind::Public,
            "protected" => TokenKind::Protected,
            "private" => TokenKind::Private,
            "static" => TokenKind::Static,
            "readonly" => TokenKind::Readonly,
            "var" => TokenKind::Var,
            "const" => TokenKind::Const,
            "return" => TokenKind::Return,
            "namespace" => TokenKind::Namespace,
            "use" => TokenKind::Use,
            "new" => TokenKind::New,
            "if" => TokenKind::If,
            "elseif" => TokenKind::Elseif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "foreach" => TokenKind::Foreach,
            "switch" => TokenKind::Switch,
            "match" => TokenKind::Match,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "array" => TokenKind::Array,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "and" => TokenKind::LogicalAnd,
            "or" => TokenKind::LogicalOr,
            "xor" => TokenKind::LogicalXor,
            "instanceof" => TokenKind::Instanceof,
            _ => TokenKind::String,
        }
    }

    fn lex_operator(&mut self) {
        let rest = self.rest();
        if let Some((op, kind)) = OPERATORS.iter().find(|(op, _)| rest.starts_with(op)) {
            self.push(*kind, op.len());
            return;
        }

        let kind = match rest.as_bytes()[0] {
            b'=' => TokenKind::Equal,
            b'|' => TokenKind::BitwiseOr,
            b'&' => TokenKind::BitwiseAnd,
            b':' => TokenKind::Colon,
            b'?' if self.nullable_context() => TokenKind::Nullable,
            b'?' => TokenKind::InlineThen,
            b if b.is_ascii_punctuation() => TokenKind::Operator,
            _ => TokenKind::Unknown,
        };
        let len = rest.chars().next().map_or(1, char::len_utf8);
        self.push(kind, len);
    }

    /// Decides whether a `?` at the cursor prefixes a type.
    fn nullable_context(&self) -> bool {
        let prefix = matches!(
            self.last_significant,
            Some(
                TokenKind::OpenParenthesis
                    | TokenKind::Comma
                    | TokenKind::Colon
                    | TokenKind::Public
                    | TokenKind::Protected
                    | TokenKind::Private
                    | TokenKind::Static
                    | TokenKind::Readonly
                    | TokenKind::Var
                    | TokenKind::Const
                    | TokenKind::AttributeClose
            )
        );
        prefix
            && self.rest()[1..]
                .trim_start()
                .bytes()
                .next()
                .is_some_and(|b| b == b'\\' || is_ident_start(b))
    }
}

fn previous_effective(tokens: &[Token], index: usize) -> Option<usize> {
    (0..index).rev().find(|&i| !tokens[i].kind.is_empty())
}

fn next_effective(tokens: &[Token], from: usize) -> Option<usize> {
    (from..tokens.len()).find(|&i| !tokens[i].kind.is_empty())
}

fn link_brackets(tokens: &mut [Token]) {
    let mut stack: Vec<usize> = Vec::new();

    for i in 0..tokens.len() {
        let kind = tokens[i].kind;
        if kind.is_opener() {
            stack.push(i);
            continue;
        }
        if !kind.is_closer() {
            continue;
        }

        let Some(pos) = stack
            .iter()
            .rposition(|&o| tokens[o].kind.closer() == Some(kind))
        else {
            continue;
        };
        let opener = stack[pos];
        stack.truncate(pos);

        for idx in [opener, i] {
            tokens[idx].bracket_opener = Some(opener);
            tokens[idx].bracket_closer = Some(i);
            if kind == TokenKind::CloseParenthesis {
                tokens[idx].parenthesis_opener = Some(opener);
                tokens[idx].parenthesis_closer = Some(i);
            }
        }
    }
}

fn link_parenthesis_owners(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        if tokens[i].kind != TokenKind::OpenParenthesis {
            continue;
        }
        let Some(closer) = tokens[i].parenthesis_closer else {
            continue;
        };
        let Some(prev) = previous_effective(tokens, i) else {
            continue;
        };

        let owner = match tokens[prev].kind {
            TokenKind::Function
            | TokenKind::Fn
            | TokenKind::If
            | TokenKind::Elseif
            | TokenKind::While
            | TokenKind::For
            | TokenKind::Foreach
            | TokenKind::Switch
            | TokenKind::Catch
            | TokenKind::Match
            | TokenKind::Array
            | TokenKind::Use => Some(prev),
            TokenKind::String => previous_effective(tokens, prev)
                .and_then(|p| {
                    if tokens[p].kind == TokenKind::BitwiseAnd {
                        previous_effective(tokens, p)
                    } else {
                        Some(p)
                    }
                })
                .filter(|&p| tokens[p].kind == TokenKind::Function),
            _ => None,
        };

        if let Some(owner) = owner {
            tokens[owner].parenthesis_opener = Some(i);
            tokens[owner].parenthesis_closer = Some(closer);
            tokens[i].parenthesis_owner = Some(owner);
            tokens[closer].parenthesis_owner = Some(owner);
        }
    }
}

fn link_scopes(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        let opener = match tokens[i].kind {
            TokenKind::Function
            | TokenKind::Class
            | TokenKind::Interface
            | TokenKind::Trait
            | TokenKind::Enum => find_declaration_body(tokens, i),
            TokenKind::If
            | TokenKind::Elseif
            | TokenKind::While
            | TokenKind::For
            | TokenKind::Foreach
            | TokenKind::Switch
            | TokenKind::Catch
            | TokenKind::Match => tokens[i]
                .parenthesis_closer
                .and_then(|c| next_effective(tokens, c + 1))
                .filter(|&n| tokens[n].kind == TokenKind::OpenCurlyBracket),
            TokenKind::Else | TokenKind::Try | TokenKind::Finally => next_effective(tokens, i + 1)
                .filter(|&n| tokens[n].kind == TokenKind::OpenCurlyBracket),
            _ => None,
        };

        let Some(opener) = opener else {
            continue;
        };
        let Some(closer) = tokens[opener].bracket_closer else {
            continue;
        };

        tokens[i].scope_opener = Some(opener);
        tokens[i].scope_closer = Some(closer);
        for idx in [opener, closer] {
            tokens[idx].scope_condition = Some(i);
            tokens[idx].scope_opener = Some(opener);
            tokens[idx].scope_closer = Some(closer);
        }
    }
}

/// Finds the `{` opening a declaration body, or `None` for `;`-terminated ones.
fn find_declaration_body(tokens: &[Token], owner: usize) -> Option<usize> {
    let mut j = tokens[owner].parenthesis_closer.map_or(owner + 1, |c| c + 1);
    while j < tokens.len() {
        match tokens[j].kind {
            TokenKind::OpenCurlyBracket => return Some(j),
            TokenKind::Semicolon | TokenKind::CloseCurlyBracket => return None,
            kind if kind.is_opener() => {
                j = tokens[j].bracket_closer? + 1;
                continue;
            }
            _ => {}
        }
        j += 1;
    }
    None
}
