use std::fmt;

/// Type names that are never class names.
///
/// Compared case-insensitively.
pub const BASIC_TYPES: &[&str] = &[
    "array",
    "array-key",
    "bool",
    "boolean",
    "callable",
    "callable-string",
    "class-string",
    "double",
    "false",
    "float",
    "int",
    "integer",
    "iterable",
    "list",
    "mixed",
    "negative-int",
    "never",
    "non-empty-array",
    "non-empty-list",
    "non-empty-string",
    "null",
    "numeric",
    "numeric-string",
    "object",
    "parent",
    "positive-int",
    "resource",
    "scalar",
    "self",
    "static",
    "string",
    "true",
    "void",
    "$this",
];

/// Decides whether `name` looks like a class name.
///
/// This is a heuristic, not a symbol lookup: a name containing a namespace
/// separator is a class; otherwise it must start with an uppercase ASCII
/// letter and not be one of [`BASIC_TYPES`]. Unusually named types produce
/// false positives and negatives.
#[must_use]
pub fn is_class_name(name: &str) -> bool {
    if name.contains('\\') {
        return true;
    }
    name.starts_with(|c: char| c.is_ascii_uppercase()) && !is_basic_type(name)
}

/// Returns true if `name` is in [`BASIC_TYPES`].
#[must_use]
pub fn is_basic_type(name: &str) -> bool {
    BASIC_TYPES.iter().any(|t| t.eq_ignore_ascii_case(name))
}

/// Parsed type annotation.
///
/// `to_string()` reproduces the parsed text byte-for-byte. Anything the
/// parser does not model structurally is kept as [`TypeExpr::Verbatim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `int`, `\Foo\Bar`, `non-empty-string`.
    Identifier(String),
    /// `A|B|C`, members in written order.
    Union(Vec<TypeExpr>),
    /// `A&B`.
    Intersection(Vec<TypeExpr>),
    /// `T[]`.
    Array(Box<TypeExpr>),
    /// `base<arg, arg>`.
    Generic {
        /// Type before `<`.
        base: String,
        /// Arguments in written order.
        args: Vec<TypeExpr>,
        /// Text between consecutive arguments (`,` plus any spacing).
        separators: Vec<String>,
    },
    /// `?T`.
    Nullable(Box<TypeExpr>),
    /// `(T)`.
    Parenthesized(Box<TypeExpr>),
    /// Shapes, callables, literals and conditional types.
    Verbatim(String),
}

impl TypeExpr {
    /// Builds a type from union members; a single member is returned as is.
    #[must_use]
    pub fn from_members(mut members: Vec<TypeExpr>) -> Self {
        if members.len() == 1 {
            members.remove(0)
        } else {
            Self::Union(members)
        }
    }

    /// Direct union members, or the expression itself when not a union.
    #[must_use]
    pub fn members(&self) -> &[TypeExpr] {
        match self {
            Self::Union(members) => members,
            other => std::slice::from_ref(other),
        }
    }

    /// Union members rendered as text, in written order.
    #[must_use]
    pub fn union_members(&self) -> Vec<String> {
        self.members().iter().map(ToString::to_string).collect()
    }

    /// Rewrites `?T` as `T|null`. `None` when not a nullable shorthand.
    #[must_use]
    pub fn expand_nullable(&self) -> Option<TypeExpr> {
        match self {
            Self::Nullable(inner) => {
                let mut members = inner.members().to_vec();
                members.push(Self::Identifier("null".to_string()));
                Some(Self::Union(members))
            }
            _ => None,
        }
    }

    /// Returns true if any union member is `null`.
    #[must_use]
    pub fn contains_null(&self) -> bool {
        matches!(self, Self::Nullable(_))
            || self
                .members()
                .iter()
                .any(|m| matches!(m, Self::Identifier(n) if n.eq_ignore_ascii_case("null")))
    }

    /// Identifier name, if this is a plain identifier.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(name) | Self::Verbatim(name) => f.write_str(name),
            Self::Union(members) => write_joined(f, members, "|"),
            Self::Intersection(members) => write_joined(f, members, "&"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Generic {
                base,
                args,
                separators,
            } => {
                write!(f, "{base}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(separators.get(i - 1).map_or(", ", String::as_str))?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Self::Nullable(inner) => write!(f, "?{inner}"),
            Self::Parenthesized(inner) => write!(f, "({inner})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, members: &[TypeExpr], sep: &str) -> fmt::Result {
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{member}")?;
    }
    Ok(())
}

/// Parses a type annotation.
///
/// Never fails; text that cannot be modelled structurally (or would not
/// render back identically) becomes [`TypeExpr::Verbatim`].
#[must_use]
pub fn parse_type(text: &str) -> TypeExpr {
    let parsed = parse_union(text);
    if parsed.to_string() == text {
        parsed
    } else {
        TypeExpr::Verbatim(text.to_string())
    }
}

fn parse_union(text: &str) -> TypeExpr {
    let parts = split_top_level(text, '|');
    if parts.len() > 1 {
        return TypeExpr::Union(parts.into_iter().map(parse_intersection).collect());
    }
    parse_intersection(text)
}

fn parse_intersection(text: &str) -> TypeExpr {
    let parts = split_top_level(text, '&');
    if parts.len() > 1 {
        return TypeExpr::Intersection(parts.into_iter().map(parse_atom).collect());
    }
    parse_atom(text)
}

fn parse_atom(text: &str) -> TypeExpr {
    if let Some(inner) = text.strip_prefix('?') {
        return TypeExpr::Nullable(Box::new(parse_atom(inner)));
    }
    if let Some(inner) = text.strip_suffix("[]") {
        if !inner.is_empty() && closes_balanced(inner) {
            return TypeExpr::Array(Box::new(parse_atom(inner)));
        }
    }
    if text.starts_with('(')
        && text.ends_with(')')
        && matching_close(text, 0) == Some(text.len() - 1)
    {
        return TypeExpr::Parenthesized(Box::new(parse_union(&text[1..text.len() - 1])));
    }
    if let Some(open) = text.find('<') {
        let base = &text[..open];
        if is_identifier(base)
            && text.ends_with('>')
            && matching_close(text, open) == Some(text.len() - 1)
        {
            return parse_generic(base, &text[open + 1..text.len() - 1]);
        }
    }
    if is_identifier(text) {
        return TypeExpr::Identifier(text.to_string());
    }
    TypeExpr::Verbatim(text.to_string())
}

fn parse_generic(base: &str, inner: &str) -> TypeExpr {
    let mut args = Vec::new();
    let mut separators = Vec::new();
    for (i, part) in split_top_level(inner, ',').into_iter().enumerate() {
        let trimmed = part.trim_start();
        if i > 0 {
            separators.push(format!(",{}", &part[..part.len() - trimmed.len()]));
        }
        args.push(parse_union(trimmed));
    }
    TypeExpr::Generic {
        base: base.to_string(),
        args,
        separators,
    }
}

fn is_identifier(text: &str) -> bool {
    let text = text.strip_prefix('$').unwrap_or(text);
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '\\')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '\\' | '-'))
}

/// Returns true when every bracket opened in `text` is closed.
fn closes_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

/// Byte offset of the bracket closing the one at `open`.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on `sep` outside brackets and quotes.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Result of separating a tag body into its type and the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSplit<'a> {
    /// Type portion.
    pub type_text: &'a str,
    /// Everything after the type, including leading whitespace.
    pub rest: &'a str,
    /// Bracket depth at the end of the type portion; positive means the
    /// type continues on a following line, negative means stray closers.
    pub depth: i32,
}

/// Splits a tag body at the first top-level whitespace run.
///
/// Whitespace inside `<>`, `{}`, `()` or `[]` belongs to the type, as does
/// the space after a callable's return colon (`callable(int): void`).
#[must_use]
pub fn split_type_prefix(body: &str) -> TypeSplit<'_> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;
    let mut end = body.len();
    let mut chars = body.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            prev = Some(c);
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => {
                if prev == Some(':') && body[..i].ends_with("):") {
                    while chars.peek().is_some_and(|(_, n)| n.is_whitespace()) {
                        chars.next();
                    }
                    continue;
                }
                end = i;
                break;
            }
            _ => {}
        }
        if depth < 0 {
            end = i + c.len_utf8();
            break;
        }
        prev = Some(c);
    }

    TypeSplit {
        type_text: &body[..end],
        rest: &body[end..],
        depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for text in [
            "int",
            "?string",
            "Node|string|null",
            "\\Foo\\Bar[]",
            "array<int, string>",
            "array<int,string>",
            "Collection<int, array<string, Node>>|null",
            "(A&B)|null",
            "array{foo: int, bar?: string}",
            "callable(int): void",
            "'a'|'b'",
            "int[][]",
            "class-string<Foo>",
            "Foo::BAR_*",
            "",
        ] {
            assert_eq!(parse_type(text).to_string(), text, "round trip of {text:?}");
        }
    }

    #[test]
    fn test_structure() {
        assert_eq!(
            parse_type("?Foo"),
            TypeExpr::Nullable(Box::new(TypeExpr::Identifier("Foo".into())))
        );
        assert!(matches!(parse_type("int[]"), TypeExpr::Array(_)));
        assert!(matches!(parse_type("array{a: int}"), TypeExpr::Verbatim(_)));

        let TypeExpr::Generic { base, args, .. } = parse_type("array<int, Foo|null>") else {
            panic!("expected generic");
        };
        assert_eq!(base, "array");
        assert_eq!(args.len(), 2);
        assert!(matches!(args[1], TypeExpr::Union(_)));
    }

    #[test]
    fn test_union_members_preserve_order() {
        let ty = parse_type("Node|string|array<int, Node>");
        assert_eq!(ty.union_members(), vec!["Node", "string", "array<int, Node>"]);
        assert_eq!(parse_type("int").union_members(), vec!["int"]);

        let filtered: Vec<TypeExpr> = ty
            .members()
            .iter()
            .filter(|m| m.to_string() != "string")
            .cloned()
            .collect();
        assert_eq!(TypeExpr::from_members(filtered).to_string(), "Node|array<int, Node>");
    }

    #[test]
    fn test_expand_nullable() {
        let expanded = parse_type("?string").expand_nullable().unwrap();
        assert_eq!(expanded.to_string(), "string|null");
        assert!(expanded.contains_null());
        assert_eq!(parse_type("string|null").expand_nullable(), None);
    }

    #[test]
    fn test_class_name_heuristic() {
        assert!(is_class_name("Node"));
        assert!(is_class_name("\\foo\\bar"));
        assert!(!is_class_name("string"));
        assert!(!is_class_name("String"));
        assert!(!is_class_name("Self"));
        assert!(!is_class_name("node"));
    }

    #[test]
    fn test_split_type_prefix() {
        let split = split_type_prefix("array<int, string> $x Desc");
        assert_eq!(split.type_text, "array<int, string>");
        assert_eq!(split.rest, " $x Desc");
        assert_eq!(split.depth, 0);

        let split = split_type_prefix("callable(int): void $cb");
        assert_eq!(split.type_text, "callable(int): void");

        let split = split_type_prefix("array{");
        assert_eq!(split.depth, 1);

        assert!(split_type_prefix("int>").depth < 0);
    }
}
