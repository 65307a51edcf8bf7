use std::fmt;

use super::type_expr::{parse_type, split_type_prefix, TypeExpr};

/// A tag body that starts with a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedValue {
    /// Parsed type portion.
    pub type_expr: TypeExpr,
    /// Text after the type, kept verbatim (including leading whitespace).
    pub rest: String,
}

impl TypedValue {
    /// Variable name following the type (`$x`), without `&` or `...`.
    #[must_use]
    pub fn variable(&self) -> Option<&str> {
        let word = self.rest.split_whitespace().next()?;
        let word = word.trim_start_matches('&').trim_start_matches("...");
        word.starts_with('$').then_some(word)
    }

    /// Description after the type and variable name.
    #[must_use]
    pub fn description(&self) -> &str {
        let rest = self.rest.trim_start();
        if self.variable().is_some() {
            rest.split_once(char::is_whitespace)
                .map_or("", |(_, d)| d.trim_start())
        } else {
            rest
        }
    }

    /// Copy with a different type and the same remainder.
    #[must_use]
    pub fn with_type(&self, type_expr: TypeExpr) -> Self {
        Self {
            type_expr,
            rest: self.rest.clone(),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.type_expr, self.rest)
    }
}

/// Parsed value of a doc-comment tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    /// `@param Type $name Description`.
    Param(TypedValue),
    /// `@return Type Description`.
    Return(TypedValue),
    /// `@var Type [$name] Description`.
    Var(TypedValue),
    /// `@throws Type Description`.
    Throws(TypedValue),
    /// `@method [static] [Type] name(params)`.
    Method {
        /// Return type, when one precedes the method name.
        return_type: Option<TypeExpr>,
        /// The full body.
        body: String,
    },
    /// Any tag without typed structure (`@see`, `@deprecated`, ...).
    Generic(String),
    /// A typed tag whose body carries no type (`@param $x`).
    Typeless(String),
    /// A typed tag whose type portion does not parse.
    Invalid {
        /// The full body.
        body: String,
        /// The type ends inside an unclosed bracket; it may continue on the
        /// next line (see `doc_tag_multiline_value`).
        continues: bool,
    },
}

impl TagValue {
    /// The typed part of `@param`, `@return`, `@var` and `@throws`.
    #[must_use]
    pub fn typed(&self) -> Option<&TypedValue> {
        match self {
            Self::Param(v) | Self::Return(v) | Self::Var(v) | Self::Throws(v) => Some(v),
            _ => None,
        }
    }

    /// Same kind of tag with a replaced typed part.
    #[must_use]
    pub fn with_typed(&self, value: TypedValue) -> Self {
        match self {
            Self::Param(_) => Self::Param(value),
            Self::Return(_) => Self::Return(value),
            Self::Var(_) => Self::Var(value),
            Self::Throws(_) => Self::Throws(value),
            other => other.clone(),
        }
    }

    /// Returns true for [`TagValue::Invalid`].
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(v) | Self::Return(v) | Self::Var(v) | Self::Throws(v) => write!(f, "{v}"),
            Self::Method { body, .. } | Self::Invalid { body, .. } => f.write_str(body),
            Self::Generic(body) | Self::Typeless(body) => f.write_str(body),
        }
    }
}

/// Parses the body of tag `name` (with or without `@`).
///
/// Tolerant: absent or malformed bodies produce [`TagValue::Typeless`] or
/// [`TagValue::Invalid`] instead of failing. Tool-prefixed variants
/// (`@phpstan-param`, `@psalm-return`) parse like the plain tag.
#[must_use]
pub fn parse_tag(name: &str, body: &str) -> TagValue {
    let name = name.trim_start_matches('@').to_ascii_lowercase();
    let base = name
        .strip_prefix("phpstan-")
        .or_else(|| name.strip_prefix("psalm-"))
        .unwrap_or(&name);

    let wrap: fn(TypedValue) -> TagValue = match base {
        "param" => TagValue::Param,
        "return" => TagValue::Return,
        "var" => TagValue::Var,
        "throws" => TagValue::Throws,
        "method" => return parse_method(body),
        _ => return TagValue::Generic(body.to_string()),
    };

    let trimmed = body.trim_start();
    if trimmed.is_empty() || starts_with_variable(trimmed) || trimmed.len() != body.len() {
        return TagValue::Typeless(body.to_string());
    }

    let split = split_type_prefix(body);
    if split.depth != 0 {
        return TagValue::Invalid {
            body: body.to_string(),
            continues: split.depth > 0,
        };
    }

    wrap(TypedValue {
        type_expr: parse_type(split.type_text),
        rest: split.rest.to_string(),
    })
}

fn starts_with_variable(text: &str) -> bool {
    text.trim_start_matches('&').trim_start_matches("...").starts_with('$')
}

fn parse_method(body: &str) -> TagValue {
    let mut words = body.split_whitespace();
    let mut first = words.next();
    if first.is_some_and(|w| w.eq_ignore_ascii_case("static")) {
        first = words.next();
    }
    let return_type = match (first, words.next()) {
        (Some(ty), Some(name)) if !ty.contains('(') && name.contains('(') => Some(parse_type(ty)),
        _ => None,
    };
    TagValue::Method {
        return_type,
        body: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_tag() {
        let value = parse_tag("@param", "Node|string $parent The parent");
        let TagValue::Param(typed) = &value else {
            panic!("expected param, got {value:?}");
        };
        assert_eq!(typed.type_expr.union_members(), vec!["Node", "string"]);
        assert_eq!(typed.variable(), Some("$parent"));
        assert_eq!(typed.description(), "The parent");
        assert_eq!(value.to_string(), "Node|string $parent The parent");
    }

    #[test]
    fn test_variadic_and_reference_variables() {
        let TagValue::Param(typed) = parse_tag("param", "int ...$values") else {
            panic!("expected param");
        };
        assert_eq!(typed.variable(), Some("$values"));
        let TagValue::Param(typed) = parse_tag("param", "array &$out") else {
            panic!("expected param");
        };
        assert_eq!(typed.variable(), Some("$out"));
    }

    #[test]
    fn test_typeless_and_invalid() {
        assert_eq!(parse_tag("@param", "$x Desc"), TagValue::Typeless("$x Desc".into()));
        assert_eq!(parse_tag("@return", ""), TagValue::Typeless(String::new()));
        assert_eq!(
            parse_tag("@param", "array{"),
            TagValue::Invalid {
                body: "array{".into(),
                continues: true
            }
        );
        assert!(matches!(
            parse_tag("@var", "int> $x"),
            TagValue::Invalid {
                continues: false,
                ..
            }
        ));
    }

    #[test]
    fn test_prefixed_and_generic_tags() {
        assert!(matches!(parse_tag("@phpstan-param", "int $x"), TagValue::Param(_)));
        assert!(matches!(parse_tag("@psalm-return", "list<int>"), TagValue::Return(_)));
        assert_eq!(
            parse_tag("@deprecated", "since 2.0"),
            TagValue::Generic("since 2.0".into())
        );
    }

    #[test]
    fn test_method_tag() {
        let TagValue::Method { return_type, body } =
            parse_tag("@method", "static Foo create(int $a)")
        else {
            panic!("expected method");
        };
        assert_eq!(return_type.map(|t| t.to_string()).as_deref(), Some("Foo"));
        assert_eq!(body, "static Foo create(int $a)");
        assert!(matches!(
            parse_tag("@method", "create()"),
            TagValue::Method {
                return_type: None,
                ..
            }
        ));
    }

    #[test]
    fn test_rewrite_keeps_remainder() {
        let value = parse_tag("@var", "?string Some text");
        let typed = value.typed().unwrap();
        let expanded = typed.type_expr.expand_nullable().unwrap();
        assert_eq!(
            value.with_typed(typed.with_type(expanded)).to_string(),
            "string|null Some text"
        );
    }
}
