//! Function signature and property extraction.
//!
//! Descriptors are rebuilt from the live token sequence on every call and
//! must not be kept across a committed changeset.

use crate::locator::enclosing_scope_owner;
use crate::token::{TokenKind, Tokens};

/// Category of a parameter or property default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultValue {
    /// No default value.
    #[default]
    None,
    /// Quoted string literal.
    String,
    /// Integer literal (optionally negated).
    Int,
    /// Float literal (optionally negated).
    Float,
    /// `true` or `false`.
    Bool,
    /// `null`.
    Null,
    /// `[...]` or `array(...)`.
    Array,
    /// Any other expression (constants, calls, concatenations).
    Expression,
}

impl DefaultValue {
    /// Returns true when a default value is present.
    #[must_use]
    pub fn is_present(self) -> bool {
        self != Self::None
    }
}

/// One parameter of a function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Index of the parameter's variable token.
    pub name_index: usize,
    /// Variable name including `$`.
    pub name: String,
    /// Declared type without a leading `?`.
    pub declared_type: Option<String>,
    /// Declared type exactly as written.
    pub declared_type_full: Option<String>,
    /// Nullable prefix, `null` in a union type, or a `null` default.
    pub nullable: bool,
    /// Default value category.
    pub default: DefaultValue,
    /// `...$name`.
    pub variadic: bool,
    /// `&$name`.
    pub by_reference: bool,
    /// Constructor property promotion (`public`, `readonly`, ...).
    pub promoted: bool,
}

impl Parameter {
    /// Returns true when the parameter has a native type.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        self.declared_type.is_some()
    }
}

/// Native return type of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnType {
    /// Declared type without a leading `?`.
    pub declared_type: String,
    /// Declared type exactly as written.
    pub declared_type_full: String,
    /// `?T` or a union containing `null`.
    pub nullable: bool,
}

/// Signature of a `function` or `fn` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Function name; `None` for closures and arrow functions.
    pub name: Option<String>,
    /// Parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Native return type.
    pub return_type: Option<ReturnType>,
    /// False for abstract and interface methods.
    pub has_body: bool,
}

impl FunctionSignature {
    /// Returns true when every parameter and the return value carry a
    /// native type. Constructors and destructors need no return type.
    #[must_use]
    pub fn is_fully_typed(&self) -> bool {
        let return_typed = self.return_type.is_some()
            || self.name.as_deref().is_some_and(|n| {
                n.eq_ignore_ascii_case("__construct") || n.eq_ignore_ascii_case("__destruct")
            });
        return_typed && self.parameters.iter().all(Parameter::is_typed)
    }
}

/// A class property declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDeclaration {
    /// Variable name including `$`.
    pub name: String,
    /// Declared type without a leading `?`.
    pub declared_type: Option<String>,
    /// Declared type exactly as written.
    pub declared_type_full: Option<String>,
    /// `?T` or a union containing `null`.
    pub nullable: bool,
    /// Default value category.
    pub default: DefaultValue,
    /// `static` modifier present.
    pub is_static: bool,
}

/// Extracts the parameters of the function declared at `declaration`.
///
/// Returns an empty list when the token owns no parameter list.
#[must_use]
pub fn method_parameters(tokens: &Tokens, declaration: usize) -> Vec<Parameter> {
    let Some(token) = tokens.get(declaration) else {
        return Vec::new();
    };
    let (Some(open), Some(close)) = (token.parenthesis_opener, token.parenthesis_closer) else {
        return Vec::new();
    };

    split_top_level(tokens, open + 1, close)
        .into_iter()
        .filter_map(|(start, end)| parse_parameter(tokens, start, end))
        .collect()
}

/// Extracts the full signature of the `function`/`fn` token at `declaration`.
#[must_use]
pub fn function_signature(tokens: &Tokens, declaration: usize) -> Option<FunctionSignature> {
    let token = tokens.get(declaration)?;
    if !matches!(token.kind, TokenKind::Function | TokenKind::Fn) {
        return None;
    }

    let name = tokens
        .next_effective(declaration)
        .and_then(|n| {
            if tokens[n].kind == TokenKind::BitwiseAnd {
                tokens.next_effective(n)
            } else {
                Some(n)
            }
        })
        .filter(|&n| tokens[n].kind == TokenKind::String)
        .map(|n| tokens[n].content.clone());

    let return_type = token
        .parenthesis_closer
        .and_then(|closer| return_type(tokens, closer));

    Some(FunctionSignature {
        name,
        parameters: method_parameters(tokens, declaration),
        return_type,
        has_body: token.scope_opener.is_some() || token.kind == TokenKind::Fn,
    })
}

/// Describes the property whose variable token is at `variable`.
///
/// Returns `None` when the variable is not a property declaration.
#[must_use]
pub fn property_declaration(tokens: &Tokens, variable: usize) -> Option<PropertyDeclaration> {
    if tokens.get(variable)?.kind != TokenKind::Variable {
        return None;
    }
    let owner = enclosing_scope_owner(tokens, variable)?;
    if !matches!(
        tokens[owner].kind,
        TokenKind::Class | TokenKind::Trait | TokenKind::Interface | TokenKind::Enum
    ) {
        return None;
    }

    let mut type_parts = Vec::new();
    let mut has_modifier = false;
    let mut is_static = false;
    let mut cursor = variable;
    while let Some(prev) = tokens.previous_effective(cursor) {
        let kind = tokens[prev].kind;
        if kind.is_modifier() {
            has_modifier = true;
            is_static |= kind == TokenKind::Static;
        } else if !has_modifier && is_type_token(kind) {
            type_parts.push(tokens[prev].content.as_str());
        } else {
            break;
        }
        cursor = prev;
    }
    if !has_modifier {
        return None;
    }

    type_parts.reverse();
    let (declared_type, declared_type_full, type_nullable) = split_type(&type_parts.concat());
    let default = default_after(tokens, variable, tokens.len());

    Some(PropertyDeclaration {
        name: tokens[variable].content.clone(),
        declared_type,
        declared_type_full,
        nullable: type_nullable || default == DefaultValue::Null,
        default,
        is_static,
    })
}

/// Splits `start..end` on commas outside nested brackets.
fn split_top_level(tokens: &Tokens, start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut segment_start = start;
    let mut i = start;
    while i < end {
        let token = &tokens[i];
        if token.kind.is_opener() {
            i = token.bracket_closer.map_or(i + 1, |c| c + 1);
            continue;
        }
        if token.kind == TokenKind::Comma {
            segments.push((segment_start, i));
            segment_start = i + 1;
        }
        i += 1;
    }
    segments.push((segment_start, end));
    segments
}

fn parse_parameter(tokens: &Tokens, start: usize, end: usize) -> Option<Parameter> {
    let mut type_text = String::new();
    let mut variadic = false;
    let mut by_reference = false;
    let mut promoted = false;
    let mut name_index = None;

    let mut i = start;
    while i < end {
        let token = &tokens[i];
        match token.kind {
            TokenKind::AttributeOpen => {
                i = token.bracket_closer.map_or(i + 1, |c| c + 1);
                continue;
            }
            TokenKind::Variable => {
                name_index = Some(i);
                break;
            }
            TokenKind::Ellipsis => variadic = true,
            TokenKind::Public | TokenKind::Protected | TokenKind::Private | TokenKind::Readonly => {
                promoted = true;
            }
            TokenKind::BitwiseAnd
                if tokens.next_effective(i).is_some_and(|n| {
                    matches!(tokens[n].kind, TokenKind::Variable | TokenKind::Ellipsis)
                }) =>
            {
                by_reference = true;
            }
            kind if kind.is_empty() => {}
            _ => type_text.push_str(&token.content),
        }
        i += 1;
    }

    let name_index = name_index?;
    let (declared_type, declared_type_full, type_nullable) = split_type(&type_text);
    let default = default_after(tokens, name_index, end);

    Some(Parameter {
        name_index,
        name: tokens[name_index].content.clone(),
        declared_type,
        declared_type_full,
        nullable: type_nullable || default == DefaultValue::Null,
        default,
        variadic,
        by_reference,
        promoted,
    })
}

/// Returns `(declared_type, declared_type_full, nullable)` for a type text.
fn split_type(full: &str) -> (Option<String>, Option<String>, bool) {
    if full.is_empty() {
        return (None, None, false);
    }
    let nullable = full.starts_with('?')
        || full
            .split('|')
            .any(|member| member.trim_matches(['(', ')']).eq_ignore_ascii_case("null"));
    let stripped = full.strip_prefix('?').unwrap_or(full);
    (Some(stripped.to_string()), Some(full.to_string()), nullable)
}

fn is_type_token(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::String
            | TokenKind::Nullable
            | TokenKind::Array
            | TokenKind::Null
            | TokenKind::True
            | TokenKind::False
            | TokenKind::BitwiseOr
            | TokenKind::BitwiseAnd
            | TokenKind::OpenParenthesis
            | TokenKind::CloseParenthesis
    )
}

/// Classifies the default value following the variable at `name`.
///
/// Only the first few effective tokens after the name are inspected; the
/// value itself is classified by its first token.
fn default_after(tokens: &Tokens, name: usize, end: usize) -> DefaultValue {
    let Some(equal) = tokens
        .find_next_effective(name + 1, Some(end))
        .filter(|&e| e <= name + 3 && tokens[e].kind == TokenKind::Equal)
    else {
        return DefaultValue::None;
    };
    let Some(value) = tokens.find_next_effective(equal + 1, Some(end)) else {
        return DefaultValue::Expression;
    };

    match tokens[value].kind {
        TokenKind::ConstantString => DefaultValue::String,
        TokenKind::OpenShortArray | TokenKind::Array => DefaultValue::Array,
        TokenKind::LNumber => DefaultValue::Int,
        TokenKind::DNumber => DefaultValue::Float,
        TokenKind::True | TokenKind::False => DefaultValue::Bool,
        TokenKind::Null => DefaultValue::Null,
        TokenKind::Operator if matches!(tokens[value].content.as_str(), "-" | "+") => {
            match tokens.find_next_effective(value + 1, Some(end)).map(|n| tokens[n].kind) {
                Some(TokenKind::LNumber) => DefaultValue::Int,
                Some(TokenKind::DNumber) => DefaultValue::Float,
                _ => DefaultValue::Expression,
            }
        }
        _ => DefaultValue::Expression,
    }
}

fn return_type(tokens: &Tokens, parenthesis_closer: usize) -> Option<ReturnType> {
    let mut colon = tokens.next_effective(parenthesis_closer)?;
    if tokens[colon].kind == TokenKind::Use {
        let use_open = tokens.next_effective(colon)?;
        colon = tokens.next_effective(tokens[use_open].bracket_closer?)?;
    }
    if tokens[colon].kind != TokenKind::Colon {
        return None;
    }

    let mut text = String::new();
    let mut i = colon + 1;
    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::OpenCurlyBracket | TokenKind::Semicolon | TokenKind::DoubleArrow => break,
            kind if kind.is_empty() => {}
            _ => text.push_str(&token.content),
        }
        i += 1;
    }

    let (declared_type, declared_type_full, nullable) = split_type(&text);
    Some(ReturnType {
        declared_type: declared_type?,
        declared_type_full: declared_type_full?,
        nullable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::predicate;

    fn function(tokens: &Tokens) -> usize {
        tokens
            .find_next([TokenKind::Function, TokenKind::Fn], 0, None)
            .unwrap()
    }

    #[test]
    fn test_parameters_keep_declaration_order() {
        for arity in 0..5 {
            let params: Vec<String> = (0..arity).map(|i| format!("int $p{i}")).collect();
            let src = format!("<?php\nfunction f({}) {{}}\n", params.join(", "));
            let tokens = Tokens::tokenize(&src);
            let names: Vec<String> = method_parameters(&tokens, function(&tokens))
                .into_iter()
                .map(|p| p.name)
                .collect();
            let expected: Vec<String> = (0..arity).map(|i| format!("$p{i}")).collect();
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn test_default_value_table() {
        let tokens = Tokens::tokenize(
            "<?php\nfunction f($a = 'x', $b = [1, 2], $c = 3, $d = 1.5, $e = true, $f = null, $g = -2, $h = PHP_EOL, $i = array(), $j) {}\n",
        );
        let defaults: Vec<DefaultValue> = method_parameters(&tokens, function(&tokens))
            .into_iter()
            .map(|p| p.default)
            .collect();
        assert_eq!(
            defaults,
            vec![
                DefaultValue::String,
                DefaultValue::Array,
                DefaultValue::Int,
                DefaultValue::Float,
                DefaultValue::Bool,
                DefaultValue::Null,
                DefaultValue::Int,
                DefaultValue::Expression,
                DefaultValue::Array,
                DefaultValue::None,
            ]
        );
    }

    #[test]
    fn test_nullable_type_is_stripped() {
        let tokens = Tokens::tokenize(
            "<?php\nfunction f(?string $a, Node $b = null, int|null $c, \\Foo\\Bar $d) {}\n",
        );
        let params = method_parameters(&tokens, function(&tokens));

        assert_eq!(params[0].declared_type.as_deref(), Some("string"));
        assert_eq!(params[0].declared_type_full.as_deref(), Some("?string"));
        assert!(params[0].nullable);

        assert_eq!(params[1].declared_type.as_deref(), Some("Node"));
        assert!(params[1].nullable);
        assert!(params[2].nullable);

        assert_eq!(params[3].declared_type.as_deref(), Some("\\Foo\\Bar"));
        assert!(!params[3].nullable);
    }

    #[test]
    fn test_parameter_flags() {
        let tokens = Tokens::tokenize(
            "<?php\nclass A {\n    public function __construct(#[Attr(1, 2)] private readonly int $a, array &$b, string ...$rest) {}\n}\n",
        );
        let params = method_parameters(&tokens, function(&tokens));
        assert_eq!(params.len(), 3);
        assert!(params[0].promoted);
        assert_eq!(params[0].declared_type.as_deref(), Some("int"));
        assert!(params[1].by_reference);
        assert_eq!(params[1].declared_type.as_deref(), Some("array"));
        assert!(params[2].variadic);
        assert!(!params[2].by_reference);
    }

    #[test]
    fn test_intersection_is_not_by_reference() {
        let tokens = Tokens::tokenize("<?php\nfunction f(A&B $x) {}\n");
        let params = method_parameters(&tokens, function(&tokens));
        assert_eq!(params[0].declared_type.as_deref(), Some("A&B"));
        assert!(!params[0].by_reference);
    }

    #[test]
    fn test_no_parameter_list_yields_empty() {
        let tokens = Tokens::tokenize("<?php\nfunction f() {}\n$x = 1;\n");
        assert!(method_parameters(&tokens, function(&tokens)).is_empty());
        let var = tokens.find_next(TokenKind::Variable, 0, None).unwrap();
        assert!(method_parameters(&tokens, var).is_empty());
        assert!(method_parameters(&tokens, 9999).is_empty());
    }

    #[test]
    fn test_function_signature() {
        let tokens = Tokens::tokenize(
            "<?php\ninterface I {\n    public function find(int $id): ?Node;\n}\n",
        );
        let sig = function_signature(&tokens, function(&tokens)).unwrap();
        assert_eq!(sig.name.as_deref(), Some("find"));
        assert!(!sig.has_body);
        let ret = sig.return_type.clone().unwrap();
        assert_eq!(ret.declared_type, "Node");
        assert_eq!(ret.declared_type_full, "?Node");
        assert!(ret.nullable);
        assert!(sig.is_fully_typed());
    }

    #[test]
    fn test_closure_signature() {
        let tokens =
            Tokens::tokenize("<?php\n$f = function ($a) use ($b): int { return 1; };\n$g = fn(int $x): int => $x;\n");
        let closure = function_signature(&tokens, function(&tokens)).unwrap();
        assert_eq!(closure.name, None);
        assert_eq!(closure.parameters.len(), 1);
        assert_eq!(closure.return_type.as_ref().map(|r| r.declared_type.as_str()), Some("int"));
        assert!(!closure.is_fully_typed());

        let arrow = tokens.find_next(TokenKind::Fn, 0, None).unwrap();
        let arrow = function_signature(&tokens, arrow).unwrap();
        assert!(arrow.has_body);
        assert!(arrow.is_fully_typed());
    }

    #[test]
    fn test_constructor_needs_no_return_type() {
        let tokens = Tokens::tokenize("<?php\nclass A {\n    public function __construct(int $a) {}\n}\n");
        let sig = function_signature(&tokens, function(&tokens)).unwrap();
        assert!(sig.return_type.is_none());
        assert!(sig.is_fully_typed());
    }

    #[test]
    fn test_property_declaration() {
        let tokens = Tokens::tokenize(
            "<?php\nclass A {\n    private static ?string $name;\n    public $list = [];\n    function f() { $local = 1; }\n}\n",
        );
        let find = |content: &str| {
            tokens
                .find_next(predicate(|t| t.content == content), 0, None)
                .unwrap()
        };

        let name = property_declaration(&tokens, find("$name")).unwrap();
        assert_eq!(name.declared_type.as_deref(), Some("string"));
        assert!(name.nullable);
        assert!(name.is_static);
        assert_eq!(name.default, DefaultValue::None);

        let list = property_declaration(&tokens, find("$list")).unwrap();
        assert_eq!(list.declared_type, None);
        assert_eq!(list.default, DefaultValue::Array);

        assert_eq!(property_declaration(&tokens, find("$local")), None);
    }
}
