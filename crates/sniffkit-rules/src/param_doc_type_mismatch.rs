//! Rule to detect `@param` types that contradict the native parameter type.
//!
//! # Detected Patterns
//!
//! ```php
//! /**
//!  * @param Node|string $parent
//!  */
//! function attach(Node $parent) {}
//! ```
//!
//! `string` can never be passed as `Node`, so the fixer strips it and leaves
//! `@param Node $parent`. When no documented member is compatible, or the
//! tag spans several lines, the violation is reported without a fix.
//!
//! Compatibility is judged conservatively: a member is only removed when it
//! is provably incompatible. Class names are compared by the
//! `is_class_name` heuristic, so any class is assumed compatible with any
//! other class.

use sniffkit_core::doc::{is_class_name, DocBlock, TypeExpr};
use sniffkit_core::locator::find_doc_comment;
use sniffkit_core::signature::{method_parameters, DefaultValue, Parameter};
use sniffkit_core::{Rule, RuleError, Severity, SniffContext, TokenKind};

/// Rule code for param-doc-type-mismatch.
pub const CODE: &str = "SK002";

/// Rule name for param-doc-type-mismatch.
pub const NAME: &str = "param-doc-type-mismatch";

/// Reports `@param` union members that the native type rejects.
#[derive(Debug, Clone)]
pub struct ParamDocTypeMismatch {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for ParamDocTypeMismatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamDocTypeMismatch {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Rule for ParamDocTypeMismatch {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Reports @param types incompatible with the native parameter type"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn fixable(&self) -> bool {
        true
    }

    fn register(&self) -> &'static [TokenKind] {
        &[TokenKind::Function]
    }

    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
        let tokens = ctx.tokens();
        let Some(closer) = find_doc_comment(tokens, index) else {
            return Ok(());
        };
        let Some(opener) = tokens[closer].comment_opener else {
            return Ok(());
        };
        let Some(block) = DocBlock::read(tokens, opener) else {
            return Ok(());
        };

        for parameter in method_parameters(tokens, index) {
            let Some(native) = parameter.declared_type.as_deref() else {
                continue;
            };
            let Some(tag) = block.param_tag(&parameter.name) else {
                continue;
            };
            let Some(typed) = tag.value.typed() else {
                continue;
            };

            let native_members = native_members(native, parameter.nullable);
            let (kept, dropped): (Vec<&TypeExpr>, Vec<&TypeExpr>) = typed
                .type_expr
                .members()
                .iter()
                .partition(|member| is_compatible(member, &native_members, &parameter));
            if dropped.is_empty() {
                continue;
            }

            let dropped_text = dropped
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let message = format!(
                "@param type \"{}\" of {} is incompatible with native type \"{}\": {}",
                typed.type_expr,
                parameter.name,
                parameter.declared_type_full.as_deref().unwrap_or(native),
                dropped_text
            );

            let value_index = tag.value_index;
            match value_index {
                Some(value_index) if !kept.is_empty() && !tag.multiline => {
                    let narrowed =
                        TypeExpr::from_members(kept.into_iter().cloned().collect());
                    let replacement = tag.value.with_typed(typed.with_type(narrowed)).to_string();
                    ctx.add_fixable(tag.index, message, |fixer| {
                        fixer.replace(value_index, replacement)?;
                        Ok(())
                    })?;
                }
                _ => {
                    ctx.add_error(tag.index, message);
                }
            }
        }

        Ok(())
    }
}

/// Native type members, lowercased for scalars and without leading `\`.
fn native_members(native: &str, nullable: bool) -> Vec<String> {
    let mut members: Vec<String> = native
        .split(['|', '&'])
        .map(|m| normalize(m.trim_matches(['(', ')'])))
        .filter(|m| !m.is_empty())
        .collect();
    if nullable && !members.iter().any(|m| m == "null") {
        members.push("null".to_string());
    }
    members
}

fn normalize(name: &str) -> String {
    let name = name.trim_start_matches('\\');
    if is_class_name(name) {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

/// Scalar categories a doc type name can stand for.
fn doc_categories(name: &str) -> Option<&'static [&'static str]> {
    Some(match name {
        "int" | "integer" | "positive-int" | "negative-int" | "non-negative-int"
        | "non-positive-int" | "non-zero-int" => &["int"],
        "float" | "double" => &["float"],
        "string" | "non-empty-string" | "numeric-string" | "literal-string"
        | "lowercase-string" | "class-string" | "callable-string" | "trait-string"
        | "interface-string" | "enum-string" => &["string"],
        "bool" | "boolean" => &["bool"],
        "true" => &["true"],
        "false" => &["false"],
        "array" | "list" | "non-empty-array" | "non-empty-list" | "associative-array"
        | "callable-array" => &["array"],
        "array-key" => &["int", "string"],
        "numeric" => &["int", "float", "string"],
        "scalar" => &["int", "float", "string", "bool"],
        "null" | "void" => &["null"],
        "resource" | "closed-resource" | "open-resource" => &["resource"],
        _ => return None,
    })
}

/// Whether the native member `native` accepts the scalar category `category`.
fn native_accepts_scalar(native: &str, category: &str) -> bool {
    match native {
        "mixed" => true,
        "float" => matches!(category, "float" | "int"),
        "bool" => matches!(category, "bool" | "true" | "false"),
        "iterable" => category == "array",
        "callable" => matches!(category, "string" | "array"),
        n => n == category,
    }
}

/// Whether the native member `native` accepts some object.
fn native_accepts_object(native: &str) -> bool {
    matches!(native, "mixed" | "object" | "iterable" | "callable" | "self" | "static")
        || is_class_name(native)
}

fn is_compatible(member: &TypeExpr, natives: &[String], parameter: &Parameter) -> bool {
    let name = match member {
        TypeExpr::Identifier(name) => normalize(name),
        TypeExpr::Array(_) => "array".to_string(),
        TypeExpr::Generic { base, .. } => normalize(base),
        // Shapes, callables, intersections: nothing provable.
        _ => return true,
    };

    if name == "null" && parameter.default == DefaultValue::Null {
        return true;
    }

    if let Some(categories) = doc_categories(&name) {
        return categories
            .iter()
            .any(|c| natives.iter().any(|n| native_accepts_scalar(n, c)));
    }

    match name.as_str() {
        "mixed" => true,
        "object" | "self" | "static" | "$this" | "closure" | "iterable" | "callable" => natives
            .iter()
            .any(|n| native_accepts_object(n) || n == &name || n == "mixed"),
        _ if is_class_name(&name) => natives.iter().any(|n| native_accepts_object(n)),
        // Unknown lowercase names (template types, aliases) are left alone.
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check, fix};

    #[test]
    fn test_strips_incompatible_member() {
        let src = "<?php\n/**\n * @param Node|string $parent\n */\nfunction attach(Node $parent) {}\n";
        let violations = check(ParamDocTypeMismatch::new(), src);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].fixable);
        assert!(violations[0].message.contains("string"));

        insta::assert_snapshot!(fix(ParamDocTypeMismatch::new(), src), @r"
        <?php
        /**
         * @param Node $parent
         */
        function attach(Node $parent) {}
        ");
    }

    #[test]
    fn test_unfixable_when_nothing_compatible() {
        let src = "<?php\n/**\n * @param string|int $parent\n */\nfunction attach(Node $parent) {}\n";
        let violations = check(ParamDocTypeMismatch::new(), src);
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].fixable);
        assert_eq!(fix(ParamDocTypeMismatch::new(), src), src);
    }

    #[test]
    fn test_compatible_types_pass() {
        let src = "<?php\n/**\n * @param int|float $n\n * @param list<string> $items\n * @param Foo|null $foo\n * @param true $flag\n */\nfunction f(float $n, iterable $items, ?Bar $foo, bool $flag) {}\n";
        assert!(check(ParamDocTypeMismatch::new(), src).is_empty());
    }

    #[test]
    fn test_null_needs_nullable_native() {
        let src = "<?php\n/**\n * @param string|null $s\n */\nfunction f(string $s) {}\n";
        let fixed = fix(ParamDocTypeMismatch::new(), src);
        assert!(fixed.contains("@param string $s"));

        let src = "<?php\n/**\n * @param string|null $s\n */\nfunction f(string $s = null) {}\n";
        assert!(check(ParamDocTypeMismatch::new(), src).is_empty());
    }

    #[test]
    fn test_keeps_description() {
        let src = "<?php\n/**\n * @param int|Foo $count How many.\n */\nfunction f(int $count) {}\n";
        let fixed = fix(ParamDocTypeMismatch::new(), src);
        assert!(fixed.contains(" * @param int $count How many.\n"));
    }

    #[test]
    fn test_untyped_and_undocumented_parameters_are_skipped() {
        let src = "<?php\n/**\n * @param string $a\n */\nfunction f($a, int $b) {}\n";
        assert!(check(ParamDocTypeMismatch::new(), src).is_empty());
    }
}
