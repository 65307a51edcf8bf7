//! Rule presets and configuration-driven rule selection.

use crate::{
    array_trailing_blank_lines, cast_spacing, disallow_yoda_comparison, doc_nullable_type,
    enum_case_pascal_case, license_header, param_doc_type_mismatch, psr4_autoload_consistency,
    require_function_doc, ArrayTrailingBlankLines, CastSpacing, DisallowYodaComparison,
    DocNullableType, EnumCasePascalCase, LicenseHeader, ParamDocTypeMismatch,
    Psr4AutoloadConsistency, RequireFunctionDoc,
};
use sniffkit_core::{Config, RuleBox, RuleConfig};
use tracing::warn;

/// Preset configurations for sniffkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Recommended rules with sensible defaults.
    Recommended,
    /// Every rule, including those that need project files.
    Strict,
    /// Minimal rules for gradual adoption.
    Minimal,
}

impl Preset {
    /// Returns the rules for this preset.
    #[must_use]
    pub fn rules(self) -> Vec<RuleBox> {
        match self {
            Self::Recommended => recommended_rules(),
            Self::Strict => strict_rules(),
            Self::Minimal => minimal_rules(),
        }
    }

    /// Parses a preset name as used in `sniffkit.toml`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "recommended" => Some(Self::Recommended),
            "strict" => Some(Self::Strict),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    fn names(self) -> &'static [&'static str] {
        match self {
            Self::Recommended => &RECOMMENDED,
            Self::Strict => &ALL,
            Self::Minimal => &MINIMAL,
        }
    }
}

const RECOMMENDED: [&str; 6] = [
    doc_nullable_type::NAME,
    param_doc_type_mismatch::NAME,
    array_trailing_blank_lines::NAME,
    enum_case_pascal_case::NAME,
    cast_spacing::NAME,
    disallow_yoda_comparison::NAME,
];

const MINIMAL: [&str; 2] = [doc_nullable_type::NAME, cast_spacing::NAME];

const ALL: [&str; 9] = [
    doc_nullable_type::NAME,
    param_doc_type_mismatch::NAME,
    array_trailing_blank_lines::NAME,
    enum_case_pascal_case::NAME,
    require_function_doc::NAME,
    cast_spacing::NAME,
    psr4_autoload_consistency::NAME,
    license_header::NAME,
    disallow_yoda_comparison::NAME,
];

fn build(names: &[&str]) -> Vec<RuleBox> {
    names
        .iter()
        .filter_map(|name| rule_by_name(name, None))
        .collect()
}

/// Returns the recommended set of rules.
///
/// Includes:
/// - `doc-nullable-type` (SK001) - Spells out nullable doc types
/// - `param-doc-type-mismatch` (SK002) - Checks `@param` against native types
/// - `array-trailing-blank-lines` (SK003) - Forbids blank lines before `]`
/// - `enum-case-pascal-case` (SK004) - Requires PascalCase enum cases
/// - `cast-spacing` (SK006) - One space after casts
/// - `disallow-yoda-comparison` (SK009) - Literal on the right
#[must_use]
pub fn recommended_rules() -> Vec<RuleBox> {
    build(&RECOMMENDED)
}

/// Returns the strict set of rules.
///
/// Includes all recommended rules plus:
/// - `require-function-doc` (SK005) - Doc comments on untyped functions
/// - `psr4-autoload-consistency` (SK007) - Needs `composer.json`
/// - `license-header` (SK008) - Needs a `LICENSE_HEADER` file
#[must_use]
pub fn strict_rules() -> Vec<RuleBox> {
    build(&ALL)
}

/// Returns the minimal set of rules.
///
/// For gradual adoption, only includes the whitespace-level fixers
/// `doc-nullable-type` and `cast-spacing`.
#[must_use]
pub fn minimal_rules() -> Vec<RuleBox> {
    build(&MINIMAL)
}

/// Returns all available rules with default settings.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    build(&ALL)
}

/// Builds a rule by name, applying its `[rules.<name>]` options.
///
/// Returns `None` for unknown names.
#[must_use]
pub fn rule_by_name(name: &str, config: Option<&RuleConfig>) -> Option<RuleBox> {
    let severity = config.and_then(|c| c.severity);
    macro_rules! boxed {
        ($rule:expr) => {{
            let rule = $rule;
            let severity = severity.unwrap_or(rule.severity);
            Box::new(rule.severity(severity))
        }};
    }

    let rule: RuleBox = match name {
        doc_nullable_type::NAME => boxed!(DocNullableType::new()),
        param_doc_type_mismatch::NAME => boxed!(ParamDocTypeMismatch::new()),
        array_trailing_blank_lines::NAME => boxed!(ArrayTrailingBlankLines::new()),
        enum_case_pascal_case::NAME => boxed!(EnumCasePascalCase::new()),
        require_function_doc::NAME => {
            let skip = config.map_or(true, |c| c.get_bool("skip_fully_typed", true));
            let in_tests = config.map_or(true, |c| c.get_bool("allow_in_tests", true));
            let rule = RequireFunctionDoc::new()
                .skip_fully_typed(skip)
                .allow_in_tests(in_tests);
            boxed!(rule)
        }
        cast_spacing::NAME => {
            let mut rule = CastSpacing::new();
            if let Some(spacing) = config.and_then(|c| c.get_option::<usize>("spacing")) {
                rule = rule.spacing(spacing);
            }
            boxed!(rule)
        }
        psr4_autoload_consistency::NAME => {
            let mut rule = Psr4AutoloadConsistency::new();
            if let Some(base) = config.and_then(|c| c.get_option::<String>("base_path")) {
                rule = rule.base_path(base);
            }
            if let Some(manifest) = config.and_then(|c| c.get_option::<String>("manifest")) {
                rule = rule.manifest(manifest);
            }
            boxed!(rule)
        }
        license_header::NAME => {
            let mut rule = LicenseHeader::new();
            let names = config.map(|c| c.get_str_array("file_names")).unwrap_or_default();
            if !names.is_empty() {
                rule = rule.file_names(names);
            }
            if let Some(text) = config.and_then(|c| c.get_option::<String>("text")) {
                rule = rule.text(text);
            }
            boxed!(rule)
        }
        disallow_yoda_comparison::NAME => boxed!(DisallowYodaComparison::new()),
        _ => return None,
    };
    Some(rule)
}

/// Builds the rule set described by a configuration.
///
/// Starts from the configured preset (`recommended` when unset) and adds
/// rules explicitly enabled with `enabled = true`. Rules disabled in the
/// configuration are dropped by the analyzer, not here.
#[must_use]
pub fn rules_from_config(config: &Config) -> Vec<RuleBox> {
    let preset = match config.preset.as_deref() {
        None => Preset::Recommended,
        Some(name) => Preset::from_name(name).unwrap_or_else(|| {
            warn!("Unknown preset '{}', using recommended", name);
            Preset::Recommended
        }),
    };

    let mut names: Vec<&str> = preset.names().to_vec();
    let mut extra: Vec<&String> = config
        .rules
        .iter()
        .filter(|(name, rule)| rule.enabled == Some(true) && !names.contains(&name.as_str()))
        .map(|(name, _)| name)
        .collect();
    extra.sort();
    names.extend(extra.iter().map(|name| name.as_str()));

    names
        .into_iter()
        .filter_map(|name| {
            let rule = rule_by_name(name, config.rule_config(name));
            if rule.is_none() {
                warn!("Unknown rule '{}' in configuration", name);
            }
            rule
        })
        .collect()
}
