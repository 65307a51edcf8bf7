//! End-to-end checks of the built-in rules through the analyzer.

use sniffkit_core::{Analyzer, Config, LintResult, RuleBox};
use sniffkit_rules::{
    recommended_rules, rules_from_config, CastSpacing, DocNullableType, EnumCasePascalCase,
    ParamDocTypeMismatch, Psr4AutoloadConsistency, RequireFunctionDoc,
};

fn run(rules: Vec<RuleBox>, src: &str, fix: bool) -> LintResult {
    let mut builder = Analyzer::builder().root(".").fix(fix);
    for rule in rules {
        builder = builder.rule_box(rule);
    }
    builder
        .build()
        .expect("Failed to build analyzer")
        .analyze_source("scenario.php", src)
}

fn fixed(rules: Vec<RuleBox>, src: &str) -> String {
    run(rules, src, true).files[0]
        .fixed_source
        .clone()
        .unwrap_or_else(|| src.to_string())
}

#[test]
fn nullable_var_on_property_is_expanded() {
    let src = "<?php\nclass A\n{\n    /** @var ?string */\n    private $name;\n}\n";
    let out = fixed(vec![Box::new(DocNullableType::new())], src);
    assert!(out.contains("/** @var string|null */"), "{out}");
}

#[test]
fn incompatible_param_member_is_stripped() {
    let src = "<?php\n/**\n * @param Node|string $parent\n */\nfunction attach(Node $parent) {}\n";
    let report = run(vec![Box::new(ParamDocTypeMismatch::new())], src, false);
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].fixable);

    let out = fixed(vec![Box::new(ParamDocTypeMismatch::new())], src);
    assert!(out.contains(" * @param Node $parent\n"), "{out}");
}

#[test]
fn param_with_no_compatible_member_is_diagnostic_only() {
    let src = "<?php\n/**\n * @param string $parent\n */\nfunction attach(Node $parent) {}\n";
    let report = run(vec![Box::new(ParamDocTypeMismatch::new())], src, false);
    assert_eq!(report.violations.len(), 1);
    assert!(!report.violations[0].fixable);
}

#[test]
fn enum_cases_are_pascal_cased() {
    let src = "<?php\nenum Flag\n{\n    case CTE;\n    case DISABLE_CONSTRAINT;\n}\n";
    let result = run(vec![Box::new(EnumCasePascalCase::new())], src, true);
    let out = result.files[0].fixed_source.clone().unwrap_or_default();
    assert!(out.contains("case Cte;"));
    assert!(out.contains("case DISABLE_CONSTRAINT;"));
    assert_eq!(result.unfixed().count(), 1);
}

#[test]
fn fully_typed_function_needs_no_doc() {
    let src = "<?php\nfunction sum(int $a, int $b): int\n{\n    return $a + $b;\n}\n";
    let report = run(vec![Box::new(RequireFunctionDoc::new())], src, false);
    assert!(report.violations.is_empty());
}

#[test]
fn cast_gets_one_space() {
    let out = fixed(vec![Box::new(CastSpacing::new())], "<?php\n(void)$x;\n");
    assert_eq!(out, "<?php\n(void) $x;\n");
}

const MIXED: &str = r#"<?php
namespace App;

enum Mode
{
    case CTE;
}

class Repo
{
    /** @var ?string */
    private $name;

    /**
     * @param Node|string $parent
     */
    public function attach(Node $parent): void
    {
        $ids = [
            1,

        ];
        if (null === $parent) {
            return;
        }
        $x = (int)$ids[0];
    }
}
"#;

#[test]
fn recommended_fixes_are_idempotent() {
    let first = run(recommended_rules(), MIXED, true);
    assert!(first.files[0].converged);
    let out = first.files[0]
        .fixed_source
        .clone()
        .expect("fixes should apply");

    insta::assert_snapshot!(out, @r#"
    <?php
    namespace App;

    enum Mode
    {
        case Cte;
    }

    class Repo
    {
        /** @var string|null */
        private $name;

        /**
         * @param Node $parent
         */
        public function attach(Node $parent): void
        {
            $ids = [
                1,
            ];
            if ($parent === null) {
                return;
            }
            $x = (int) $ids[0];
        }
    }
    "#);

    let second = run(recommended_rules(), &out, true);
    assert!(second.files[0].fixed_source.is_none());
    assert!(run(recommended_rules(), &out, false).violations.is_empty());
}

#[test]
fn project_rules_read_project_files() {
    let dir = tempfile::Builder::new().prefix("sniffkit").tempdir().unwrap();
    let src_dir = dir.path().join("src");
    std::fs::create_dir_all(&src_dir).unwrap();
    std::fs::write(
        dir.path().join("composer.json"),
        r#"{ "autoload": { "psr-4": { "App\\": "src/" } } }"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("LICENSE_HEADER"), "Copyright (c) Acme\n").unwrap();
    std::fs::write(
        src_dir.join("User.php"),
        "<?php\n/*\n * Copyright (c) Acme\n */\n\nnamespace App;\n\nclass User {}\n",
    )
    .unwrap();
    std::fs::write(src_dir.join("Order.php"), "<?php\nnamespace App;\n\nclass Invoice {}\n")
        .unwrap();

    let config = Config::parse(
        r#"
preset = "minimal"

[rules.license-header]
enabled = true
"#,
    )
    .unwrap();
    let mut builder = Analyzer::builder().root(dir.path()).config(config.clone());
    for rule in rules_from_config(&config) {
        builder = builder.rule_box(rule);
    }
    let result = builder
        .rule(Psr4AutoloadConsistency::new().base_path(dir.path()))
        .build()
        .unwrap()
        .analyze()
        .unwrap();

    assert_eq!(result.files_checked, 2);
    assert!(result.rule_errors.is_empty());
    let codes: Vec<_> = result.violations.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(codes, vec!["SK008", "SK007"]);
    assert!(result
        .violations
        .iter()
        .all(|v| v.location.file.ends_with("Order.php")));
}
