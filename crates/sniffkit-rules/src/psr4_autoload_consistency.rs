//! Rule to check class names against the PSR-4 autoload map.
//!
//! The expected fully qualified name of a class is derived from its file
//! path and the `autoload.psr-4` / `autoload-dev.psr-4` tables of
//! `composer.json`:
//!
//! ```json
//! { "autoload": { "psr-4": { "App\\": "src/" } } }
//! ```
//!
//! `src/Models/User.php` must then declare `App\Models\User`. Files outside
//! every mapped directory are not checked.
//!
//! A missing or unreadable manifest is a configuration error: the rule
//! disables itself for the rest of the run.

use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use sniffkit_core::{Rule, RuleError, Severity, SniffContext, TokenKind};
use tracing::debug;

/// Rule code for psr4-autoload-consistency.
pub const CODE: &str = "SK007";

/// Rule name for psr4-autoload-consistency.
pub const NAME: &str = "psr4-autoload-consistency";

const MANIFEST: &str = "composer.json";

/// Namespace prefix to directories, in manifest order.
type Psr4Map = Vec<(String, Vec<PathBuf>)>;

/// Requires declared class names to match the PSR-4 autoload map.
#[derive(Debug)]
pub struct Psr4AutoloadConsistency {
    /// Custom severity.
    pub severity: Severity,
    /// Directory holding the manifest; the working directory when unset.
    pub base_path: Option<PathBuf>,
    /// Manifest file name, relative to the base path.
    pub manifest: String,
    cache: Mutex<Option<(PathBuf, Psr4Map)>>,
}

impl Default for Psr4AutoloadConsistency {
    fn default() -> Self {
        Self::new()
    }
}

impl Psr4AutoloadConsistency {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
            base_path: None,
            manifest: MANIFEST.to_string(),
            cache: Mutex::new(None),
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the directory holding the manifest.
    #[must_use]
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the manifest file name.
    #[must_use]
    pub fn manifest(mut self, name: impl Into<String>) -> Self {
        self.manifest = name.into();
        self
    }

    fn base(&self) -> Result<PathBuf, RuleError> {
        match &self.base_path {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            relative => std::env::current_dir()
                .map(|cwd| match relative {
                    Some(path) => cwd.join(path),
                    None => cwd,
                })
                .map_err(|e| RuleError::Config(format!("cannot determine working directory: {e}"))),
        }
    }

    fn psr4_map(&self, base: &Path) -> Result<Psr4Map, RuleError> {
        let manifest = base.join(&self.manifest);
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| RuleError::Invariant("manifest cache poisoned".into()))?;
        if let Some((path, map)) = cache.as_ref() {
            if *path == manifest {
                return Ok(map.clone());
            }
        }

        let map = load_psr4_map(&manifest)?;
        debug!(manifest = %manifest.display(), prefixes = map.len(), "Loaded PSR-4 map");
        *cache = Some((manifest, map.clone()));
        Ok(map)
    }
}

fn load_psr4_map(manifest: &Path) -> Result<Psr4Map, RuleError> {
    let content = std::fs::read_to_string(manifest).map_err(|e| {
        RuleError::Config(format!("cannot read {}: {e}", manifest.display()))
    })?;
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        RuleError::Config(format!("cannot parse {}: {e}", manifest.display()))
    })?;

    let mut map = Psr4Map::new();
    for section in ["autoload", "autoload-dev"] {
        let Some(table) = json
            .get(section)
            .and_then(|s| s.get("psr-4"))
            .and_then(serde_json::Value::as_object)
        else {
            continue;
        };
        for (prefix, dirs) in table {
            let dirs = match dirs {
                serde_json::Value::String(dir) => vec![normalize_dir(dir)],
                serde_json::Value::Array(list) => list
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(normalize_dir)
                    .collect(),
                _ => continue,
            };
            map.push((prefix.clone(), dirs));
        }
    }
    Ok(map)
}

fn normalize_dir(dir: &str) -> PathBuf {
    Path::new(dir)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// Fully qualified name expected for the file at `relative`.
fn expected_name(map: &Psr4Map, relative: &Path) -> Option<String> {
    let (prefix, dir) = map
        .iter()
        .flat_map(|(prefix, dirs)| dirs.iter().map(move |dir| (prefix, dir)))
        .filter(|(_, dir)| relative.starts_with(dir))
        .max_by_key(|(_, dir)| dir.components().count())?;

    let remainder = relative.strip_prefix(dir).ok()?;
    let stem = remainder.file_stem()?.to_str()?;
    let mut segments: Vec<&str> = remainder
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    segments.push(stem);

    let prefix = prefix.trim_matches('\\');
    let name = segments.join("\\");
    Some(if prefix.is_empty() {
        name
    } else {
        format!("{prefix}\\{name}")
    })
}

/// `path` relative to `base`; relative paths are taken from the working
/// directory.
fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Some(
        absolute
            .strip_prefix(base)
            .ok()?
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect(),
    )
}

impl Rule for Psr4AutoloadConsistency {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires class names to match the PSR-4 autoload map of composer.json"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn register(&self) -> &'static [TokenKind] {
        &[
            TokenKind::Class,
            TokenKind::Interface,
            TokenKind::Trait,
            TokenKind::Enum,
        ]
    }

    fn process(&self, ctx: &mut SniffContext<'_>, index: usize) -> Result<(), RuleError> {
        let tokens = ctx.tokens();
        if tokens
            .previous_effective(index)
            .is_some_and(|p| tokens[p].kind == TokenKind::New)
        {
            return Ok(());
        }
        let Some(name_index) = tokens
            .next_effective(index)
            .filter(|&n| tokens[n].kind == TokenKind::String)
        else {
            return Ok(());
        };

        let base = self.base()?;
        let map = self.psr4_map(&base)?;
        let Some(relative) = relative_to(ctx.file().path, &base) else {
            return Ok(());
        };
        let Some(expected) = expected_name(&map, &relative) else {
            return Ok(());
        };

        let namespace = tokens
            .find_previous(TokenKind::Namespace, index, None)
            .and_then(|ns| tokens.next_effective(ns))
            .filter(|&n| tokens[n].kind == TokenKind::String)
            .map(|n| tokens.content(n).trim_start_matches('\\'));
        let short = tokens.content(name_index);
        let actual = match namespace {
            Some(ns) => format!("{ns}\\{short}"),
            None => short.to_string(),
        };

        if actual != expected {
            ctx.add_error(
                name_index,
                format!(
                    "Class name \"{actual}\" does not match the PSR-4 expected name \"{expected}\""
                ),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sniffkit_core::{Analyzer, RuleFailureKind};

    fn project(composer: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST), composer).unwrap();
        dir
    }

    fn run(dir: &Path, file: &str, src: &str) -> sniffkit_core::LintResult {
        Analyzer::builder()
            .root(dir)
            .rule(Psr4AutoloadConsistency::new().base_path(dir))
            .build()
            .unwrap()
            .analyze_source(dir.join(file), src)
    }

    const COMPOSER: &str = r#"{
        "autoload": { "psr-4": { "App\\": "src/", "Lib\\Util\\": ["lib/util", "extra/"] } },
        "autoload-dev": { "psr-4": { "App\\Tests\\": "tests/" } }
    }"#;

    #[test]
    fn test_expected_name() {
        let dir = project(COMPOSER);
        let map = load_psr4_map(&dir.path().join(MANIFEST)).unwrap();
        assert_eq!(
            expected_name(&map, Path::new("src/Models/User.php")).as_deref(),
            Some("App\\Models\\User")
        );
        assert_eq!(
            expected_name(&map, Path::new("tests/UserTest.php")).as_deref(),
            Some("App\\Tests\\UserTest")
        );
        assert_eq!(
            expected_name(&map, Path::new("extra/Str.php")).as_deref(),
            Some("Lib\\Util\\Str")
        );
        assert_eq!(expected_name(&map, Path::new("bin/run.php")), None);
    }

    #[test]
    fn test_matching_class_passes() {
        let dir = project(COMPOSER);
        let src = "<?php\nnamespace App\\Models;\n\nfinal class User\n{\n}\n";
        let result = run(dir.path(), "src/Models/User.php", src);
        assert!(result.violations.is_empty());
        assert!(result.rule_errors.is_empty());
    }

    #[test]
    fn test_mismatch_reports_both_names() {
        let dir = project(COMPOSER);
        let src = "<?php\nnamespace App\\Model;\n\nclass User {}\n$x = new class {};\n";
        let result = run(dir.path(), "src/Models/User.php", src);
        assert_eq!(result.violations.len(), 1);
        let message = &result.violations[0].message;
        assert!(message.contains("App\\Model\\User"));
        assert!(message.contains("App\\Models\\User"));
    }

    #[test]
    fn test_missing_manifest_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = "<?php\nclass A {}\nclass B {}\n";
        let result = run(dir.path(), "src/A.php", src);
        assert!(result.violations.is_empty());
        assert_eq!(result.rule_errors.len(), 1);
        assert_eq!(result.rule_errors[0].kind, RuleFailureKind::Config);
        assert_eq!(result.rule_errors[0].code, CODE);
    }
}
