//! Core analyzer for orchestrating lint execution.
//!
//! Every file is handled in isolation: tokenize, run the rules, commit
//! fixes, re-tokenize, until a pass commits nothing or the pass ceiling is
//! reached. A last pass with fixing disabled reports what remains. Files
//! run in parallel on a scoped thread pool; the only state shared between
//! them is the set of rules disabled by configuration errors.

use crate::config::{Config, RuleConfig};
use crate::context::{ActiveRule, FileContext, SniffContext};
use crate::fixer::Fixer;
use crate::rule::{Rule, RuleBox, RuleError};
use crate::token::Tokens;
use crate::types::{FileOutcome, LintResult, RuleFailure, RuleFailureKind, Severity, Violation};

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Code of the violation reported when a rule leaves a changeset open.
pub const CHANGESET_LEAK_CODE: &str = "Internal.ChangesetLeak";

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Directory walk error.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    config: Option<Config>,
    fix: bool,
    max_passes: Option<usize>,
    parallelism: Option<usize>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory (or single file) to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Applies fixes (default: report only).
    #[must_use]
    pub fn fix(mut self, fix: bool) -> Self {
        self.fix = fix;
        self
    }

    /// Overrides the configured fix-pass ceiling.
    #[must_use]
    pub fn max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// Overrides the configured number of worker threads.
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined or an
    /// exclude pattern is not a valid glob.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();
        let root = self
            .root
            .unwrap_or_else(|| config.analyzer.root.clone());

        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        for pattern in &exclude_patterns {
            glob::Pattern::new(pattern)?;
        }

        let max_passes = self
            .max_passes
            .unwrap_or(config.analyzer.max_passes)
            .max(1);
        let parallelism = self.parallelism.or(config.analyzer.parallelism);

        Ok(Analyzer {
            root,
            rules: self.rules,
            exclude_patterns,
            config,
            fix: self.fix,
            max_passes,
            parallelism,
        })
    }
}

/// Rules disabled during the current run.
#[derive(Debug, Default)]
struct RunState {
    disabled: RwLock<HashSet<&'static str>>,
}

impl RunState {
    fn is_disabled(&self, rule: &str) -> bool {
        self.disabled
            .read()
            .map_or(false, |disabled| disabled.contains(rule))
    }

    fn disable(&self, rule: &'static str) {
        if let Ok(mut disabled) = self.disabled.write() {
            disabled.insert(rule);
        }
    }
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    config: Config,
    fix: bool,
    max_passes: usize,
    parallelism: Option<usize>,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns true when fixes are applied.
    #[must_use]
    pub fn is_fixing(&self) -> bool {
        self.fix
    }

    /// Gets the rule configuration for a specific rule.
    #[must_use]
    pub fn rule_config(&self, rule_name: &str) -> Option<&RuleConfig> {
        self.config.rules.get(rule_name)
    }

    /// Analyzes all files and returns the results.
    ///
    /// With fixing enabled, each [`FileOutcome`] carries the patched source;
    /// writing it back is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery fails or a file cannot be read.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let files = self.discover_files()?;
        info!("Found {} files to analyze", files.len());

        let state = RunState::default();
        let per_file = self.run_files(&files, &state)?;

        let mut result = LintResult::new();
        for file_result in per_file {
            result.extend(file_result);
        }
        Self::sort(&mut result);

        info!(
            "Analysis complete: {} violations ({} fixed) in {} files",
            result.violations.len(),
            result.fixed_count(),
            result.files_checked
        );

        Ok(result)
    }

    /// Runs the same pipeline as [`Analyzer::analyze`] on in-memory source.
    #[must_use]
    pub fn analyze_source(&self, path: impl AsRef<Path>, source: &str) -> LintResult {
        let state = RunState::default();
        let mut result = self.analyze_file(path.as_ref(), source, &state);
        Self::sort(&mut result);
        result
    }

    fn run_files(
        &self,
        files: &[PathBuf],
        state: &RunState,
    ) -> Result<Vec<LintResult>, AnalyzerError> {
        let threads = self.parallelism.unwrap_or(0);
        if threads == 1 || files.len() < 2 {
            return files.iter().map(|f| self.read_and_analyze(f, state)).collect();
        }

        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_scoped(rayon::ThreadBuilder::run, |pool| {
                pool.install(|| {
                    files
                        .par_iter()
                        .map(|f| self.read_and_analyze(f, state))
                        .collect::<Result<Vec<_>, _>>()
                })
            })
            .unwrap_or_else(|e| {
                warn!("failed to create thread pool ({e}), running sequentially");
                files.iter().map(|f| self.read_and_analyze(f, state)).collect()
            })
    }

    fn read_and_analyze(&self, path: &Path, state: &RunState) -> Result<LintResult, AnalyzerError> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalyzerError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(self.analyze_file(path, &content, state))
    }

    /// Fix passes until stable, then a report pass.
    fn analyze_file(&self, path: &Path, source: &str, state: &RunState) -> LintResult {
        debug!("Analyzing: {}", path.display());

        let mut result = LintResult::new();
        result.files_checked = 1;

        let mut outcome = FileOutcome {
            file: path.to_path_buf(),
            passes: 0,
            converged: true,
            fixed_source: None,
        };
        let mut current = source.to_string();

        if self.fix {
            outcome.converged = false;
            for pass in 1..=self.max_passes {
                let tokens = Tokens::tokenize(&current);
                let mut fixer = Fixer::new(&tokens, true);
                let violations =
                    self.run_pass(path, &current, &tokens, &mut fixer, state, &mut result);

                if fixer.commit_count() == 0 {
                    debug!(pass, "Stable: {}", path.display());
                    outcome.converged = true;
                    break;
                }

                debug!(
                    pass,
                    commits = fixer.commit_count(),
                    conflicts = fixer.conflict_count(),
                    "Applied fixes to {}",
                    path.display()
                );
                result
                    .violations
                    .extend(violations.into_iter().filter(|v| v.fixed));
                outcome.passes = pass;
                current = fixer.contents();
            }

            if !outcome.converged {
                warn!(
                    "Fixes for {} did not converge after {} passes",
                    path.display(),
                    self.max_passes
                );
            }
            if current != source {
                outcome.fixed_source = Some(current.clone());
            }
        }

        let tokens = Tokens::tokenize(&current);
        let mut fixer = Fixer::new(&tokens, false);
        let remaining = self.run_pass(path, &current, &tokens, &mut fixer, state, &mut result);
        result.violations.extend(remaining);
        result.files.push(outcome);
        result
    }

    /// One pass of every enabled rule over every token, in source order.
    fn run_pass(
        &self,
        path: &Path,
        content: &str,
        tokens: &Tokens,
        fixer: &mut Fixer,
        state: &RunState,
        result: &mut LintResult,
    ) -> Vec<Violation> {
        let file = FileContext::new(path, content, &self.root);
        let mut ctx = SniffContext::new(tokens, &file, fixer);

        let active: Vec<(&RuleBox, ActiveRule)> = self
            .rules
            .iter()
            .filter(|rule| {
                let enabled = self.config.is_rule_enabled(rule.name());
                if !enabled {
                    debug!("Skipping disabled rule: {}", rule.name());
                }
                enabled
            })
            .map(|rule| {
                let severity = self
                    .config
                    .rule_severity(rule.name())
                    .unwrap_or_else(|| rule.default_severity());
                let identity = ActiveRule {
                    name: rule.name(),
                    code: rule.code(),
                    severity,
                };
                (rule, identity)
            })
            .collect();

        for (index, token) in tokens.iter().enumerate() {
            for (rule, identity) in &active {
                if !rule.register().contains(&token.kind) || state.is_disabled(identity.name) {
                    continue;
                }

                ctx.set_rule(*identity);
                let outcome = rule.process(&mut ctx, index);

                if ctx.fixer().in_changeset() {
                    ctx.fixer().rollback_changeset();
                    warn!(rule = identity.name, index, "Rule left a changeset open");
                    let location = ctx.location(index);
                    ctx.push_violation(Violation::new(
                        CHANGESET_LEAK_CODE,
                        identity.name,
                        Severity::Error,
                        location,
                        format!("Rule {} left a changeset open; it was rolled back", identity.name),
                    ));
                }

                if let Err(err) = outcome {
                    Self::handle_rule_error(path, identity, &err, state, result);
                }
            }
        }

        ctx.take_violations()
    }

    fn handle_rule_error(
        path: &Path,
        rule: &ActiveRule,
        err: &RuleError,
        state: &RunState,
        result: &mut LintResult,
    ) {
        let kind = if err.is_config() {
            state.disable(rule.name);
            RuleFailureKind::Config
        } else {
            RuleFailureKind::Invariant
        };

        let recorded = result.record_rule_error(RuleFailure {
            rule: rule.name.to_string(),
            code: rule.code.to_string(),
            kind,
            message: err.to_string(),
            file: path.to_path_buf(),
        });

        if recorded {
            match kind {
                RuleFailureKind::Config => {
                    warn!("Disabling rule {} for this run: {}", rule.name, err);
                }
                RuleFailureKind::Invariant => {
                    warn!("Rule {} failed on {}: {}", rule.name, path.display(), err);
                }
            }
        } else {
            debug!("Rule {} failed again: {}", rule.name, err);
        }
    }

    fn sort(result: &mut LintResult) {
        result.violations.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
        });
        result.files.sort_by(|a, b| a.file.cmp(&b.file));
    }

    /// Discovers all source files to analyze.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let walker = ignore::WalkBuilder::new(&self.root)
            .git_ignore(self.config.analyzer.respect_gitignore)
            .git_exclude(self.config.analyzer.respect_gitignore)
            .require_git(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            if !self.has_source_extension(path) {
                continue;
            }
            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.config
                    .analyzer
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }

    /// Checks if a path should be excluded.
    fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.exclude_patterns {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
            }

            // "**/vendor/**" also matches as a plain substring
            let normalized_pattern = pattern.replace("**", "");
            if normalized_pattern.len() > 1 && path_str.contains(&normalized_pattern) {
                return true;
            }
        }

        false
    }
}
