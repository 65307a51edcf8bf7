//! # sniffkit-core
//!
//! Token-stream analysis engine for PHP coding-standard rules ("sniffs").
//!
//! This crate provides the foundational pieces every rule builds on:
//!
//! - [`Tokens`], a flat token arena with bracket, parenthesis and scope links
//! - Cursor methods on [`Tokens`] (`find_next`, `find_previous`, ...)
//! - [`locator`] for doc-comment, scope and statement boundaries
//! - [`signature`] for parameter lists, return types and properties
//! - [`doc`] for doc-comment tags and type expressions
//! - [`Fixer`], the transactional changeset buffer
//! - [`Rule`] trait and the [`Analyzer`] that drives fix passes
//!
//! ## Example
//!
//! ```ignore
//! use sniffkit_core::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./src")
//!     .rule(MyRule::new())
//!     .fix(true)
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! println!("{}", result.format_test_report(Severity::Error));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod fixer;
mod lexer;
mod rule;
mod token;
mod types;

/// Token navigation primitives.
pub mod cursor;
/// Doc-comment tags and type expressions.
pub mod doc;
/// Structural boundaries over a token stream.
pub mod locator;
/// Function, parameter and property declarations.
pub mod signature;
/// Utility modules for rule implementations.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError, CHANGESET_LEAK_CODE};
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig, DEFAULT_MAX_PASSES};
pub use context::{FileContext, SniffContext};
pub use cursor::{predicate, TokenMatcher};
pub use fixer::{Fixer, FixerError};
pub use rule::{Rule, RuleBox, RuleError};
pub use token::{Token, TokenKind, Tokens, EMPTY_KINDS, MODIFIER_KINDS};
pub use types::{
    FileOutcome, LintResult, Location, RuleFailure, RuleFailureKind, Severity, Suggestion,
    Violation, ViolationDiagnostic,
};
pub use utils::allowance::AllowCheck;
