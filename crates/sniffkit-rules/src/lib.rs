//! # sniffkit-rules
//!
//! Built-in sniffs and fixers for sniffkit.
//!
//! ## Available Rules
//!
//! | Code | Name | Fixable | Description |
//! |------|------|---------|-------------|
//! | SK001 | `doc-nullable-type` | yes | `?T` in `@var`/`@param`/`@return` becomes `T\|null` |
//! | SK002 | `param-doc-type-mismatch` | partly | `@param` types incompatible with the native type |
//! | SK003 | `array-trailing-blank-lines` | yes | Blank lines before a multi-line array's closing bracket |
//! | SK004 | `enum-case-pascal-case` | partly | Enum case names must be PascalCase |
//! | SK005 | `require-function-doc` | no | Functions need a doc comment unless fully typed |
//! | SK006 | `cast-spacing` | yes | Exactly one space after a cast |
//! | SK007 | `psr4-autoload-consistency` | no | Declared class name must match the PSR-4 autoload map |
//! | SK008 | `license-header` | yes | Files must start with the project's license header |
//! | SK009 | `disallow-yoda-comparison` | partly | Literal on the left side of a comparison |
//!
//! ## Usage
//!
//! ```ignore
//! use sniffkit_core::Analyzer;
//! use sniffkit_rules::{CastSpacing, DocNullableType};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./src")
//!     .rule(CastSpacing::new())
//!     .rule(DocNullableType::new())
//!     .fix(true)
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod array_trailing_blank_lines;
mod cast_spacing;
mod disallow_yoda_comparison;
mod doc_nullable_type;
mod enum_case_pascal_case;
mod license_header;
mod param_doc_type_mismatch;
mod presets;
mod psr4_autoload_consistency;
mod require_function_doc;

#[cfg(test)]
mod testing;

pub use array_trailing_blank_lines::ArrayTrailingBlankLines;
pub use cast_spacing::CastSpacing;
pub use disallow_yoda_comparison::DisallowYodaComparison;
pub use doc_nullable_type::DocNullableType;
pub use enum_case_pascal_case::EnumCasePascalCase;
pub use license_header::LicenseHeader;
pub use param_doc_type_mismatch::ParamDocTypeMismatch;
pub use presets::{
    all_rules, minimal_rules, recommended_rules, rule_by_name, rules_from_config, strict_rules,
    Preset,
};
pub use psr4_autoload_consistency::Psr4AutoloadConsistency;
pub use require_function_doc::RequireFunctionDoc;

/// Re-export core types for convenience.
pub use sniffkit_core::{Rule, Severity, Violation};
