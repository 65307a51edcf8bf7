//! Doc-comment model.
//!
//! Tag bodies are parsed into a closed set of [`TagValue`] variants and
//! their types into [`TypeExpr`] trees. Every unmodified parse renders back
//! to its source text byte-for-byte, so fixers can rewrite one tag member
//! and leave the rest untouched.

mod block;
mod tag;
mod type_expr;

pub use block::{DocBlock, DocTag};
pub use tag::{parse_tag, TagValue, TypedValue};
pub use type_expr::{
    is_basic_type, is_class_name, parse_type, split_type_prefix, TypeExpr, TypeSplit, BASIC_TYPES,
};
