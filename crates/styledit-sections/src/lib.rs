//! Section model and Mozilla-format transcoder for Styledit.
//!
//! A user style is an ordered list of [`Section`]s: blocks of CSS scoped by
//! optional match conditions (URL, URL prefix, domain, regular expression).
//! This crate converts between that structured model and the flat
//! `@-moz-document` text dialect:
//!
//! - **Encode**: [`to_mozilla_format`] turns sections into a single CSS
//!   document. Total and deterministic.
//! - **Decode**: [`from_mozilla_format`] reparses real-world, possibly
//!   malformed CSS back into sections in a single forward pass over the
//!   token stream, recovering exact source text per section and reporting
//!   problems as positioned [`Diagnostic`]s rather than failing.
//!
//! Both are pure, synchronous functions; concurrent decodes share nothing.
//!
//! # Example
//!
//! ```
//! use styledit_sections::{ConditionKind, Section, from_mozilla_format, to_mozilla_format};
//!
//! let mut section = Section::global("body { color: red }");
//! section.push_condition(ConditionKind::Domain, "example.com");
//!
//! let text = to_mozilla_format(std::slice::from_ref(&section));
//! let result = from_mozilla_format(&text);
//! assert_eq!(result.sections, vec![section]);
//! assert!(result.diagnostics.is_empty());
//! ```

pub mod format;
pub mod section;

pub use format::{
    DecodeResult, Decoder, Diagnostic, Position, from_mozilla_format, to_mozilla_format,
};
pub use section::{ConditionKind, Section};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::format::{
        DecodeResult, Decoder, Diagnostic, Position, from_mozilla_format, to_mozilla_format,
    };
    pub use crate::section::{ConditionKind, Section};
}
