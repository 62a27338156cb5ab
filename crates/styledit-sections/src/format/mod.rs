//! Bidirectional transcoder between sections and Mozilla-format text.
//!
//! The Mozilla format is a single flat CSS document in which scoped
//! sections are wrapped in `@-moz-document` constructs:
//!
//! ```css
//! @-moz-document domain("example.com"), url-prefix("https://example.com/") {
//!     body { color: red }
//! }
//! ```
//!
//! [`to_mozilla_format`] serializes a section list into that dialect;
//! [`from_mozilla_format`] recovers sections (and their exact source text,
//! comments included) from arbitrary pasted CSS, collecting positioned
//! [`Diagnostic`]s instead of failing on malformed input.

mod decode;
mod diagnostic;
mod encode;
mod events;

pub use decode::{
    AGENT_SHEET_MARKER, DecodeResult, Decoder, NAMESPACE_BOILERPLATE, from_mozilla_format,
};
pub use diagnostic::{Diagnostic, Position};
pub use encode::to_mozilla_format;
