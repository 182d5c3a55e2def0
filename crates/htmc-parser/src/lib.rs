//! Parser for HTMC markup.
//!
//! This crate turns HTML text into an owned [`Fragment`] tree. It is a
//! forgiving fragment parser built on `nom`: unknown elements are kept as-is,
//! unclosed elements are closed at the end of their parent, stray end tags are
//! ignored, and `/>` closes any element.

mod grammar;
mod lexer;

pub use grammar::parse;

use htmc_core::{Fragment, ParseError};

/// Parse an HTML fragment from source text.
///
/// # Example
///
/// ```ignore
/// use htmc_parser::parse_fragment;
///
/// let source = r#"
/// <htmc-define>
///   <component name="greet-box" reactive-attributes="who">
///     <p>Hello, ${who}!</p>
///   </component>
/// </htmc-define>
/// "#;
///
/// let fragment = parse_fragment(source)?;
/// ```
pub fn parse_fragment(source: &str) -> Result<Fragment, ParseError> {
    parse(source)
}
