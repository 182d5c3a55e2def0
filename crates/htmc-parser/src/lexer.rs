//! Lexer primitives for HTML markup.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_until, take_while, take_while1},
    character::complete::char,
    combinator::recognize,
    sequence::{delimited, pair, preceded},
    IResult,
};

/// Parse a tag name (starts with an ASCII letter).
pub fn tag_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')),
    ))(input)
}

/// Parse the `</name` prefix of an end tag.
pub fn end_tag_open(input: &str) -> IResult<&str, &str> {
    preceded(tag("</"), tag_name)(input)
}

/// Parse the `<name` prefix of a start tag.
pub fn start_tag_open(input: &str) -> IResult<&str, &str> {
    preceded(char('<'), tag_name)(input)
}

/// Parse an attribute name.
pub fn attribute_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && !matches!(c, '"' | '\'' | '>' | '/' | '='))(input)
}

/// Parse a single- or double-quoted attribute value, returning the inner text.
pub fn quoted_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_until("\""), char('"')),
        delimited(char('\''), take_until("'"), char('\'')),
    ))(input)
}

/// Parse an unquoted attribute value.
pub fn unquoted_value(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != '>')(input)
}

/// Parse a comment, returning its body.
pub fn comment(input: &str) -> IResult<&str, &str> {
    delimited(tag("<!--"), take_until("-->"), tag("-->"))(input)
}

/// Parse a markup declaration or processing instruction (`<!DOCTYPE ...>`, `<?...?>`).
pub fn declaration(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((tag("<!"), tag("<?"))),
        pair(take_until(">"), char('>')),
    ))(input)
}

/// Parse text up to the next `<`.
pub fn text(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c == '<')(input)
}

/// Skip whitespace.
pub fn whitespace(input: &str) -> &str {
    input.trim_start()
}
