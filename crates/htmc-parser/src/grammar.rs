//! Tree construction for HTML fragments.
//!
//! Input is consumed left to right with the lexer primitives. Open elements are
//! kept on a stack; an end tag closes the nearest open element with the same
//! name (and everything opened after it), and whatever is still open at the
//! end of input is closed implicitly.

use htmc_core::{html, Fragment, FragmentElement, FragmentNode, ParseError};
use indexmap::IndexMap;

use crate::lexer::*;

/// Parse a complete HTML fragment.
pub fn parse(input: &str) -> Result<Fragment, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse_fragment()
}

/// Stateful parser over the remaining input.
struct Parser<'a> {
    input: &'a str,
    rest: &'a str,
    /// Elements opened but not yet closed.
    open: Vec<FragmentElement>,
    /// Completed top-level nodes.
    roots: Vec<FragmentNode>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            rest: input,
            open: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Byte offset of the current position.
    fn offset(&self) -> usize {
        self.input.len() - self.rest.len()
    }

    fn parse_fragment(&mut self) -> Result<Fragment, ParseError> {
        while !self.rest.is_empty() {
            self.parse_next()?;
        }

        while let Some(element) = self.open.pop() {
            self.push_node(FragmentNode::Element(element));
        }

        Ok(Fragment::new(std::mem::take(&mut self.roots)))
    }

    fn parse_next(&mut self) -> Result<(), ParseError> {
        let offset = self.offset();

        if self.rest.starts_with("<!--") {
            let (rest, body) =
                comment(self.rest).map_err(|_| ParseError::UnterminatedComment { offset })?;
            self.rest = rest;
            self.push_node(FragmentNode::Comment(body.to_string()));
            return Ok(());
        }

        if self.rest.starts_with("<!") || self.rest.starts_with("<?") {
            let (rest, _) = declaration(self.rest).map_err(|_| ParseError::UnterminatedTag {
                tag: "!".to_string(),
                offset,
            })?;
            self.rest = rest;
            return Ok(());
        }

        if let Ok((rest, name)) = end_tag_open(self.rest) {
            let close = rest.find('>').ok_or_else(|| ParseError::UnterminatedTag {
                tag: format!("/{name}"),
                offset,
            })?;
            self.rest = &rest[close + 1..];
            self.close_element(&name.to_ascii_lowercase());
            return Ok(());
        }

        if let Ok((rest, name)) = start_tag_open(self.rest) {
            self.rest = rest;
            return self.parse_start_tag(name.to_ascii_lowercase(), offset);
        }

        // A `<` that does not open markup is plain text.
        let (rest, chunk) = match text(self.rest) {
            Ok(parsed) => parsed,
            Err(_) => (&self.rest[1..], &self.rest[..1]),
        };
        self.rest = rest;
        self.push_text(&html::decode_entities(chunk));
        Ok(())
    }

    fn parse_start_tag(&mut self, name: String, offset: usize) -> Result<(), ParseError> {
        let mut attributes = IndexMap::new();
        let self_closing;

        loop {
            self.rest = whitespace(self.rest);

            if self.rest.is_empty() {
                return Err(ParseError::UnterminatedTag { tag: name, offset });
            }
            if let Some(rest) = self.rest.strip_prefix("/>") {
                self.rest = rest;
                self_closing = true;
                break;
            }
            if let Some(rest) = self.rest.strip_prefix('>') {
                self.rest = rest;
                self_closing = false;
                break;
            }
            if let Some(rest) = self.rest.strip_prefix('/') {
                self.rest = rest;
                continue;
            }

            let (attribute, value) = self.parse_attribute(&name, offset)?;
            // First occurrence wins, as in browsers.
            attributes.entry(attribute).or_insert(value);
        }

        let mut element = FragmentElement {
            tag: name,
            attributes,
            children: Vec::new(),
        };

        if html::is_void(&element.tag) || self_closing {
            self.push_node(FragmentNode::Element(element));
            return Ok(());
        }

        let escapable = html::is_escapable_raw_text(&element.tag);
        if escapable || html::is_raw_text(&element.tag) {
            let body = self.take_raw_text(&element.tag);
            if !body.is_empty() {
                let body = if escapable {
                    html::decode_entities(body)
                } else {
                    body.to_string()
                };
                element.children.push(FragmentNode::Text(body));
            }
            self.push_node(FragmentNode::Element(element));
            return Ok(());
        }

        self.open.push(element);
        Ok(())
    }

    fn parse_attribute(&mut self, tag: &str, offset: usize) -> Result<(String, String), ParseError> {
        let (rest, raw_name) = match attribute_name(self.rest) {
            Ok(parsed) => parsed,
            // Stray quote or `=`: skip one character.
            Err(_) => (&self.rest[1..], ""),
        };
        let name = raw_name.to_ascii_lowercase();
        self.rest = whitespace(rest);

        let Some(after_eq) = self.rest.strip_prefix('=') else {
            return Ok((name, String::new()));
        };
        self.rest = whitespace(after_eq);

        if self.rest.starts_with(['"', '\'']) {
            let (rest, value) =
                quoted_value(self.rest).map_err(|_| ParseError::UnterminatedAttributeValue {
                    attribute: name.clone(),
                    offset: self.offset(),
                })?;
            self.rest = rest;
            return Ok((name, html::decode_entities(value)));
        }

        match unquoted_value(self.rest) {
            Ok((rest, value)) => {
                self.rest = rest;
                Ok((name, html::decode_entities(value)))
            }
            Err(_) if self.rest.is_empty() => Err(ParseError::UnterminatedTag {
                tag: tag.to_string(),
                offset,
            }),
            Err(_) => Ok((name, String::new())),
        }
    }

    /// Consume raw text up to `</tag` (or the end of input) and the end tag itself.
    fn take_raw_text(&mut self, tag: &str) -> &'a str {
        let rest: &'a str = self.rest;
        let needle = format!("</{tag}");
        match rest.to_ascii_lowercase().find(&needle) {
            Some(end) => {
                let after = &rest[end + needle.len()..];
                self.rest = match after.find('>') {
                    Some(close) => &after[close + 1..],
                    None => "",
                };
                &rest[..end]
            }
            None => {
                self.rest = "";
                rest
            }
        }
    }

    fn close_element(&mut self, name: &str) {
        let Some(index) = self.open.iter().rposition(|e| e.tag == name) else {
            return;
        };
        while self.open.len() > index {
            if let Some(element) = self.open.pop() {
                self.push_node(FragmentNode::Element(element));
            }
        }
    }

    fn children_mut(&mut self) -> &mut Vec<FragmentNode> {
        match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        }
    }

    fn push_node(&mut self, node: FragmentNode) {
        self.children_mut().push(node);
    }

    fn push_text(&mut self, text: &str) {
        let children = self.children_mut();
        if let Some(FragmentNode::Text(previous)) = children.last_mut() {
            previous.push_str(text);
        } else {
            children.push(FragmentNode::Text(text.to_string()));
        }
    }
}
