//! Compiled placeholder templates.
//!
//! A component body is compiled once into a tree whose text and attribute
//! values are split into literal and placeholder segments. Rendering fills the
//! placeholders by index and produces a fresh [`Fragment`], so the compiled
//! template itself is never mutated.
//!
//! Only `${name}` tokens whose name is one of the template's declared names
//! become placeholders; any other `${...}` text is kept literally. Values are
//! inserted verbatim and are not scanned for further tokens.

use crate::fragment::{Fragment, FragmentElement, FragmentNode};
use indexmap::IndexMap;
use smallvec::SmallVec;

/// A piece of text or attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Segment {
    Literal(String),
    /// Index into [`Template::names`].
    Placeholder(usize),
}

/// A value split into segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segments(pub SmallVec<[Segment; 2]>);

impl Segments {
    /// Split `text` on `${name}` tokens for the given names.
    pub fn parse(text: &str, names: &[String]) -> Self {
        let mut segments = SmallVec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let index = after
                .find('}')
                .and_then(|end| names.iter().position(|n| *n == after[..end]).map(|i| (i, end)));

            match index {
                Some((index, end)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(index));
                    rest = &after[end + 1..];
                }
                None => {
                    literal.push_str("${");
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Self(segments)
    }

    /// True when no placeholder is present.
    pub fn is_static(&self) -> bool {
        self.0.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Placeholder indices in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().filter_map(|s| match s {
            Segment::Placeholder(i) => Some(*i),
            Segment::Literal(_) => None,
        })
    }

    /// Join the segments, taking placeholder values from `values` (missing → empty).
    pub fn fill(&self, values: &[&str]) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(i) => out.push_str(values.get(*i).copied().unwrap_or("")),
            }
        }
        out
    }
}

/// A compiled template node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemplateNode {
    Element {
        tag: String,
        attributes: Vec<(String, Segments)>,
        children: Vec<TemplateNode>,
    },
    Text(Segments),
    Comment(String),
}

/// A compiled component body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Template {
    names: SmallVec<[String; 4]>,
    nodes: Vec<TemplateNode>,
}

impl Template {
    /// Compile a fragment for the given placeholder names (duplicates are merged).
    pub fn compile<'a>(fragment: &Fragment, names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut unique: SmallVec<[String; 4]> = SmallVec::new();
        for name in names {
            if !unique.iter().any(|n| n == name) {
                unique.push(name.to_string());
            }
        }
        let nodes = fragment.nodes.iter().map(|n| compile_node(n, &unique)).collect();
        Self {
            names: unique,
            nodes,
        }
    }

    /// Placeholder names, in fill order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// Number of placeholder occurrences in the whole template.
    pub fn placeholder_count(&self) -> usize {
        fn count(nodes: &[TemplateNode]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    TemplateNode::Text(segments) => segments.placeholders().count(),
                    TemplateNode::Comment(_) => 0,
                    TemplateNode::Element {
                        attributes,
                        children,
                        ..
                    } => {
                        attributes
                            .iter()
                            .map(|(_, v)| v.placeholders().count())
                            .sum::<usize>()
                            + count(children)
                    }
                })
                .sum()
        }
        count(&self.nodes)
    }

    /// Produce a fresh fragment with `values[i]` filled in for `names()[i]`.
    pub fn instantiate(&self, values: &[&str]) -> Fragment {
        Fragment::new(self.nodes.iter().map(|n| instantiate_node(n, values)).collect())
    }

    /// Produce a fresh fragment, looking each name up with `value_of`.
    pub fn instantiate_with<'v>(&self, value_of: impl Fn(&str) -> &'v str) -> Fragment {
        let values: Vec<&str> = self.names.iter().map(|n| value_of(n)).collect();
        self.instantiate(&values)
    }
}

fn compile_node(node: &FragmentNode, names: &[String]) -> TemplateNode {
    match node {
        FragmentNode::Text(text) => TemplateNode::Text(Segments::parse(text, names)),
        FragmentNode::Comment(text) => TemplateNode::Comment(text.clone()),
        FragmentNode::Element(element) => TemplateNode::Element {
            tag: element.tag.clone(),
            attributes: element
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), Segments::parse(v, names)))
                .collect(),
            children: element.children.iter().map(|c| compile_node(c, names)).collect(),
        },
    }
}

fn instantiate_node(node: &TemplateNode, values: &[&str]) -> FragmentNode {
    match node {
        TemplateNode::Text(segments) => FragmentNode::Text(segments.fill(values)),
        TemplateNode::Comment(text) => FragmentNode::Comment(text.clone()),
        TemplateNode::Element {
            tag,
            attributes,
            children,
        } => FragmentNode::Element(FragmentElement {
            tag: tag.clone(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.fill(values)))
                .collect::<IndexMap<_, _>>(),
            children: children.iter().map(|c| instantiate_node(c, values)).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn greet() -> Fragment {
        Fragment::new(vec![FragmentElement::new("p")
            .with_attribute("title", "for ${who}")
            .with_child(FragmentNode::Text("Hello, ${who}! ${unknown}".to_string()))
            .into()])
    }

    #[test]
    fn test_parse_segments() {
        let segments = Segments::parse("Hi ${a} and ${b}${a}.", &names(&["a", "b"]));
        assert_eq!(
            segments.0.as_slice(),
            &[
                Segment::Literal("Hi ".to_string()),
                Segment::Placeholder(0),
                Segment::Literal(" and ".to_string()),
                Segment::Placeholder(1),
                Segment::Placeholder(0),
                Segment::Literal(".".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_tokens_stay_literal() {
        let segments = Segments::parse("${x} ${a${a}", &names(&["a"]));
        assert_eq!(segments.fill(&["1"]), "${x} ${a1");
        assert_eq!(segments.placeholders().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_unterminated_token() {
        let segments = Segments::parse("cost: ${a", &names(&["a"]));
        assert!(segments.is_static());
        assert_eq!(segments.fill(&["1"]), "cost: ${a");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let segments = Segments::parse("${a}|${b}", &names(&["a", "b"]));
        assert_eq!(segments.fill(&["${b}", "2"]), "${b}|2");
    }

    #[test]
    fn test_compile_merges_duplicate_names() {
        let template = Template::compile(&greet(), ["who", "who", "mood"]);
        assert_eq!(template.names(), &["who".to_string(), "mood".to_string()]);
        assert_eq!(template.placeholder_count(), 2);
    }

    #[test]
    fn test_instantiate_text_and_attributes() {
        let template = Template::compile(&greet(), ["who"]);
        let html = template.instantiate(&["Ada"]).to_html();
        insta::assert_snapshot!(html, @r#"<p title="for Ada">Hello, Ada! ${unknown}</p>"#);
    }

    #[test]
    fn test_instantiate_is_independent() {
        let template = Template::compile(&greet(), ["who"]);
        let ada = template.instantiate(&["Ada"]);
        let grace = template.instantiate_with(|_| "Grace");

        assert_eq!(ada.text_content(), "Hello, Ada! ${unknown}");
        assert_eq!(grace.text_content(), "Hello, Grace! ${unknown}");
        // The compiled template still holds placeholders.
        assert_eq!(template.placeholder_count(), 2);
    }

    #[test]
    fn test_missing_values_fill_empty() {
        let template = Template::compile(&greet(), ["who"]);
        assert_eq!(template.instantiate(&[]).text_content(), "Hello, ! ${unknown}");
    }

    proptest! {
        #[test]
        fn prop_fill_leaves_no_declared_token(
            prefix in "[a-zA-Z ,.!]{0,12}",
            suffix in "[a-zA-Z ,.!]{0,12}",
            value in "[a-zA-Z0-9 ]{0,12}",
        ) {
            let text = format!("{prefix}${{who}}{suffix}${{who}}");
            let segments = Segments::parse(&text, &names(&["who"]));
            let filled = segments.fill(&[value.as_str()]);
            let token = "${who}";
            prop_assert!(!filled.contains(token));
            prop_assert_eq!(filled, format!("{prefix}{value}{suffix}{value}"));
        }

        #[test]
        fn prop_text_without_tokens_is_static(text in "[^$]{0,40}") {
            let segments = Segments::parse(&text, &names(&["a", "b"]));
            prop_assert!(segments.is_static());
            prop_assert_eq!(segments.fill(&["x", "y"]), text);
        }
    }
}
