//! Compiling `<component>` declarations.
//!
//! A declaration looks like:
//!
//! ```html
//! <component name="greet-box" static-attributes="tone" reactive-attributes="who">
//!   <style>p { margin: 0; }</style>
//!   <p class="${tone}">Hello, ${who}!</p>
//! </component>
//! ```
//!
//! Compiling it validates the name, splits the attribute lists, parses the
//! body into a [`Template`](htmc_core::Template), defines the custom element
//! and stores the [`RegistryEntry`].

use htmc_core::{DefineError, Dom, NodeId};
use htmc_parser::parse_fragment;
use log::debug;

use crate::element::ComponentElement;
use crate::elements::CustomElementRegistry;
use crate::registry::{AttributeList, ComponentRegistry, RegistryEntry};

/// Attribute holding the component name.
pub const NAME_ATTRIBUTE: &str = "name";
/// Attribute listing the static attribute names.
pub const STATIC_ATTRIBUTES: &str = "static-attributes";
/// Attribute listing the reactive attribute names.
pub const REACTIVE_ATTRIBUTES: &str = "reactive-attributes";

/// Check a component name against `^[a-z][a-z0-9-]*$`.
pub fn is_valid_component_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        }
        _ => false,
    }
}

/// Split a space-separated attribute list. Empty pieces are dropped.
pub fn split_attribute_list(value: Option<&str>) -> AttributeList {
    value
        .map(|v| v.split(' ').filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Compile the `<component>` element `component` and register it.
///
/// Returns the component name. On any error nothing is stored and no element
/// is defined.
pub fn define_component(
    dom: &Dom,
    component: NodeId,
    registry: &mut ComponentRegistry,
    elements: &mut CustomElementRegistry,
) -> Result<String, DefineError> {
    let name = match dom.get_attribute(component, NAME_ATTRIBUTE) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(DefineError::MissingName),
    };
    if elements.is_defined(&name) {
        return Err(DefineError::AlreadyDefined { name });
    }
    if !is_valid_component_name(&name) {
        return Err(DefineError::InvalidName { name });
    }

    let static_attributes = split_attribute_list(dom.get_attribute(component, STATIC_ATTRIBUTES));
    let reactive_attributes =
        split_attribute_list(dom.get_attribute(component, REACTIVE_ATTRIBUTES));

    let body = parse_fragment(&dom.inner_html(component)).map_err(|source| {
        DefineError::Template {
            name: name.clone(),
            source,
        }
    })?;
    let entry = RegistryEntry::new(&body, static_attributes, reactive_attributes);

    elements.define(ComponentElement::definition(&name, &entry))?;
    debug!(
        "Defined component <{name}> (static: {:?}, reactive: {:?})",
        entry.static_attributes, entry.reactive_attributes
    );
    registry.set(name.clone(), entry);

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementKind;
    use htmc_core::{Fragment, FragmentElement};
    use proptest::prelude::*;

    /// Build `<component>` with the given attributes and inner markup under the body.
    fn declare(dom: &mut Dom, attributes: &[(&str, &str)], inner: &str) -> NodeId {
        let mut element = FragmentElement::new("component");
        for (name, value) in attributes {
            element = element.with_attribute(*name, *value);
        }
        element.children = parse_fragment(inner).unwrap().nodes;
        let fragment = Fragment::new(vec![element.into()]);
        let body = dom.body();
        dom.append_fragment(body, &fragment)[0]
    }

    fn compile(
        dom: &Dom,
        component: NodeId,
    ) -> (Result<String, DefineError>, ComponentRegistry, CustomElementRegistry) {
        let mut registry = ComponentRegistry::new();
        let mut elements = CustomElementRegistry::new();
        let result = define_component(dom, component, &mut registry, &mut elements);
        (result, registry, elements)
    }

    #[test]
    fn test_component_names() {
        assert!(is_valid_component_name("greet-box"));
        assert!(is_valid_component_name("x1-card"));
        assert!(is_valid_component_name("card"));
        assert!(!is_valid_component_name(""));
        assert!(!is_valid_component_name("1-card"));
        assert!(!is_valid_component_name("-card"));
        assert!(!is_valid_component_name("Greet-box"));
        assert!(!is_valid_component_name("greet_box"));
        assert!(!is_valid_component_name("greet box"));
    }

    #[test]
    fn test_split_attribute_list() {
        assert!(split_attribute_list(None).is_empty());
        assert!(split_attribute_list(Some("")).is_empty());
        assert_eq!(split_attribute_list(Some("a b")).as_slice(), &["a", "b"]);
        assert_eq!(split_attribute_list(Some(" a  b ")).as_slice(), &["a", "b"]);
    }

    #[test]
    fn test_define_component() {
        let mut dom = Dom::new();
        let component = declare(
            &mut dom,
            &[
                ("name", "user-card"),
                ("static-attributes", "title"),
                ("reactive-attributes", "name title"),
            ],
            "<h2>${title}</h2><p>${name}</p>",
        );

        let (result, registry, elements) = compile(&dom, component);
        assert_eq!(result, Ok("user-card".to_string()));

        let entry = registry.get("user-card").unwrap();
        assert_eq!(entry.static_attributes.as_slice(), &["title"]);
        assert_eq!(entry.reactive_attributes.as_slice(), &["name", "title"]);
        assert_eq!(entry.state.len(), 2);
        assert_eq!(entry.template.names(), &["title", "name"]);
        assert_eq!(entry.template.placeholder_count(), 2);

        let definition = elements.get("user-card").unwrap();
        assert_eq!(definition.kind, ElementKind::Component);
        assert_eq!(definition.observed_attributes, vec!["name", "title"]);
    }

    #[test]
    fn test_missing_name() {
        let mut dom = Dom::new();
        let unnamed = declare(&mut dom, &[], "<p>x</p>");
        let empty = declare(&mut dom, &[("name", "")], "<p>x</p>");

        assert_eq!(compile(&dom, unnamed).0, Err(DefineError::MissingName));
        assert_eq!(compile(&dom, empty).0, Err(DefineError::MissingName));
    }

    #[test]
    fn test_duplicate_is_rejected_without_overwriting() {
        let mut dom = Dom::new();
        let first = declare(&mut dom, &[("name", "greet-box")], "<p>first</p>");
        let second = declare(&mut dom, &[("name", "greet-box")], "<p>second</p>");

        let mut registry = ComponentRegistry::new();
        let mut elements = CustomElementRegistry::new();
        assert!(define_component(&dom, first, &mut registry, &mut elements).is_ok());
        assert_eq!(
            define_component(&dom, second, &mut registry, &mut elements),
            Err(DefineError::AlreadyDefined {
                name: "greet-box".to_string()
            })
        );

        let body = registry.get("greet-box").unwrap().template.instantiate(&[]);
        assert_eq!(body.to_html(), "<p>first</p>");
    }

    #[test]
    fn test_invalid_name_is_not_registered() {
        let mut dom = Dom::new();
        let component = declare(&mut dom, &[("name", "Bad_Name")], "<p>x</p>");

        let (result, registry, elements) = compile(&dom, component);
        assert_eq!(
            result,
            Err(DefineError::InvalidName {
                name: "Bad_Name".to_string()
            })
        );
        assert!(registry.is_empty());
        assert!(elements.is_empty());
    }

    #[test]
    fn test_platform_rejection_stores_nothing() {
        let mut dom = Dom::new();
        let component = declare(&mut dom, &[("name", "card")], "<p>x</p>");

        let (result, registry, elements) = compile(&dom, component);
        assert!(matches!(result, Err(DefineError::Platform { ref name, .. }) if name == "card"));
        assert!(registry.is_empty());
        assert!(elements.is_empty());
    }

    #[test]
    fn test_unknown_placeholders_stay_literal() {
        let mut dom = Dom::new();
        let component = declare(
            &mut dom,
            &[("name", "price-tag"), ("reactive-attributes", "amount")],
            "<span>${amount} ${currency}</span>",
        );

        let (_, registry, _) = compile(&dom, component);
        let body = registry.get("price-tag").unwrap().template.instantiate(&["42"]);
        insta::assert_snapshot!(body.to_html(), @"<span>42 ${currency}</span>");
    }

    #[test]
    fn test_entity_text_survives_compilation() {
        let mut dom = Dom::new();
        let component = declare(
            &mut dom,
            &[("name", "note-field")],
            "<textarea>a &amp;lt; b</textarea>",
        );

        let (_, registry, _) = compile(&dom, component);
        let body = registry.get("note-field").unwrap().template.instantiate(&[]);
        assert_eq!(body.text_content(), "a &lt; b");
    }

    proptest! {
        #[test]
        fn valid_names_match_pattern(name in "[a-z][a-z0-9-]{0,12}") {
            prop_assert!(is_valid_component_name(&name));
        }

        #[test]
        fn names_with_uppercase_are_invalid(prefix in "[a-z]{1,4}", upper in "[A-Z]", suffix in "[a-z-]{0,4}") {
            let name = format!("{prefix}{upper}{suffix}");
            prop_assert!(!is_valid_component_name(&name));
        }

        #[test]
        fn split_never_yields_empty_pieces(value in "[a-z ]{0,24}") {
            let list = split_attribute_list(Some(&value));
            prop_assert!(list.iter().all(|piece| !piece.is_empty()));
            prop_assert_eq!(list.len(), value.split_whitespace().count());
        }
    }
}
