//! Custom element definitions known to a page.

use htmc_core::DefineError;
use indexmap::IndexMap;

/// Behavior attached to a defined tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A compiled component, rendered from the component registry.
    Component,
    /// `<htmc-define>`.
    DefineHost,
    /// `<htmc-attach>`.
    AttachHost,
}

/// A defined custom element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDefinition {
    pub name: String,
    pub kind: ElementKind,
    /// Attributes whose changes are reported to the element.
    pub observed_attributes: Vec<String>,
}

impl ElementDefinition {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            observed_attributes: Vec::new(),
        }
    }

    pub fn with_observed_attributes(mut self, attributes: Vec<String>) -> Self {
        self.observed_attributes = attributes;
        self
    }

    pub fn observes(&self, attribute: &str) -> bool {
        self.observed_attributes.iter().any(|a| a == attribute)
    }
}

/// Check the platform's custom element naming rule: a lowercase ASCII letter
/// first, at least one hyphen, and no uppercase letters.
pub fn is_valid_custom_element_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase())
        && name.contains('-')
        && !name.chars().any(|c| c.is_ascii_uppercase())
}

/// Tag name to element definition. Definitions are permanent.
#[derive(Debug, Clone, Default)]
pub struct CustomElementRegistry {
    definitions: IndexMap<String, ElementDefinition>,
}

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a tag. Fails for names the platform rejects or already knows.
    pub fn define(&mut self, definition: ElementDefinition) -> Result<(), DefineError> {
        if !is_valid_custom_element_name(&definition.name) {
            return Err(DefineError::Platform {
                name: definition.name,
                reason: "custom element names must start with a lowercase letter and contain a hyphen"
                    .to_string(),
            });
        }
        if self.is_defined(&definition.name) {
            return Err(DefineError::AlreadyDefined {
                name: definition.name,
            });
        }
        self.definitions.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ElementDefinition> {
        self.definitions.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<ElementKind> {
        self.get(name).map(|d| d.kind)
    }

    /// Defined tag names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
