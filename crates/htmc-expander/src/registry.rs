//! Component registry for storing and looking up compiled components.

use htmc_core::{Fragment, Template};
use indexmap::IndexMap;
use smallvec::SmallVec;

/// Ordered attribute names of a component.
pub type AttributeList = SmallVec<[String; 4]>;

/// A compiled component declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Compiled body of the declaration; every render instantiates a fresh copy.
    pub template: Template,
    /// Attributes initialized once from `state`, not observed.
    pub static_attributes: AttributeList,
    /// Attributes observed for changes.
    pub reactive_attributes: AttributeList,
    /// Last-known value per attribute name.
    pub state: IndexMap<String, String>,
}

impl RegistryEntry {
    /// Compile `body` and seed an empty state value for every attribute.
    pub fn new(body: &Fragment, static_attributes: AttributeList, reactive_attributes: AttributeList) -> Self {
        let state = static_attributes
            .iter()
            .chain(reactive_attributes.iter())
            .map(|name| (name.clone(), String::new()))
            .collect();
        let template = Template::compile(
            body,
            static_attributes
                .iter()
                .chain(reactive_attributes.iter())
                .map(String::as_str),
        );

        Self {
            template,
            static_attributes,
            reactive_attributes,
            state,
        }
    }

    /// Static attributes followed by reactive attributes.
    pub fn all_attributes(&self) -> impl Iterator<Item = &str> {
        self.static_attributes
            .iter()
            .chain(self.reactive_attributes.iter())
            .map(String::as_str)
    }

    pub fn state_value(&self, name: &str) -> Option<&str> {
        self.state.get(name).map(String::as_str)
    }

    /// Update the state of a known attribute. Unknown names are ignored.
    pub fn set_state(&mut self, name: &str, value: &str) -> bool {
        match self.state.get_mut(name) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }
}

/// A registry of compiled components, keyed by component name.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: IndexMap<String, RegistryEntry>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            components: IndexMap::new(),
        }
    }

    /// Store an entry, replacing any previous one. Callers check for existing names.
    pub fn set(&mut self, name: impl Into<String>, entry: RegistryEntry) {
        self.components.insert(name.into(), entry);
    }

    /// Get a component by name.
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.components.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RegistryEntry> {
        self.components.get_mut(name)
    }

    /// Check if a component exists.
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Component names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(|s| s.as_str())
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Builder for creating registry entries without markup.
pub struct ComponentBuilder {
    name: String,
    static_attributes: AttributeList,
    reactive_attributes: AttributeList,
    defaults: Vec<(String, String)>,
    body: Fragment,
}

impl ComponentBuilder {
    /// Create a new component builder.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            static_attributes: SmallVec::new(),
            reactive_attributes: SmallVec::new(),
            defaults: Vec::new(),
            body: Fragment::default(),
        }
    }

    /// Add a static attribute.
    pub fn static_attribute(mut self, name: &str) -> Self {
        self.static_attributes.push(name.to_string());
        self
    }

    /// Add a reactive attribute.
    pub fn reactive_attribute(mut self, name: &str) -> Self {
        self.reactive_attributes.push(name.to_string());
        self
    }

    /// Seed a state value for a declared attribute.
    pub fn default_value(mut self, name: &str, value: &str) -> Self {
        self.defaults.push((name.to_string(), value.to_string()));
        self
    }

    /// Set the component body.
    pub fn body(mut self, body: Fragment) -> Self {
        self.body = body;
        self
    }

    /// Build the component name and its registry entry.
    pub fn build(self) -> (String, RegistryEntry) {
        let mut entry = RegistryEntry::new(&self.body, self.static_attributes, self.reactive_attributes);
        for (name, value) in &self.defaults {
            entry.set_state(name, value);
        }
        (self.name, entry)
    }
}
