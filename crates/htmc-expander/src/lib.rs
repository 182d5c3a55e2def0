//! Component registration and rendering for HTMC documents.
//!
//! This crate handles:
//! - The component registry (compiled templates, attribute schema, state)
//! - Compiling `<component>` declarations into registry entries
//! - The custom element definitions known to a page
//! - Rendering component instances into their shadow roots

mod definition;
mod element;
mod elements;
mod registry;

pub use definition::{
    define_component, is_valid_component_name, split_attribute_list, NAME_ATTRIBUTE,
    REACTIVE_ATTRIBUTES, STATIC_ATTRIBUTES,
};
pub use element::{observed_attributes, ComponentElement, Rendered};
pub use elements::{is_valid_custom_element_name, CustomElementRegistry, ElementDefinition, ElementKind};
pub use registry::{AttributeList, ComponentBuilder, ComponentRegistry, RegistryEntry};
