//! Component element behavior.
//!
//! Every compiled component shares this one implementation; instances differ
//! only by the component name they carry, which is looked up in the
//! [`ComponentRegistry`] on each lifecycle call.

use htmc_core::{Dom, Fragment, NodeId, RenderError, ShadowRootMode};
use log::{trace, warn};

use crate::definition::NAME_ATTRIBUTE;
use crate::elements::{ElementDefinition, ElementKind};
use crate::{ComponentRegistry, RegistryEntry};

/// Observed attributes for a component: its reactive attribute list.
pub fn observed_attributes(name: &str, registry: &ComponentRegistry) -> Vec<String> {
    match registry.get(name) {
        Some(entry) => entry.reactive_attributes.to_vec(),
        None => {
            warn!("No reactive attributes found for component: {name}");
            Vec::new()
        }
    }
}

/// Nodes touched by a render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// Former shadow root children, now detached.
    pub removed: Vec<NodeId>,
    /// New shadow root children, in order.
    pub inserted: Vec<NodeId>,
}

/// A component instance bound to its host element.
#[derive(Debug, Clone)]
pub struct ComponentElement {
    name: String,
    host: NodeId,
    renders: u32,
}

impl ComponentElement {
    /// The custom element definition for a compiled component.
    pub fn definition(name: &str, entry: &RegistryEntry) -> ElementDefinition {
        ElementDefinition::new(name, ElementKind::Component)
            .with_observed_attributes(entry.reactive_attributes.to_vec())
    }

    /// Bind an instance to `host`, attaching its open shadow root.
    pub fn new(dom: &mut Dom, host: NodeId, name: impl Into<String>) -> Self {
        dom.attach_shadow(host, ShadowRootMode::Open);
        Self {
            name: name.into(),
            host,
            renders: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Number of completed renders.
    pub fn render_count(&self) -> u32 {
        self.renders
    }

    /// Surface static defaults as attributes, then render.
    pub fn connected(
        &mut self,
        dom: &mut Dom,
        registry: &ComponentRegistry,
    ) -> Result<Rendered, RenderError> {
        self.initialize_attributes(dom, registry)?;
        self.render(dom, registry)
    }

    /// React to an observed attribute change. Returns `None` when the value did not change.
    pub fn attribute_changed(
        &mut self,
        dom: &mut Dom,
        registry: &mut ComponentRegistry,
        attribute: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Result<Option<Rendered>, RenderError> {
        if old_value == new_value {
            return Ok(None);
        }

        if let Some(entry) = registry.get_mut(&self.name) {
            entry.set_state(attribute, new_value.unwrap_or(""));
        }
        self.render(dom, registry).map(Some)
    }

    pub fn disconnected(&mut self) {
        trace!("<{}> disconnected", self.name);
    }

    fn initialize_attributes(
        &self,
        dom: &mut Dom,
        registry: &ComponentRegistry,
    ) -> Result<(), RenderError> {
        let entry = registry.get(&self.name).ok_or_else(|| RenderError::MissingEntry {
            component: self.name.clone(),
        })?;

        for attribute in &entry.static_attributes {
            if dom.has_attribute(self.host, attribute) {
                continue;
            }
            if let Some(value) = entry.state_value(attribute) {
                dom.set_attribute(self.host, attribute.clone(), value);
            }
        }
        Ok(())
    }

    /// Replace the shadow root content with a fresh instantiation of the template.
    pub fn render(
        &mut self,
        dom: &mut Dom,
        registry: &ComponentRegistry,
    ) -> Result<Rendered, RenderError> {
        let entry = registry.get(&self.name).ok_or_else(|| RenderError::MissingEntry {
            component: self.name.clone(),
        })?;
        let shadow = dom
            .shadow_root(self.host)
            .ok_or_else(|| RenderError::MissingShadowRoot {
                component: self.name.clone(),
            })?;

        let mut content = {
            let values: Vec<&str> = entry
                .template
                .names()
                .iter()
                .map(|name| {
                    dom.get_attribute(self.host, name)
                        .or_else(|| entry.state_value(name))
                        .unwrap_or("")
                })
                .collect();
            entry.template.instantiate(&values)
        };

        let removed = dom.children(shadow).to_vec();
        dom.clear_children(shadow);

        // Styles go straight into the shadow root so their rules stay scoped.
        let styles = content.take_elements("style");
        let mut inserted = dom.append_fragment(
            shadow,
            &Fragment::new(styles.into_iter().map(Into::into).collect()),
        );
        self.remove_declaration_styles(dom);

        inserted.extend(dom.append_fragment(shadow, &content));
        self.renders += 1;
        trace!("<{}> rendered ({} nodes)", self.name, inserted.len());

        Ok(Rendered { removed, inserted })
    }

    /// Drop `<style>` elements left in the light-DOM `<component>` declaration.
    fn remove_declaration_styles(&self, dom: &mut Dom) {
        let declaration = dom.find_element(dom.document(), |e| {
            e.tag == "component"
                && e.attributes.get(NAME_ATTRIBUTE).map(String::as_str) == Some(self.name.as_str())
        });
        if let Some(declaration) = declaration {
            for style in dom.elements_by_tag(declaration, "style") {
                dom.remove(style);
            }
        }
    }
}
