//! The host environment.
//!
//! A [`Page`] owns the document, the component and custom element registries,
//! the import ledger and the lazy watcher. Every mutation goes through it so
//! that custom element reactions (upgrade, connected, disconnected, attribute
//! changed) run in document order as they would in a browser. Errors raised
//! inside a reaction are logged here and never returned to the caller.

use htmc_core::{DefineError, Dom, Fragment, NodeId};
use htmc_expander::{
    observed_attributes, ComponentElement, ComponentRegistry, CustomElementRegistry,
    ElementDefinition, ElementKind, Rendered,
};
use htmc_parser::parse_fragment;
use indexmap::IndexMap;
use log::{debug, error, trace, warn};

use crate::config::PageConfig;
use crate::define_host::PendingDefinition;
use crate::host::{
    DetachedViewport, Fetcher, NoNetwork, ObserverFactory, ScriptRunner, SkipScripts,
};
use crate::lazy::LazyWatcher;
use crate::ledger::ImportLedger;

#[derive(Debug)]
pub(crate) enum Behavior {
    Component(ComponentElement),
    DefineHost,
    AttachHost,
}

#[derive(Debug)]
pub(crate) struct Instance {
    pub(crate) behavior: Behavior,
    pub(crate) connected: bool,
}

/// A document with HTMC behaviors attached.
pub struct Page {
    pub(crate) config: PageConfig,
    pub(crate) dom: Dom,
    pub(crate) components: ComponentRegistry,
    pub(crate) elements: CustomElementRegistry,
    pub(crate) instances: IndexMap<NodeId, Instance>,
    pub(crate) ledger: ImportLedger,
    pub(crate) lazy: LazyWatcher,
    /// Sources waiting for the load event.
    pub(crate) deferred: Vec<String>,
    pub(crate) loaded: bool,
    /// Definition hosts suspended on an external script.
    pub(crate) definitions: IndexMap<NodeId, PendingDefinition>,
    depth: usize,
    pub(crate) fetcher: Box<dyn Fetcher>,
    pub(crate) scripts: Box<dyn ScriptRunner>,
    pub(crate) observers: Box<dyn ObserverFactory>,
}

impl Page {
    /// Create an empty page with the host elements defined.
    ///
    /// Fails when a configured host tag is not a valid custom element name.
    pub fn new(config: PageConfig) -> Result<Self, DefineError> {
        let mut elements = CustomElementRegistry::new();
        elements.define(ElementDefinition::new(
            config.define_tag.as_str(),
            ElementKind::DefineHost,
        ))?;
        elements.define(ElementDefinition::new(
            config.attach_tag.as_str(),
            ElementKind::AttachHost,
        ))?;

        Ok(Self {
            config,
            dom: Dom::new(),
            components: ComponentRegistry::new(),
            elements,
            instances: IndexMap::new(),
            ledger: ImportLedger::new(),
            lazy: LazyWatcher::new(),
            deferred: Vec::new(),
            loaded: false,
            definitions: IndexMap::new(),
            depth: 0,
            fetcher: Box::new(NoNetwork),
            scripts: Box::new(SkipScripts),
            observers: Box::new(DetachedViewport),
        })
    }

    /// Use `fetcher` for imports.
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Use `runner` for definition host scripts.
    pub fn with_script_runner(mut self, runner: impl ScriptRunner + 'static) -> Self {
        self.scripts = Box::new(runner);
        self
    }

    /// Use `factory` to create the lazy import observer.
    pub fn with_observer_factory(mut self, factory: impl ObserverFactory + 'static) -> Self {
        self.observers = Box::new(factory);
        self
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn body(&self) -> NodeId {
        self.dom.body()
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    pub fn elements(&self) -> &CustomElementRegistry {
        &self.elements
    }

    pub fn ledger(&self) -> &ImportLedger {
        &self.ledger
    }

    pub fn lazy_watcher(&self) -> &LazyWatcher {
        &self.lazy
    }

    /// Whether [`dispatch_load`](Self::dispatch_load) has run.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Sources queued for the load event.
    pub fn deferred_imports(&self) -> &[String] {
        &self.deferred
    }

    /// Renders completed by the component instance on `node`.
    pub fn render_count(&self, node: NodeId) -> Option<u32> {
        match &self.instances.get(&node)?.behavior {
            Behavior::Component(element) => Some(element.render_count()),
            _ => None,
        }
    }

    /// Observed attributes of the compiled component `name`.
    pub fn observed_attributes(&self, name: &str) -> Vec<String> {
        observed_attributes(name, &self.components)
    }

    /// Connected elements with `tag`, including those inside shadow roots, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<NodeId> {
        self.dom
            .shadow_including_inclusive_descendants(self.dom.document())
            .into_iter()
            .filter(|&node| self.dom.tag(node) == Some(tag))
            .collect()
    }

    /// First connected element with `tag`.
    pub fn find(&self, tag: &str) -> Option<NodeId> {
        self.find_all(tag).into_iter().next()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Replace the body content with `html`.
    pub fn load_html(&mut self, html: &str) {
        let body = self.dom.body();
        for child in self.dom.children(body).to_vec() {
            self.remove(child);
        }
        self.append_html(body, html);
    }

    /// Parse `html` and append it under `parent`. Returns the inserted top-level nodes.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
        match parse_fragment(html) {
            Ok(fragment) => self.append_fragment(parent, &fragment),
            Err(err) => {
                error!("Failed to parse markup: {err}");
                Vec::new()
            }
        }
    }

    /// Append `fragment` under `parent` and run connection reactions.
    pub fn append_fragment(&mut self, parent: NodeId, fragment: &Fragment) -> Vec<NodeId> {
        if !self.knows(parent) {
            return Vec::new();
        }
        let inserted = self.dom.append_fragment(parent, fragment);
        for &node in &inserted {
            self.connect_tree(node);
        }
        inserted
    }

    /// Detach `node` and run disconnection reactions for its subtree.
    pub fn remove(&mut self, node: NodeId) {
        if !self.knows(node) {
            return;
        }
        let subtree = self.dom.shadow_including_inclusive_descendants(node);
        self.dom.remove(node);
        self.disconnect_nodes(&subtree);
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if !self.knows(node) {
            return;
        }
        let old = self.dom.set_attribute(node, name, value);
        self.attribute_changed(node, name, old.as_deref(), Some(value));
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if !self.knows(node) {
            return;
        }
        if let Some(old) = self.dom.remove_attribute(node, name) {
            self.attribute_changed(node, name, Some(old.as_str()), None);
        }
    }

    /// Report the page's load event. Runs every deferred import once.
    pub fn dispatch_load(&mut self) {
        if self.loaded {
            trace!("Load event already dispatched");
            return;
        }
        self.loaded = true;
        for src in std::mem::take(&mut self.deferred) {
            self.import_components(&src);
        }
    }

    /// Report a viewport intersection change for `target`.
    pub fn notify_intersection(&mut self, target: NodeId, is_intersecting: bool) {
        if !is_intersecting {
            return;
        }
        for src in self.lazy.intersect(target) {
            self.import_components(&src);
        }
    }

    // ------------------------------------------------------------------
    // Reactions
    // ------------------------------------------------------------------

    /// Connect every element in `root`'s shadow-including subtree, in document order.
    pub(crate) fn connect_tree(&mut self, root: NodeId) {
        for node in self.dom.shadow_including_inclusive_descendants(root) {
            self.connect_element(node);
        }
    }

    /// Upgrade and connect every connected element with the newly defined `tag`.
    pub(crate) fn upgrade(&mut self, tag: &str) {
        let candidates = self.find_all(tag);
        debug!("Upgrading {} <{tag}> element(s)", candidates.len());
        for node in candidates {
            self.connect_element(node);
        }
    }

    fn connect_element(&mut self, node: NodeId) {
        if !self.dom.is_connected(node) {
            return;
        }
        let Some(tag) = self.dom.tag(node) else {
            return;
        };
        let Some(kind) = self.elements.kind(tag) else {
            return;
        };

        let mut upgraded = false;
        match self.instances.get_mut(&node) {
            Some(instance) if instance.connected => return,
            Some(instance) => instance.connected = true,
            None => {
                upgraded = true;
                let tag = tag.to_string();
                let behavior = match kind {
                    ElementKind::Component => {
                        Behavior::Component(ComponentElement::new(&mut self.dom, node, tag.as_str()))
                    }
                    ElementKind::DefineHost => Behavior::DefineHost,
                    ElementKind::AttachHost => Behavior::AttachHost,
                };
                trace!("Upgraded <{tag}>");
                self.instances.insert(
                    node,
                    Instance {
                        behavior,
                        connected: true,
                    },
                );
            }
        }

        if upgraded && kind == ElementKind::Component {
            self.replay_attributes(node);
        }

        match kind {
            ElementKind::Component => self.connect_component(node),
            ElementKind::DefineHost => self.connect_define_host(node),
            ElementKind::AttachHost => self.connect_attach_host(node),
        }
    }

    /// Report each observed attribute present at upgrade as changed from absent.
    ///
    /// The connected render that follows replaces whatever these renders
    /// produce, so their content is not connected.
    fn replay_attributes(&mut self, node: NodeId) {
        let Some(definition) = self.dom.tag(node).and_then(|tag| self.elements.get(tag)) else {
            return;
        };
        let present: Vec<(String, String)> = self
            .dom
            .attributes(node)
            .map(|attributes| {
                attributes
                    .iter()
                    .filter(|(name, _)| definition.observes(name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        for (name, value) in present {
            let result = match self.instances.get_mut(&node) {
                Some(Instance {
                    behavior: Behavior::Component(element),
                    ..
                }) => element.attribute_changed(
                    &mut self.dom,
                    &mut self.components,
                    &name,
                    None,
                    Some(value.as_str()),
                ),
                _ => return,
            };
            if let Err(err) = result {
                error!(
                    "Error in attribute changed callback for <{}>: {err}",
                    self.tag_of(node)
                );
            }
        }
    }

    fn connect_component(&mut self, node: NodeId) {
        let result = match self.instances.get_mut(&node) {
            Some(Instance {
                behavior: Behavior::Component(element),
                ..
            }) => element.connected(&mut self.dom, &self.components),
            _ => return,
        };

        match result {
            Ok(rendered) => self.apply_render(node, rendered),
            Err(err) => error!("Error in connected callback for <{}>: {err}", self.tag_of(node)),
        }
    }

    fn attribute_changed(
        &mut self,
        node: NodeId,
        attribute: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) {
        let observed = self
            .dom
            .tag(node)
            .and_then(|tag| self.elements.get(tag))
            .is_some_and(|definition| definition.observes(attribute));
        if !observed {
            return;
        }

        let result = match self.instances.get_mut(&node) {
            Some(Instance {
                behavior: Behavior::Component(element),
                ..
            }) => element.attribute_changed(
                &mut self.dom,
                &mut self.components,
                attribute,
                old_value,
                new_value,
            ),
            _ => return,
        };

        match result {
            Ok(Some(rendered)) => self.apply_render(node, rendered),
            Ok(None) => trace!("<{}> {attribute} unchanged", self.tag_of(node)),
            Err(err) => error!(
                "Error in attribute changed callback for <{}>: {err}",
                self.tag_of(node)
            ),
        }
    }

    /// Disconnect what a render replaced and connect what it inserted.
    fn apply_render(&mut self, host: NodeId, rendered: Rendered) {
        let replaced: Vec<NodeId> = rendered
            .removed
            .iter()
            .flat_map(|&node| self.dom.shadow_including_inclusive_descendants(node))
            .collect();
        self.disconnect_nodes(&replaced);

        if self.depth >= self.config.max_nesting_depth {
            error!(
                "Components nested deeper than {} levels inside <{}>; not connecting its content",
                self.config.max_nesting_depth,
                self.tag_of(host)
            );
            return;
        }
        self.depth += 1;
        for node in rendered.inserted {
            self.connect_tree(node);
        }
        self.depth -= 1;
    }

    fn disconnect_nodes(&mut self, nodes: &[NodeId]) {
        for &node in nodes {
            if self.dom.is_connected(node) {
                continue;
            }
            let Some(instance) = self.instances.get_mut(&node) else {
                continue;
            };
            if !instance.connected {
                continue;
            }
            instance.connected = false;

            let releases_imports = match &mut instance.behavior {
                Behavior::Component(element) => {
                    element.disconnected();
                    false
                }
                Behavior::DefineHost => false,
                Behavior::AttachHost => true,
            };
            if releases_imports {
                self.release_attach_host(node);
            }
        }
    }

    fn knows(&self, node: NodeId) -> bool {
        let known = self.dom.contains(node);
        if !known {
            warn!("Ignoring {node:?}, which belongs to another document");
        }
        known
    }

    fn tag_of(&self, node: NodeId) -> &str {
        self.dom.tag(node).unwrap_or("#node")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(PageConfig::new()).unwrap()
    }

    const GREET_BOX: &str = r#"
        <htmc-define>
            <component name="greet-box" reactive-attributes="who">
                <p>Hello, ${who}!</p>
            </component>
        </htmc-define>
    "#;

    #[test]
    fn test_hosts_are_defined() {
        let page = page();
        assert_eq!(page.elements().kind("htmc-define"), Some(ElementKind::DefineHost));
        assert_eq!(page.elements().kind("htmc-attach"), Some(ElementKind::AttachHost));
    }

    #[test]
    fn test_invalid_host_tag() {
        let result = Page::new(PageConfig::new().with_define_tag("define"));
        assert!(matches!(result, Err(DefineError::Platform { .. })));
    }

    #[test]
    fn test_use_after_definition() {
        let mut page = page();
        page.load_html(&format!(r#"{GREET_BOX}<greet-box who="Ada"></greet-box>"#));

        let host = page.find("greet-box").unwrap();
        assert_eq!(page.dom().rendered_text(host).trim(), "Hello, Ada!");
        // One render for the initial attribute, one on connection.
        assert_eq!(page.render_count(host), Some(2));
    }

    #[test]
    fn test_use_before_definition_is_upgraded() {
        let mut page = page();
        page.load_html(&format!(r#"<greet-box who="Ada"></greet-box>{GREET_BOX}"#));

        let host = page.find("greet-box").unwrap();
        assert_eq!(page.dom().rendered_text(host).trim(), "Hello, Ada!");
        assert_eq!(page.render_count(host), Some(2));
    }

    #[test]
    fn test_parsed_attribute_seeds_state() {
        let mut page = page();
        page.load_html(&format!(
            r#"{GREET_BOX}<greet-box who="Ada"></greet-box><greet-box></greet-box>"#
        ));

        let state = page.components().get("greet-box").and_then(|e| e.state_value("who"));
        assert_eq!(state, Some("Ada"));
        let hosts = page.find_all("greet-box");
        assert_eq!(page.dom().rendered_text(hosts[1]).trim(), "Hello, Ada!");
        assert_eq!(page.render_count(hosts[1]), Some(1));
    }

    #[test]
    fn test_upgraded_attribute_seeds_state() {
        let mut page = page();
        page.load_html(&format!(
            r#"<greet-box who="Ada"></greet-box><greet-box></greet-box>{GREET_BOX}"#
        ));

        let hosts = page.find_all("greet-box");
        assert_eq!(page.dom().rendered_text(hosts[0]).trim(), "Hello, Ada!");
        assert_eq!(page.dom().rendered_text(hosts[1]).trim(), "Hello, Ada!");
    }

    #[test]
    fn test_appended_use_renders() {
        let mut page = page();
        page.load_html(GREET_BOX);
        let body = page.body();
        let inserted = page.append_html(body, r#"<greet-box who="Grace"></greet-box>"#);

        assert_eq!(page.dom().rendered_text(inserted[0]).trim(), "Hello, Grace!");
    }

    #[test]
    fn test_unobserved_attribute_does_not_render() {
        let mut page = page();
        page.load_html(&format!(r#"{GREET_BOX}<greet-box who="Ada"></greet-box>"#));
        let host = page.find("greet-box").unwrap();

        page.set_attribute(host, "title", "ignored");
        page.set_attribute(host, "who", "Ada");
        assert_eq!(page.render_count(host), Some(2));
    }

    #[test]
    fn test_remove_attribute_rerenders() {
        let mut page = page();
        page.load_html(&format!(r#"{GREET_BOX}<greet-box who="Ada"></greet-box>"#));
        let host = page.find("greet-box").unwrap();

        page.remove_attribute(host, "who");
        page.remove_attribute(host, "who");
        assert_eq!(page.render_count(host), Some(3));
        assert_eq!(page.dom().rendered_text(host).trim(), "Hello, !");
    }

    #[test]
    fn test_nested_components_render() {
        let mut page = page();
        page.load_html(
            r#"
            <htmc-define>
                <component name="inner-tag" reactive-attributes="label"><b>${label}</b></component>
                <component name="outer-card" reactive-attributes="title">
                    <section><inner-tag label="${title}"></inner-tag></section>
                </component>
            </htmc-define>
            <outer-card title="Nested"></outer-card>
            "#,
        );

        let outer = page.find("outer-card").unwrap();
        assert_eq!(page.dom().rendered_text(outer).trim(), "Nested");

        let inner = page.find_all("inner-tag");
        // One use inside the declaration body, one inside the shadow root.
        assert_eq!(inner.len(), 2);

        page.set_attribute(outer, "title", "Changed");
        assert_eq!(page.dom().rendered_text(outer).trim(), "Changed");
        let old_inner = inner[1];
        assert!(!page.dom().is_connected(old_inner));
    }

    #[test]
    fn test_self_nesting_is_bounded() {
        let mut page = Page::new(PageConfig::new().with_max_nesting_depth(3)).unwrap();
        page.load_html(
            r#"
            <htmc-define>
                <component name="loop-box"><i>x</i><loop-box></loop-box></component>
            </htmc-define>
            "#,
        );

        // The declaration body holds one use; it nests three levels deep before stopping.
        assert_eq!(page.find_all("loop-box").len(), 5);
    }

    #[test]
    fn test_foreign_nodes_are_ignored() {
        let mut other = page();
        other.load_html(&format!(r#"{GREET_BOX}<greet-box></greet-box><greet-box></greet-box>"#));
        let foreign = *other.find_all("greet-box").last().unwrap();

        let mut page = page();
        page.set_attribute(foreign, "who", "Ada");
        page.remove_attribute(foreign, "who");
        page.remove(foreign);
        page.notify_intersection(foreign, true);
        assert!(page.append_html(foreign, "<p>x</p>").is_empty());
        assert!(page.dom().children(page.body()).is_empty());
    }

    #[test]
    fn test_unparsable_markup_is_logged() {
        let mut page = page();
        let body = page.body();
        assert!(page.append_html(body, "<!-- never closed").is_empty());
    }
}
