//! `<htmc-define>`: runs its scripts in order, then compiles its components.
//!
//! Each `<script>` is replaced by a fresh copy before it is handed to the
//! [`ScriptRunner`](crate::ScriptRunner). A script with a `src` suspends the
//! host until [`Page::dispatch_script_load`] reports that the copy loaded, so
//! components compiled afterwards can rely on its side effects.

use std::collections::VecDeque;

use htmc_core::{DefineError, NodeId};
use htmc_expander::define_component;
use log::{error, trace, warn};

use crate::host::Script;
use crate::page::Page;

/// Scripts a definition host has not run yet.
#[derive(Debug, Default)]
pub(crate) struct PendingDefinition {
    scripts: VecDeque<NodeId>,
    /// Replacement script whose load event the host waits for.
    waiting_on: Option<NodeId>,
}

impl Page {
    /// Report that the external script `script` finished loading.
    pub fn dispatch_script_load(&mut self, script: NodeId) {
        let host = self
            .definitions
            .iter()
            .find(|(_, pending)| pending.waiting_on == Some(script))
            .map(|(&host, _)| host);

        match host {
            Some(host) => self.resume_definition(host),
            None => trace!("Ignoring load event for script {script:?}"),
        }
    }

    /// Whether a definition host is waiting on an external script.
    pub fn is_definition_pending(&self, host: NodeId) -> bool {
        self.definitions.contains_key(&host)
    }

    pub(crate) fn connect_define_host(&mut self, host: NodeId) {
        if self.dom.has_attribute(host, &self.config.defined_marker) {
            trace!("Definition host already processed");
            return;
        }
        self.dom
            .set_attribute(host, self.config.defined_marker.as_str(), "true");
        self.dom.set_attribute(host, "hidden", "");

        let scripts = self.dom.elements_by_tag(host, "script").into();
        self.definitions.insert(
            host,
            PendingDefinition {
                scripts,
                waiting_on: None,
            },
        );
        self.resume_definition(host);
    }

    fn resume_definition(&mut self, host: NodeId) {
        loop {
            let next = match self.definitions.get_mut(&host) {
                Some(pending) => {
                    pending.waiting_on = None;
                    pending.scripts.pop_front()
                }
                None => return,
            };
            let Some(original) = next else {
                break;
            };

            if let Some(copy) = self.run_script(original) {
                if let Some(pending) = self.definitions.get_mut(&host) {
                    pending.waiting_on = Some(copy);
                }
                return;
            }
        }

        self.definitions.shift_remove(&host);
        self.define_components(host);
    }

    /// Replace `original` with a fresh copy and execute it.
    ///
    /// Returns the copy when the host must wait for it to load.
    fn run_script(&mut self, original: NodeId) -> Option<NodeId> {
        let attributes = self.dom.attributes(original).cloned().unwrap_or_default();
        let text = self.dom.text_content(original);

        let copy = self.dom.create_element("script");
        for (name, value) in &attributes {
            self.dom.set_attribute(copy, name.as_str(), value.as_str());
        }
        if !text.is_empty() {
            let content = self.dom.create_text(text.as_str());
            self.dom.append_child(copy, content);
        }
        self.dom.replace(original, copy);

        let script = Script {
            node: copy,
            src: attributes.get("src").filter(|src| !src.is_empty()).cloned(),
            text,
            attributes,
        };
        match self.scripts.execute(&script) {
            Ok(()) => script.src.is_some().then_some(copy),
            Err(err) => {
                error!("Script execution failed: {err}");
                None
            }
        }
    }

    fn define_components(&mut self, host: NodeId) {
        for component in self.dom.elements_by_tag(host, "component") {
            match define_component(&self.dom, component, &mut self.components, &mut self.elements) {
                Ok(name) => self.upgrade(&name),
                Err(err @ (DefineError::Template { .. } | DefineError::Platform { .. })) => {
                    error!("{err}")
                }
                Err(err) => warn!("{err}"),
            }
        }
    }
}
