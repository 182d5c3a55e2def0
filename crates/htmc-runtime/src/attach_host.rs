//! `<htmc-attach>`: imports remote fragments into the document body.

use htmc_core::{Dom, Fragment, ImportError, NodeId};
use htmc_parser::parse_fragment;
use log::{debug, error, warn};

use crate::page::Page;

/// When an attach host imports its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStrategy {
    /// Import during connection.
    Immediate,
    /// Import on the page's load event (`defer`).
    Deferred,
    /// Import the first time the element intersects the viewport (`lazy`).
    Lazy,
}

impl ImportStrategy {
    /// Strategy selected by the element's attributes. `defer` wins over `lazy`.
    pub fn of(dom: &Dom, element: NodeId) -> Self {
        if dom.has_attribute(element, "defer") {
            ImportStrategy::Deferred
        } else if dom.has_attribute(element, "lazy") {
            ImportStrategy::Lazy
        } else {
            ImportStrategy::Immediate
        }
    }
}

impl Page {
    pub(crate) fn connect_attach_host(&mut self, host: NodeId) {
        self.dom.set_attribute(host, "hidden", "");

        for nested in self.dom.elements_by_tag(host, &self.config.attach_tag) {
            if let Some(src) = self.source_of(nested) {
                self.schedule_import(host, nested, &src);
            }
        }

        match self.source_of(host) {
            Some(src) => self.schedule_import(host, host, &src),
            None => warn!("{}", ImportError::MissingSource),
        }
    }

    pub(crate) fn release_attach_host(&mut self, host: NodeId) {
        self.lazy.release(host);
    }

    fn source_of(&self, element: NodeId) -> Option<String> {
        self.dom
            .get_attribute(element, "src")
            .filter(|src| !src.is_empty())
            .map(str::to_string)
    }

    fn schedule_import(&mut self, owner: NodeId, target: NodeId, src: &str) {
        match ImportStrategy::of(&self.dom, target) {
            ImportStrategy::Immediate => self.import_components(src),
            ImportStrategy::Deferred if self.loaded && self.config.defer_after_load => {
                self.import_components(src)
            }
            ImportStrategy::Deferred => {
                debug!("Deferring import of {src} until load");
                self.deferred.push(src.to_string());
            }
            ImportStrategy::Lazy => {
                debug!("Importing {src} when visible");
                self.lazy
                    .subscribe(self.observers.as_mut(), owner, target, src);
            }
        }
    }

    /// Fetch `src` once and splice its content into the body.
    pub(crate) fn import_components(&mut self, src: &str) {
        if !self.ledger.claim(src) {
            debug!("Skipping {src}: already imported");
            return;
        }

        match self.fetch_fragment(src) {
            Ok(fragment) => {
                debug!("Imported {src} ({} nodes)", fragment.nodes.len());
                let body = self.dom.body();
                self.append_fragment(body, &fragment);
            }
            Err(err) => error!("{err}"),
        }
    }

    fn fetch_fragment(&mut self, src: &str) -> Result<Fragment, ImportError> {
        let response = self
            .fetcher
            .fetch(src)
            .map_err(|source| ImportError::Network {
                src: src.to_string(),
                source,
            })?;
        if !response.is_success() {
            return Err(ImportError::Status {
                src: src.to_string(),
                status: response.status,
            });
        }
        parse_fragment(&response.body).map_err(|source| ImportError::Parse {
            src: src.to_string(),
            source,
        })
    }
}
