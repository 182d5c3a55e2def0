//! Recording collaborators shared by the page scenarios.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use htmc_core::{FetchError, NodeId, ScriptError};
use htmc_runtime::{FetchResponse, Page, PageConfig, Script, ViewportObserver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportCall {
    Create,
    Observe(NodeId),
    Unobserve(NodeId),
    Disconnect,
}

/// Shared logs of everything the page asked its collaborators to do.
#[derive(Default, Clone)]
pub struct Recorder {
    pub files: Rc<RefCell<HashMap<String, String>>>,
    pub requests: Rc<RefCell<Vec<String>>>,
    pub scripts: Rc<RefCell<Vec<Script>>>,
    pub viewport: Rc<RefCell<Vec<ViewportCall>>>,
}

struct RecordingObserver(Rc<RefCell<Vec<ViewportCall>>>);

impl ViewportObserver for RecordingObserver {
    fn observe(&mut self, target: NodeId) {
        self.0.borrow_mut().push(ViewportCall::Observe(target));
    }

    fn unobserve(&mut self, target: NodeId) {
        self.0.borrow_mut().push(ViewportCall::Unobserve(target));
    }

    fn disconnect(&mut self) {
        self.0.borrow_mut().push(ViewportCall::Disconnect);
    }
}

impl Recorder {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn serve(&self, url: &str, body: &str) -> &Self {
        self.files
            .borrow_mut()
            .insert(url.to_string(), body.to_string());
        self
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| *r == url).count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn observers_created(&self) -> usize {
        self.viewport
            .borrow()
            .iter()
            .filter(|c| **c == ViewportCall::Create)
            .count()
    }

    pub fn page(&self) -> Page {
        self.page_with(PageConfig::new())
    }

    /// A page wired to this recorder. Unknown urls answer 404; scripts whose
    /// text contains `fail` report an error.
    pub fn page_with(&self, config: PageConfig) -> Page {
        let files = Rc::clone(&self.files);
        let requests = Rc::clone(&self.requests);
        let scripts = Rc::clone(&self.scripts);
        let viewport = Rc::clone(&self.viewport);

        Page::new(config)
            .expect("default host tags are valid")
            .with_fetcher(move |url: &str| -> Result<FetchResponse, FetchError> {
                requests.borrow_mut().push(url.to_string());
                match files.borrow().get(url) {
                    Some(body) => Ok(FetchResponse::ok(body.as_str())),
                    None => Ok(FetchResponse::with_status(404)),
                }
            })
            .with_script_runner(move |script: &Script| -> Result<(), ScriptError> {
                scripts.borrow_mut().push(script.clone());
                if script.text.contains("fail") {
                    Err(ScriptError::new(script.src.as_deref(), "script failed"))
                } else {
                    Ok(())
                }
            })
            .with_observer_factory(move || -> Box<dyn ViewportObserver> {
                viewport.borrow_mut().push(ViewportCall::Create);
                Box::new(RecordingObserver(Rc::clone(&viewport)))
            })
    }
}

/// Flattened text of the first `tag` element, trimmed.
pub fn text_of(page: &Page, tag: &str) -> String {
    let node = page
        .find(tag)
        .unwrap_or_else(|| panic!("no <{tag}> in the page"));
    page.dom().rendered_text(node).trim().to_string()
}
