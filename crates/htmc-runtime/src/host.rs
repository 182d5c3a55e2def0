//! Collaborators provided by the embedder.
//!
//! The page never performs I/O or runs scripts itself. It calls out through
//! these traits, and the embedder reports asynchronous outcomes (page load,
//! viewport intersection, external script load) back through [`Page`](crate::Page)
//! methods.

use htmc_core::{FetchError, NodeId, ScriptError};
use indexmap::IndexMap;

/// Response of a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    /// A `200` response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// An empty response with the given status.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network transport used to import remote fragments.
pub trait Fetcher {
    /// Fetch `url` and return its status and body text.
    fn fetch(&mut self, url: &str) -> Result<FetchResponse, FetchError>;
}

impl<F> Fetcher for F
where
    F: FnMut(&str) -> Result<FetchResponse, FetchError>,
{
    fn fetch(&mut self, url: &str) -> Result<FetchResponse, FetchError> {
        self(url)
    }
}

/// A freshly inserted script element handed to the [`ScriptRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// The replacement script node now in the document.
    pub node: NodeId,
    /// External source, if any. The page waits for
    /// [`Page::dispatch_script_load`](crate::Page::dispatch_script_load) on `node` before continuing.
    pub src: Option<String>,
    /// Inline text.
    pub text: String,
    /// All attributes, in document order.
    pub attributes: IndexMap<String, String>,
}

/// Executes scripts found in definition hosts.
pub trait ScriptRunner {
    fn execute(&mut self, script: &Script) -> Result<(), ScriptError>;
}

impl<F> ScriptRunner for F
where
    F: FnMut(&Script) -> Result<(), ScriptError>,
{
    fn execute(&mut self, script: &Script) -> Result<(), ScriptError> {
        self(script)
    }
}

/// A viewport intersection watcher. Intersections are reported back through
/// [`Page::notify_intersection`](crate::Page::notify_intersection).
pub trait ViewportObserver {
    fn observe(&mut self, target: NodeId);
    fn unobserve(&mut self, target: NodeId);
    /// Stop watching every target.
    fn disconnect(&mut self);
}

/// Creates the page's viewport observer when the first lazy import subscribes.
pub trait ObserverFactory {
    fn create(&mut self) -> Box<dyn ViewportObserver>;
}

impl<F> ObserverFactory for F
where
    F: FnMut() -> Box<dyn ViewportObserver>,
{
    fn create(&mut self) -> Box<dyn ViewportObserver> {
        self()
    }
}

/// Fetcher used when the embedder provides none. Every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNetwork;

impl Fetcher for NoNetwork {
    fn fetch(&mut self, url: &str) -> Result<FetchResponse, FetchError> {
        Err(FetchError::new(format!("no network available to fetch {url}")))
    }
}

/// Script runner used when the embedder provides none. Scripts are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipScripts;

impl ScriptRunner for SkipScripts {
    fn execute(&mut self, _script: &Script) -> Result<(), ScriptError> {
        Ok(())
    }
}

/// Observer used when the embedder provides none. Nothing ever intersects
/// unless reported by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedViewport;

impl ViewportObserver for DetachedViewport {
    fn observe(&mut self, _target: NodeId) {}
    fn unobserve(&mut self, _target: NodeId) {}
    fn disconnect(&mut self) {}
}

impl ObserverFactory for DetachedViewport {
    fn create(&mut self) -> Box<dyn ViewportObserver> {
        Box::new(DetachedViewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses() {
        assert!(FetchResponse::ok("").is_success());
        assert!(FetchResponse::with_status(204).is_success());
        assert!(!FetchResponse::with_status(199).is_success());
        assert!(!FetchResponse::with_status(304).is_success());
        assert!(!FetchResponse::with_status(404).is_success());
    }

    #[test]
    fn test_closure_fetcher() {
        let mut requests = Vec::new();
        let mut fetcher = |url: &str| -> Result<FetchResponse, FetchError> {
            requests.push(url.to_string());
            Ok(FetchResponse::ok("<p>hi</p>"))
        };

        let response = Fetcher::fetch(&mut fetcher, "/parts.html").unwrap();
        assert_eq!(response.body, "<p>hi</p>");
        drop(fetcher);
        assert_eq!(requests, vec!["/parts.html"]);
    }

    #[test]
    fn test_no_network() {
        let error = NoNetwork.fetch("/a.html").unwrap_err();
        assert!(error.message.contains("/a.html"));
    }
}
