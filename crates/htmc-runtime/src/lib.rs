//! Page host for HTMC documents.
//!
//! This crate ties the other htmc crates into a running document:
//! - [`Page`]: the DOM plus custom element reactions
//! - `<htmc-define>` hosts that run scripts and compile components
//! - `<htmc-attach>` hosts that import remote fragments immediately, on load, or when visible
//! - The collaborator traits an embedder implements for network, scripts, and viewport
//!
//! # Example
//!
//! ```
//! use htmc_runtime::{Page, PageConfig};
//!
//! let mut page = Page::new(PageConfig::new()).unwrap();
//! page.load_html(r#"
//!     <htmc-define>
//!         <component name="greet-box" reactive-attributes="who"><p>Hello, ${who}!</p></component>
//!     </htmc-define>
//!     <greet-box who="Ada"></greet-box>
//! "#);
//!
//! let greeting = page.find("greet-box").unwrap();
//! assert_eq!(page.dom().rendered_text(greeting), "Hello, Ada!");
//!
//! page.set_attribute(greeting, "who", "Grace");
//! assert_eq!(page.dom().rendered_text(greeting), "Hello, Grace!");
//! ```

mod attach_host;
mod config;
mod define_host;
mod host;
mod lazy;
mod ledger;
mod page;

pub use attach_host::ImportStrategy;
pub use config::PageConfig;
pub use host::{
    DetachedViewport, FetchResponse, Fetcher, NoNetwork, ObserverFactory, Script, ScriptRunner,
    SkipScripts, ViewportObserver,
};
pub use lazy::LazyWatcher;
pub use ledger::ImportLedger;
pub use page::Page;

pub use htmc_core::{Dom, Fragment, NodeId};
