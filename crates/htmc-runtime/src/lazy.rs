//! Reference-counted viewport watcher for lazy imports.
//!
//! One [`ViewportObserver`] serves every lazy import on a page. It is created
//! when the first owner subscribes and disconnected when the last owner's
//! interest ends, either because its targets intersected or because the owner
//! released them. Releasing one owner never affects another owner's targets.

use htmc_core::NodeId;
use indexmap::IndexMap;
use log::debug;

use crate::host::{ObserverFactory, ViewportObserver};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Subscription {
    owner: NodeId,
    src: String,
}

/// Shared lazy-import watcher.
#[derive(Default)]
pub struct LazyWatcher {
    observer: Option<Box<dyn ViewportObserver>>,
    targets: IndexMap<NodeId, Vec<Subscription>>,
    owners: IndexMap<NodeId, usize>,
}

impl std::fmt::Debug for LazyWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyWatcher")
            .field("active", &self.is_active())
            .field("targets", &self.targets)
            .field("owners", &self.owners)
            .finish()
    }
}

impl LazyWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import `src` when `target` first intersects, on behalf of `owner`.
    pub fn subscribe(
        &mut self,
        factory: &mut dyn ObserverFactory,
        owner: NodeId,
        target: NodeId,
        src: &str,
    ) {
        let observer = self.observer.get_or_insert_with(|| {
            debug!("Creating lazy import watcher");
            factory.create()
        });

        let subscriptions = self.targets.entry(target).or_default();
        if subscriptions.is_empty() {
            observer.observe(target);
        }
        subscriptions.push(Subscription {
            owner,
            src: src.to_string(),
        });
        *self.owners.entry(owner).or_insert(0) += 1;
    }

    /// Handle `target` becoming visible. Returns the sources to import, once.
    pub fn intersect(&mut self, target: NodeId) -> Vec<String> {
        let Some(subscriptions) = self.targets.shift_remove(&target) else {
            return Vec::new();
        };
        if let Some(observer) = self.observer.as_mut() {
            observer.unobserve(target);
        }

        let mut sources: Vec<String> = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            self.forget(subscription.owner);
            if !sources.contains(&subscription.src) {
                sources.push(subscription.src);
            }
        }
        self.teardown_if_unused();
        sources
    }

    /// Drop every pending subscription made by `owner`.
    pub fn release(&mut self, owner: NodeId) {
        if !self.owners.contains_key(&owner) {
            return;
        }

        let mut emptied = Vec::new();
        for (&target, subscriptions) in self.targets.iter_mut() {
            subscriptions.retain(|s| s.owner != owner);
            if subscriptions.is_empty() {
                emptied.push(target);
            }
        }
        for target in emptied {
            self.targets.shift_remove(&target);
            if let Some(observer) = self.observer.as_mut() {
                observer.unobserve(target);
            }
        }

        self.owners.shift_remove(&owner);
        self.teardown_if_unused();
    }

    /// Whether an observer currently exists.
    pub fn is_active(&self) -> bool {
        self.observer.is_some()
    }

    /// Number of owners with pending subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.owners.len()
    }

    pub fn is_watching(&self, target: NodeId) -> bool {
        self.targets.contains_key(&target)
    }

    fn forget(&mut self, owner: NodeId) {
        if let Some(pending) = self.owners.get_mut(&owner) {
            *pending = pending.saturating_sub(1);
            if *pending == 0 {
                self.owners.shift_remove(&owner);
            }
        }
    }

    fn teardown_if_unused(&mut self) {
        if !self.owners.is_empty() {
            return;
        }
        if let Some(mut observer) = self.observer.take() {
            debug!("Disconnecting lazy import watcher");
            observer.disconnect();
        }
    }
}
