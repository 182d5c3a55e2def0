//! Record of imported fragment sources.

use indexmap::IndexSet;

/// Sources already fetched by this page. Grows monotonically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportLedger {
    sources: IndexSet<String>,
}

impl ImportLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `src`. Returns false when it was already recorded.
    pub fn claim(&mut self, src: &str) -> bool {
        if self.sources.contains(src) {
            return false;
        }
        self.sources.insert(src.to_string())
    }

    pub fn contains(&self, src: &str) -> bool {
        self.sources.contains(src)
    }

    /// Claimed sources, in claim order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_claim_once() {
        let mut ledger = ImportLedger::new();
        assert!(ledger.claim("/parts.html"));
        assert!(!ledger.claim("/parts.html"));
        assert!(ledger.claim("/other.html"));
        assert_eq!(ledger.sources().collect::<Vec<_>>(), vec!["/parts.html", "/other.html"]);
    }

    proptest! {
        #[test]
        fn each_source_claimed_exactly_once(sources in prop::collection::vec("/[a-c]{1,2}\\.html", 0..20)) {
            let mut ledger = ImportLedger::new();
            let granted = sources.iter().filter(|s| ledger.claim(s)).count();
            let unique: std::collections::HashSet<_> = sources.iter().collect();
            prop_assert_eq!(granted, unique.len());
            prop_assert_eq!(ledger.len(), unique.len());
        }
    }
}
