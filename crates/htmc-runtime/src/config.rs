//! Page configuration.

/// Options for a [`Page`](crate::Page).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageConfig {
    /// Tag of the definition host element.
    pub define_tag: String,
    /// Tag of the attach (import) host element.
    pub attach_tag: String,
    /// Attribute set on a definition host once it has processed its subtree.
    pub defined_marker: String,
    /// Run deferred imports immediately when they are registered after the
    /// load event. When false they wait for a load event that never comes.
    pub defer_after_load: bool,
    /// Maximum depth of components rendered inside other components.
    pub max_nesting_depth: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            define_tag: "htmc-define".to_string(),
            attach_tag: "htmc-attach".to_string(),
            defined_marker: "components-defined".to_string(),
            defer_after_load: true,
            max_nesting_depth: 64,
        }
    }
}

impl PageConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different definition host tag.
    pub fn with_define_tag(mut self, tag: impl Into<String>) -> Self {
        self.define_tag = tag.into();
        self
    }

    /// Use a different attach host tag.
    pub fn with_attach_tag(mut self, tag: impl Into<String>) -> Self {
        self.attach_tag = tag.into();
        self
    }

    /// Use a different idempotency marker attribute.
    pub fn with_defined_marker(mut self, attribute: impl Into<String>) -> Self {
        self.defined_marker = attribute.into();
        self
    }

    /// Keep deferred imports registered after the load event waiting.
    pub fn strict_load_event(mut self) -> Self {
        self.defer_after_load = false;
        self
    }

    /// Set the maximum component nesting depth.
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth.max(1);
        self
    }
}
