//! Bridge configuration.

/// Options for a [`Bridge`](crate::Bridge).
///
/// ```
/// use enginebridge::BridgeConfig;
///
/// let config = BridgeConfig::new()
///     .with_trace_calls(true)
///     .with_strict_overrides(true);
/// assert!(config.trace_calls);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Log every native call at `trace` level.
    pub trace_calls: bool,
    /// Reject script classes that list overrides their base does not have,
    /// instead of logging a warning.
    pub strict_overrides: bool,
    /// Initial capacity of the method handle cache.
    pub cache_capacity: usize,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self {
            trace_calls: false,
            strict_overrides: false,
            cache_capacity: 256,
        }
    }

    pub fn with_trace_calls(mut self, enabled: bool) -> Self {
        self.trace_calls = enabled;
        self
    }

    pub fn with_strict_overrides(mut self, enabled: bool) -> Self {
        self.strict_overrides = enabled;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}
