//! Engine configuration.

/// Default maximum number of hops in a relationship path.
pub const DEFAULT_MAX_PATH_DEPTH: usize = 8;

/// Aggregate engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Skip the execution adapter for plans known to match nothing.
    pub short_circuit_denied: bool,

    /// Cache structural path resolution.
    pub path_cache: bool,

    /// Maximum number of hops in a relationship path.
    pub max_path_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            short_circuit_denied: true,
            path_cache: true,
            max_path_depth: DEFAULT_MAX_PATH_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always execute plans, even when statically empty.
    pub fn without_short_circuit(mut self) -> Self {
        self.short_circuit_denied = false;
        self
    }

    /// Disable the path cache.
    pub fn without_path_cache(mut self) -> Self {
        self.path_cache = false;
        self
    }

    /// Set the maximum path depth.
    pub fn with_max_path_depth(mut self, depth: usize) -> Self {
        self.max_path_depth = depth.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new();
        assert!(config.short_circuit_denied);
        assert!(config.path_cache);
        assert_eq!(config.max_path_depth, DEFAULT_MAX_PATH_DEPTH);

        let config = EngineConfig::new()
            .without_short_circuit()
            .without_path_cache()
            .with_max_path_depth(0);
        assert!(!config.short_circuit_denied);
        assert!(!config.path_cache);
        assert_eq!(config.max_path_depth, 1);
    }
}
