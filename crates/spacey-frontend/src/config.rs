//! Front end configuration.

/// Options controlling parsing, validation and lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendConfig {
    /// Treat every program as strict mode code
    pub strict: bool,
    /// Defer lowering of eligible function bodies
    pub lazy: bool,
    /// Minimum body size in bytes for a body to be deferred
    pub lazy_threshold: usize,
    /// Diagnostics beyond this many errors are counted but not stored
    pub max_errors: usize,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            strict: false,
            lazy: false,
            lazy_threshold: 64,
            max_errors: 20,
        }
    }
}

impl FrontendConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets strict mode for every program.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enables or disables lazy function bodies.
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Sets the minimum size of a deferred body.
    pub fn with_lazy_threshold(mut self, bytes: usize) -> Self {
        self.lazy_threshold = bytes;
        self
    }

    /// Sets how many errors are stored.
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Returns the lazy threshold if laziness is enabled.
    pub fn lazy_threshold(&self) -> Option<usize> {
        self.lazy.then_some(self.lazy_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FrontendConfig::default();
        assert!(!config.strict);
        assert_eq!(config.lazy_threshold(), None);
        assert_eq!(config.max_errors, 20);
    }

    #[test]
    fn test_builders() {
        let config = FrontendConfig::new().with_lazy(true).with_lazy_threshold(0);
        assert_eq!(config.lazy_threshold(), Some(0));
    }
}
