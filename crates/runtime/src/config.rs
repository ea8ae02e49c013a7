//! Evaluator configuration
//!
//! Hosts tune the evaluator through `EvalConfig`: builder methods for
//! embedding, or a TOML document for file-driven setups.
//!
//! # Example
//!
//! ```rust
//! use lith_runtime::EvalConfig;
//!
//! let config = EvalConfig::new()
//!     .with_poll_period(8)
//!     .with_recursion_limit(256)
//!     .with_trace(true);
//! assert_eq!(config.poll_period, 8);
//! ```

use lith_core::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    /// Expressions evaluated between signal polls.
    pub poll_period: u32,

    /// Nested evaluation depth before the stack-overflow guard trips.
    pub recursion_limit: usize,

    /// Emit the per-expression trace through the `tracing` crate.
    pub trace: bool,

    /// Legacy mode: arguments of an unused refinement read as NONE rather
    /// than unset.
    pub legacy_refinement_none: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            poll_period: 32,
            recursion_limit: 512,
            trace: false,
            legacy_refinement_none: false,
        }
    }
}

impl EvalConfig {
    pub fn new() -> EvalConfig {
        EvalConfig::default()
    }

    pub fn with_poll_period(mut self, period: u32) -> EvalConfig {
        self.poll_period = period;
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> EvalConfig {
        self.recursion_limit = limit;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> EvalConfig {
        self.trace = trace;
        self
    }

    pub fn with_legacy_refinement_none(mut self, legacy: bool) -> EvalConfig {
        self.legacy_refinement_none = legacy;
        self
    }

    /// Parse a TOML document. Unknown keys are rejected so typos in host
    /// config files surface immediately.
    pub fn from_toml_str(text: &str) -> Result<EvalConfig, Error> {
        toml::from_str(text).map_err(|e| Error::misc(format!("bad evaluator config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EvalConfig::default();
        assert_eq!(c.poll_period, 32);
        assert!(!c.trace);
        assert!(!c.legacy_refinement_none);
    }

    #[test]
    fn test_builder_chain() {
        let c = EvalConfig::new()
            .with_poll_period(4)
            .with_recursion_limit(99)
            .with_legacy_refinement_none(true);
        assert_eq!(c.poll_period, 4);
        assert_eq!(c.recursion_limit, 99);
        assert!(c.legacy_refinement_none);
    }

    #[test]
    fn test_from_toml() {
        let c = EvalConfig::from_toml_str("poll_period = 7\ntrace = true\n").unwrap();
        assert_eq!(c.poll_period, 7);
        assert!(c.trace);
        // Unspecified fields keep their defaults.
        assert_eq!(c.recursion_limit, 512);
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        assert!(EvalConfig::from_toml_str("poll_period = \"lots\"").is_err());
    }
}
