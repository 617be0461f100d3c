//! Per-dependency breaker registry.
//!
//! Each protected dependency gets exactly one breaker, keyed by name.
//! Sharing a breaker across dependencies with different failure semantics
//! is the bug this type exists to prevent.

use std::sync::Arc;

use dashmap::DashMap;

use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};

/// Registry of named circuit breakers, all sharing one tuning profile.
pub struct BreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Get the breaker for a dependency, creating it on first use.
    pub fn get_or_create(&self, dependency: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(dependency.to_string())
            .or_insert_with(|| CircuitBreaker::new(dependency, self.config.clone()))
            .clone()
    }

    /// Get an existing breaker without creating one.
    pub fn get(&self, dependency: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(dependency).map(|entry| entry.clone())
    }

    /// Names of all registered dependencies.
    pub fn dependencies(&self) -> Vec<String> {
        self.breakers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Tear down every breaker, cancelling pending timers.
    pub fn destroy_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().destroy();
        }
        self.breakers.clear();
    }
}
