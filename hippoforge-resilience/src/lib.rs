//! Resilience primitives: a generic failure-counting circuit breaker for
//! wrapping external calls (LLM, subprocess, SQL), plus the
//! performance-index-driven status used by C2's `toolStatus` and C8's
//! circuit-breaker gating, which are threshold lookups rather than
//! stateful breakers.

mod circuit_breaker;
mod pi_status;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerOpenError, CircuitBreakerStats,
    CircuitState,
};
pub use pi_status::{tool_status, CircuitStatus, PI_CRITICAL_THRESHOLD, PI_WARNING_THRESHOLD};
