//! Threshold lookups shared by the telemetry ledger's `toolStatus` (§4.2)
//! and the self-healing monitor's role/tool gating (§4.8). These are
//! stateless functions over a success rate or performance index, not a
//! stateful breaker like [`super::CircuitBreaker`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    Ready,
    Warning,
    Tripped,
}

/// Below this, a tool/role is TRIPPED (§4.2, §4.8).
pub const PI_CRITICAL_THRESHOLD: f64 = 0.3;
/// Below this (and at/above critical), a tool/role is WARNING.
pub const PI_WARNING_THRESHOLD: f64 = 0.7;

/// `toolStatus(tool)` from §4.2: READY | WARNING | TRIPPED at 0.7 / 0.3.
pub fn tool_status(success_rate: f64) -> CircuitStatus {
    if success_rate < PI_CRITICAL_THRESHOLD {
        CircuitStatus::Tripped
    } else if success_rate < PI_WARNING_THRESHOLD {
        CircuitStatus::Warning
    } else {
        CircuitStatus::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_match_spec_boundaries() {
        assert_eq!(tool_status(0.9), CircuitStatus::Ready);
        assert_eq!(tool_status(0.7), CircuitStatus::Ready);
        assert_eq!(tool_status(0.69), CircuitStatus::Warning);
        assert_eq!(tool_status(0.3), CircuitStatus::Warning);
        assert_eq!(tool_status(0.29), CircuitStatus::Tripped);
    }
}
