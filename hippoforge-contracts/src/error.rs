use thiserror::Error;

/// The six-class error taxonomy from the kernel's error handling design.
///
/// Only `ContractViolation`, `LockContention`, and unhandled state-load
/// failures are expected to propagate out of a component's public contract
/// method; the other variants are recorded (telemetry, ExitReport warnings)
/// and swallowed at the boundary that produced them.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("transient external failure on attempt {attempt}: {source}")]
    TransientExternal {
        #[source]
        source: anyhow::Error,
        attempt: u32,
    },

    #[error("schema mismatch: expected version {expected}, found {found}")]
    SchemaMismatch { expected: u32, found: u32 },

    #[error("contract violation: {message}")]
    ContractViolation { message: String },

    #[error("{operation} timed out after {elapsed_ms}ms")]
    ResourceTimeout { operation: String, elapsed_ms: u64 },

    #[error("lock contention on session {session_id} after waiting {waited_ms}ms")]
    LockContention { session_id: String, waited_ms: u64 },

    #[error("integrity alert on task {task_id}: {reason}")]
    IntegrityAlert { task_id: String, reason: String },
}

impl OrchestratorError {
    pub fn contract(message: impl Into<String>) -> Self {
        Self::ContractViolation {
            message: message.into(),
        }
    }

    pub fn lock_contention(session_id: impl Into<String>, waited_ms: u64) -> Self {
        Self::LockContention {
            session_id: session_id.into(),
            waited_ms,
        }
    }

    pub fn integrity_alert(task_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IntegrityAlert {
            task_id: task_id.into(),
            reason: reason.into(),
        }
    }

    /// True for the handful of classes that are allowed to propagate to a
    /// contract caller rather than being degraded at the component boundary.
    pub fn is_propagating(&self) -> bool {
        matches!(
            self,
            Self::ContractViolation { .. } | Self::LockContention { .. }
        )
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_contract_and_lock_errors_propagate() {
        assert!(OrchestratorError::contract("bad phase").is_propagating());
        assert!(OrchestratorError::lock_contention("s1", 6000).is_propagating());
        assert!(!OrchestratorError::SchemaMismatch {
            expected: 2,
            found: 1
        }
        .is_propagating());
        assert!(!OrchestratorError::integrity_alert("t1", "uncommitted").is_propagating());
    }
}
