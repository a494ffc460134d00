use chrono::{DateTime, Duration, Utc};

/// A lock row as persisted by the SQL backend: `locked_by` and
/// `lock_expires_at` on `session_state`. Five-minute TTL per §3/§4.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLock {
    pub locked_by: String,
    pub expires_at: DateTime<Utc>,
}

pub const LOCK_TTL_MINUTES: i64 = 5;

impl SessionLock {
    pub fn claim(agent: impl Into<String>) -> Self {
        Self {
            locked_by: agent.into(),
            expires_at: Utc::now() + Duration::minutes(LOCK_TTL_MINUTES),
        }
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn held_by(&self, agent: &str, now: DateTime<Utc>) -> bool {
        self.locked_by == agent && !self.is_stale(now)
    }
}

/// RAII-ish marker returned by `BlackboardStore::save`'s lock claim so
/// callers can see which agent currently holds the session, without
/// forcing an async `Drop`-based release (releasing is explicit via
/// `release_lock`, matching the contract's `releaseLock` method).
#[derive(Debug, Clone)]
pub struct LockGuard {
    pub session_id: String,
    pub lock: SessionLock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_lock_is_not_stale() {
        let lock = SessionLock::claim("agent-1");
        assert!(!lock.is_stale(Utc::now()));
        assert!(lock.held_by("agent-1", Utc::now()));
    }

    #[test]
    fn lock_expires_after_ttl() {
        let lock = SessionLock::claim("agent-1");
        let future = Utc::now() + Duration::minutes(LOCK_TTL_MINUTES + 1);
        assert!(lock.is_stale(future));
        assert!(!lock.held_by("agent-1", future));
    }
}
