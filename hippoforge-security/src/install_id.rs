use std::path::Path;

use rand::RngCore;
use sha2::{Digest, Sha256};

/// A stable, anonymized identifier attached to every telemetry event
/// (`install_id`, §3). Derived once from a locally persisted random seed
/// and cached thereafter; `SWARM_INSTALL_ID` overrides it for
/// reproducible telemetry in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallId(String);

impl InstallId {
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolves the install id: the `SWARM_INSTALL_ID` override if set,
    /// else a hash of the seed file at `seed_path`, creating the seed if
    /// it does not exist.
    pub fn resolve(seed_path: &Path) -> anyhow::Result<Self> {
        if let Ok(explicit) = std::env::var("SWARM_INSTALL_ID") {
            return Ok(Self(explicit));
        }

        let seed = if seed_path.exists() {
            std::fs::read(seed_path)?
        } else {
            let mut bytes = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut bytes);
            if let Some(parent) = seed_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(seed_path, bytes)?;
            bytes.to_vec()
        };

        let mut hasher = Sha256::new();
        hasher.update(&seed);
        let digest = hasher.finalize();
        Ok(Self(hex_encode(&digest)))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_override_wins() {
        std::env::set_var("SWARM_INSTALL_ID", "fixed-id-for-tests");
        let dir = std::env::temp_dir().join("hippoforge-install-id-test");
        let id = InstallId::resolve(&dir.join("seed")).unwrap();
        assert_eq!(id.as_str(), "fixed-id-for-tests");
        std::env::remove_var("SWARM_INSTALL_ID");
    }
}
