use hmac::{Hmac, Mac};
use sha2::Sha256;

use hippoforge_contracts::AuthorSignature;

type HmacSha256 = Hmac<Sha256>;

/// Threads a running HMAC over each appended `AuthorSignature` so the
/// provenance log can detect out-of-band tampering. The chain key is the
/// session's signing secret; each signature covers the previous entry's
/// digest plus this entry's canonical fields, so altering any one entry
/// invalidates every signature after it.
pub struct SignedProvenanceChain {
    key: Vec<u8>,
    last_digest: Vec<u8>,
}

impl SignedProvenanceChain {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            last_digest: Vec::new(),
        }
    }

    /// Signs `entry` in place, chaining from the previous digest, and
    /// returns the digest to verify the next entry against.
    pub fn sign(&mut self, entry: &mut AuthorSignature) -> anyhow::Result<()> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| anyhow::anyhow!("invalid hmac key length: {e}"))?;
        mac.update(&self.last_digest);
        mac.update(entry.agent_id.as_bytes());
        mac.update(entry.action.as_bytes());
        mac.update(entry.timestamp.to_rfc3339().as_bytes());

        let digest = mac.finalize().into_bytes();
        entry.signature = Some(hex_encode(&digest));
        self.last_digest = digest.to_vec();
        Ok(())
    }

    /// Verifies a full chain of already-signed entries from the start,
    /// returning the index of the first entry whose signature no longer
    /// matches, if any.
    pub fn verify_chain(key: &[u8], entries: &[AuthorSignature]) -> Option<usize> {
        let mut chain = SignedProvenanceChain::new(key.to_vec());
        for (idx, entry) in entries.iter().enumerate() {
            let mut candidate = entry.clone();
            candidate.signature = None;
            if chain.sign(&mut candidate).is_err() {
                return Some(idx);
            }
            if candidate.signature != entry.signature {
                return Some(idx);
            }
        }
        None
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
