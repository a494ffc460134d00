//! Versioned binary cache codec, replacing the source system's pickled
//! cache blob with version tag `"1.0"` per the redesign flag in §9: a
//! magic-prefixed, version-tagged binary encoding that rebuilds on any
//! mismatch rather than trusting an untyped blob.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

const MAGIC: &[u8; 4] = b"HFC1";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file too short to contain a header")]
    Truncated,
    #[error("bad magic bytes, not a hippoforge cache file")]
    BadMagic,
    #[error("cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("encode error: {0}")]
    Encode(#[from] bincode::Error),
}

/// Encodes `value` as `MAGIC || version:u32_le || bincode(value)`.
pub fn encode<T: Serialize>(value: &T, version: u32) -> Result<Vec<u8>, CacheError> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&version.to_le_bytes());
    let body = bincode::serialize(value)?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decodes a blob written by [`encode`], rejecting it (so the caller
/// rebuilds) unless the embedded version exactly matches `expected_version`.
pub fn decode<T: DeserializeOwned>(
    bytes: &[u8],
    expected_version: u32,
) -> Result<T, CacheError> {
    if bytes.len() < 8 {
        return Err(CacheError::Truncated);
    }
    if &bytes[0..4] != MAGIC {
        return Err(CacheError::BadMagic);
    }
    let found_version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if found_version != expected_version {
        return Err(CacheError::VersionMismatch {
            expected: expected_version,
            found: found_version,
        });
    }
    Ok(bincode::deserialize(&bytes[8..])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        nodes: Vec<String>,
    }

    #[test]
    fn round_trips_at_matching_version() {
        let value = Sample {
            nodes: vec!["a.py::alpha".to_string()],
        };
        let blob = encode(&value, 1).unwrap();
        let decoded: Sample = decode(&blob, 1).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn version_mismatch_forces_rebuild() {
        let value = Sample { nodes: vec![] };
        let blob = encode(&value, 1).unwrap();
        let result: Result<Sample, _> = decode(&blob, 2);
        assert!(matches!(result, Err(CacheError::VersionMismatch { .. })));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let result: Result<Sample, _> = decode(b"not-a-cache-file", 1);
        assert!(matches!(result, Err(CacheError::BadMagic)));
    }
}
