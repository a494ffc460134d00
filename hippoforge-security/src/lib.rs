//! Install identity hashing and HMAC-chained provenance signatures.
//! A supplement over the source system, whose provenance records carried
//! an unauthenticated placeholder signature field; here the field is a
//! real running HMAC over the chain so tampering with an entry in place
//! is detectable on reload.

mod install_id;
mod provenance_chain;

pub use install_id::InstallId;
pub use provenance_chain::SignedProvenanceChain;
