//! Canonical data model primitives for Synapse governance artifacts.
//!
//! Every byte string that is hashed or signed by the governance kernel passes
//! through this crate: decision payloads, ledger entry data, proof bundle
//! claims and raw intents. Keeping canonicalization in one place is what lets
//! an independent verifier re-serialize a record and reach the same bytes the
//! issuer signed.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic hashing and signing.
pub mod canonicalizer;
/// SHA-256 hex digests and the genesis sentinel.
pub mod digest;
/// Identifier newtypes and timestamps.
pub mod identifiers;
/// Validation helpers used by canonical types.
pub mod validation;

pub use canonicalizer::{to_canonical_bytes, to_canonical_string, CanonicalizationError, Canonicalizer};
pub use digest::{is_sha256_hex, sha256_hex, Sha256Hex, GENESIS_HASH};
pub use identifiers::{ActorId, CapabilityId, SpaceId, Timestamp};
pub use validation::ValidationError;
