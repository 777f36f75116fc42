use synapse_canonical::{CanonicalizationError, ValidationError};
use synapse_journal::JournalError;
use thiserror::Error;

/// Top-level error for authority and configuration operations.
///
/// The gate never returns this type: every gate failure becomes a DENY verdict.
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Payload could not be canonicalized for hashing or signing.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    /// Ledger operation failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    /// Registry operation failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    /// Configuration could not be loaded or applied.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Signer could not be constructed.
    #[error("signer error: {0}")]
    Signer(#[from] SignerError),
    /// Identifier or timestamp validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    /// A record could not be converted to JSON.
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    /// A decision record was not issued by this authority or is not in its ledger.
    #[error("decision record rejected: {0}")]
    UnrecordedDecision(&'static str),
}

/// Errors raised by the audit ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Entry data could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    /// Persisting or loading entries failed.
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
    /// A writer panicked while holding the chain lock.
    #[error("ledger lock poisoned")]
    Poisoned,
}

/// Errors raised by the policy registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Version string is not valid semver.
    #[error("capability {id}: invalid version '{version}': {source}")]
    InvalidVersion {
        /// Capability id.
        id: String,
        /// Offending version string.
        version: String,
        /// Parser error.
        source: semver::Error,
    },
    /// The (id, version) pair already holds a different manifest.
    #[error("capability {id}@{version} is already registered with a different manifest")]
    VersionConflict {
        /// Capability id.
        id: String,
        /// Conflicting version.
        version: String,
    },
    /// Manifest could not be hashed.
    #[error("manifest canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    /// A writer panicked while holding the registry lock.
    #[error("registry lock poisoned")]
    Poisoned,
}

/// Errors raised while constructing a signer.
#[derive(Error, Debug)]
pub enum SignerError {
    /// Seeds must not be empty.
    #[error("signer seed must not be empty")]
    EmptySeed,
    /// Key material was rejected by the MAC or signature implementation.
    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

/// Errors raised while loading configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// File is not valid JSON for the expected shape.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path that failed.
        path: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },
    /// No signer seed was configured.
    #[error("no signer seed configured (set signer.seed or SYNAPSE_SIGNER_SEED)")]
    MissingSeed,
}
