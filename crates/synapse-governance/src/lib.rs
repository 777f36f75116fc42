//! Governance kernel for Synapse.
//!
//! This crate provides:
//! - A policy engine evaluating capability and space intents
//! - An authority that signs each decision and anchors it in the audit ledger
//! - A gate that independently re-verifies decisions before enforcement
//! - A SHA-256 hash-chained, append-only audit ledger
//! - Redacted proof bundles verifiable without ledger access
//!
//! Core invariants:
//! - Every decision and every gate verdict appends exactly one ledger entry
//! - Signatures cover the canonical JSON of `{package, reason}`
//! - The gate is fail-closed: any failure or panic becomes DENY
//! - Broken chains are reported, never repaired
//!
//! ```rust
//! use std::sync::Arc;
//! use synapse_governance::{
//!     AuditLedger, CapabilityGraph, CapabilityManifest, GovernanceGate, HmacSigner, Intent,
//!     PolicyEngine, PolicyRegistry, Role, SecurityContext, SynapseAuthority, OPEN_CAPABILITY,
//! };
//!
//! let registry = Arc::new(PolicyRegistry::new());
//! registry.register("notes.app", "1.0.0", CapabilityManifest::default())?;
//! let graph = CapabilityGraph::from_registry(&registry);
//! let ledger = Arc::new(AuditLedger::new(Arc::new(HmacSigner::from_seed("demo")?))?);
//!
//! let authority = SynapseAuthority::new(PolicyEngine::new(registry, graph), ledger.clone());
//! let gate = GovernanceGate::new(ledger);
//!
//! let intent = Intent::new(OPEN_CAPABILITY, "notes.app");
//! let record = authority.request_decision(
//!     intent.clone(),
//!     SecurityContext::authenticated("user:alice", Role::User),
//! )?;
//! let verdict = gate.enforce(&record, &intent);
//! assert_eq!(verdict.reason, "PASSED_INTEGRITY_CHECKS");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![deny(missing_docs)]

/// Decision issuance.
pub mod authority;
/// Time sources.
pub mod clock;
/// Configuration files.
pub mod config;
/// Caller security context.
pub mod context;
/// Decision packages and records.
pub mod decision;
/// Policy evaluation.
pub mod engine;
/// Error types.
pub mod errors;
/// Enforcement gate.
pub mod gate;
/// Capability graph.
pub mod graph;
/// Governance health.
pub mod health;
/// Audit ledger.
pub mod ledger;
/// Capability manifests and space policies.
pub mod manifest;
/// Proof bundles.
pub mod proof;
/// Versioned capability registry.
pub mod registry;
/// Signers and verifiers.
pub mod signer;

pub use authority::SynapseAuthority;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CapabilityConfig, Governance, GovernanceConfig, SignerConfig, SignerKind};
pub use context::{Role, SecurityContext};
pub use decision::{
    signing_payload, AuditTrail, Decision, DecisionPackage, DecisionRecord, Intent,
    PolicyIdentity, ReasonCore, FOCUS_WINDOW, MOVE_WINDOW, OPEN_CAPABILITY, OPEN_WINDOW,
    SCHEMA_VERSION, SWITCH_SPACE, SYSTEM_CONFIGURE, SYSTEM_TARGET,
};
pub use engine::{Evaluation, PolicyEngine, UnclassifiedPolicy};
pub use errors::{ConfigError, GovernanceError, LedgerError, RegistryError, SignerError};
pub use gate::{GateStatus, GateVerdict, GovernanceGate, PASSED_INTEGRITY_CHECKS};
pub use graph::CapabilityGraph;
pub use health::{check_governance, ChainSource, GovernanceHealth, HealthStatus, KernelFreeze};
pub use ledger::{
    load_ledger, read_journal, verify_entries, AuditLedger, AuditLedgerBuilder,
    ChainVerification, JournalSink, LedgerEntry, LedgerEvent, LedgerSink, LedgerStatus,
    SnapshotEntry,
};
pub use manifest::{
    CapabilityManifest, CertificationTier, SpacePermission, SpacePermissions, SpacePolicy,
    SpaceRegistry, WindowMode, DEFAULT_SPACE_PERMISSIONS,
};
pub use proof::{
    create_proof_bundle, intent_hash, verify_proof_bundle, verify_proof_bundle_json,
    verify_proof_bundle_signature, ProofBundle, ProofVerification,
};
pub use registry::{PolicyRegistry, RegisteredManifest, RegistrationOutcome};
pub use signer::{Ed25519Signer, Ed25519Verifier, HmacSigner, SignatureVerifier, Signer};
