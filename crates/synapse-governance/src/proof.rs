//! Redacted, externally verifiable proof of a decision.
//!
//! A bundle carries the hash of the intent rather than the intent itself,
//! and the hash of the ledger entry rather than the ledger. Anyone can run
//! [`verify_proof_bundle`]; checking the signature as well needs a verifier
//! for the authority's key.

use crate::decision::{Decision, DecisionRecord, Intent};
use crate::signer::{SignatureVerifier, Signer};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use synapse_canonical::{
    sha256_hex, to_canonical_bytes, to_canonical_string, CanonicalizationError, Sha256Hex, Timestamp,
};

/// Allowed clock skew for `issuedAt` in the future.
pub const FUTURE_TOLERANCE_SECS: i64 = 60;
/// Maximum age of a bundle.
pub const MAX_AGE_DAYS: i64 = 365;

const REQUIRED_FIELDS: [&str; 9] = [
    "decisionId",
    "policyId",
    "policyVersion",
    "intentHash",
    "decision",
    "ledgerHash",
    "signature",
    "issuedAt",
    "authorityId",
];

/// Proof that a decision was issued and recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    /// Decision id.
    pub decision_id: String,
    /// Policy id.
    pub policy_id: String,
    /// Policy version.
    pub policy_version: String,
    /// SHA-256 of the canonical intent.
    pub intent_hash: String,
    /// Outcome.
    pub decision: Decision,
    /// Hash of the ledger entry that recorded the decision.
    pub ledger_hash: String,
    /// Signature over the canonical bundle core.
    pub signature: String,
    /// Issue time.
    pub issued_at: Timestamp,
    /// Issuing authority.
    pub authority_id: String,
}

/// Outcome of a bundle verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofVerification {
    /// Whether no check failed.
    pub valid: bool,
    /// Every failed check.
    pub errors: Vec<String>,
}

impl ProofVerification {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// SHA-256 of the canonical intent.
pub fn intent_hash(intent: &Intent) -> Result<String, CanonicalizationError> {
    Ok(sha256_hex(to_canonical_bytes(intent)?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedCore<'a> {
    decision_id: &'a str,
    policy_id: &'a str,
    policy_version: &'a str,
    intent_hash: &'a str,
    decision: Decision,
    issued_at: &'a Timestamp,
}

impl ProofBundle {
    /// Canonical JSON of the signed fields.
    pub fn signing_payload(&self) -> Result<String, CanonicalizationError> {
        to_canonical_string(&SignedCore {
            decision_id: &self.decision_id,
            policy_id: &self.policy_id,
            policy_version: &self.policy_version,
            intent_hash: &self.intent_hash,
            decision: self.decision,
            issued_at: &self.issued_at,
        })
    }
}

/// Issues a bundle for `record`.
pub fn create_proof_bundle<S: Signer + ?Sized>(
    record: &DecisionRecord,
    signer: &S,
    authority_id: &str,
    issued_at: DateTime<Utc>,
) -> Result<ProofBundle, CanonicalizationError> {
    let package = &record.package;
    let mut bundle = ProofBundle {
        decision_id: package.decision_id.clone(),
        policy_id: package.policy_id.clone(),
        policy_version: package.policy_version.clone(),
        intent_hash: intent_hash(&package.intent)?,
        decision: package.decision,
        ledger_hash: record.audit.ledger_ref.clone(),
        signature: String::new(),
        issued_at: Timestamp::from_datetime(issued_at),
        authority_id: authority_id.to_string(),
    };
    bundle.signature = signer.sign(&bundle.signing_payload()?);
    Ok(bundle)
}

fn is_signature_shape(value: &str) -> bool {
    matches!(value.len(), 64 | 128) && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn str_field<'a>(fields: &'a serde_json::Map<String, Value>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Structural checks on an untyped bundle. Needs no key and no ledger.
pub fn verify_proof_bundle_json(bundle: &Value, now: DateTime<Utc>) -> ProofVerification {
    let Some(fields) = bundle.as_object() else {
        return ProofVerification::from_errors(vec!["bundle must be a JSON object".into()]);
    };
    let mut errors = Vec::new();
    let field = |name: &str| str_field(fields, name);

    for name in REQUIRED_FIELDS {
        if field(name).is_none() {
            errors.push(format!("missing field: {name}"));
        }
    }

    if let Some(decision) = field("decision") {
        if Decision::parse(decision).is_none() {
            errors.push(format!("invalid decision: {decision}"));
        }
    }
    for name in ["intentHash", "ledgerHash"] {
        if let Some(value) = field(name) {
            if Sha256Hex::parse(value).is_err() {
                errors.push(format!("{name} is not a SHA-256 hex digest"));
            }
        }
    }
    if let Some(signature) = field("signature") {
        if !is_signature_shape(signature) {
            errors.push("signature has an unexpected shape".into());
        }
    }
    if let Some(issued_at) = field("issuedAt") {
        match DateTime::parse_from_rfc3339(issued_at) {
            Ok(issued_at) => {
                let issued_at = issued_at.with_timezone(&Utc);
                if issued_at > now + Duration::seconds(FUTURE_TOLERANCE_SECS) {
                    errors.push("issuedAt is in the future".into());
                }
                if issued_at < now - Duration::days(MAX_AGE_DAYS) {
                    errors.push("issuedAt is older than one year".into());
                }
            }
            Err(_) => errors.push("issuedAt is not a valid timestamp".into()),
        }
    }

    ProofVerification::from_errors(errors)
}

/// Structural checks on a typed bundle.
pub fn verify_proof_bundle(bundle: &ProofBundle, now: DateTime<Utc>) -> ProofVerification {
    match serde_json::to_value(bundle) {
        Ok(value) => verify_proof_bundle_json(&value, now),
        Err(e) => ProofVerification::from_errors(vec![format!("bundle is not serializable: {e}")]),
    }
}

/// Structural checks plus signature recomputation.
///
/// A signature mismatch is reported only as `Invalid Signature`.
pub fn verify_proof_bundle_signature<V: SignatureVerifier + ?Sized>(
    bundle: &ProofBundle,
    verifier: &V,
    now: DateTime<Utc>,
) -> ProofVerification {
    let mut verification = verify_proof_bundle(bundle, now);
    let signed = bundle
        .signing_payload()
        .map(|payload| verifier.verify(&payload, &bundle.signature))
        .unwrap_or(false);
    if !signed {
        verification.errors.push("Invalid Signature".into());
        verification.valid = false;
    }
    verification
}
