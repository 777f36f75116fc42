//! Independent re-verification of decision records before enforcement.
//!
//! The gate runs a fixed pipeline (schema version, signature, scope) and
//! returns the recorded decision only when every stage passes. Any failure,
//! error or panic yields DENY. Each call records its verdict as one
//! `GATE_VERIFICATION` ledger entry.

use crate::decision::{signing_payload, Decision, DecisionRecord, Intent, SCHEMA_VERSION};
use crate::ledger::{AuditLedger, LedgerEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Reason given when every check passes.
pub const PASSED_INTEGRITY_CHECKS: &str = "PASSED_INTEGRITY_CHECKS";
/// Schema version differs.
pub const SCHEMA_VERSION_MISMATCH: &str = "Schema Version Mismatch";
/// Signature does not match the record.
pub const INVALID_SIGNATURE: &str = "Invalid Signature";
/// Proposed action differs from the recorded one.
pub const ACTION_MISMATCH: &str = "Action Mismatch";
/// Proposed target differs from the recorded one.
pub const TARGET_MISMATCH: &str = "Target Mismatch";
/// Verification itself failed.
pub const INTERNAL_VERIFICATION_ERROR: &str = "Internal Verification Error";

/// How the gate reached its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    /// All checks passed; the verdict is the recorded decision.
    Verified,
    /// A check failed.
    Rejected,
    /// Verification could not complete.
    Error,
}

/// Verdict of a single `enforce` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateVerdict {
    /// Decision to enforce.
    pub decision: Decision,
    /// Pipeline outcome.
    pub status: GateStatus,
    /// `PASSED_INTEGRITY_CHECKS` or the failing stage's reason.
    pub reason: String,
    /// Decision id of the checked record.
    pub decision_id: String,
    /// Hash of the `GATE_VERIFICATION` entry, when it could be written.
    pub ledger_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    SchemaVersion,
    Signature,
    Action,
    Target,
    Internal,
}

impl Rejection {
    fn reason(self) -> &'static str {
        match self {
            Rejection::SchemaVersion => SCHEMA_VERSION_MISMATCH,
            Rejection::Signature => INVALID_SIGNATURE,
            Rejection::Action => ACTION_MISMATCH,
            Rejection::Target => TARGET_MISMATCH,
            Rejection::Internal => INTERNAL_VERIFICATION_ERROR,
        }
    }

    fn status(self) -> GateStatus {
        match self {
            Rejection::Internal => GateStatus::Error,
            _ => GateStatus::Rejected,
        }
    }
}

/// Enforcement point. Shares the authority's ledger but not its engine.
#[derive(Debug, Clone)]
pub struct GovernanceGate {
    ledger: Arc<AuditLedger>,
}

impl GovernanceGate {
    /// Gate verifying against `ledger`'s signer.
    pub fn new(ledger: Arc<AuditLedger>) -> Self {
        Self { ledger }
    }

    /// Verifies `record` against `proposed` and returns the decision to enforce.
    ///
    /// Never fails and never panics to the caller.
    pub fn enforce(&self, record: &DecisionRecord, proposed: &Intent) -> GateVerdict {
        let checked = panic::catch_unwind(AssertUnwindSafe(|| self.check(record, proposed)))
            .unwrap_or(Err(Rejection::Internal));

        let (decision, status, reason) = match checked {
            Ok(()) => (record.package.decision, GateStatus::Verified, PASSED_INTEGRITY_CHECKS),
            Err(rejection) => (Decision::Deny, rejection.status(), rejection.reason()),
        };

        let data = json!({
            "decisionId": record.package.decision_id,
            "recordLedgerRef": record.audit.ledger_ref,
            "status": status,
            "reason": reason,
            "decision": decision,
            "proposedAction": proposed.action,
            "proposedTarget": proposed.target,
        });
        let appended = panic::catch_unwind(AssertUnwindSafe(|| {
            self.ledger.append(LedgerEvent::GateVerification, data)
        }));

        let entry = match appended {
            Ok(Ok(entry)) => entry,
            Ok(Err(e)) => {
                error!(decision_id = %record.package.decision_id, error = %e, "gate verdict could not be recorded");
                return self.unrecorded(record);
            }
            Err(_) => {
                error!(decision_id = %record.package.decision_id, "gate verdict recording panicked");
                return self.unrecorded(record);
            }
        };

        if status == GateStatus::Verified {
            info!(
                decision_id = %record.package.decision_id,
                decision = %decision,
                ledger_index = entry.index,
                "gate verification passed"
            );
        } else {
            warn!(
                decision_id = %record.package.decision_id,
                reason,
                ledger_index = entry.index,
                "gate verification failed"
            );
        }

        GateVerdict {
            decision,
            status,
            reason: reason.to_string(),
            decision_id: record.package.decision_id.clone(),
            ledger_ref: Some(entry.hash),
        }
    }

    fn unrecorded(&self, record: &DecisionRecord) -> GateVerdict {
        GateVerdict {
            decision: Decision::Deny,
            status: GateStatus::Error,
            reason: INTERNAL_VERIFICATION_ERROR.to_string(),
            decision_id: record.package.decision_id.clone(),
            ledger_ref: None,
        }
    }

    fn check(&self, record: &DecisionRecord, proposed: &Intent) -> Result<(), Rejection> {
        if record.package.schema_version != SCHEMA_VERSION {
            return Err(Rejection::SchemaVersion);
        }

        let payload =
            signing_payload(&record.package, &record.reason).map_err(|_| Rejection::Internal)?;
        if !self.ledger.verify_signature(&payload, &record.audit.signature) {
            return Err(Rejection::Signature);
        }

        if record.package.intent.action != proposed.action {
            return Err(Rejection::Action);
        }
        if record.package.intent.target != proposed.target {
            return Err(Rejection::Target);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::SynapseAuthority;
    use crate::context::{Role, SecurityContext};
    use crate::decision::{OPEN_CAPABILITY, SWITCH_SPACE};
    use crate::engine::PolicyEngine;
    use crate::graph::CapabilityGraph;
    use crate::manifest::CapabilityManifest;
    use crate::registry::PolicyRegistry;
    use crate::signer::{HmacSigner, SignatureVerifier, Signer};

    fn setup() -> (SynapseAuthority, GovernanceGate) {
        let registry = Arc::new(PolicyRegistry::new());
        registry
            .register("notes.app", "1.0.0", CapabilityManifest::default())
            .unwrap();
        let graph = CapabilityGraph::from_registry(&registry);
        let ledger = Arc::new(AuditLedger::new(Arc::new(HmacSigner::from_seed("gate").unwrap())).unwrap());
        let authority = SynapseAuthority::new(PolicyEngine::new(registry, graph), Arc::clone(&ledger));
        (authority, GovernanceGate::new(ledger))
    }

    fn allowed(authority: &SynapseAuthority) -> DecisionRecord {
        authority
            .request_decision(
                Intent::new(OPEN_CAPABILITY, "notes.app"),
                SecurityContext::authenticated("user:alice", Role::User),
            )
            .unwrap()
    }

    #[test]
    fn valid_record_passes() {
        let (authority, gate) = setup();
        let record = allowed(&authority);
        let verdict = gate.enforce(&record, &record.package.intent);
        assert_eq!(verdict.decision, Decision::Allow);
        assert_eq!(verdict.status, GateStatus::Verified);
        assert_eq!(verdict.reason, PASSED_INTEGRITY_CHECKS);
        let tip = authority.ledger().last_entry().unwrap();
        assert_eq!(tip.event, LedgerEvent::GateVerification);
        assert_eq!(verdict.ledger_ref, Some(tip.hash));
    }

    #[test]
    fn stages_report_their_reason() {
        let (authority, gate) = setup();
        let record = allowed(&authority);

        let mut stale = record.clone();
        stale.package.schema_version = "0.9.0".into();
        assert_eq!(gate.enforce(&stale, &record.package.intent).reason, SCHEMA_VERSION_MISMATCH);

        let mut forged = record.clone();
        forged.package.context.role = Role::Owner;
        assert_eq!(gate.enforce(&forged, &record.package.intent).reason, INVALID_SIGNATURE);

        let action = gate.enforce(&record, &Intent::new(SWITCH_SPACE, "notes.app"));
        assert_eq!(action.reason, ACTION_MISMATCH);
        assert_eq!(action.decision, Decision::Deny);

        let target = gate.enforce(&record, &Intent::new(OPEN_CAPABILITY, "other.app"));
        assert_eq!(target.reason, TARGET_MISMATCH);
    }

    #[test]
    fn every_call_appends_one_entry() {
        let (authority, gate) = setup();
        let record = allowed(&authority);
        let before = authority.ledger().len();
        gate.enforce(&record, &record.package.intent);
        gate.enforce(&record, &Intent::new("OTHER", "x"));
        assert_eq!(authority.ledger().len(), before + 2);
        assert!(authority.ledger().verify_chain().is_valid);
    }

    struct PanickingSigner;

    impl SignatureVerifier for PanickingSigner {
        fn verify(&self, _payload: &str, _signature: &str) -> bool {
            panic!("verifier exploded")
        }
    }

    impl Signer for PanickingSigner {
        fn sign(&self, _payload: &str) -> String {
            "0".repeat(64)
        }
        fn public_key(&self) -> String {
            String::new()
        }
        fn signer_id(&self) -> String {
            "panicking".into()
        }
    }

    #[test]
    fn panicking_verifier_fails_closed() {
        let (authority, _) = setup();
        let record = allowed(&authority);
        let ledger = Arc::new(AuditLedger::new(Arc::new(PanickingSigner)).unwrap());
        let gate = GovernanceGate::new(Arc::clone(&ledger));
        let verdict = gate.enforce(&record, &record.package.intent);
        assert_eq!(verdict.decision, Decision::Deny);
        assert_eq!(verdict.status, GateStatus::Error);
        assert_eq!(verdict.reason, INTERNAL_VERIFICATION_ERROR);
        assert_eq!(ledger.len(), 2);
    }
}
