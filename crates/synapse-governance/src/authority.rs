use crate::context::SecurityContext;
use crate::decision::{
    signing_payload, AuditTrail, DecisionPackage, DecisionRecord, Intent, SCHEMA_VERSION,
};
use crate::engine::PolicyEngine;
use crate::errors::GovernanceError;
use crate::ledger::{AuditLedger, LedgerEvent};
use crate::proof::{create_proof_bundle, ProofBundle};
use serde_json::json;
use std::sync::Arc;
use synapse_canonical::Timestamp;
use tracing::{info, warn};
use uuid::Uuid;

/// Issues signed, ledger-anchored decisions.
///
/// Every call to [`SynapseAuthority::request_decision`] appends exactly one
/// `DECISION_RECORDED` entry, including for DENY outcomes.
#[derive(Debug)]
pub struct SynapseAuthority {
    engine: PolicyEngine,
    ledger: Arc<AuditLedger>,
    authority_id: String,
}

impl SynapseAuthority {
    /// Authority identified by the ledger signer's id.
    pub fn new(engine: PolicyEngine, ledger: Arc<AuditLedger>) -> Self {
        let authority_id = ledger.signer_id();
        Self {
            engine,
            ledger,
            authority_id,
        }
    }

    /// Overrides the id stamped into proof bundles.
    pub fn with_authority_id(mut self, authority_id: impl Into<String>) -> Self {
        self.authority_id = authority_id.into();
        self
    }

    /// Shared ledger.
    pub fn ledger(&self) -> &Arc<AuditLedger> {
        &self.ledger
    }

    /// Policy engine.
    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    /// Authority id.
    pub fn authority_id(&self) -> &str {
        &self.authority_id
    }

    /// Evaluates, signs and records a decision.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures: canonicalization, serialization or a
    /// ledger append that could not be persisted.
    pub fn request_decision(
        &self,
        intent: Intent,
        security: SecurityContext,
    ) -> Result<DecisionRecord, GovernanceError> {
        let evaluation = self.engine.evaluate(&intent, &security);

        let package = DecisionPackage {
            decision_id: Uuid::new_v4().to_string(),
            trace_id: Uuid::new_v4().to_string(),
            timestamp: Timestamp::from_datetime(self.ledger.clock().now()),
            actor_id: security.actor_id.clone(),
            schema_version: SCHEMA_VERSION.to_string(),
            policy_id: evaluation.policy.policy_id,
            policy_version: evaluation.policy.policy_version,
            policy_hash: evaluation.policy.policy_hash,
            intent,
            context: security,
            decision: evaluation.decision,
        };
        let reason = evaluation.reason;

        let payload = signing_payload(&package, &reason)?;
        let signature = self.ledger.sign(&payload);
        let signer_id = self.ledger.signer_id();

        let entry = self.ledger.append(
            LedgerEvent::DecisionRecorded,
            json!({
                "decisionId": package.decision_id,
                "package": serde_json::to_value(&package)?,
                "reason": serde_json::to_value(&reason)?,
                "signature": signature,
                "signerId": signer_id,
            }),
        )?;

        info!(
            decision_id = %package.decision_id,
            decision = %package.decision,
            action = %package.intent.action,
            target = %package.intent.target,
            policy = %format!("{}@{}", package.policy_id, package.policy_version),
            ledger_index = entry.index,
            "decision recorded"
        );

        Ok(DecisionRecord {
            package,
            reason,
            audit: AuditTrail {
                ledger_ref: entry.hash,
                previous_hash: entry.previous_hash,
                signature,
                signer_id,
            },
        })
    }

    /// Issues a proof bundle for `record`, stamped with the ledger clock.
    ///
    /// # Errors
    ///
    /// [`GovernanceError::UnrecordedDecision`] unless the record carries this
    /// authority's signature and its `ledger_ref` names the
    /// `DECISION_RECORDED` entry for the same decision.
    pub fn create_proof_bundle(&self, record: &DecisionRecord) -> Result<ProofBundle, GovernanceError> {
        self.check_recorded(record)?;
        Ok(create_proof_bundle(
            record,
            self.ledger.signer().as_ref(),
            &self.authority_id,
            self.ledger.clock().now(),
        )?)
    }

    fn check_recorded(&self, record: &DecisionRecord) -> Result<(), GovernanceError> {
        let payload = record.signing_payload()?;
        if !self.ledger.verify_signature(&payload, &record.audit.signature) {
            warn!(decision_id = %record.package.decision_id, "proof refused: invalid signature");
            return Err(GovernanceError::UnrecordedDecision("invalid signature"));
        }
        let entry = self
            .ledger
            .find_by_hash(&record.audit.ledger_ref)
            .ok_or(GovernanceError::UnrecordedDecision("ledger entry not found"))?;
        let matches = entry.event == LedgerEvent::DecisionRecorded
            && entry.data["decisionId"] == record.package.decision_id.as_str()
            && entry.data["signature"] == record.audit.signature.as_str();
        if !matches {
            warn!(decision_id = %record.package.decision_id, "proof refused: ledger entry mismatch");
            return Err(GovernanceError::UnrecordedDecision(
                "ledger entry does not record this decision",
            ));
        }
        Ok(())
    }
}
