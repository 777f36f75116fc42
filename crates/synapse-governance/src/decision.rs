//! Decision packages, reason cores and signed decision records.

use crate::context::SecurityContext;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use synapse_canonical::{to_canonical_string, ActorId, CanonicalizationError, Timestamp};

/// Schema version stamped into every decision package and checked by the gate.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Opens a registered capability; target is the capability id.
pub const OPEN_CAPABILITY: &str = "OPEN_CAPABILITY";
/// Switches into a space; target is the space id.
pub const SWITCH_SPACE: &str = "SWITCH_SPACE";
/// Opens a window inside a space; target is the space id.
pub const OPEN_WINDOW: &str = "OPEN_WINDOW";
/// Focuses a window inside a space; target is the space id.
pub const FOCUS_WINDOW: &str = "FOCUS_WINDOW";
/// Moves a window inside a space; target is the space id.
pub const MOVE_WINDOW: &str = "MOVE_WINDOW";

/// Capability that always requires escalation.
pub const SYSTEM_CONFIGURE: &str = "system.configure";
/// Reserved target exempt from the blocklist.
pub const SYSTEM_TARGET: &str = "system";

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Proceed.
    Allow,
    /// Refuse.
    Deny,
    /// Proceed only after additional verification.
    Escalate,
}

impl Decision {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Deny => "DENY",
            Decision::Escalate => "ESCALATE",
        }
    }

    /// Parses a wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ALLOW" => Some(Decision::Allow),
            "DENY" => Some(Decision::Deny),
            "ESCALATE" => Some(Decision::Escalate),
            _ => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested action on a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Action name, e.g. `OPEN_CAPABILITY`.
    pub action: String,
    /// Capability id, space id or other action-specific target.
    pub target: String,
    /// Action parameters.
    #[serde(default = "empty_params")]
    pub params: Value,
}

fn empty_params() -> Value {
    json!({})
}

impl Intent {
    /// Intent with empty params.
    pub fn new(action: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            target: target.into(),
            params: empty_params(),
        }
    }

    /// Replaces the params object.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}

/// The policy a decision was made under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyIdentity {
    /// Policy (capability) id.
    pub policy_id: String,
    /// Policy version.
    pub policy_version: String,
    /// SHA-256 of the canonical manifest, when one was registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_hash: Option<String>,
}

impl PolicyIdentity {
    /// Identity with no manifest hash.
    pub fn new(policy_id: impl Into<String>, policy_version: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            policy_version: policy_version.into(),
            policy_hash: None,
        }
    }

    /// `policyId@policyVersion`.
    pub fn policy_ref(&self) -> String {
        format!("{}@{}", self.policy_id, self.policy_version)
    }
}

/// Everything the authority decided, before signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPackage {
    /// UUID v4, unique per decision.
    pub decision_id: String,
    /// UUID v4 correlating the request across systems.
    pub trace_id: String,
    /// Issue time.
    pub timestamp: Timestamp,
    /// Requesting principal.
    pub actor_id: ActorId,
    /// Package schema version.
    pub schema_version: String,
    /// Policy id.
    pub policy_id: String,
    /// Policy version.
    pub policy_version: String,
    /// Manifest hash, if registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_hash: Option<String>,
    /// Requested intent.
    pub intent: Intent,
    /// Security context snapshot.
    pub context: SecurityContext,
    /// Outcome.
    pub decision: Decision,
}

impl DecisionPackage {
    /// Policy identity carried by this package.
    pub fn policy(&self) -> PolicyIdentity {
        PolicyIdentity {
            policy_id: self.policy_id.clone(),
            policy_version: self.policy_version.clone(),
            policy_hash: self.policy_hash.clone(),
        }
    }
}

/// Explanation of a decision. Signed together with the package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReasonCore {
    /// Machine-readable reason codes, e.g. `POLICY_MISSING`.
    pub reason_codes: Vec<String>,
    /// `policyId@policyVersion` references.
    pub policy_refs: Vec<String>,
    /// Rules that fired, in evaluation order.
    pub rule_hits: Vec<String>,
    /// Evaluator-supplied evidence.
    #[serde(default)]
    pub evidence: Value,
    /// Requirements the caller did not meet.
    #[serde(default)]
    pub missing_requirements: Vec<String>,
}

/// Ledger anchoring and signature of a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    /// Hash of the ledger entry that recorded the decision.
    pub ledger_ref: String,
    /// Hash of the entry before it.
    pub previous_hash: String,
    /// Signature over the canonical `{package, reason}`.
    pub signature: String,
    /// Signer that produced `signature`.
    #[serde(rename = "signerId")]
    pub signer_id: String,
}

/// Signed, ledger-anchored decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// What was decided.
    pub package: DecisionPackage,
    /// Why.
    pub reason: ReasonCore,
    /// Where it was recorded and who signed it.
    pub audit: AuditTrail,
}

impl DecisionRecord {
    /// Canonical bytes the signature covers.
    pub fn signing_payload(&self) -> Result<String, CanonicalizationError> {
        signing_payload(&self.package, &self.reason)
    }
}

/// Canonical JSON of `{"package": .., "reason": ..}`.
///
/// The gate re-serializes received records through this function, so any
/// field added to or altered in a package after signing breaks the signature.
pub fn signing_payload(
    package: &DecisionPackage,
    reason: &ReasonCore,
) -> Result<String, CanonicalizationError> {
    #[derive(Serialize)]
    struct Payload<'a> {
        package: &'a DecisionPackage,
        reason: &'a ReasonCore,
    }
    to_canonical_string(&Payload { package, reason })
}
