//! Capability and space policy evaluation.
//!
//! Rules are checked in a fixed order and the first one that decides wins:
//! blocklist, then capability rules for `OPEN_CAPABILITY`, then space rules
//! for the space-scoped actions, then the unclassified fallback. Evaluation
//! reads no clock and no randomness, so identical inputs always produce
//! identical evaluations.

use crate::context::{Role, SecurityContext};
use crate::decision::{
    Decision, Intent, PolicyIdentity, ReasonCore, FOCUS_WINDOW, MOVE_WINDOW, OPEN_CAPABILITY,
    OPEN_WINDOW, SWITCH_SPACE, SYSTEM_CONFIGURE, SYSTEM_TARGET,
};
use crate::graph::CapabilityGraph;
use crate::manifest::{SpacePermission, SpacePolicy, SpaceRegistry};
use crate::registry::PolicyRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use synapse_canonical::{sha256_hex, to_canonical_string};
use tracing::debug;

/// Version assigned to capabilities evaluated without a registered manifest.
pub const DRAFT_VERSION: &str = "0.0.0-draft";
/// Version of the built-in rule sets (blocklist, spaces, fallback).
pub const ENGINE_POLICY_VERSION: &str = "1.0.0";
/// Policy id of the blocklist rule.
pub const BLOCKLIST_POLICY_ID: &str = "synapse.blocklist";
/// Policy id of the space rules.
pub const SPACE_POLICY_ID: &str = "synapse.space";
/// Policy id of the unclassified fallback.
pub const DEFAULT_POLICY_ID: &str = "synapse.default";

/// Reason codes attached to evaluations.
pub mod reason {
    /// Target is blocklisted.
    pub const TARGET_BLOCKLISTED: &str = "TARGET_BLOCKLISTED";
    /// Capability is not in the graph.
    pub const CAPABILITY_UNKNOWN: &str = "CAPABILITY_UNKNOWN";
    /// Caller lacks required policies.
    pub const POLICY_MISSING: &str = "POLICY_MISSING";
    /// Capability always escalates.
    pub const HIGH_RISK_CAPABILITY: &str = "HIGH_RISK_CAPABILITY";
    /// Step-up session required.
    pub const STEP_UP_REQUIRED: &str = "STEP_UP_REQUIRED";
    /// Capability checks passed.
    pub const CAPABILITY_GRANTED: &str = "CAPABILITY_GRANTED";
    /// Caller is not authenticated.
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    /// Caller role is below the space's required role.
    pub const ROLE_INSUFFICIENT: &str = "ROLE_INSUFFICIENT";
    /// Space permission bit is off.
    pub const SPACE_PERMISSION_DENIED: &str = "SPACE_PERMISSION_DENIED";
    /// Space checks passed.
    pub const SPACE_GRANTED: &str = "SPACE_GRANTED";
    /// Unclassified action allowed by fallback.
    pub const DEFAULT_ALLOW: &str = "DEFAULT_ALLOW";
    /// Unclassified action denied by fallback.
    pub const DEFAULT_DENY: &str = "DEFAULT_DENY";
}

/// What to do with actions no rule classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnclassifiedPolicy {
    /// Allow with `DEFAULT_ALLOW`.
    #[default]
    Allow,
    /// Deny with `DEFAULT_DENY`.
    Deny,
}

/// Result of evaluating an intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Outcome.
    pub decision: Decision,
    /// Policy the outcome was reached under.
    pub policy: PolicyIdentity,
    /// Explanation.
    pub reason: ReasonCore,
}

struct Trace {
    policy: PolicyIdentity,
    rule_hits: Vec<String>,
    evidence: serde_json::Map<String, Value>,
}

impl Trace {
    fn new(policy: PolicyIdentity) -> Self {
        Self {
            policy,
            rule_hits: Vec::new(),
            evidence: serde_json::Map::new(),
        }
    }

    fn hit(&mut self, rule: &str) {
        self.rule_hits.push(rule.to_string());
    }

    fn evidence(&mut self, key: &str, value: Value) {
        self.evidence.insert(key.to_string(), value);
    }

    fn finish(self, decision: Decision, code: &str, missing: Vec<String>) -> Evaluation {
        debug!(
            decision = %decision,
            code,
            policy = %self.policy.policy_ref(),
            "policy evaluated"
        );
        Evaluation {
            decision,
            reason: ReasonCore {
                reason_codes: vec![code.to_string()],
                policy_refs: vec![self.policy.policy_ref()],
                rule_hits: self.rule_hits,
                evidence: Value::Object(self.evidence),
                missing_requirements: missing,
            },
            policy: self.policy,
        }
    }
}

/// Computes decisions from the registry, the capability graph and space policies.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    registry: Arc<PolicyRegistry>,
    graph: CapabilityGraph,
    spaces: Arc<SpaceRegistry>,
    unclassified: UnclassifiedPolicy,
}

impl PolicyEngine {
    /// Engine with no space policies and the allow fallback.
    pub fn new(registry: Arc<PolicyRegistry>, graph: CapabilityGraph) -> Self {
        Self {
            registry,
            graph,
            spaces: Arc::new(SpaceRegistry::new()),
            unclassified: UnclassifiedPolicy::default(),
        }
    }

    /// Uses `spaces` for space-scoped actions.
    pub fn with_spaces(mut self, spaces: Arc<SpaceRegistry>) -> Self {
        self.spaces = spaces;
        self
    }

    /// Sets the fallback for unclassified actions.
    pub fn with_unclassified(mut self, policy: UnclassifiedPolicy) -> Self {
        self.unclassified = policy;
        self
    }

    /// Shared registry.
    pub fn registry(&self) -> &Arc<PolicyRegistry> {
        &self.registry
    }

    /// Shared space policies.
    pub fn spaces(&self) -> &Arc<SpaceRegistry> {
        &self.spaces
    }

    /// Capability graph.
    pub fn graph(&self) -> &CapabilityGraph {
        &self.graph
    }

    /// Evaluates `intent` for the caller described by `security`.
    pub fn evaluate(&self, intent: &Intent, security: &SecurityContext) -> Evaluation {
        if intent.target != SYSTEM_TARGET && self.graph.is_blocked(&intent.target) {
            let mut trace = Trace::new(PolicyIdentity::new(BLOCKLIST_POLICY_ID, ENGINE_POLICY_VERSION));
            trace.hit("blocklist");
            trace.evidence("target", json!(intent.target));
            return trace.finish(Decision::Deny, reason::TARGET_BLOCKLISTED, Vec::new());
        }

        match intent.action.as_str() {
            OPEN_CAPABILITY => self.evaluate_capability(intent, security),
            SWITCH_SPACE => self.evaluate_space(intent, security, SpacePermission::Access),
            OPEN_WINDOW => self.evaluate_space(intent, security, SpacePermission::OpenWindow),
            FOCUS_WINDOW => self.evaluate_space(intent, security, SpacePermission::FocusWindow),
            MOVE_WINDOW => self.evaluate_space(intent, security, SpacePermission::MoveWindow),
            _ => {
                let mut trace = Trace::new(PolicyIdentity::new(DEFAULT_POLICY_ID, ENGINE_POLICY_VERSION));
                trace.hit("unclassified");
                trace.evidence("action", json!(intent.action));
                match self.unclassified {
                    UnclassifiedPolicy::Allow => {
                        trace.finish(Decision::Allow, reason::DEFAULT_ALLOW, Vec::new())
                    }
                    UnclassifiedPolicy::Deny => {
                        trace.finish(Decision::Deny, reason::DEFAULT_DENY, Vec::new())
                    }
                }
            }
        }
    }

    fn evaluate_capability(&self, intent: &Intent, security: &SecurityContext) -> Evaluation {
        let capability = intent.target.as_str();
        let registered = self.registry.get_latest(capability);

        let policy = match &registered {
            Some(r) => PolicyIdentity {
                policy_id: r.id.to_string(),
                policy_version: r.version.to_string(),
                policy_hash: Some(r.hash.clone()),
            },
            None => PolicyIdentity::new(capability, DRAFT_VERSION),
        };
        let mut trace = Trace::new(policy);
        trace.evidence("capability", json!(capability));
        trace.evidence("registered", json!(registered.is_some()));

        trace.hit("capability.exists");
        if !self.graph.exists(capability) {
            return trace.finish(Decision::Deny, reason::CAPABILITY_UNKNOWN, Vec::new());
        }

        let required: &[String] = match &registered {
            Some(r) => &r.manifest.required_policies,
            None => self.graph.required_policies(capability),
        };
        if !required.is_empty() {
            trace.evidence("requiredPolicies", json!(required));
            if security.role >= Role::Admin {
                trace.hit("capability.admin_bypass");
            } else {
                trace.hit("capability.required_policies");
                let missing = security.missing_policies(required);
                if !missing.is_empty() {
                    return trace.finish(Decision::Deny, reason::POLICY_MISSING, missing);
                }
            }
        }

        if capability == SYSTEM_CONFIGURE {
            trace.hit("capability.high_risk");
            return trace.finish(
                Decision::Escalate,
                reason::HIGH_RISK_CAPABILITY,
                vec!["stepUp".to_string()],
            );
        }

        let requires_step_up = match &registered {
            Some(r) => r.manifest.requires_step_up,
            None => self.graph.requires_step_up(capability),
        };
        if requires_step_up {
            trace.hit("capability.step_up");
            trace.evidence("stepUpActive", json!(security.step_up_active));
            if !security.step_up_active {
                return trace.finish(
                    Decision::Escalate,
                    reason::STEP_UP_REQUIRED,
                    vec!["stepUp".to_string()],
                );
            }
        }

        trace.finish(Decision::Allow, reason::CAPABILITY_GRANTED, Vec::new())
    }

    fn evaluate_space(
        &self,
        intent: &Intent,
        security: &SecurityContext,
        permission: SpacePermission,
    ) -> Evaluation {
        let registered = self.spaces.get(&intent.target);
        let policy_hash = registered
            .as_ref()
            .and_then(|p| to_canonical_string(p).ok())
            .map(sha256_hex);
        let space = registered.unwrap_or_else(|| SpacePolicy::new(intent.target.as_str()));

        let mut trace = Trace::new(PolicyIdentity {
            policy_id: SPACE_POLICY_ID.to_string(),
            policy_version: ENGINE_POLICY_VERSION.to_string(),
            policy_hash: policy_hash.clone(),
        });
        trace.evidence("spaceId", json!(space.space_id));
        trace.evidence("registered", json!(policy_hash.is_some()));
        trace.evidence("permission", json!(permission.as_str()));

        trace.hit("space.authenticated");
        if !security.authenticated {
            return trace.finish(
                Decision::Deny,
                reason::UNAUTHENTICATED,
                vec!["authenticated".to_string()],
            );
        }

        if let Some(required) = space.required_role {
            trace.hit("space.required_role");
            trace.evidence("requiredRole", json!(required));
            if security.role.rank() < required.rank() {
                return trace.finish(
                    Decision::Deny,
                    reason::ROLE_INSUFFICIENT,
                    vec![format!("role:{}", required.as_str())],
                );
            }
        }

        trace.hit("space.permission");
        if !space.permissions.allows(permission) {
            return trace.finish(
                Decision::Deny,
                reason::SPACE_PERMISSION_DENIED,
                vec![permission.as_str().to_string()],
            );
        }

        trace.finish(Decision::Allow, reason::SPACE_GRANTED, Vec::new())
    }
}
