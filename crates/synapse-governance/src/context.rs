use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use synapse_canonical::ActorId;

/// Caller role. Ordering is the privilege order: `Guest < User < Admin < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Rank 0.
    Guest,
    /// Rank 1.
    User,
    /// Rank 2.
    Admin,
    /// Rank 3.
    Owner,
}

impl Role {
    /// Numeric rank used for `requiredRole` comparisons.
    pub fn rank(self) -> u8 {
        match self {
            Role::Guest => 0,
            Role::User => 1,
            Role::Admin => 2,
            Role::Owner => 3,
        }
    }

    /// Lowercase name as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

/// Security facts about the caller at the moment a decision is requested.
///
/// A snapshot of this struct is embedded in every signed decision package, so
/// the verdict can be audited against exactly what the engine saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    /// Principal requesting the decision.
    pub actor_id: ActorId,
    /// Whether the session is authenticated.
    pub authenticated: bool,
    /// Caller role.
    pub role: Role,
    /// Policy grants held by the caller.
    #[serde(default)]
    pub policies: BTreeSet<String>,
    /// Whether a step-up authentication session is currently active.
    #[serde(default)]
    pub step_up_active: bool,
}

impl SecurityContext {
    /// Authenticated context with no grants and no step-up session.
    pub fn authenticated(actor_id: impl Into<ActorId>, role: Role) -> Self {
        Self {
            actor_id: actor_id.into(),
            authenticated: true,
            role,
            policies: BTreeSet::new(),
            step_up_active: false,
        }
    }

    /// Unauthenticated guest context.
    pub fn anonymous() -> Self {
        Self {
            actor_id: ActorId::new("anonymous"),
            authenticated: false,
            role: Role::Guest,
            policies: BTreeSet::new(),
            step_up_active: false,
        }
    }

    /// Adds a policy grant.
    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policies.insert(policy.into());
        self
    }

    /// Sets the step-up flag.
    pub fn with_step_up(mut self, active: bool) -> Self {
        self.step_up_active = active;
        self
    }

    /// Returns the required policies the caller does not hold, in input order.
    pub fn missing_policies<'a, I>(&self, required: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        required
            .into_iter()
            .filter(|policy| !self.policies.contains(*policy))
            .cloned()
            .collect()
    }
}
