//! Capability manifests and space policies.

use crate::context::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use synapse_canonical::SpaceId;

/// How a capability presents its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// Floating window.
    #[default]
    Windowed,
    /// Fills the space.
    Fullscreen,
    /// No window.
    Headless,
}

/// Review level a capability has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificationTier {
    /// Not reviewed.
    #[default]
    Uncertified,
    /// Reviewed by the community.
    Community,
    /// Reviewed and signed off by the platform.
    Verified,
    /// Part of the platform itself.
    Core,
}

/// Versioned metadata describing a governed capability.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilityManifest {
    /// Policies a caller must hold (admins bypass).
    pub required_policies: Vec<String>,
    /// Whether an active step-up session is required.
    pub requires_step_up: bool,
    /// Window presentation.
    pub window_mode: WindowMode,
    /// Review level.
    pub certification_tier: CertificationTier,
    /// Capability ids this one depends on.
    pub dependencies: Vec<String>,
    /// Contexts (e.g. `desktop`, `mobile`) the capability runs in.
    pub contexts_supported: Vec<String>,
}

impl CapabilityManifest {
    /// Adds a required policy.
    pub fn require_policy(mut self, policy: impl Into<String>) -> Self {
        self.required_policies.push(policy.into());
        self
    }

    /// Sets the step-up requirement.
    pub fn with_step_up(mut self, required: bool) -> Self {
        self.requires_step_up = required;
        self
    }
}

/// Permission bits of a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacePermissions {
    /// May switch into the space.
    pub can_access: bool,
    /// May open windows in it.
    pub can_open_window: bool,
    /// May focus windows in it.
    pub can_focus_window: bool,
    /// May move windows in it.
    pub can_move_window: bool,
}

/// Permissions applied to spaces with no registered policy.
pub const DEFAULT_SPACE_PERMISSIONS: SpacePermissions = SpacePermissions {
    can_access: true,
    can_open_window: true,
    can_focus_window: true,
    can_move_window: true,
};

impl Default for SpacePermissions {
    fn default() -> Self {
        DEFAULT_SPACE_PERMISSIONS
    }
}

/// One permission bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpacePermission {
    /// `canAccess`.
    Access,
    /// `canOpenWindow`.
    OpenWindow,
    /// `canFocusWindow`.
    FocusWindow,
    /// `canMoveWindow`.
    MoveWindow,
}

impl SpacePermission {
    /// Wire name of the bit.
    pub fn as_str(self) -> &'static str {
        match self {
            SpacePermission::Access => "canAccess",
            SpacePermission::OpenWindow => "canOpenWindow",
            SpacePermission::FocusWindow => "canFocusWindow",
            SpacePermission::MoveWindow => "canMoveWindow",
        }
    }
}

impl SpacePermissions {
    /// Reads one bit.
    pub fn allows(&self, permission: SpacePermission) -> bool {
        match permission {
            SpacePermission::Access => self.can_access,
            SpacePermission::OpenWindow => self.can_open_window,
            SpacePermission::FocusWindow => self.can_focus_window,
            SpacePermission::MoveWindow => self.can_move_window,
        }
    }
}

/// Access policy of a single space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacePolicy {
    /// Space id.
    pub space_id: SpaceId,
    /// Permission bits.
    #[serde(default)]
    pub permissions: SpacePermissions,
    /// Minimum role, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
}

impl SpacePolicy {
    /// Policy with default permissions and no role requirement.
    pub fn new(space_id: impl Into<SpaceId>) -> Self {
        Self {
            space_id: space_id.into(),
            permissions: DEFAULT_SPACE_PERMISSIONS,
            required_role: None,
        }
    }

    /// Sets the minimum role.
    pub fn with_required_role(mut self, role: Role) -> Self {
        self.required_role = Some(role);
        self
    }

    /// Replaces the permission bits.
    pub fn with_permissions(mut self, permissions: SpacePermissions) -> Self {
        self.permissions = permissions;
        self
    }
}

/// Space policies keyed by space id.
///
/// Registration replaces any previous policy for the same space.
#[derive(Debug, Default)]
pub struct SpaceRegistry {
    spaces: RwLock<BTreeMap<SpaceId, SpacePolicy>>,
}

impl SpaceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a policy.
    pub fn register(&self, policy: SpacePolicy) {
        let mut spaces = self.spaces.write().unwrap_or_else(PoisonError::into_inner);
        spaces.insert(policy.space_id.clone(), policy);
    }

    /// Looks up a policy.
    pub fn get(&self, space_id: &str) -> Option<SpacePolicy> {
        let spaces = self.spaces.read().unwrap_or_else(PoisonError::into_inner);
        spaces.get(space_id).cloned()
    }

    /// Number of registered spaces.
    pub fn len(&self) -> usize {
        self.spaces.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no space is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
