//! JSON configuration for a governance deployment.
//!
//! ```json
//! {
//!   "signer": {"kind": "ed25519", "seed": "..."},
//!   "capabilities": [
//!     {"id": "audit.view", "version": "1.0.0", "manifest": {"requiredPolicies": ["audit.read"]}}
//!   ],
//!   "spaces": [{"spaceId": "ops", "requiredRole": "admin"}],
//!   "blocklist": ["legacy.shell"],
//!   "unclassified": "deny"
//! }
//! ```

use crate::engine::{PolicyEngine, UnclassifiedPolicy};
use crate::errors::{ConfigError, GovernanceError};
use crate::graph::CapabilityGraph;
use crate::manifest::{CapabilityManifest, SpacePolicy, SpaceRegistry};
use crate::registry::PolicyRegistry;
use crate::signer::{Ed25519Signer, HmacSigner, Signer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use synapse_canonical::CapabilityId;

/// Signature scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerKind {
    /// HMAC-SHA256. Test and single-process use only.
    #[default]
    Hmac,
    /// Ed25519.
    Ed25519,
}

/// Signer section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Scheme.
    pub kind: SignerKind,
    /// Key seed. Usually supplied through the environment instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

/// One capability registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Capability id.
    pub id: CapabilityId,
    /// Semver version.
    pub version: String,
    /// Manifest.
    #[serde(default)]
    pub manifest: CapabilityManifest,
}

/// Whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GovernanceConfig {
    /// Informational schema version of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Signer.
    pub signer: SignerConfig,
    /// Capabilities, registered in order.
    pub capabilities: Vec<CapabilityConfig>,
    /// Space policies.
    pub spaces: Vec<SpacePolicy>,
    /// Blocked targets.
    pub blocklist: Vec<String>,
    /// Fallback for unclassified actions.
    pub unclassified: UnclassifiedPolicy,
}

/// Engine and signer built from a configuration.
pub struct Governance {
    /// Policy engine.
    pub engine: PolicyEngine,
    /// Signer.
    pub signer: Arc<dyn Signer>,
}

impl GovernanceConfig {
    /// Reads and parses a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parses configuration text; `origin` names the source in errors.
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Registers capabilities and spaces and builds the engine.
    pub fn build_engine(&self) -> Result<PolicyEngine, GovernanceError> {
        let registry = Arc::new(PolicyRegistry::new());
        for capability in &self.capabilities {
            registry.register(
                capability.id.clone(),
                &capability.version,
                capability.manifest.clone(),
            )?;
        }

        let graph = self
            .blocklist
            .iter()
            .fold(CapabilityGraph::from_registry(&registry), |graph, target| {
                graph.block(target.clone())
            });

        let spaces = Arc::new(SpaceRegistry::new());
        for space in &self.spaces {
            spaces.register(space.clone());
        }

        Ok(PolicyEngine::new(registry, graph)
            .with_spaces(spaces)
            .with_unclassified(self.unclassified))
    }

    /// Builds the configured signer. `seed_override` wins over the file.
    pub fn signer(&self, seed_override: Option<&str>) -> Result<Arc<dyn Signer>, GovernanceError> {
        let seed = seed_override
            .or(self.signer.seed.as_deref())
            .ok_or(ConfigError::MissingSeed)?;
        let signer: Arc<dyn Signer> = match self.signer.kind {
            SignerKind::Hmac => Arc::new(HmacSigner::from_seed(seed)?),
            SignerKind::Ed25519 => Arc::new(Ed25519Signer::from_seed(seed)?),
        };
        Ok(signer)
    }

    /// Builds engine and signer together.
    pub fn build(&self, seed_override: Option<&str>) -> Result<Governance, GovernanceError> {
        Ok(Governance {
            engine: self.build_engine()?,
            signer: self.signer(seed_override)?,
        })
    }
}
