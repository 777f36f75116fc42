//! Versioned capability manifests.
//!
//! Each capability id maps to a set of semver versions, one of which is
//! active. Registering a version newer than the active one activates it;
//! older versions are kept for replay but never become active again.

use crate::errors::RegistryError;
use crate::manifest::CapabilityManifest;
use semver::Version;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use synapse_canonical::{sha256_hex, to_canonical_string, CapabilityId};
use tracing::info;

/// What a registration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Stored and now active.
    Activated,
    /// Stored, but an equal or newer version stays active.
    StoredInactive,
    /// Identical manifest already registered under this version.
    Unchanged,
}

/// A manifest as held by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredManifest {
    /// Capability id.
    pub id: CapabilityId,
    /// Version.
    pub version: Version,
    /// Manifest.
    pub manifest: CapabilityManifest,
    /// SHA-256 of the canonical manifest JSON.
    pub hash: String,
}

#[derive(Debug)]
struct Stored {
    manifest: CapabilityManifest,
    hash: String,
}

#[derive(Debug)]
struct Versions {
    active: Version,
    all: BTreeMap<Version, Stored>,
}

/// Thread-safe registry of capability manifests.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    capabilities: RwLock<BTreeMap<CapabilityId, Versions>>,
}

impl PolicyRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `manifest` as `id@version`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidVersion`] for non-semver versions and
    /// [`RegistryError::VersionConflict`] when the version already holds a
    /// different manifest.
    pub fn register(
        &self,
        id: impl Into<CapabilityId>,
        version: &str,
        manifest: CapabilityManifest,
    ) -> Result<RegistrationOutcome, RegistryError> {
        let id = id.into();
        let parsed = Version::parse(version).map_err(|source| RegistryError::InvalidVersion {
            id: id.to_string(),
            version: version.to_string(),
            source,
        })?;
        let hash = sha256_hex(to_canonical_string(&manifest)?);

        let mut capabilities = self
            .capabilities
            .write()
            .map_err(|_| RegistryError::Poisoned)?;

        let versions = match capabilities.entry(id.clone()) {
            Entry::Vacant(slot) => {
                info!(capability = %id, version = %parsed, "capability registered");
                let mut all = BTreeMap::new();
                all.insert(parsed.clone(), Stored { manifest, hash });
                slot.insert(Versions { active: parsed, all });
                return Ok(RegistrationOutcome::Activated);
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        if let Some(existing) = versions.all.get(&parsed) {
            if existing.hash == hash {
                return Ok(RegistrationOutcome::Unchanged);
            }
            return Err(RegistryError::VersionConflict {
                id: id.to_string(),
                version: parsed.to_string(),
            });
        }

        versions.all.insert(parsed.clone(), Stored { manifest, hash });
        if parsed > versions.active {
            info!(capability = %id, from = %versions.active, to = %parsed, "capability version activated");
            versions.active = parsed;
            Ok(RegistrationOutcome::Activated)
        } else {
            info!(capability = %id, version = %parsed, active = %versions.active, "older capability version stored inactive");
            Ok(RegistrationOutcome::StoredInactive)
        }
    }

    /// Active manifest of `id`.
    pub fn get_latest(&self, id: &str) -> Option<RegisteredManifest> {
        let capabilities = self.capabilities.read().unwrap_or_else(PoisonError::into_inner);
        let (key, versions) = capabilities.get_key_value(id)?;
        let stored = versions.all.get(&versions.active)?;
        Some(RegisteredManifest {
            id: key.clone(),
            version: versions.active.clone(),
            manifest: stored.manifest.clone(),
            hash: stored.hash.clone(),
        })
    }

    /// Specific version of `id`, active or not.
    pub fn get_version(&self, id: &str, version: &str) -> Option<RegisteredManifest> {
        let version = Version::parse(version).ok()?;
        let capabilities = self.capabilities.read().unwrap_or_else(PoisonError::into_inner);
        let (key, versions) = capabilities.get_key_value(id)?;
        let stored = versions.all.get(&version)?;
        Some(RegisteredManifest {
            id: key.clone(),
            version,
            manifest: stored.manifest.clone(),
            hash: stored.hash.clone(),
        })
    }

    /// All versions of `id`, ascending.
    pub fn versions(&self, id: &str) -> Vec<Version> {
        let capabilities = self.capabilities.read().unwrap_or_else(PoisonError::into_inner);
        capabilities
            .get(id)
            .map(|v| v.all.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All registered capability ids, sorted.
    pub fn ids(&self) -> Vec<CapabilityId> {
        let capabilities = self.capabilities.read().unwrap_or_else(PoisonError::into_inner);
        capabilities.keys().cloned().collect()
    }
}
