use crate::manifest::CapabilityManifest;
use crate::registry::PolicyRegistry;
use std::collections::{BTreeMap, BTreeSet};
use synapse_canonical::CapabilityId;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CapabilityNode {
    requires_step_up: bool,
    required_policies: Vec<String>,
}

/// Read-only view of which capabilities exist and which targets are blocked.
///
/// The engine consults the graph for existence even when the registry has
/// no manifest, so a capability can be known to the graph before its
/// manifest is published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityGraph {
    nodes: BTreeMap<CapabilityId, CapabilityNode>,
    blocklist: BTreeSet<String>,
}

impl CapabilityGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph holding every active manifest of `registry`.
    pub fn from_registry(registry: &PolicyRegistry) -> Self {
        registry
            .ids()
            .into_iter()
            .filter_map(|id| registry.get_latest(id.as_str()))
            .fold(Self::new(), |graph, registered| {
                graph.with_capability(registered.id, &registered.manifest)
            })
    }

    /// Adds or replaces a capability node.
    pub fn with_capability(mut self, id: impl Into<CapabilityId>, manifest: &CapabilityManifest) -> Self {
        self.nodes.insert(
            id.into(),
            CapabilityNode {
                requires_step_up: manifest.requires_step_up,
                required_policies: manifest.required_policies.clone(),
            },
        );
        self
    }

    /// Blocks a target.
    pub fn block(mut self, target: impl Into<String>) -> Self {
        self.blocklist.insert(target.into());
        self
    }

    /// Whether `id` is a known capability.
    pub fn exists(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Whether `target` is blocklisted.
    pub fn is_blocked(&self, target: &str) -> bool {
        self.blocklist.contains(target)
    }

    /// Step-up flag of `id`; unknown capabilities report `false`.
    pub fn requires_step_up(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(|n| n.requires_step_up)
    }

    /// Required policies of `id`; unknown capabilities report none.
    pub fn required_policies(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .map(|n| n.required_policies.as_slice())
            .unwrap_or_default()
    }

    /// Known capability ids.
    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityId> {
        self.nodes.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_on_unknown_capability_are_empty() {
        let graph = CapabilityGraph::new();
        assert!(!graph.exists("x"));
        assert!(!graph.requires_step_up("x"));
        assert!(graph.required_policies("x").is_empty());
    }

    #[test]
    fn from_registry_uses_active_manifests() {
        let registry = PolicyRegistry::new();
        registry
            .register("audit.view", "1.0.0", CapabilityManifest::default().require_policy("audit.read"))
            .unwrap();
        registry
            .register("audit.view", "2.0.0", CapabilityManifest::default().with_step_up(true))
            .unwrap();
        let graph = CapabilityGraph::from_registry(&registry).block("vault");
        assert!(graph.exists("audit.view"));
        assert!(graph.requires_step_up("audit.view"));
        assert!(graph.required_policies("audit.view").is_empty());
        assert!(graph.is_blocked("vault"));
        assert_eq!(graph.capabilities().count(), 1);
    }
}
