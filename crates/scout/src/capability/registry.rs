//! Capability registry.
//!
//! Built once per run by merging remote capabilities, then local ones.
//! Entries keep the position of their first insertion.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::CapabilityError;
use super::{CapabilityDescriptor, CapabilityOrigin};

/// Prefix given to a remote entry displaced under [`CollisionPolicy::Namespace`].
pub const REMOTE_NAMESPACE: &str = "remote.";

/// What to do when two capabilities share a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The later insertion replaces the earlier one, with a warning.
    #[default]
    Override,
    /// A collision between a remote and a local capability is an error.
    Reject,
    /// The remote entry is kept as `remote.<name>` and the local one takes
    /// the plain name. A clash on `remote.<name>` itself is an error.
    Namespace,
}

#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    entries: Vec<CapabilityDescriptor>,
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge remote and local capabilities into one registry.
    ///
    /// Identical inputs always produce identical registries.
    pub fn merge(
        remote: Vec<CapabilityDescriptor>,
        local: Vec<CapabilityDescriptor>,
        policy: CollisionPolicy,
    ) -> Result<Self, CapabilityError> {
        let mut registry = Self::new();
        for descriptor in remote.into_iter().chain(local) {
            registry.insert(descriptor, policy)?;
        }

        debug!(
            count = registry.len(),
            names = ?registry.names(),
            "Capability registry built"
        );
        Ok(registry)
    }

    fn insert(
        &mut self,
        descriptor: CapabilityDescriptor,
        policy: CollisionPolicy,
    ) -> Result<(), CapabilityError> {
        let Some(&slot) = self.index.get(&descriptor.name) else {
            self.index.insert(descriptor.name.clone(), self.entries.len());
            self.entries.push(descriptor);
            return Ok(());
        };

        let existing = &self.entries[slot];
        let cross_origin = existing.origin != descriptor.origin;

        match policy {
            CollisionPolicy::Reject if cross_origin => {
                return Err(CapabilityError::Collision(descriptor.name));
            }
            CollisionPolicy::Namespace
                if cross_origin && existing.origin == CapabilityOrigin::Remote =>
            {
                let namespaced = format!("{REMOTE_NAMESPACE}{}", existing.name);
                if self.index.contains_key(&namespaced) {
                    return Err(CapabilityError::Collision(namespaced));
                }

                let mut displaced = existing.clone();
                displaced.name = namespaced;
                debug!(
                    name = %descriptor.name,
                    renamed = %displaced.name,
                    "Remote capability moved to namespace"
                );
                self.entries[slot] = descriptor;
                self.index.insert(displaced.name.clone(), self.entries.len());
                self.entries.push(displaced);
                return Ok(());
            }
            _ => {}
        }

        warn!(
            name = %descriptor.name,
            replaced = %existing.origin,
            by = %descriptor.origin,
            "Capability name collision, later definition wins"
        );
        self.entries[slot] = descriptor;
        Ok(())
    }

    /// Invoke a capability by name.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<String, CapabilityError> {
        let descriptor = self
            .get(name)
            .ok_or_else(|| CapabilityError::NotFound(name.to_string()))?;

        debug!(name, origin = %descriptor.origin, "Invoking capability");
        descriptor.invoke(arguments).await
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names in registry order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per capability: name, origin, description.
    pub fn describe(&self) -> String {
        let width = self.entries.iter().map(|d| d.name.len()).max().unwrap_or(0);
        self.entries
            .iter()
            .map(|d| format!("{:<width$}  {:<6}  {}", d.name, d.origin, d.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, SharedCapability};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Echo(&'static str);

    #[async_trait]
    impl Capability for Echo {
        async fn invoke(&self, _arguments: Value) -> Result<String, CapabilityError> {
            Ok(self.0.to_string())
        }
    }

    fn descriptor(name: &str, origin: CapabilityOrigin, reply: &'static str) -> CapabilityDescriptor {
        let capability: SharedCapability = Arc::new(Echo(reply));
        CapabilityDescriptor::new(name, origin, format!("{name} ({origin})"), capability)
    }

    fn remote() -> Vec<CapabilityDescriptor> {
        vec![
            descriptor("search", CapabilityOrigin::Remote, "remote search"),
            descriptor("fetch", CapabilityOrigin::Remote, "remote fetch"),
        ]
    }

    fn local() -> Vec<CapabilityDescriptor> {
        vec![
            descriptor("save_definition", CapabilityOrigin::Local, "saved"),
            descriptor("search", CapabilityOrigin::Local, "local search"),
        ]
    }

    fn snapshot(registry: &CapabilityRegistry) -> Vec<(String, CapabilityOrigin)> {
        registry
            .iter()
            .map(|d| (d.name.clone(), d.origin))
            .collect()
    }

    #[tokio::test]
    async fn local_overrides_remote_with_same_name() {
        let registry =
            CapabilityRegistry::merge(remote(), local(), CollisionPolicy::Override).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["search", "fetch", "save_definition"]);
        assert_eq!(registry.get("search").unwrap().origin, CapabilityOrigin::Local);
        assert_eq!(
            registry.invoke("search", Value::Null).await.unwrap(),
            "local search"
        );
    }

    #[test]
    fn merge_is_deterministic() {
        let first = CapabilityRegistry::merge(remote(), local(), CollisionPolicy::Override).unwrap();
        for _ in 0..10 {
            let again =
                CapabilityRegistry::merge(remote(), local(), CollisionPolicy::Override).unwrap();
            assert_eq!(snapshot(&first), snapshot(&again));
        }
    }

    #[test]
    fn reject_policy_errors_on_cross_origin_collision() {
        let err = CapabilityRegistry::merge(remote(), local(), CollisionPolicy::Reject).unwrap_err();
        assert!(matches!(err, CapabilityError::Collision(name) if name == "search"));
    }

    #[tokio::test]
    async fn namespace_policy_keeps_both() {
        let registry =
            CapabilityRegistry::merge(remote(), local(), CollisionPolicy::Namespace).unwrap();

        assert_eq!(
            registry.names(),
            vec!["search", "fetch", "save_definition", "remote.search"]
        );
        assert_eq!(registry.get("search").unwrap().origin, CapabilityOrigin::Local);
        assert_eq!(
            registry.invoke("remote.search", Value::Null).await.unwrap(),
            "remote search"
        );
    }

    #[test]
    fn namespace_policy_never_drops_a_taken_namespaced_name() {
        let remote = vec![descriptor("search", CapabilityOrigin::Remote, "remote search")];
        let local = vec![
            descriptor("remote.search", CapabilityOrigin::Local, "local namespaced"),
            descriptor("search", CapabilityOrigin::Local, "local search"),
        ];

        let err = CapabilityRegistry::merge(remote, local, CollisionPolicy::Namespace).unwrap_err();
        assert!(matches!(err, CapabilityError::Collision(name) if name == "remote.search"));
    }

    #[tokio::test]
    async fn unknown_name_is_not_found() {
        let registry = CapabilityRegistry::merge(vec![], local(), CollisionPolicy::Override).unwrap();
        let err = registry.invoke("search_web", Value::Null).await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound(name) if name == "search_web"));
    }

    #[test]
    fn empty_remote_set_is_fine() {
        let registry = CapabilityRegistry::merge(vec![], vec![], CollisionPolicy::Override).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.describe(), "");
    }

    #[test]
    fn describe_lists_origin() {
        let registry = CapabilityRegistry::merge(remote(), vec![], CollisionPolicy::Override).unwrap();
        let text = registry.describe();
        assert!(text.contains("search  remote  search (remote)"));
        assert_eq!(text.lines().count(), 2);
    }
}
