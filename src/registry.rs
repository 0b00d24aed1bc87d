//! In-memory index of registered containers.
//!
//! The index is keyed both ways: by runtime id (the key lifecycle events
//! carry) and by logical name (the key the hosts file is built from). The
//! name map stores the owning id rather than a second copy of the record,
//! so the two maps cannot drift apart.

use std::collections::BTreeMap;

use crate::record::ContainerRecord;

/// One hosts-file line worth of data: a container name on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    /// Address assigned on the network.
    pub address: String,
    /// Container name.
    pub name: String,
    /// Network name.
    pub network: String,
}

/// What [`HostRegistry::register`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The record was inserted into both maps.
    Registered,
    /// Another container already owns the name; the record was not stored.
    DuplicateName,
    /// The record has no addressed networks; the record was not stored.
    NoNetworks,
}

/// Bidirectional index of currently-registered containers.
///
/// Invariants:
///
/// - names are unique: a later container claiming a registered name is
///   rejected, never overwriting the earlier one;
/// - every stored record has at least one addressed network;
/// - the id map and the name map always describe the same set of records.
///
/// The registry does no I/O; callers persist a [`snapshot`](Self::snapshot)
/// after mutating.
#[derive(Debug, Default)]
pub struct HostRegistry {
    by_id: BTreeMap<String, ContainerRecord>,
    by_name: BTreeMap<String, String>,
}

impl HostRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under both its id and its name.
    ///
    /// Rejections are reported, not raised: a duplicate name or an empty
    /// network set leaves the registry unchanged and returns the matching
    /// [`RegisterOutcome`]. Both are routine: compose stacks reuse names
    /// quickly, and host-networking containers have no attachments at all.
    pub fn register(&mut self, record: ContainerRecord) -> RegisterOutcome {
        if let Some(owner) = self.by_name.get(record.name()) {
            tracing::warn!(
                name = %record.name(),
                id = %record.id(),
                registered_to = %owner,
                "name already registered, skipping"
            );
            return RegisterOutcome::DuplicateName;
        }

        if !record.has_networks() {
            tracing::warn!(
                name = %record.name(),
                id = %record.id(),
                "container has no addressed networks, skipping"
            );
            return RegisterOutcome::NoNetworks;
        }

        for (network, address) in record.networks() {
            tracing::info!(
                name = %record.name(),
                network = %network,
                address = %address,
                "registering container network"
            );
        }

        self.by_name
            .insert(record.name().to_string(), record.id().to_string());
        self.by_id.insert(record.id().to_string(), record);
        RegisterOutcome::Registered
    }

    /// Removes the record keyed by `id` from both maps.
    ///
    /// Returns the evicted record, or `None` if the id was never
    /// registered, which is expected for containers that had no network at
    /// start time and for duplicate-name rejects.
    pub fn unregister(&mut self, id: &str) -> Option<ContainerRecord> {
        let Some(record) = self.by_id.remove(id) else {
            tracing::debug!(id = %id, "unregister for unknown container, skipping");
            return None;
        };

        // The name map always points at the id that won registration, which
        // is exactly the record we just removed.
        self.by_name.remove(record.name());
        tracing::info!(
            name = %record.name(),
            id = %id,
            "unregistered all entries for container"
        );
        Some(record)
    }

    /// Looks up a record by runtime id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ContainerRecord> {
        self.by_id.get(id)
    }

    /// Looks up a record by logical name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&ContainerRecord> {
        self.by_id.get(self.by_name.get(name)?)
    }

    /// Returns `true` if `name` is currently registered.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no containers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Point-in-time view of every `(address, name, network)` triple.
    ///
    /// The returned entries are detached from the registry, so rendering
    /// can never observe a half-applied mutation.
    #[must_use]
    pub fn snapshot(&self) -> Vec<HostEntry> {
        let mut entries = Vec::new();
        for record in self.by_id.values() {
            for (network, address) in record.networks() {
                entries.push(HostEntry {
                    address: address.to_string(),
                    name: record.name().to_string(),
                    network: network.to_string(),
                });
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web() -> ContainerRecord {
        ContainerRecord::new("c1", "/web", [("app".to_string(), "10.0.0.2".to_string())])
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = HostRegistry::new();
        assert_eq!(registry.register(web()), RegisterOutcome::Registered);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("c1").unwrap().name(), "web");
        assert_eq!(registry.get_by_name("web").unwrap().id(), "c1");
    }

    #[test]
    fn duplicate_name_keeps_first_record() {
        let mut registry = HostRegistry::new();
        registry.register(web());

        let imposter =
            ContainerRecord::new("c2", "/web", [("app".to_string(), "10.0.0.9".to_string())]);
        assert_eq!(
            registry.register(imposter),
            RegisterOutcome::DuplicateName
        );

        // First registration untouched.
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_by_name("web").unwrap().id(), "c1");
        assert!(registry.get("c2").is_none());
    }

    #[test]
    fn no_networks_is_rejected() {
        let mut registry = HostRegistry::new();
        let record = ContainerRecord::new("c1", "/web", []);
        assert_eq!(registry.register(record), RegisterOutcome::NoNetworks);
        assert!(registry.is_empty());
    }

    #[test]
    fn empty_addresses_are_rejected() {
        let mut registry = HostRegistry::new();
        let record = ContainerRecord::new("c1", "/web", [("app".to_string(), String::new())]);
        assert_eq!(registry.register(record), RegisterOutcome::NoNetworks);
        assert!(registry.is_empty());
    }

    #[test]
    fn reregistering_same_id_is_a_noop() {
        let mut registry = HostRegistry::new();
        registry.register(web());
        assert_eq!(registry.register(web()), RegisterOutcome::DuplicateName);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("c1").unwrap(), &web());
    }

    #[test]
    fn unregister_clears_both_maps() {
        let mut registry = HostRegistry::new();
        registry.register(web());

        let removed = registry.unregister("c1").unwrap();
        assert_eq!(removed.name(), "web");
        assert!(registry.get("c1").is_none());
        assert!(!registry.contains_name("web"));
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_unknown_id_is_a_noop() {
        let mut registry = HostRegistry::new();
        registry.register(web());

        assert!(registry.unregister("c999").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_reject_does_not_free_the_name_on_death() {
        let mut registry = HostRegistry::new();
        registry.register(web());

        let imposter =
            ContainerRecord::new("c2", "/web", [("app".to_string(), "10.0.0.9".to_string())]);
        registry.register(imposter);

        // The imposter dies; the winner keeps its name.
        assert!(registry.unregister("c2").is_none());
        assert_eq!(registry.get_by_name("web").unwrap().id(), "c1");
    }

    #[test]
    fn snapshot_lists_every_network() {
        let mut registry = HostRegistry::new();
        registry.register(ContainerRecord::new(
            "c1",
            "/web",
            [
                ("app".to_string(), "10.0.0.2".to_string()),
                ("backend".to_string(), "10.1.0.2".to_string()),
            ],
        ));
        registry.register(ContainerRecord::new(
            "c2",
            "/db",
            [("app".to_string(), "10.0.0.3".to_string())],
        ));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.contains(&HostEntry {
            address: "10.1.0.2".to_string(),
            name: "web".to_string(),
            network: "backend".to_string(),
        }));
    }

    #[test]
    fn snapshot_is_detached() {
        let mut registry = HostRegistry::new();
        registry.register(web());

        let snapshot = registry.snapshot();
        registry.unregister("c1");
        assert_eq!(snapshot.len(), 1);
    }
}
