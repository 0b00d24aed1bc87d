//! Container descriptors.

use std::collections::BTreeMap;

/// Immutable description of a running container's network identity.
///
/// Built once from a runtime inspect response and never patched: a changed
/// network set is represented by unregistering the old record and
/// registering a new one.
///
/// # Example
///
/// ```
/// use dnsthing::ContainerRecord;
///
/// let record = ContainerRecord::new(
///     "c1",
///     "/web",
///     [("app".to_string(), "10.0.0.2".to_string())],
/// );
///
/// assert_eq!(record.name(), "web");
/// assert!(record.has_networks());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    id: String,
    name: String,
    networks: BTreeMap<String, String>,
}

impl ContainerRecord {
    /// Creates a record from runtime-supplied fields.
    ///
    /// The leading `/` Docker reports on container names is stripped, and
    /// network attachments with an empty address ("not yet assigned") are
    /// dropped. A record may come out with zero networks; the registry
    /// refuses to store such a record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        networks: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let name = name.into();
        let name = name.strip_prefix('/').unwrap_or(&name).to_string();

        Self {
            id: id.into(),
            name,
            networks: networks
                .into_iter()
                .filter(|(_, address)| !address.is_empty())
                .collect(),
        }
    }

    /// Runtime-assigned container id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Logical container name, without the leading path separator.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates over `(network, address)` attachments in network-name order.
    pub fn networks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.networks
            .iter()
            .map(|(network, address)| (network.as_str(), address.as_str()))
    }

    /// Returns `true` if at least one network has an assigned address.
    #[must_use]
    pub fn has_networks(&self) -> bool {
        !self.networks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_slash() {
        let r = ContainerRecord::new("c1", "/web", []);
        assert_eq!(r.name(), "web");
    }

    #[test]
    fn plain_name_kept() {
        let r = ContainerRecord::new("c1", "web", []);
        assert_eq!(r.name(), "web");
    }

    #[test]
    fn drops_unassigned_addresses() {
        let r = ContainerRecord::new(
            "c1",
            "web",
            [
                ("app".to_string(), "10.0.0.2".to_string()),
                ("pending".to_string(), String::new()),
            ],
        );

        let networks: Vec<_> = r.networks().collect();
        assert_eq!(networks, vec![("app", "10.0.0.2")]);
        assert!(r.has_networks());
    }

    #[test]
    fn all_addresses_empty_means_no_networks() {
        let r = ContainerRecord::new("c1", "web", [("app".to_string(), String::new())]);
        assert!(!r.has_networks());
    }
}
