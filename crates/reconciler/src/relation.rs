//! Latest relation data received from and sent to peer units.

use std::collections::BTreeMap;

use gnb_core::{CoreEndpoint, GnbIdentity, ResultExt};
use tracing::{debug, info};

/// How a relation update affected the AMF endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSet {
    Unchanged,
    /// Only keys that do not define the endpoint changed.
    Cosmetic,
    /// Host, port or security parameters changed.
    Material,
    /// A previously known endpoint is gone.
    Cleared,
}

impl ChangeSet {
    /// Whether the rendered configuration may differ.
    #[must_use]
    pub const fn is_material(self) -> bool {
        matches!(self, Self::Material | Self::Cleared)
    }
}

/// Tracks the `fiveg-n2` endpoint and the identity last advertised.
///
/// The tracker is the only owner of the current [`CoreEndpoint`]; everything
/// else reads it through [`current`](Self::current).
#[derive(Debug, Clone, Default)]
pub struct RelationStateTracker {
    joined: bool,
    raw: BTreeMap<String, String>,
    endpoint: Option<CoreEndpoint>,
    advertised: Option<GnbIdentity>,
}

impl RelationStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the AMF relation exists, before any data arrives.
    pub fn joined(&mut self) -> ChangeSet {
        if self.joined {
            return ChangeSet::Unchanged;
        }
        self.joined = true;
        ChangeSet::Cosmetic
    }

    /// Take in the peer's full data bag.
    ///
    /// Data that does not describe a usable endpoint is logged and treated as
    /// no endpoint at all.
    pub fn update(&mut self, data: BTreeMap<String, String>) -> ChangeSet {
        self.joined = true;
        let parsed = CoreEndpoint::from_relation_data(&data)
            .into_option_logged("Reading AMF endpoint from relation data");

        let change = match (&self.endpoint, &parsed) {
            (Some(_), None) => ChangeSet::Cleared,
            (None, Some(_)) => ChangeSet::Material,
            (Some(old), Some(new)) if old != new => ChangeSet::Material,
            _ if data != self.raw => ChangeSet::Cosmetic,
            _ => ChangeSet::Unchanged,
        };

        match (&parsed, change) {
            (Some(endpoint), ChangeSet::Material) => info!(%endpoint, "AMF endpoint updated"),
            (None, ChangeSet::Cleared) => info!("AMF endpoint withdrawn"),
            (_, change) => debug!(?change, "Relation data received"),
        }

        self.raw = data;
        self.endpoint = parsed;
        change
    }

    /// The relation is gone; forget everything it carried.
    pub fn broken(&mut self) -> ChangeSet {
        self.joined = false;
        self.raw.clear();
        match self.endpoint.take() {
            Some(endpoint) => {
                info!(%endpoint, "AMF relation broken");
                ChangeSet::Cleared
            }
            None => ChangeSet::Unchanged,
        }
    }

    #[must_use]
    pub const fn current(&self) -> Option<&CoreEndpoint> {
        self.endpoint.as_ref()
    }

    #[must_use]
    pub const fn is_joined(&self) -> bool {
        self.joined
    }

    /// Record the identity being published. Returns whether it changed.
    pub fn advertise(&mut self, identity: GnbIdentity) -> bool {
        if self.advertised.as_ref() == Some(&identity) {
            return false;
        }
        self.advertised = Some(identity);
        true
    }

    /// The identity relation went away; the next peer needs a fresh publish.
    pub fn forget_advertised(&mut self) {
        self.advertised = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn first_usable_data_is_material() {
        let mut tracker = RelationStateTracker::new();
        assert_eq!(tracker.joined(), ChangeSet::Cosmetic);
        assert!(tracker.current().is_none());

        let change = tracker.update(data(&[("host", "amf"), ("port", "38412")]));
        assert_eq!(change, ChangeSet::Material);
        assert_eq!(tracker.current(), Some(&CoreEndpoint::new("amf", 38412)));
    }

    #[test]
    fn cosmetic_keys_do_not_touch_the_endpoint() {
        let mut tracker = RelationStateTracker::new();
        tracker.update(data(&[("host", "amf"), ("port", "38412")]));

        let change = tracker.update(data(&[
            ("host", "amf"),
            ("port", "38412"),
            ("amf_ip_address", "10.0.0.9"),
        ]));
        assert_eq!(change, ChangeSet::Cosmetic);
        assert!(!change.is_material());

        let again = tracker.update(data(&[
            ("host", "amf"),
            ("port", "38412"),
            ("amf_ip_address", "10.0.0.9"),
        ]));
        assert_eq!(again, ChangeSet::Unchanged);
    }

    #[test]
    fn port_change_is_material() {
        let mut tracker = RelationStateTracker::new();
        tracker.update(data(&[("host", "amf"), ("port", "38412")]));
        let change = tracker.update(data(&[("amf_hostname", "amf"), ("amf_port", "38413")]));
        assert_eq!(change, ChangeSet::Material);
    }

    #[test]
    fn malformed_data_clears_a_known_endpoint() {
        let mut tracker = RelationStateTracker::new();
        tracker.update(data(&[("host", "amf"), ("port", "38412")]));
        let change = tracker.update(data(&[("host", "amf"), ("port", "zero")]));
        assert_eq!(change, ChangeSet::Cleared);
        assert!(tracker.current().is_none());
        assert!(tracker.is_joined());
    }

    #[test]
    fn broken_relation_clears_endpoint() {
        let mut tracker = RelationStateTracker::new();
        tracker.update(data(&[("host", "amf"), ("port", "38412")]));
        assert_eq!(tracker.broken(), ChangeSet::Cleared);
        assert_eq!(tracker.broken(), ChangeSet::Unchanged);
        assert!(!tracker.is_joined());
    }

    #[test]
    fn advertise_reports_changes_only() {
        let mut tracker = RelationStateTracker::new();
        let identity = GnbIdentity::for_unit("ran", "gnb", 1);
        assert!(tracker.advertise(identity.clone()));
        assert!(!tracker.advertise(identity.clone()));
        assert!(tracker.advertise(GnbIdentity::for_unit("ran", "gnb", 2)));

        tracker.forget_advertised();
        assert!(tracker.advertise(identity));
    }
}
