//! gNB identity advertised on the `fiveg_gnb_identity` relation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name and tracking area published to peers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GnbIdentity {
    pub gnb_name: String,
    pub tac: u32,
}

impl GnbIdentity {
    /// Derive the identity for a unit from its model and application names.
    pub fn for_unit(model: &str, application: &str, tac: u32) -> Self {
        Self {
            gnb_name: format!("{model}-ueransim-{application}"),
            tac,
        }
    }

    /// Relation data bag published for this identity.
    pub fn to_relation_data(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("gnb_name".to_string(), self.gnb_name.clone()),
            ("tac".to_string(), self.tac.to_string()),
        ])
    }
}
