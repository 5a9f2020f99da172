//! Site parameters set through the operator's configuration options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::result::Result;

/// Option keys recognised by [`SiteConfig`].
pub const OPTION_KEYS: &[&str] = &[
    "mcc",
    "mnc",
    "tac",
    "cell-id",
    "id-length",
    "band",
    "sst",
    "sd",
    "gnb-address",
    "bind-address",
];

/// Radio site parameters for the simulated gNB.
///
/// Values are kept as the raw option strings. Typed validation happens when
/// the configuration document is rendered, so a bad value becomes a blocked
/// status rather than a parse failure here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SiteConfig {
    /// Mobile Country Code.
    pub mcc: String,
    /// Mobile Network Code.
    pub mnc: String,
    /// Tracking Area Code, hexadecimal.
    pub tac: String,
    /// NR Cell Identity, hexadecimal.
    pub cell_id: String,
    /// Length of the gNB identifier in bits.
    pub id_length: String,
    /// NR operating band.
    pub band: String,
    /// Slice/Service Type.
    pub sst: String,
    /// Slice Differentiator, hexadecimal.
    pub sd: Option<String>,
    /// Address and prefix of the N3 (GTP) interface.
    pub gnb_address: String,
    /// Bind address for the radio link and NGAP; the unit address when unset.
    pub bind_address: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            mcc: "001".to_string(),
            mnc: "01".to_string(),
            tac: "1".to_string(),
            cell_id: "0x000000010".to_string(),
            id_length: "32".to_string(),
            band: "78".to_string(),
            sst: "1".to_string(),
            sd: Some("102030".to_string()),
            gnb_address: "192.168.251.5/24".to_string(),
            bind_address: None,
        }
    }
}

impl SiteConfig {
    /// Build a site config from option key/values layered over the defaults.
    ///
    /// Unknown keys are logged and skipped; options for other features of the
    /// orchestrator model must not block the radio.
    pub fn from_options(options: &BTreeMap<String, String>) -> Self {
        options
            .iter()
            .fold(Self::default(), |site, (key, value)| {
                match site.clone().with_option(key, value) {
                    Ok(updated) => updated,
                    Err(e) => {
                        warn!(error = %e, "Ignoring option");
                        site
                    }
                }
            })
    }

    /// Set a single option by its key.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownOption` if `key` is not in [`OPTION_KEYS`].
    pub fn with_option(mut self, key: &str, value: &str) -> Result<Self> {
        let value = value.trim().to_string();
        match key {
            "mcc" => self.mcc = value,
            "mnc" => self.mnc = value,
            "tac" => self.tac = value,
            "cell-id" => self.cell_id = value,
            "id-length" => self.id_length = value,
            "band" => self.band = value,
            "sst" => self.sst = value,
            "sd" => self.sd = non_empty(value),
            "gnb-address" => self.gnb_address = value,
            "bind-address" => self.bind_address = non_empty(value),
            other => return Err(Error::unknown_option(other)),
        }
        Ok(self)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Parse a hexadecimal option value with an optional `0x` prefix.
///
/// Returns `None` for empty or non-hexadecimal input.
pub fn parse_hex(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.is_empty() || digits.len() > 16 {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
