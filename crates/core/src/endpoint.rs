//! AMF reachability learned from the `fiveg-n2` relation.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::error::RelationDataError;

/// Relation keys that carry the AMF host, primary name first.
pub const HOST_KEYS: &[&str] = &["host", "amf_hostname"];
/// Relation keys that carry the AMF port, primary name first.
pub const PORT_KEYS: &[&str] = &["port", "amf_port"];
/// Relation key carrying optional transport security parameters.
pub const SECURITY_KEY: &str = "security";

/// Transport used towards the AMF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    Sctp,
    Tls,
}

/// Optional TLS/SCTP parameters published by the AMF.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SecurityParams {
    pub transport: Transport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sctp_streams: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_server_name: Option<String>,
}

/// Where the gNB reaches its AMF.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoreEndpoint {
    pub host: String,
    pub port: u16,
    pub security: Option<SecurityParams>,
}

impl CoreEndpoint {
    /// Create an endpoint without security parameters.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            security: None,
        }
    }

    /// Attach security parameters.
    #[must_use]
    pub fn with_security(mut self, security: SecurityParams) -> Self {
        self.security = Some(security);
        self
    }

    /// Interpret raw relation data as an endpoint.
    ///
    /// # Errors
    ///
    /// Returns `RelationDataError` when host or port is missing or malformed,
    /// or when `security` is present but not a valid parameter object.
    pub fn from_relation_data(
        data: &BTreeMap<String, String>,
    ) -> Result<Self, RelationDataError> {
        let (host_key, host) = lookup(data, HOST_KEYS)?;
        if !is_valid_host(host) {
            return Err(RelationDataError::malformed(
                host_key,
                host,
                "not an IP address or hostname",
            ));
        }

        let (port_key, raw_port) = lookup(data, PORT_KEYS)?;
        let port = raw_port
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| {
                RelationDataError::malformed(port_key, raw_port, "expected a port in 1..=65535")
            })?;

        let security = data
            .get(SECURITY_KEY)
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                serde_json::from_str::<SecurityParams>(raw).map_err(|e| {
                    RelationDataError::malformed(SECURITY_KEY, raw.as_str(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            host: host.to_string(),
            port,
            security,
        })
    }
}

impl fmt::Display for CoreEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn lookup<'a>(
    data: &'a BTreeMap<String, String>,
    keys: &[&'static str],
) -> Result<(&'static str, &'a str), RelationDataError> {
    keys.iter()
        .find_map(|key| {
            data.get(*key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(|v| (*key, v))
        })
        .ok_or_else(|| RelationDataError::missing_key(keys.first().copied().unwrap_or("host")))
}

/// Whether `host` is an IP address or an RFC 1123 hostname.
pub fn is_valid_host(host: &str) -> bool {
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    let host = host.strip_suffix('.').unwrap_or(host);
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
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
    fn parses_primary_keys() {
        let endpoint = CoreEndpoint::from_relation_data(&data(&[("host", "amf"), ("port", "38412")]));
        assert_eq!(endpoint, Ok(CoreEndpoint::new("amf", 38412)));
    }

    #[test]
    fn parses_amf_prefixed_aliases() {
        let endpoint = CoreEndpoint::from_relation_data(&data(&[
            ("amf_hostname", "amf.core.svc"),
            ("amf_port", "38412"),
            ("amf_ip_address", "1.1.1.1"),
        ]));
        assert_eq!(endpoint, Ok(CoreEndpoint::new("amf.core.svc", 38412)));
    }

    #[test]
    fn missing_port_is_reported() {
        let err = CoreEndpoint::from_relation_data(&data(&[("host", "amf")]));
        assert_eq!(err, Err(RelationDataError::missing_key("port")));
    }

    #[test]
    fn zero_and_non_numeric_ports_are_malformed() {
        for port in ["0", "abc", "70000"] {
            let err = CoreEndpoint::from_relation_data(&data(&[("host", "amf"), ("port", port)]));
            assert!(matches!(err, Err(RelationDataError::Malformed { .. })), "{port}");
        }
    }

    #[test]
    fn security_parameters_are_parsed() {
        let endpoint = CoreEndpoint::from_relation_data(&data(&[
            ("host", "10.0.0.1"),
            ("port", "38412"),
            ("security", r#"{"transport":"sctp","sctp-streams":2}"#),
        ]));
        let expected = CoreEndpoint::new("10.0.0.1", 38412).with_security(SecurityParams {
            transport: Transport::Sctp,
            sctp_streams: Some(2),
            tls_server_name: None,
        });
        assert_eq!(endpoint, Ok(expected));
    }

    #[test]
    fn malformed_security_is_rejected() {
        let err = CoreEndpoint::from_relation_data(&data(&[
            ("host", "amf"),
            ("port", "38412"),
            ("security", "tls please"),
        ]));
        assert!(matches!(err, Err(RelationDataError::Malformed { key, .. }) if key == "security"));
    }

    #[test]
    fn host_syntax() {
        assert!(is_valid_host("amf"));
        assert!(is_valid_host("amf-0.amf-endpoints.core.svc.cluster.local"));
        assert!(is_valid_host("10.1.2.3"));
        assert!(is_valid_host("fd00::1"));
        assert!(!is_valid_host(""));
        assert!(!is_valid_host("-amf"));
        assert!(!is_valid_host("amf..core"));
        assert!(!is_valid_host("amf_core"));
        assert!(!is_valid_host(&"a".repeat(64)));
    }
}
