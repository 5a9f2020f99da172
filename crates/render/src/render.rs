//! Renders the UERANSIM gNB configuration.

use gnb_core::{CoreEndpoint, SiteConfig, Transport, ValidationError};
use serde::Serialize;

use crate::document::ConfigDocument;
use crate::validate::{ValidatedSite, validate_endpoint, validate_site};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GnbDocument<'a> {
    mcc: &'a str,
    mnc: &'a str,
    nci: String,
    id_length: u8,
    tac: u32,
    band: u16,
    link_ip: String,
    ngap_ip: String,
    gtp_ip: String,
    amf_configs: Vec<AmfConfig<'a>>,
    slices: Vec<Slice>,
    ignore_stream_ids: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AmfConfig<'a> {
    address: &'a str,
    port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    transport: Option<Transport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sctp_streams: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tls_server_name: Option<&'a str>,
}

#[derive(Serialize)]
struct Slice {
    sst: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    sd: Option<u32>,
}

/// Turns site options and an AMF endpoint into a configuration document.
#[derive(Debug, Clone)]
pub struct Renderer {
    unit_address: String,
}

impl Renderer {
    /// `unit_address` is the link/NGAP bind address used when the site
    /// options do not set `bind-address`.
    pub fn new(unit_address: impl Into<String>) -> Self {
        Self {
            unit_address: unit_address.into(),
        }
    }

    /// Validate the site options alone.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate_site(&self, site: &SiteConfig) -> Result<ValidatedSite, Vec<ValidationError>> {
        validate_site(site, &self.unit_address)
    }

    /// Render the document for `site` and `endpoint`.
    ///
    /// Identical inputs always produce byte-identical output.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` in option order, then endpoint
    /// errors.
    pub fn render(
        &self,
        site: &SiteConfig,
        endpoint: &CoreEndpoint,
    ) -> Result<ConfigDocument, ValidationError> {
        let site = self
            .validate_site(site)
            .map_err(|errors| errors.into_iter().next().unwrap_or_else(unknown))?;
        validate_endpoint(endpoint)?;

        let security = endpoint.security.as_ref();
        let document = GnbDocument {
            mcc: &site.mcc,
            mnc: &site.mnc,
            nci: format!("{:#011x}", site.nci),
            id_length: site.id_length,
            tac: site.tac,
            band: site.band,
            link_ip: site.bind_ip.to_string(),
            ngap_ip: site.bind_ip.to_string(),
            gtp_ip: site.gtp_ip.to_string(),
            amf_configs: vec![AmfConfig {
                address: &endpoint.host,
                port: endpoint.port,
                transport: security.map(|s| s.transport),
                sctp_streams: security.and_then(|s| s.sctp_streams),
                tls_server_name: security.and_then(|s| s.tls_server_name.as_deref()),
            }],
            slices: vec![Slice {
                sst: site.sst,
                sd: site.sd,
            }],
            ignore_stream_ids: true,
        };

        serde_yaml::to_string(&document)
            .map(ConfigDocument::new)
            .map_err(|e| ValidationError::new("document", e.to_string()))
    }
}

fn unknown() -> ValidationError {
    ValidationError::new("site", "invalid")
}
