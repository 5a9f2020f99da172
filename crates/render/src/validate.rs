//! Range and syntax checks for site options and the AMF endpoint.

use std::net::IpAddr;
use std::ops::RangeInclusive;

use gnb_core::endpoint::is_valid_host;
use gnb_core::site::parse_hex;
use gnb_core::{CoreEndpoint, SiteConfig, ValidationError};
use itertools::Itertools;

/// Tracking area codes are 24 bits; zero cannot be advertised.
pub const TAC_RANGE: RangeInclusive<u64> = 1..=0xFF_FFFF;
/// NR Cell Identity is 36 bits.
pub const NCI_RANGE: RangeInclusive<u64> = 1..=0xF_FFFF_FFFF;
/// gNB identifier length in bits.
pub const ID_LENGTH_RANGE: RangeInclusive<u64> = 22..=32;
/// `freqBandIndicatorNR`.
pub const BAND_RANGE: RangeInclusive<u64> = 1..=1024;
pub const SST_RANGE: RangeInclusive<u64> = 1..=255;
pub const SD_RANGE: RangeInclusive<u64> = 0..=0xFF_FFFF;

/// Site options after validation, in their typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSite {
    pub mcc: String,
    pub mnc: String,
    pub tac: u32,
    pub nci: u64,
    pub id_length: u8,
    pub band: u16,
    pub sst: u8,
    pub sd: Option<u32>,
    pub gtp_ip: IpAddr,
    pub bind_ip: IpAddr,
}

/// Validate every site option, collecting all violations.
///
/// `unit_address` is the bind address used when the site does not set one.
///
/// # Errors
///
/// Returns every `ValidationError` found, in option order.
pub fn validate_site(
    site: &SiteConfig,
    unit_address: &str,
) -> Result<ValidatedSite, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mcc = collect(&mut errors, digits("mcc", &site.mcc, 3..=3));
    let mnc = collect(&mut errors, digits("mnc", &site.mnc, 2..=3));
    let tac = collect(&mut errors, hex_in("tac", &site.tac, TAC_RANGE));
    let nci = collect(&mut errors, hex_in("cell-id", &site.cell_id, NCI_RANGE));
    let id_length = collect(&mut errors, decimal_in("id-length", &site.id_length, ID_LENGTH_RANGE));
    let band = collect(&mut errors, decimal_in("band", &site.band, BAND_RANGE));
    let sst = collect(&mut errors, decimal_in("sst", &site.sst, SST_RANGE));
    let sd = collect(
        &mut errors,
        site.sd
            .as_deref()
            .map(|sd| hex_in("sd", sd, SD_RANGE))
            .transpose(),
    );
    let gtp_ip = collect(&mut errors, cidr("gnb-address", &site.gnb_address));
    let bind_ip = collect(
        &mut errors,
        ip("bind-address", site.bind_address.as_deref().unwrap_or(unit_address)),
    );

    match (mcc, mnc, tac, nci, id_length, band, sst, sd, gtp_ip, bind_ip) {
        (
            Some(mcc),
            Some(mnc),
            Some(tac),
            Some(nci),
            Some(id_length),
            Some(band),
            Some(sst),
            Some(sd),
            Some(gtp_ip),
            Some(bind_ip),
        ) if errors.is_empty() => Ok(ValidatedSite {
            mcc,
            mnc,
            tac: narrow(tac),
            nci,
            id_length: narrow(id_length),
            band: narrow(band),
            sst: narrow(sst),
            sd: sd.map(narrow),
            gtp_ip,
            bind_ip,
        }),
        _ => Err(errors),
    }
}

/// Check that the endpoint is syntactically usable.
///
/// # Errors
///
/// Returns a `ValidationError` for `amf-host` or `amf-port`.
pub fn validate_endpoint(endpoint: &CoreEndpoint) -> Result<(), ValidationError> {
    if !is_valid_host(&endpoint.host) {
        return Err(ValidationError::new(
            "amf-host",
            format!("'{}' is not an IP address or hostname", endpoint.host),
        ));
    }
    if endpoint.port == 0 {
        return Err(ValidationError::new("amf-port", "must be in 1..=65535"));
    }
    Ok(())
}

/// One-line summary of validation errors for a status message.
pub fn summarize(errors: &[ValidationError]) -> String {
    errors.iter().join(", ")
}

fn collect<T>(errors: &mut Vec<ValidationError>, result: Result<T, ValidationError>) -> Option<T> {
    result.map_err(|e| errors.push(e)).ok()
}

// Values have already been range-checked against a range that fits `T`.
fn narrow<T: TryFrom<u64> + Default>(value: u64) -> T {
    T::try_from(value).unwrap_or_default()
}

fn digits(
    field: &str,
    value: &str,
    len: RangeInclusive<usize>,
) -> Result<String, ValidationError> {
    if len.contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit()) {
        return Ok(value.to_string());
    }
    let rule = if len.start() == len.end() {
        format!("must be exactly {} digits", len.start())
    } else {
        format!("must be {} to {} digits", len.start(), len.end())
    };
    Err(ValidationError::new(field, rule))
}

fn hex_in(field: &str, value: &str, range: RangeInclusive<u64>) -> Result<u64, ValidationError> {
    parse_hex(value)
        .filter(|v| range.contains(v))
        .ok_or_else(|| {
            ValidationError::new(
                field,
                format!("must be hexadecimal in {:#x}..={:#x}", range.start(), range.end()),
            )
        })
}

fn decimal_in(
    field: &str,
    value: &str,
    range: RangeInclusive<u64>,
) -> Result<u64, ValidationError> {
    value
        .parse::<u64>()
        .ok()
        .filter(|v| range.contains(v))
        .ok_or_else(|| {
            ValidationError::new(field, format!("must be an integer in {}..={}", range.start(), range.end()))
        })
}

fn ip(field: &str, value: &str) -> Result<IpAddr, ValidationError> {
    value
        .parse::<IpAddr>()
        .map_err(|_| ValidationError::new(field, format!("'{value}' is not an IP address")))
}

fn cidr(field: &str, value: &str) -> Result<IpAddr, ValidationError> {
    let invalid = || ValidationError::new(field, format!("'{value}' is not an address/prefix"));
    let (addr, prefix) = value.split_once('/').ok_or_else(invalid)?;
    let addr = addr.parse::<IpAddr>().map_err(|_| invalid())?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    prefix
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= max)
        .map(|_| addr)
        .ok_or_else(invalid)
}
