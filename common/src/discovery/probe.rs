use std::net::IpAddr;

use crate::error::RecordError;

use super::record::{DiscoveryRecord, keys};

const ONVIF_SCOPE_PREFIX: &str = "onvif://www.onvif.org/";

/// Normalized snapshot of one discovery answer.
///
/// The endpoint address is the registry key and is never empty. The metadata version
/// is carried for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeData {
    pub endpoint_address: String,
    pub types: Vec<String>,
    pub device_ip: String,
    pub device_service_address: String,
    pub scopes: String,
    pub metadata_version: String,
}

impl ProbeData {
    pub fn new(
        endpoint_address: impl Into<String>,
        device_service_address: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_address: endpoint_address.into(),
            device_service_address: device_service_address.into(),
            ..Self::default()
        }
    }

    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = scopes.into();
        self
    }

    /// Parsed device IP, if the discoverer reported a valid one.
    pub fn ip(&self) -> Option<IpAddr> {
        self.device_ip.parse().ok()
    }

    /// Individual scope URIs, in advertised order.
    pub fn scope_uris(&self) -> impl Iterator<Item = &str> {
        self.scopes.split_whitespace()
    }

    /// First value advertised for an ONVIF scope category such as `name` or `location`.
    pub fn scope(&self, category: &str) -> Option<String> {
        self.scope_uris().find_map(|uri| {
            let rest = uri.strip_prefix(ONVIF_SCOPE_PREFIX)?;
            let value = rest.strip_prefix(category)?.strip_prefix('/')?;
            Some(decode_scope_value(value))
        })
    }
}

impl TryFrom<&DiscoveryRecord> for ProbeData {
    type Error = RecordError;

    fn try_from(record: &DiscoveryRecord) -> Result<Self, Self::Error> {
        let endpoint_address = record.value(keys::ENDPOINT_ADDRESS).trim();
        if endpoint_address.is_empty() {
            return Err(RecordError::MissingEndpoint);
        }

        Ok(Self {
            endpoint_address: endpoint_address.to_string(),
            types: record
                .value(keys::TYPES)
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            device_ip: record.value(keys::DEVICE_IP).trim().to_string(),
            device_service_address: record.value(keys::DEVICE_SERVICE_ADDRESS).trim().to_string(),
            scopes: record.value(keys::SCOPES).to_string(),
            metadata_version: record.value(keys::METADATA_VERSION).trim().to_string(),
        })
    }
}

/// Percent-decodes a scope value. Malformed escapes are kept as written and invalid
/// UTF-8 is replaced.
fn decode_scope_value(value: &str) -> String {
    let bytes = urlencoding::decode_binary(value.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}
