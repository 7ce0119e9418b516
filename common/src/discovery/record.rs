use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Field names used by discoverers when reporting a responding device.
pub mod keys {
    pub const ENDPOINT_ADDRESS: &str = "ep_address";
    pub const TYPES: &str = "types";
    pub const DEVICE_IP: &str = "device_ip";
    pub const DEVICE_SERVICE_ADDRESS: &str = "device_service_address";
    pub const SCOPES: &str = "scopes";
    pub const METADATA_VERSION: &str = "metadata_version";
}

/// Raw key-value record exactly as a discoverer reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscoveryRecord(HashMap<String, String>);

impl DiscoveryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value for `key`, or an empty string when the field is absent.
    pub fn value(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DiscoveryRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
