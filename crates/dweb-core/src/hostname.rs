//! Gateway hostname -> name-service hostname
//!
//! A gateway serves `vitalik.eth.limo`; the name service needs `vitalik.eth`.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, error, info};

use crate::{Error, Result};

/// Suffix replacement table, longest suffix first
#[derive(Debug, Clone, Default)]
pub struct HostnameSubstitution {
    rules: Vec<(String, String)>,
}

impl HostnameSubstitution {
    pub fn new(config: BTreeMap<String, String>) -> Self {
        let mut rules: Vec<(String, String)> = config.into_iter().collect();
        rules.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        info!(substitutions = ?rules, "hostname substitution initialized");
        Self { rules }
    }

    /// Replace the longest configured suffix of `host`, dropping any port
    ///
    /// Hosts without a matching suffix come back lowercased and without a
    /// port, like substituted ones.
    pub fn substitute(&self, host: &str) -> String {
        let hostname = host
            .split_once("://")
            .map_or(host, |(_, rest)| rest)
            .split(['/', ':'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        for (suffix, replacement) in &self.rules {
            if let Some(stem) = hostname.strip_suffix(suffix.as_str()) {
                let substituted = format!("{}{}", stem, replacement);
                debug!(hostname = %hostname, substituted = %substituted, "substituted hostname");
                return substituted;
            }
        }

        debug!(hostname = %hostname, "no substitution for hostname");
        hostname
    }
}

/// Parse a substitution table given as base64-encoded JSON or plain JSON
///
/// Entries whose value is not a string are logged and skipped.
pub fn parse_raw_config(raw: &str) -> Result<BTreeMap<String, String>> {
    let decoded = STANDARD
        .decode(raw.trim())
        .ok()
        .and_then(|bytes| serde_json::from_slice::<BTreeMap<String, serde_json::Value>>(&bytes).ok());

    let entries = match decoded {
        Some(entries) => entries,
        None => serde_json::from_str::<BTreeMap<String, serde_json::Value>>(raw)
            .map_err(|e| Error::InvalidHostnameSubstitution(e.to_string()))?,
    };

    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(s) => Some((key, s)),
            other => {
                error!(key = %key, value = %other, "invalid hostname substitution entry");
                None
            }
        })
        .collect())
}
