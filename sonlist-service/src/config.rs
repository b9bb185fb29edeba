//! Service configuration, read from the `[service]` table of a TOML file.

use serde::{Deserialize, Serialize};
use sonlist_crypto::HashParams;
use sonlist_permissions::PermissionEvaluator;
use sonlist_types::fields::{DEFAULT_ADMIN_IDENTITY, DEFAULT_ANONYMOUS_IDENTITY};
use std::path::Path;
use tracing::{info, warn};

/// Runtime settings for the item service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Collection holding lists and items.
    pub collection: String,
    /// Identity allowed everything.
    pub admin_identity: String,
    /// Identity of callers that did not authenticate.
    pub anonymous_identity: String,
    /// Cost parameters for hashed fields.
    pub hash: HashParams,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            collection: "items".to_string(),
            admin_identity: DEFAULT_ADMIN_IDENTITY.to_string(),
            anonymous_identity: DEFAULT_ANONYMOUS_IDENTITY.to_string(),
            hash: HashParams::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    service: ServiceConfig,
}

impl ServiceConfig {
    /// Parses the `[service]` table of a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<ConfigFile>(contents).map(|file| file.service)
    }

    /// Loads configuration from `path`.
    /// Falls back to defaults with a warning if the file is missing or invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml(&contents) {
                Ok(config) => {
                    info!("Loaded service config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!(
                        "Failed to parse config file {:?}: {}. Falling back to defaults.",
                        path, e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// The permission evaluator for the configured identities.
    pub fn evaluator(&self) -> PermissionEvaluator {
        PermissionEvaluator::new(&self.admin_identity, &self.anonymous_identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config = ServiceConfig::from_toml(
            r#"
            [service]
            admin_identity = "root"

            [service.hash]
            time_cost = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.admin_identity, "root");
        assert_eq!(config.collection, "items");
        assert_eq!(config.hash.time_cost, 3);
        assert_eq!(config.hash.memory_cost, HashParams::default().memory_cost);
    }

    #[test]
    fn missing_table_is_default() {
        assert_eq!(ServiceConfig::from_toml("").unwrap(), ServiceConfig::default());
    }
}
