//! Migration settings.
//!
//! Settings are read once from a TOML file into a [`ZoneMigrationConfig`] and
//! handed to the engine by reference. Nothing reads them from process-wide
//! state.
//!
//! ```toml
//! clone_suffix = "-cloned"
//! on_malformed = "abort-batch"
//!
//! [intrazone]
//! zone = "intra"
//!
//! [intrazone.legacy_zones]
//! trust = "addr-trust"
//!
//! [eastwest]
//! trust_zone = "trust"
//! zone = "eastwest"
//! trust_subnets = ["10.1.1.0/24"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ipnetwork::IpNetwork;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CLONE_SUFFIX: &str = "-cloned";

/// What to do with a rule whose fields are not plain member lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedPolicy {
    /// Stop the whole run; the operator must commit or revert first.
    #[default]
    AbortBatch,
    /// Carry the rule through verbatim and record a review entry.
    SkipRule,
}

impl MalformedPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AbortBatch => "abort-batch",
            Self::SkipRule => "skip-rule",
        }
    }
}

/// Which transformation a config is being checked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPath {
    Intrazone,
    EastWest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntrazoneSettings {
    /// Name of the zone every legacy zone collapses into.
    #[serde(default)]
    pub zone: String,
    /// Legacy zone name -> address object/group covering that zone.
    #[serde(default)]
    pub legacy_zones: BTreeMap<String, String>,
}

impl IntrazoneSettings {
    /// Mapped address name for a legacy zone.
    pub fn legacy_zone_address(&self, zone: &str) -> Option<&str> {
        self.legacy_zones.get(zone).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EastWestSettings {
    /// Existing zone whose traffic is being split.
    #[serde(default)]
    pub trust_zone: String,
    /// New lateral zone name.
    #[serde(default)]
    pub zone: String,
    /// Networks considered inside the trust zone.
    #[serde(default)]
    pub trust_subnets: Vec<IpNetwork>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneMigrationConfig {
    #[serde(default)]
    pub intrazone: IntrazoneSettings,
    #[serde(default)]
    pub eastwest: EastWestSettings,
    #[serde(default = "default_clone_suffix")]
    pub clone_suffix: String,
    #[serde(default)]
    pub on_malformed: MalformedPolicy,
}

impl Default for ZoneMigrationConfig {
    fn default() -> Self {
        Self {
            intrazone: IntrazoneSettings::default(),
            eastwest: EastWestSettings::default(),
            clone_suffix: default_clone_suffix(),
            on_malformed: MalformedPolicy::default(),
        }
    }
}

fn default_clone_suffix() -> String {
    DEFAULT_CLONE_SUFFIX.to_string()
}

impl ZoneMigrationConfig {
    /// True when every trust subnet is a single host (/32 or /128).
    ///
    /// In this mode the operator is moving specific hosts, so rules matching
    /// `any` in the trust zone are not cloned.
    pub fn single_ip_mode(&self) -> bool {
        let subnets = &self.eastwest.trust_subnets;
        !subnets.is_empty() && subnets.iter().all(is_host_prefix)
    }

    /// Check that the settings needed by `path` are present and consistent.
    pub fn validate(&self, path: MigrationPath) -> Result<(), ConfigError> {
        match path {
            MigrationPath::Intrazone => self.validate_intrazone(),
            MigrationPath::EastWest => self.validate_eastwest(),
        }
    }

    fn validate_intrazone(&self) -> Result<(), ConfigError> {
        let settings = &self.intrazone;
        if settings.zone.trim().is_empty() {
            return Err(invalid("intrazone.zone must be set"));
        }
        if settings.legacy_zones.is_empty() {
            return Err(invalid("intrazone.legacy_zones must map at least one zone"));
        }
        if settings.legacy_zones.contains_key(&settings.zone) {
            return Err(invalid(format!(
                "intrazone.zone '{}' is also listed as a legacy zone",
                settings.zone
            )));
        }
        if let Some((zone, _)) = settings
            .legacy_zones
            .iter()
            .find(|(_, addr)| addr.trim().is_empty())
        {
            return Err(invalid(format!(
                "intrazone.legacy_zones.{zone} has an empty address name"
            )));
        }
        Ok(())
    }

    fn validate_eastwest(&self) -> Result<(), ConfigError> {
        let settings = &self.eastwest;
        if settings.trust_zone.trim().is_empty() {
            return Err(invalid("eastwest.trust_zone must be set"));
        }
        if settings.zone.trim().is_empty() {
            return Err(invalid("eastwest.zone must be set"));
        }
        if settings.zone == settings.trust_zone {
            return Err(invalid("eastwest.zone must differ from eastwest.trust_zone"));
        }
        if settings.trust_subnets.is_empty() {
            return Err(invalid("eastwest.trust_subnets must list at least one network"));
        }
        if self.clone_suffix.is_empty() {
            return Err(invalid("clone_suffix must not be empty"));
        }
        Ok(())
    }
}

fn is_host_prefix(net: &IpNetwork) -> bool {
    match net {
        IpNetwork::V4(v4) => v4.prefix() == 32,
        IpNetwork::V6(v6) => v6.prefix() == 128,
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

/// Errors returned when loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Load settings from a TOML file.
pub fn load_config(path: &Path) -> Result<ZoneMigrationConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_config(&raw, path.display().to_string())
}

/// Parse settings from TOML text; `origin` names the source in errors.
pub fn parse_config(raw: &str, origin: String) -> Result<ZoneMigrationConfig, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: origin,
        source,
    })
}
