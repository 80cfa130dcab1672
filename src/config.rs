use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::core::PolicyError;
use crate::models::{MatchConstraints, ScoringPolicy, Urgency};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    /// Largest accepted JSON body, in bytes
    #[serde(default = "default_json_limit")]
    pub json_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            json_limit_bytes: default_json_limit(),
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_json_limit() -> usize { 8 * 1024 * 1024 }

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
    pub cache_capacity: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_geocoding_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: None,
            cache_capacity: None,
            cache_ttl_secs: None,
        }
    }
}

fn default_true() -> bool { true }
fn default_geocoding_endpoint() -> String { "https://nominatim.openstreetmap.org".to_string() }
fn default_user_agent() -> String { format!("donor-match/{}", env!("CARGO_PKG_VERSION")) }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_proximity_decay_km")]
    pub proximity_decay_km: f64,
    pub max_distance_km: Option<f64>,
    pub min_donation_interval_days: Option<u32>,
    /// Urgency level name to flat score bonus
    #[serde(default = "default_urgency_bonus")]
    pub urgency_bonus: HashMap<String, f64>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            proximity_decay_km: default_proximity_decay_km(),
            max_distance_km: None,
            min_donation_interval_days: None,
            urgency_bonus: default_urgency_bonus(),
        }
    }
}

fn default_proximity_decay_km() -> f64 { 100.0 }

fn default_urgency_bonus() -> HashMap<String, f64> {
    HashMap::from([
        ("normal".to_string(), 20.0),
        ("high".to_string(), 50.0),
        ("critical".to_string(), 80.0),
    ])
}

impl MatchingSettings {
    /// Build and validate the scoring policy
    pub fn scoring_policy(&self) -> Result<ScoringPolicy, PolicyError> {
        let mut urgency_bonus = BTreeMap::new();
        for (name, value) in &self.urgency_bonus {
            let urgency: Urgency = name
                .parse()
                .map_err(|_| PolicyError::UnknownUrgency(name.clone()))?;
            if urgency_bonus.insert(urgency, *value).is_some() {
                return Err(PolicyError::DuplicateUrgency(urgency));
            }
        }

        let policy = ScoringPolicy {
            proximity_decay_km: self.proximity_decay_km,
            urgency_bonus,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn constraints(&self) -> MatchConstraints {
        MatchConstraints {
            max_distance_km: self.max_distance_km,
            min_donation_interval_days: self.min_donation_interval_days,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Text,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with DONOR_MATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., DONOR_MATCH__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("DONOR_MATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
