//! Configuration loading for DroneWatch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::agent::Position;
use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the DroneWatch home directory (~/.dronewatch).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".dronewatch"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.dronewatch/settings.json
pub fn load_settings() -> Result<Settings> {
    let path = get_settings_path()?;

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}. Run 'dronewatch config --init' first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let settings = parse_settings(&content)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Parse and validate settings JSON.
pub fn parse_settings(content: &str) -> Result<Settings> {
    let settings: Settings = serde_json::from_str(content)?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.clock.tick_interval_ms == 0 {
        return Err(Error::Config(
            "clock.tick_interval_ms must be greater than zero".to_string(),
        ));
    }
    if !(settings.drone.initial_battery > 0.0) {
        return Err(Error::Config(format!(
            "drone.initial_battery must be positive, got {}",
            settings.drone.initial_battery
        )));
    }
    if !settings.contract_net.bid_factor.is_finite() {
        return Err(Error::Config("contract_net.bid_factor must be finite".to_string()));
    }
    Ok(())
}

/// Load settings or return default if not found.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

/// Write settings to ~/.dronewatch/settings.json
pub fn save_settings(settings: &Settings) -> Result<PathBuf> {
    let path = get_settings_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(settings)?)?;
    Ok(path)
}

/// Simulation clock configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ClockConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    100
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Contract-net configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ContractNetConfig {
    #[serde(default = "default_task_delay_ms")]
    pub task_delay_ms: u64,
    #[serde(default = "default_bid_factor")]
    pub bid_factor: f64,
}

fn default_task_delay_ms() -> u64 {
    2000
}

fn default_bid_factor() -> f64 {
    0.1
}

impl ContractNetConfig {
    pub fn task_delay(&self) -> Duration {
        Duration::from_millis(self.task_delay_ms)
    }
}

impl Default for ContractNetConfig {
    fn default() -> Self {
        Self {
            task_delay_ms: default_task_delay_ms(),
            bid_factor: default_bid_factor(),
        }
    }
}

/// Drone configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DroneConfig {
    #[serde(default = "default_initial_battery")]
    pub initial_battery: f64,
    #[serde(default)]
    pub position: Position,
}

fn default_initial_battery() -> f64 {
    100.0
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            initial_battery: default_initial_battery(),
            position: Position::default(),
        }
    }
}

/// Starting position of a non-drone agent.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PlacementConfig {
    #[serde(default)]
    pub position: Position,
}

fn default_robber_placement() -> PlacementConfig {
    PlacementConfig {
        position: Position::new(5.0, 5.0, 0.0),
    }
}

/// Vote configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct VoteConfig {
    /// Fixed RNG seed; OS entropy when absent.
    pub seed: Option<u64>,
}

/// Message gateway configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_host")]
    pub host: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    5002
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

/// Record store configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PersistenceConfig {
    #[serde(default = "default_persistence_enabled")]
    pub enabled: bool,
    /// Defaults to ~/.dronewatch/records.db
    pub db_path: Option<PathBuf>,
}

fn default_persistence_enabled() -> bool {
    true
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_persistence_enabled(),
            db_path: None,
        }
    }
}

/// DroneWatch settings.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub contract_net: ContractNetConfig,

    #[serde(default)]
    pub drone: DroneConfig,

    #[serde(default)]
    pub camera: PlacementConfig,

    #[serde(default)]
    pub guard: PlacementConfig,

    #[serde(default = "default_robber_placement")]
    pub robber: PlacementConfig,

    #[serde(default)]
    pub vote: VoteConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            contract_net: ContractNetConfig::default(),
            drone: DroneConfig::default(),
            camera: PlacementConfig::default(),
            guard: PlacementConfig::default(),
            robber: default_robber_placement(),
            vote: VoteConfig::default(),
            gateway: GatewayConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gets_defaults() {
        let settings = parse_settings("{}").unwrap();
        assert_eq!(settings.clock.tick_interval(), Duration::from_millis(100));
        assert_eq!(settings.contract_net.task_delay(), Duration::from_secs(2));
        assert_eq!(settings.contract_net.bid_factor, 0.1);
        assert_eq!(settings.drone.initial_battery, 100.0);
        assert_eq!(settings.robber.position, Position::new(5.0, 5.0, 0.0));
        assert_eq!(settings.gateway.port, 5002);
        assert!(settings.persistence.enabled);
        assert!(settings.vote.seed.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let settings = parse_settings(
            r#"{"contract_net": {"task_delay_ms": 500}, "vote": {"seed": 9}}"#,
        )
        .unwrap();
        assert_eq!(settings.contract_net.task_delay_ms, 500);
        assert_eq!(settings.contract_net.bid_factor, 0.1);
        assert_eq!(settings.vote.seed, Some(9));
    }

    #[test]
    fn test_rejects_zero_tick() {
        let result = parse_settings(r#"{"clock": {"tick_interval_ms": 0}}"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_non_positive_battery() {
        let result = parse_settings(r#"{"drone": {"initial_battery": 0.0}}"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_round_trips() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        let parsed = parse_settings(&json).unwrap();
        assert_eq!(parsed.gateway.host, "0.0.0.0");
    }
}
