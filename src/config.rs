//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the fsru-config.toml file.
//! It provides a centralized way to configure the FSRU tank, the supply carrier, the
//! transit-leg tolerances, the access calendars and the simulation horizon.
//!
//! Every section carries `#[serde(default)]`, so a file only needs to name the values
//! that differ from the reference scenario.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::TimeStep;

/// Default configuration file name, resolved relative to the working directory.
pub const CONFIG_FILE: &str = "fsru-config.toml";

/// Errors raised while reading, writing or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A capacity or rate that must be strictly positive is not
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("{field} = {value} lies outside the tank range [0, {capacity}]")]
    OutOfTankRange {
        field: &'static str,
        value: f64,
        capacity: f64,
    },
}

/// Application configuration loaded from fsru-config.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// FSRU storage and send-out
    #[serde(default)]
    pub fsru: FsruConfig,
    /// Supply carrier cargo and pumping
    #[serde(default)]
    pub lngc: LngcConfig,
    /// Transit offsets and matching tolerances per leg
    #[serde(default)]
    pub route: RouteConfig,
    /// Access calendar sources
    #[serde(default)]
    pub calendar: CalendarConfig,
    /// Run length
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// FSRU tank configuration (volumes in m³, rates in m³ per tick)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FsruConfig {
    pub capacity: f64,
    pub initial_level: f64,
    /// Metered regasification send-out per tick
    pub sendout_rate: f64,
    /// Send-out never draws the tank below this level
    pub min_operable: f64,
    /// Level at which a resupply should ideally complete.
    /// Derived from the carrier parameters when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_level: Option<f64>,
}

impl Default for FsruConfig {
    fn default() -> Self {
        FsruConfig {
            capacity: 174e3,
            initial_level: 174e3,
            sendout_rate: 1097.0,
            min_operable: 3300.0,
            optimal_level: None,
        }
    }
}

/// Supply carrier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LngcConfig {
    pub capacity: f64,
    /// Maximum cargo pumped into the FSRU per tick
    pub transfer_rate: f64,
}

impl Default for LngcConfig {
    fn default() -> Self {
        LngcConfig {
            capacity: 170e3,
            transfer_rate: 1e4,
        }
    }
}

/// Transit-leg offsets and tolerances, all in ticks
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Leg 2 is matched against `desired - leg2_transit_offset`
    pub leg2_transit_offset: TimeStep,
    /// Leg 1 is matched against `leg2_slot - leg1_transit_offset`
    pub leg1_transit_offset: TimeStep,
    /// How far before its target a leg-2 slot may lie
    pub arrival_lookback: TimeStep,
    /// How far before its target a leg-1 slot may lie.
    /// Defaults to `arrival_lookback - leg2_transit_offset`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg1_lookback: Option<TimeStep>,
    /// Ticks from the leg-2 slot until the carrier is alongside the FSRU
    pub transit_tail: TimeStep,
    /// Shift applied to the leg-1 slot when retrying an infeasible match
    pub retry_offset: TimeStep,
    /// Optional cap on how far after its target a leg-1/leg-2 slot may lie (unbounded when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookahead: Option<TimeStep>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        RouteConfig {
            leg2_transit_offset: 5,
            leg1_transit_offset: 2,
            arrival_lookback: 33,
            leg1_lookback: None,
            transit_tail: 5,
            retry_offset: 2,
            lookahead: None,
        }
    }
}

impl RouteConfig {
    pub fn leg1_lookback(&self) -> TimeStep {
        self.leg1_lookback
            .unwrap_or(self.arrival_lookback - self.leg2_transit_offset)
    }
}

/// Access calendar configuration
///
/// When any of the three CSV paths is missing, or a file fails to load, the
/// synthetic tide model in [`crate::fallback`] provides all three legs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CalendarConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg1: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg2: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg3: Option<PathBuf>,
    /// Wall-clock instant of tick 0 for the synthetic model
    pub start: NaiveDateTime,
    /// Number of ticks the synthetic model generates
    pub length: usize,
    /// Minutes represented by one tick
    pub tick_minutes: u32,
    /// Minimum predicted height (ft) for the channel legs (1 and 3) to be passable
    pub channel_threshold_ft: f64,
    /// Minimum predicted height (ft) for the berth approach (leg 2) to be passable
    pub berth_threshold_ft: f64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        CalendarConfig {
            leg1: None,
            leg2: None,
            leg3: None,
            start,
            length: 24 * 365,
            tick_minutes: 60,
            channel_threshold_ft: 5.5,
            berth_threshold_ft: 3.0,
        }
    }
}

impl CalendarConfig {
    /// The three CSV paths, if every one of them is configured.
    pub fn paths(&self) -> Option<[&Path; 3]> {
        match (&self.leg1, &self.leg2, &self.leg3) {
            (Some(l1), Some(l2), Some(l3)) => Some([l1.as_path(), l2.as_path(), l3.as_path()]),
            _ => None,
        }
    }
}

/// Simulation run configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of ticks to simulate; defaults to the leg-1 calendar length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon: Option<usize>,
}

impl Config {
    /// Load configuration from fsru-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_path(&path) {
            Ok(config) => {
                info!(path = %path.as_ref().display(), "loaded configuration");
                config
            }
            Err(ConfigError::Io(_)) => {
                info!("no config file found, using default configuration");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "invalid config file, using default configuration");
                Self::default()
            }
        }
    }

    /// Load and validate configuration, surfacing every failure to the caller.
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str::<Config>(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Optimal FSRU level: the configured value, or the level at which a full
    /// cargo fits while the tank keeps sending out during the discharge.
    pub fn optimal_level(&self) -> f64 {
        self.fsru.optimal_level.unwrap_or_else(|| {
            self.fsru.capacity - self.lngc.capacity
                + self.fsru.sendout_rate * (self.lngc.capacity / self.lngc.transfer_rate)
        })
    }

    /// Reject parameter sets the simulation cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("fsru.capacity", self.fsru.capacity),
            ("fsru.sendout_rate", self.fsru.sendout_rate),
            ("lngc.capacity", self.lngc.capacity),
            ("lngc.transfer_rate", self.lngc.transfer_rate),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        let capacity = self.fsru.capacity;
        for (field, value) in [
            ("fsru.initial_level", self.fsru.initial_level),
            ("fsru.min_operable", self.fsru.min_operable),
            ("fsru.optimal_level", self.optimal_level()),
        ] {
            if !(0.0..=capacity).contains(&value) {
                return Err(ConfigError::OutOfTankRange {
                    field,
                    value,
                    capacity,
                });
            }
        }

        let route = &self.route;
        for (field, value) in [
            ("route.leg2_transit_offset", route.leg2_transit_offset),
            ("route.leg1_transit_offset", route.leg1_transit_offset),
            ("route.arrival_lookback", route.arrival_lookback),
            ("route.leg1_lookback", route.leg1_lookback()),
            ("route.transit_tail", route.transit_tail),
            ("route.lookahead", route.lookahead.unwrap_or(0)),
        ] {
            if value < 0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if route.retry_offset < 1 {
            return Err(ConfigError::NonPositive {
                field: "route.retry_offset",
                value: route.retry_offset as f64,
            });
        }
        if self.calendar.tick_minutes == 0 {
            return Err(ConfigError::NonPositive {
                field: "calendar.tick_minutes",
                value: 0.0,
            });
        }

        Ok(())
    }
}
