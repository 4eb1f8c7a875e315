//! Combat tuning (walk speeds, zoom, trace, reticle factors)
//!
//! Дефолты совпадают с тем что ожидает геймдизайн; RON override грузится
//! host'ом (например `assets/config/combat.ron`) и вставляется как resource
//! ДО `BlasterCombatPlugin`.
//!
//! ```ignore
//! let config = CombatConfig::from_ron_str(&std::fs::read_to_string(path)?)?;
//! app.insert_resource(config).add_plugins(BlasterCombatPlugin);
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Ошибка загрузки combat config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse combat config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Invalid combat config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// Глобальные combat параметры (одинаковы для всех персонажей)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Max walk speed без прицеливания (world units/s)
    pub base_walk_speed: f32,

    /// Max walk speed при прицеливании
    pub aim_walk_speed: f32,

    /// Скорость возврата FOV к default (когда не целимся)
    pub zoom_interp_speed: f32,

    /// Длина visibility ray от crosshair
    pub trace_length: f32,

    /// Отступ старта ray за персонажа (против self-hit)
    pub trace_start_margin: f32,

    /// Имя socket'а на скелете, к которому крепится оружие
    pub hand_socket: String,

    pub reticle: ReticleTuning,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            base_walk_speed: 600.0,
            aim_walk_speed: 450.0,
            zoom_interp_speed: 20.0,
            trace_length: 80_000.0,
            trace_start_margin: 20.0,
            hand_socket: "RightHandSocket".into(),
            reticle: ReticleTuning::default(),
        }
    }
}

impl CombatConfig {
    /// Парсит RON и валидирует значения
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: CombatConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_walk_speed < 0.0 || self.aim_walk_speed < 0.0 {
            return Err(ConfigError::Invalid {
                field: "walk_speed",
                reason: "must be non-negative",
            });
        }
        if self.trace_length <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "trace_length",
                reason: "must be positive",
            });
        }
        if self.hand_socket.is_empty() {
            return Err(ConfigError::Invalid {
                field: "hand_socket",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

/// Reticle spread constants
///
/// spread = (base + velocity + airborne − aim + kick) × target multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReticleTuning {
    pub base_spread: f32,

    pub airborne_target: f32,
    pub airborne_rate: f32,
    pub landing_rate: f32,

    pub aim_target: f32,
    pub aim_rate: f32,

    pub shooting_kick: f32,
    pub shooting_recovery_rate: f32,

    /// Multiplier: целимся (ADS) в interactive target
    pub aimed_target_multiplier: f32,
    /// Multiplier: interactive target под crosshair, но без ADS
    pub hip_target_multiplier: f32,
}

impl Default for ReticleTuning {
    fn default() -> Self {
        Self {
            base_spread: 0.5,
            airborne_target: 2.25,
            airborne_rate: 2.25,
            landing_rate: 30.0,
            aim_target: 0.58,
            aim_rate: 30.0,
            shooting_kick: 0.2,
            shooting_recovery_rate: 20.0,
            aimed_target_multiplier: 0.085,
            hip_target_multiplier: 0.1,
        }
    }
}
