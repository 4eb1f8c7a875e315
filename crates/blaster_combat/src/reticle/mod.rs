//! Reticle feedback model — crosshair spread + tint для HUD
//!
//! Architecture:
//! - ECS считает HudPacket каждый кадр (только для LocallyControlled)
//! - Presentation layer читает `HudPacket` component и рисует 5 текстур
//! - `HudPacket` component одновременно marker sink'а: нет component → нет HUD → skip
//!
//! Spread складывается из 4 независимых факторов:
//! - velocity: горизонтальная скорость / max walk speed, clamp [0, 1], без сглаживания
//! - airborne: плавно растёт в воздухе, быстро гаснет на земле
//! - aim: плавно уменьшает spread при прицеливании
//! - shooting: импульс при выстреле, затухает

use bevy::prelude::*;

use crate::combat::interp::{interp_to, map_range_clamped};
use crate::combat::{CombatState, CrosshairTextures, Weapon};
use crate::components::{CharacterMovement, LocallyControlled};
use crate::config::{CombatConfig, ReticleTuning};

/// Цвет crosshair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum CrosshairTint {
    /// Ничего интересного под crosshair (белый)
    #[default]
    Neutral,
    /// Interactive target под crosshair (красный)
    Alert,
}

impl CrosshairTint {
    /// Linear RGBA
    pub fn rgba(&self) -> [f32; 4] {
        match self {
            CrosshairTint::Neutral => [1.0, 1.0, 1.0, 1.0],
            CrosshairTint::Alert => [1.0, 0.0, 0.0, 1.0],
        }
    }
}

/// HUD packet (output для presentation layer)
///
/// Перестраивается каждый кадр, identity нет.
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct HudPacket {
    pub crosshairs: CrosshairTextures,
    pub spread: f32,
    pub tint: CrosshairTint,
}

/// Входы reticle model за один кадр
#[derive(Debug, Clone, Copy)]
pub struct ReticleInputs<'a> {
    pub horizontal_speed: f32,
    pub max_walk_speed: f32,
    pub is_falling: bool,
    pub is_aiming: bool,
    pub target_highlighted: bool,
    /// Crosshair set экипированного оружия (None = без оружия)
    pub crosshairs: Option<&'a CrosshairTextures>,
}

/// Состояние сглаживаемых факторов spread
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ReticleModel {
    pub velocity_factor: f32,
    pub in_air_factor: f32,
    pub aim_factor: f32,
    pub shooting_factor: f32,
}

impl ReticleModel {
    /// Импульс от выстрела (вызывает fire-rate governor)
    pub fn kick(&mut self, tuning: &ReticleTuning) {
        self.shooting_factor = tuning.shooting_kick;
    }

    /// Один шаг модели: обновляет факторы, возвращает готовый HudPacket
    pub fn update(&mut self, inputs: &ReticleInputs, delta_time: f32, tuning: &ReticleTuning) -> HudPacket {
        // [0, max_walk_speed] → [0, 1]
        self.velocity_factor = map_range_clamped(
            (0.0, inputs.max_walk_speed),
            (0.0, 1.0),
            inputs.horizontal_speed,
        );

        self.in_air_factor = if inputs.is_falling {
            interp_to(self.in_air_factor, tuning.airborne_target, delta_time, tuning.airborne_rate)
        } else {
            interp_to(self.in_air_factor, 0.0, delta_time, tuning.landing_rate)
        };

        let aim_target = if inputs.is_aiming { tuning.aim_target } else { 0.0 };
        self.aim_factor = interp_to(self.aim_factor, aim_target, delta_time, tuning.aim_rate);

        self.shooting_factor = interp_to(self.shooting_factor, 0.0, delta_time, tuning.shooting_recovery_rate);

        let spread = (tuning.base_spread + self.velocity_factor + self.in_air_factor - self.aim_factor
            + self.shooting_factor)
            * target_multiplier(inputs.target_highlighted, inputs.is_aiming, tuning);

        HudPacket {
            crosshairs: inputs.crosshairs.cloned().unwrap_or_default(),
            spread,
            tint: if inputs.target_highlighted {
                CrosshairTint::Alert
            } else {
                CrosshairTint::Neutral
            },
        }
    }
}

/// Spread multiplier от target под crosshair
pub fn target_multiplier(target_highlighted: bool, is_aiming: bool, tuning: &ReticleTuning) -> f32 {
    match (target_highlighted, is_aiming) {
        (true, true) => tuning.aimed_target_multiplier,
        (true, false) => tuning.hip_target_multiplier,
        (false, _) => 1.0,
    }
}

/// System: пересчёт HudPacket для локального игрока
pub fn update_reticle(
    time: Res<Time>,
    config: Res<CombatConfig>,
    mut characters: Query<
        (&CombatState, &CharacterMovement, &mut ReticleModel, &mut HudPacket),
        With<LocallyControlled>,
    >,
    weapons: Query<&Weapon>,
) {
    let delta = time.delta_secs();

    for (state, movement, mut model, mut hud) in characters.iter_mut() {
        let weapon = state.equipped_weapon.and_then(|entity| weapons.get(entity).ok());

        let inputs = ReticleInputs {
            horizontal_speed: movement.horizontal_speed(),
            max_walk_speed: movement.max_walk_speed,
            is_falling: movement.is_falling,
            is_aiming: state.is_aiming,
            target_highlighted: state.target_highlighted,
            crosshairs: weapon.map(|w| &w.crosshairs),
        };

        *hud = model.update(&inputs, delta, &config.reticle);
    }
}
