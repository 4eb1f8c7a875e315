//! Field-of-view interpolator (zoom при прицеливании)
//!
//! Aiming → current_fov плавно идёт к `weapon.zoomed_fov` со скоростью оружия.
//! Не aiming → обратно к default FOV со скоростью из config.
//! Без оружия — no-op (камеру не трогаем).

use bevy::prelude::*;

use crate::combat::interp::interp_to;
use crate::combat::{CombatState, Weapon};
use crate::components::{FollowCamera, LocallyControlled};
use crate::config::CombatConfig;

/// Один шаг FOV interpolation
///
/// Возвращает новый `current_fov` или None если оружия нет (no-op).
pub fn step_fov(state: &CombatState, weapon: Option<&Weapon>, zoom_interp_speed: f32, delta_time: f32) -> Option<f32> {
    let weapon = weapon?;

    let fov = if state.is_aiming {
        interp_to(state.current_fov, weapon.zoomed_fov, delta_time, weapon.zoomed_fov_interp_speed)
    } else {
        interp_to(state.current_fov, state.default_fov, delta_time, zoom_interp_speed)
    };

    Some(fov)
}

/// System: FOV interpolation для локального игрока
pub fn interp_fov(
    time: Res<Time>,
    config: Res<CombatConfig>,
    mut characters: Query<(&mut CombatState, Option<&mut FollowCamera>), With<LocallyControlled>>,
    weapons: Query<&Weapon>,
) {
    let delta = time.delta_secs();

    for (mut state, camera) in characters.iter_mut() {
        let weapon = state.equipped_weapon.and_then(|entity| weapons.get(entity).ok());
        let Some(fov) = step_fov(&state, weapon, config.zoom_interp_speed, delta) else {
            continue;
        };

        state.current_fov = fov;

        if let Some(mut camera) = camera {
            camera.field_of_view = fov;
        }
    }
}
