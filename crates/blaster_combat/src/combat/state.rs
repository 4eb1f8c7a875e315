//! CombatState — per-character combat состояние
//!
//! Один экземпляр на персонажа (component на character entity).
//! Server копия authoritative, клиенты держат mirror.
//!
//! Replicated (server → clients): `equipped_weapon`, `is_aiming`.
//! Всё остальное local-only.

use bevy::prelude::*;

use crate::components::{CharacterMovement, FollowCamera};
use crate::config::CombatConfig;
use crate::logger;

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct CombatState {
    /// Экипированное оружие (non-owning handle, replicated)
    pub equipped_weapon: Option<Entity>,

    /// Прицеливается ли персонаж (replicated)
    pub is_aiming: bool,

    /// Последняя точка под crosshair (local-only, пишет tracer)
    pub hit_target: Vec3,

    /// Под crosshair interactive target (пишет tracer, читает reticle)
    pub target_highlighted: bool,

    /// Fire-rate gate (false пока идёт fire timer)
    pub can_fire: bool,

    /// Кнопка стрельбы удерживается
    pub fire_button_held: bool,

    /// FOV камеры без прицеливания (снимается с камеры при spawn)
    pub default_fov: f32,

    /// Текущий интерполированный FOV
    pub current_fov: f32,

    pub base_walk_speed: f32,
    pub aim_walk_speed: f32,
}

impl Default for CombatState {
    fn default() -> Self {
        Self::from_config(&CombatConfig::default())
    }
}

impl CombatState {
    pub fn from_config(config: &CombatConfig) -> Self {
        Self {
            equipped_weapon: None,
            is_aiming: false,
            hit_target: Vec3::ZERO,
            target_highlighted: false,
            can_fire: true,
            fire_button_held: false,
            default_fov: 90.0,
            current_fov: 90.0,
            base_walk_speed: config.base_walk_speed,
            aim_walk_speed: config.aim_walk_speed,
        }
    }

    pub fn has_weapon(&self) -> bool {
        self.equipped_weapon.is_some()
    }

    /// Max walk speed для текущего aim состояния
    pub fn walk_speed(&self) -> f32 {
        if self.is_aiming {
            self.aim_walk_speed
        } else {
            self.base_walk_speed
        }
    }

    /// Применить aim состояние + walk speed
    ///
    /// Одинаково на invoking стороне (prediction) и на server.
    pub fn apply_aiming(&mut self, aiming: bool, movement: Option<&mut CharacterMovement>) {
        self.is_aiming = aiming;

        if let Some(movement) = movement {
            movement.max_walk_speed = self.walk_speed();
        }
    }
}

/// Observer: инициализация CombatState при spawn персонажа
///
/// - max walk speed ← base_walk_speed
/// - default/current FOV ← FOV follow camera (если камера есть)
pub fn init_combat_state(
    trigger: Trigger<OnAdd, CombatState>,
    mut characters: Query<(&mut CombatState, Option<&mut CharacterMovement>, Option<&FollowCamera>)>,
) {
    let entity = trigger.target();
    let Ok((mut state, movement, camera)) = characters.get_mut(entity) else {
        return;
    };

    if let Some(mut movement) = movement {
        movement.max_walk_speed = state.base_walk_speed;
    }

    if let Some(camera) = camera {
        state.default_fov = camera.field_of_view;
        state.current_fov = camera.field_of_view;
    }

    logger::log(&format!(
        "CombatState ready for {:?} (walk={}, fov={})",
        entity, state.base_walk_speed, state.default_fov
    ));
}
