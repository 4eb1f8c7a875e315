//! Combat module — per-character combat state + fire-rate governor
//!
//! ECS ответственность:
//! - CombatState: equip/aim/fire gate, FOV, walk speeds
//! - Fire-rate: cooldown timer, automatic очередь
//! - Events: FireRequested (→ net intent), WeaponFired / FireMontageRequested (→ снаружи)
//!
//! Снаружи core:
//! - Projectile spawn, damage resolution (читают WeaponFired)
//! - Fire animation (читает FireMontageRequested)

use bevy::prelude::*;

pub mod fire_rate;
pub mod interp;
pub mod state;
pub mod weapon;


// Re-export основных типов
pub use fire_rate::{FireRequested, FireTimer, finish_fire_timer, try_fire};
pub use state::CombatState;
pub use weapon::{
    CrosshairTextures, FireMontageRequested, InteractWithCrosshairs, Weapon, WeaponFired, WeaponState,
};

use crate::CombatSet;

/// Combat Plugin
///
/// Порядок выполнения (Update):
/// 1. tick_fire_timers — cooldown, automatic повтор (CombatSet::Timers)
/// 2. process_fire_buttons — press/release → fire() (CombatSet::Input)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<CombatState>()
            .register_type::<Weapon>()
            .register_type::<InteractWithCrosshairs>();

        app.add_event::<FireRequested>()
            .add_event::<WeaponFired>()
            .add_event::<FireMontageRequested>();

        app.add_observer(state::init_combat_state)
            .add_observer(fire_rate::cancel_fire_timer_on_weapon_removed);

        app.add_systems(
            Update,
            (
                fire_rate::process_fire_buttons.in_set(CombatSet::Input),
                fire_rate::tick_fire_timers.in_set(CombatSet::Timers),
            ),
        );
    }
}
