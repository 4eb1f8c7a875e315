//! Equipment module — weapon equip manager
//!
//! # Architecture
//!
//! **Events → Systems flow:**
//! - Input / server inbox пишет `EquipWeaponIntent`
//! - Authority: `equip_weapon` (state, attachment, owner, rotation mode)
//! - Client: RequestEquip → server → replication `equipped_weapon`
//! - Client mirror: `EquippedWeaponReplicated` → `on_rep_equipped_weapon`
//!   (только rotation mode, без attachment)

use bevy::prelude::*;

pub mod events;
pub mod systems;


// Re-exports
pub use events::*;
pub use systems::*;

use crate::CombatSet;

/// Equipment plugin
pub struct EquipmentPlugin;

impl Plugin for EquipmentPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<crate::components::Attachment>()
            .register_type::<crate::components::WeaponOwner>()
            .register_type::<crate::components::RotationMode>();

        app
            // Events
            .add_event::<EquipWeaponIntent>()
            // Change hook replicated поля
            .add_observer(on_rep_equipped_weapon)
            // Equip до dispatch fire: выстрел того же кадра видит оружие
            .add_systems(Update, process_equip_intents.in_set(CombatSet::Authority));
    }
}
