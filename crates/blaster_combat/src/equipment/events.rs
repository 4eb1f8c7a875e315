//! Equipment events
//!
//! **Equip flow:**
//! - `EquipWeaponIntent` (input / AI / server inbox) → equip на authority,
//!   RequestEquip на клиенте
//! - `EquippedWeaponReplicated` → change hook на client mirror (entity event
//!   на персонаже, триггерит replication applier)

use bevy::prelude::*;

/// Экипировать оружие
///
/// # Flow (authority)
/// 1. `equipped_weapon` ← weapon, weapon state → Equipped
/// 2. Attachment на hand socket (если socket есть)
/// 3. WeaponOwner ← character
/// 4. RotationMode → ControllerYaw
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct EquipWeaponIntent {
    pub character: Entity,
    pub weapon: Entity,
}

/// Replicated `equipped_weapon` изменился на этом peer
///
/// Entity event: target = персонаж. Attachment здесь НЕ повторяется,
/// только rotation mode.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct EquippedWeaponReplicated {
    /// Новое значение (None = оружие снято)
    pub weapon: Option<Entity>,
}
