//! Equipment systems
//!
//! - `process_equip_intents` — authority equip / client RequestEquip
//! - `equip_weapon` — сам equip (world mutation, без event plumbing)
//! - `on_rep_equipped_weapon` — change hook replicated поля

use bevy::prelude::*;

use crate::combat::{CombatState, Weapon, WeaponState};
use crate::components::{Attachment, RotationMode, SkeletonSockets, WeaponOwner};
use crate::config::CombatConfig;
use crate::equipment::events::*;
use crate::net::{NetId, NetMessage, NetOutbox, NetRole};
use crate::{log, log_warning};

/// Что произошло при equip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipOutcome {
    /// Экипировано и прикреплено к hand socket
    Attached,
    /// Экипировано, но socket не найден (визуал не прикреплён)
    EquippedWithoutSocket,
    /// Персонаж или оружие не найдены
    Skipped,
}

/// Equip (authority side)
///
/// No-op если нет персонажа (CombatState) или оружия (Weapon).
pub fn equip_weapon(
    commands: &mut Commands,
    character: Entity,
    weapon_entity: Entity,
    hand_socket: &str,
    characters: &mut Query<(&mut CombatState, &mut RotationMode, Option<&SkeletonSockets>)>,
    weapons: &mut Query<(&mut Weapon, &mut Transform)>,
) -> EquipOutcome {
    let Ok((mut state, mut rotation, sockets)) = characters.get_mut(character) else {
        return EquipOutcome::Skipped;
    };
    let Ok((mut weapon, mut weapon_transform)) = weapons.get_mut(weapon_entity) else {
        return EquipOutcome::Skipped;
    };

    state.equipped_weapon = Some(weapon_entity);
    weapon.set_state(WeaponState::Equipped);

    let socket = sockets.and_then(|sockets| sockets.get(hand_socket)).copied();
    let outcome = match socket {
        Some(socket_transform) => {
            *weapon_transform = socket_transform;
            commands
                .entity(weapon_entity)
                .insert(Attachment::weapon(character, hand_socket, socket_transform));
            EquipOutcome::Attached
        }
        None => EquipOutcome::EquippedWithoutSocket,
    };

    commands.entity(weapon_entity).insert(WeaponOwner(character));
    *rotation = RotationMode::ControllerYaw;

    outcome
}

/// System: обработать EquipWeaponIntent
///
/// Authority (Standalone/Server) экипирует сразу, client шлёт RequestEquip и
/// ждёт replication.
pub fn process_equip_intents(
    mut commands: Commands,
    role: Res<NetRole>,
    config: Res<CombatConfig>,
    mut intents: EventReader<EquipWeaponIntent>,
    mut characters: Query<(&mut CombatState, &mut RotationMode, Option<&SkeletonSockets>)>,
    mut weapons: Query<(&mut Weapon, &mut Transform)>,
    net_ids: Query<&NetId>,
    mut outbox: ResMut<NetOutbox>,
) {
    for intent in intents.read() {
        if !role.is_authority() {
            let (Ok(character), Ok(weapon)) = (net_ids.get(intent.character), net_ids.get(intent.weapon)) else {
                log_warning(&format!(
                    "EquipWeaponIntent {:?} → {:?} without NetIds — not sent to server",
                    intent.weapon, intent.character
                ));
                continue;
            };
            outbox.push(NetMessage::RequestEquip {
                character: *character,
                weapon: *weapon,
            });
            continue;
        }

        match equip_weapon(
            &mut commands,
            intent.character,
            intent.weapon,
            &config.hand_socket,
            &mut characters,
            &mut weapons,
        ) {
            EquipOutcome::Attached => {
                log(&format!(
                    "✅ Equipped weapon {:?} to {:?} ({})",
                    intent.weapon, intent.character, config.hand_socket
                ));
            }
            EquipOutcome::EquippedWithoutSocket => {
                log_warning(&format!(
                    "Equipped weapon {:?} to {:?}, but socket '{}' not found — not attached",
                    intent.weapon, intent.character, config.hand_socket
                ));
            }
            EquipOutcome::Skipped => {}
        }
    }
}

/// Observer: replicated `equipped_weapon` изменился → повторить rotation switch
///
/// Attachment НЕ повторяется: его видно через replicated transform оружия.
pub fn on_rep_equipped_weapon(
    trigger: Trigger<EquippedWeaponReplicated>,
    mut characters: Query<&mut RotationMode>,
) {
    if trigger.event().weapon.is_none() {
        return;
    }

    let Ok(mut rotation) = characters.get_mut(trigger.target()) else {
        return;
    };

    *rotation = RotationMode::ControllerYaw;
}
