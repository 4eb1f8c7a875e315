//! Field replication: server CombatState → client mirrors
//!
//! Replicated только `equipped_weapon` и `is_aiming`, last-write-wins per
//! field. Server шлёт поле когда оно отличается от последнего отправленного
//! (`ReplicationSnapshot`). Client применяет и для `equipped_weapon`
//! триггерит change hook (`EquippedWeaponReplicated`).
//!
//! Смена `equipped_weapon` на mirror отменяет `FireTimer` и открывает gate.
//!
//! `is_aiming` для LocallyControlled персонажа не перезаписывается: владелец
//! уже предсказал его локально, server value может быть устаревшим.

use bevy::prelude::*;

use super::protocol::{NetId, NetMessage, ReplicatedField};
use super::{NetIdMap, NetOutbox};
use crate::combat::{CombatState, FireTimer};
use crate::components::{CharacterMovement, LocallyControlled};
use crate::equipment::EquippedWeaponReplicated;
use crate::logger;

/// Последние отправленные значения replicated полей (server side)
///
/// None = поле ещё ни разу не отправлялось.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct ReplicationSnapshot {
    pub equipped_weapon: Option<Option<NetId>>,
    pub is_aiming: Option<bool>,
}

impl ReplicationSnapshot {
    /// Сравнить с текущими значениями, вернуть изменившиеся поля
    pub fn diff(&mut self, equipped_weapon: Option<NetId>, is_aiming: bool) -> Vec<ReplicatedField> {
        let mut changed = Vec::new();

        if self.equipped_weapon != Some(equipped_weapon) {
            self.equipped_weapon = Some(equipped_weapon);
            changed.push(ReplicatedField::EquippedWeapon(equipped_weapon));
        }

        if self.is_aiming != Some(is_aiming) {
            self.is_aiming = Some(is_aiming);
            changed.push(ReplicatedField::IsAiming(is_aiming));
        }

        changed
    }
}

/// Client mirror персонажей для apply_replicated_field
pub type ReplicatedCharacters<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut CombatState,
        Option<&'static mut CharacterMovement>,
        Has<LocallyControlled>,
    ),
>;

/// System (server): отправить изменившиеся replicated поля
pub fn replicate_combat_fields(
    mut commands: Commands,
    mut characters: Query<(Entity, &NetId, &CombatState, Option<&mut ReplicationSnapshot>)>,
    net_ids: Query<&NetId>,
    mut outbox: ResMut<NetOutbox>,
) {
    for (entity, id, state, snapshot) in characters.iter_mut() {
        let equipped = match state.equipped_weapon {
            None => None,
            Some(weapon) => match net_ids.get(weapon) {
                Ok(weapon_id) => Some(*weapon_id),
                Err(_) => {
                    logger::log_warning(&format!(
                        "Equipped weapon {:?} of {:?} has no NetId — replicated as none",
                        weapon, entity
                    ));
                    None
                }
            },
        };

        let changed = match snapshot {
            Some(mut snapshot) => snapshot.diff(equipped, state.is_aiming),
            None => {
                let mut snapshot = ReplicationSnapshot::default();
                let changed = snapshot.diff(equipped, state.is_aiming);
                commands.entity(entity).insert(snapshot);
                changed
            }
        };

        for field in changed {
            outbox.push(NetMessage::Replicate { character: *id, field });
        }
    }
}

/// Применить replicated поле к client mirror
///
/// Оружие с неизвестным NetId (ещё не заспавнено здесь) → warning, поле не
/// применяется.
pub fn apply_replicated_field(
    character: Entity,
    field: ReplicatedField,
    net_ids: &NetIdMap,
    characters: &mut ReplicatedCharacters,
    commands: &mut Commands,
) {
    let Ok((mut state, movement, locally_controlled)) = characters.get_mut(character) else {
        return;
    };

    match field {
        ReplicatedField::IsAiming(aiming) => {
            if locally_controlled {
                return;
            }
            state.apply_aiming(aiming, movement.map(|m| m.into_inner()));
        }
        ReplicatedField::EquippedWeapon(weapon_id) => {
            let weapon = match weapon_id {
                None => None,
                Some(id) => match net_ids.get(id) {
                    Some(weapon) => Some(weapon),
                    None => {
                        logger::log_warning(&format!(
                            "Replicated weapon {:?} for {:?} not spawned on this peer — skipped",
                            id, character
                        ));
                        return;
                    }
                },
            };

            if state.equipped_weapon == weapon {
                return;
            }

            // Смена оружия отменяет pending fire timer (как OnRemove<Weapon> на authority)
            state.equipped_weapon = weapon;
            state.can_fire = true;
            commands.entity(character).try_remove::<FireTimer>();
            commands.trigger_targets(EquippedWeaponReplicated { weapon }, character);
        }
    }
}
