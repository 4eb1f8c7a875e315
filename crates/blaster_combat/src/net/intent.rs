//! Intent replicator — aim / fire intents между client и server
//!
//! - Aim: локальная prediction сразу, server получает SetAiming.
//! - Fire: client шлёт RequestFire, server раздаёт ровно один FireConfirmed
//!   на принятый запрос, все peers (включая server) исполняют его.
//! - Server копия CombatState authoritative, её поля уходят через replication.

use bevy::prelude::*;

use super::protocol::{NetId, NetMessage};
use super::replication::{self, ReplicatedCharacters};
use super::{NetIdMap, NetInbox, NetOutbox, NetRole, Sender};
use crate::combat::{CombatState, FireMontageRequested, FireRequested, Weapon, WeaponFired};
use crate::components::CharacterMovement;
use crate::equipment::EquipWeaponIntent;
use crate::logger;
use crate::shooting::AimIntent;

/// Подтверждённый выстрел для локального исполнения (montage + weapon fire)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ConfirmedFire {
    pub character: Entity,
    pub shot: u64,
    pub hit_target: Vec3,
}

/// Счётчик выстрелов authority (монотонный, начинается с 1)
#[derive(Resource, Debug, Default)]
pub struct ShotSequence {
    last: u64,
}

impl ShotSequence {
    pub fn next_shot(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

/// Последний исполненный выстрел персонажа (dedupe повторной доставки)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ShotLedger {
    pub last_shot: Option<u64>,
}

impl ShotLedger {
    /// Принять выстрел; false если он уже был исполнен (или старее)
    pub fn accept(&mut self, shot: u64) -> bool {
        if self.last_shot.is_some_and(|last| shot <= last) {
            return false;
        }
        self.last_shot = Some(shot);
        true
    }
}

/// System: AimIntent → prediction + SetAiming (client)
pub fn process_aim_intents(
    role: Res<NetRole>,
    mut intents: EventReader<AimIntent>,
    mut characters: Query<(&mut CombatState, Option<&mut CharacterMovement>, Option<&NetId>)>,
    mut outbox: ResMut<NetOutbox>,
) {
    for intent in intents.read() {
        let Ok((mut state, movement, net_id)) = characters.get_mut(intent.character) else {
            continue;
        };

        state.apply_aiming(intent.aiming, movement.map(|m| m.into_inner()));

        if *role != NetRole::Client {
            continue;
        }

        match net_id {
            Some(id) => outbox.push(NetMessage::SetAiming {
                character: *id,
                aiming: intent.aiming,
            }),
            None => logger::log_warning(&format!(
                "AimIntent for {:?} without NetId — not sent to server",
                intent.character
            )),
        }
    }
}

/// System: FireRequested → RequestFire (client) или FireConfirmed (authority)
pub fn dispatch_fire_requests(
    role: Res<NetRole>,
    mut requests: EventReader<FireRequested>,
    characters: Query<(&CombatState, Option<&NetId>)>,
    mut sequence: ResMut<ShotSequence>,
    mut outbox: ResMut<NetOutbox>,
    mut confirmed: EventWriter<ConfirmedFire>,
) {
    for request in requests.read() {
        let Ok((state, net_id)) = characters.get(request.character) else {
            continue;
        };

        if !role.is_authority() {
            match net_id {
                Some(id) => outbox.push(NetMessage::RequestFire {
                    character: *id,
                    hit_target: request.hit_target.into(),
                }),
                None => logger::log_warning(&format!(
                    "FireRequested for {:?} without NetId — not sent to server",
                    request.character
                )),
            }
            continue;
        }

        // Authority: без оружия broadcast не делаем
        if !state.has_weapon() {
            continue;
        }

        let shot = sequence.next_shot();

        if role.is_networked() {
            match net_id {
                Some(id) => outbox.push(NetMessage::FireConfirmed {
                    character: *id,
                    shot,
                    hit_target: request.hit_target.into(),
                }),
                None => logger::log_warning(&format!(
                    "Shot {} of {:?} not broadcast: character has no NetId",
                    shot, request.character
                )),
            }
        }

        confirmed.write(ConfirmedFire {
            character: request.character,
            shot,
            hit_target: request.hit_target,
        });
    }
}

/// System: исполнить подтверждённый выстрел (все peers)
///
/// Нет персонажа или оружия → no-op. Повтор shot → no-op.
pub fn execute_confirmed_fire(
    mut confirmed: EventReader<ConfirmedFire>,
    mut characters: Query<(&CombatState, Option<&mut ShotLedger>)>,
    weapons: Query<(), With<Weapon>>,
    mut montages: EventWriter<FireMontageRequested>,
    mut fired: EventWriter<WeaponFired>,
) {
    for fire in confirmed.read() {
        let Ok((state, ledger)) = characters.get_mut(fire.character) else {
            continue;
        };

        if let Some(mut ledger) = ledger {
            if !ledger.accept(fire.shot) {
                logger::log(&format!("Duplicate shot {} for {:?} ignored", fire.shot, fire.character));
                continue;
            }
        }

        let Some(weapon) = state.equipped_weapon.filter(|w| weapons.contains(*w)) else {
            continue;
        };

        montages.write(FireMontageRequested {
            character: fire.character,
            aiming: state.is_aiming,
        });
        fired.write(WeaponFired {
            weapon,
            shooter: fire.character,
            hit_target: fire.hit_target,
        });
    }
}

/// System (server): разобрать входящие client → server сообщения
pub fn receive_server_messages(
    mut inbox: ResMut<NetInbox>,
    net_ids: Res<NetIdMap>,
    mut characters: Query<(&mut CombatState, Option<&mut CharacterMovement>)>,
    mut fire_requests: EventWriter<FireRequested>,
    mut equip_intents: EventWriter<EquipWeaponIntent>,
) {
    for incoming in inbox.drain() {
        let message = incoming.message;

        if !message.is_client_to_server() {
            logger::log_warning(&format!(
                "Server ignores {:?} from {:?}: wrong direction",
                message, incoming.from
            ));
            continue;
        }

        let Some(character) = net_ids.get(message.character()) else {
            logger::log_error(&format!(
                "Server: unknown character {:?} in {:?} from {:?}",
                message.character(),
                message,
                incoming.from
            ));
            continue;
        };

        match message {
            NetMessage::SetAiming { aiming, .. } => {
                if let Ok((mut state, movement)) = characters.get_mut(character) {
                    state.apply_aiming(aiming, movement.map(|m| m.into_inner()));
                }
            }
            NetMessage::RequestFire { hit_target, .. } => {
                fire_requests.write(FireRequested {
                    character,
                    hit_target: hit_target.into(),
                });
            }
            NetMessage::RequestEquip { weapon, .. } => {
                let Some(weapon) = net_ids.get(weapon) else {
                    logger::log_error(&format!("Server: unknown weapon {:?} in RequestEquip", weapon));
                    continue;
                };
                equip_intents.write(EquipWeaponIntent { character, weapon });
            }
            NetMessage::FireConfirmed { .. } | NetMessage::Replicate { .. } => {}
        }
    }
}

/// System (client): разобрать входящие server → client сообщения
pub fn receive_client_messages(
    mut inbox: ResMut<NetInbox>,
    net_ids: Res<NetIdMap>,
    mut characters: ReplicatedCharacters,
    mut confirmed: EventWriter<ConfirmedFire>,
    mut commands: Commands,
) {
    for incoming in inbox.drain() {
        if incoming.from != Sender::Server {
            logger::log_warning(&format!("Client ignores message from {:?}", incoming.from));
            continue;
        }

        let message = incoming.message;
        let Some(character) = net_ids.get(message.character()) else {
            logger::log_warning(&format!(
                "Client: unknown character {:?} in {:?} — dropped",
                message.character(),
                message
            ));
            continue;
        };

        match message {
            NetMessage::FireConfirmed { shot, hit_target, .. } => {
                confirmed.write(ConfirmedFire {
                    character,
                    shot,
                    hit_target: hit_target.into(),
                });
            }
            NetMessage::Replicate { field, .. } => {
                replication::apply_replicated_field(character, field, &net_ids, &mut characters, &mut commands);
            }
            NetMessage::SetAiming { .. } | NetMessage::RequestFire { .. } | NetMessage::RequestEquip { .. } => {
                logger::log_warning(&format!("Client ignores {:?}: wrong direction", message));
            }
        }
    }
}
