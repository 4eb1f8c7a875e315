//! Net layer — роль процесса, NetId, outbox/inbox, replication
//!
//! Архитектура: server authoritative, клиенты предсказывают только aim.
//! ```text
//! Client: AimIntent / FireRequested / EquipWeaponIntent ──▶ NetOutbox ──▶ transport
//! Server: NetInbox ──▶ apply / validate ──▶ FireConfirmed + Replicate ──▶ NetOutbox
//! Client: NetInbox ──▶ FireConfirmed (execute) + Replicate (mirror)
//! ```
//!
//! Core не знает про transport: outbox/inbox — просто очереди сообщений.
//! `loopback::LoopbackNetwork` связывает несколько App in-process.

use bevy::prelude::*;
use std::collections::HashMap;

pub mod intent;
pub mod loopback;
pub mod protocol;
pub mod replication;

pub use intent::{ConfirmedFire, ShotLedger, ShotSequence};
pub use loopback::LoopbackNetwork;
pub use protocol::{NetId, NetMessage, ProtocolError, ReplicatedField, WireVec3, decode_message, encode_message};
pub use replication::ReplicationSnapshot;

use crate::CombatSet;

/// ID клиента (выдаёт transport)
pub type ClientId = u64;

/// Роль процесса в сессии
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetRole {
    /// Один процесс, без сети (authority, outbox не используется)
    #[default]
    Standalone,
    /// Authoritative server (listen или dedicated)
    Server,
    /// Remote client
    Client,
}

impl NetRole {
    /// Процесс владеет authoritative CombatState
    pub fn is_authority(&self) -> bool {
        matches!(self, NetRole::Standalone | NetRole::Server)
    }

    /// Процесс участвует в сетевой сессии (outbox доставляется)
    pub fn is_networked(&self) -> bool {
        !matches!(self, NetRole::Standalone)
    }
}

/// NetId → Entity для этого процесса
///
/// Поддерживается observers на OnAdd/OnRemove NetId.
#[derive(Resource, Debug, Default)]
pub struct NetIdMap {
    entities: HashMap<NetId, Entity>,
}

impl NetIdMap {
    pub fn get(&self, id: NetId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Исходящие сообщения
///
/// Client: всё адресовано server. Server: всё broadcast всем клиентам.
#[derive(Resource, Debug, Default)]
pub struct NetOutbox {
    messages: Vec<NetMessage>,
}

impl NetOutbox {
    pub fn push(&mut self, message: NetMessage) {
        self.messages.push(message);
    }

    pub fn drain(&mut self) -> Vec<NetMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Отправитель входящего сообщения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Server,
    Client(ClientId),
}

/// Входящее сообщение
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    pub from: Sender,
    pub message: NetMessage,
}

/// Входящие сообщения (заполняет transport, разбирает NetPlugin)
#[derive(Resource, Debug, Default)]
pub struct NetInbox {
    messages: Vec<Incoming>,
}

impl NetInbox {
    pub fn push(&mut self, from: Sender, message: NetMessage) {
        self.messages.push(Incoming { from, message });
    }

    pub fn drain(&mut self) -> Vec<Incoming> {
        std::mem::take(&mut self.messages)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Observer: новый NetId → регистрация в NetIdMap
fn register_net_id(trigger: Trigger<OnAdd, NetId>, ids: Query<&NetId>, mut map: ResMut<NetIdMap>) {
    let entity = trigger.target();
    let Ok(id) = ids.get(entity) else {
        return;
    };

    if let Some(previous) = map.entities.insert(*id, entity) {
        if previous != entity {
            crate::logger::log_warning(&format!(
                "NetId {:?} re-registered: {:?} → {:?}",
                id, previous, entity
            ));
        }
    }
}

/// Observer: NetId удалён (despawn) → убрать из NetIdMap
fn unregister_net_id(trigger: Trigger<OnRemove, NetId>, ids: Query<&NetId>, mut map: ResMut<NetIdMap>) {
    let entity = trigger.target();
    let Ok(id) = ids.get(entity) else {
        return;
    };

    if map.entities.get(id) == Some(&entity) {
        map.entities.remove(id);
    }
}

/// Net Plugin
///
/// Порядок выполнения (Update):
/// 1. process_aim_intents — prediction + SetAiming (CombatSet::Input)
/// 2. receive_server_messages / receive_client_messages (CombatSet::Network)
/// 3. dispatch_fire_requests → execute_confirmed_fire (CombatSet::Authority)
/// 4. replicate_combat_fields — только server (CombatSet::Replication)
pub struct NetPlugin;

impl Plugin for NetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NetRole>()
            .init_resource::<NetIdMap>()
            .init_resource::<NetOutbox>()
            .init_resource::<NetInbox>()
            .init_resource::<ShotSequence>();

        app.register_type::<NetId>().register_type::<ShotLedger>();

        app.add_event::<ConfirmedFire>();

        app.add_observer(register_net_id).add_observer(unregister_net_id);

        app.add_systems(
            Update,
            (
                intent::process_aim_intents.in_set(CombatSet::Input),
                (
                    intent::receive_server_messages.run_if(resource_equals(NetRole::Server)),
                    intent::receive_client_messages.run_if(resource_equals(NetRole::Client)),
                )
                    .in_set(CombatSet::Network),
                (intent::dispatch_fire_requests, intent::execute_confirmed_fire)
                    .chain()
                    .after(crate::equipment::process_equip_intents)
                    .in_set(CombatSet::Authority),
                replication::replicate_combat_fields
                    .run_if(resource_equals(NetRole::Server))
                    .in_set(CombatSet::Replication),
            ),
        );
    }
}
