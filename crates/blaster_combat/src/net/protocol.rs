//! Wire protocol — сообщения client ↔ server
//!
//! Transport-agnostic: core кладёт `NetMessage` в `NetOutbox`, transport
//! (loopback / UDP / WebSocket) сериализует через `encode_message` и
//! доставляет в `NetInbox` другой стороны. Предполагается reliable ordered
//! канал.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Сетевой идентификатор entity (одинаков на server и всех клиентах)
///
/// Выдаётся миром при spawn (персонажи, оружие). Entity ID у каждого
/// процесса свой, поэтому по сети ходят только NetId.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect,
)]
#[reflect(Component)]
pub struct NetId(pub u64);

/// Vec3 на проводе
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for WireVec3 {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<WireVec3> for Vec3 {
    fn from(v: WireVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Replicated поля CombatState (last-write-wins per field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ReplicatedField {
    EquippedWeapon(Option<NetId>),
    IsAiming(bool),
}

/// Все сообщения combat core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetMessage {
    // === Client → Server ===
    /// Клиент начал/закончил прицеливание (уже применено локально)
    SetAiming { character: NetId, aiming: bool },

    /// Клиент хочет выстрелить в точку под crosshair
    RequestFire { character: NetId, hit_target: WireVec3 },

    /// Клиент хочет экипировать оружие (equip server-authoritative)
    RequestEquip { character: NetId, weapon: NetId },

    // === Server → All clients ===
    /// Server подтвердил выстрел (ровно один на принятый RequestFire)
    FireConfirmed {
        character: NetId,
        /// Монотонный номер выстрела на server (dedupe на клиентах)
        shot: u64,
        hit_target: WireVec3,
    },

    /// Обновление replicated поля
    Replicate { character: NetId, field: ReplicatedField },
}

impl NetMessage {
    /// Сообщение идёт client → server
    pub fn is_client_to_server(&self) -> bool {
        matches!(
            self,
            NetMessage::SetAiming { .. } | NetMessage::RequestFire { .. } | NetMessage::RequestEquip { .. }
        )
    }

    /// Персонаж, к которому относится сообщение
    pub fn character(&self) -> NetId {
        match self {
            NetMessage::SetAiming { character, .. }
            | NetMessage::RequestFire { character, .. }
            | NetMessage::RequestEquip { character, .. }
            | NetMessage::FireConfirmed { character, .. }
            | NetMessage::Replicate { character, .. } => *character,
        }
    }
}

/// Ошибка wire codec
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode_message(message: &NetMessage) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(message).map_err(ProtocolError::Encode)
}

pub fn decode_message(bytes: &[u8]) -> Result<NetMessage, ProtocolError> {
    serde_json::from_slice(bytes).map_err(ProtocolError::Decode)
}
