//! Attachment компоненты: оружие, прикреплённое к socket'у персонажа

use bevy::prelude::*;

/// Attachment — привязка entity к socket'у host персонажа
///
/// Presentation layer читает `Changed<Attachment>` и перевешивает визуал
/// (bone attachment). Core только фиксирует куда и с каким offset'ом.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Attachment {
    /// Host entity (персонаж)
    pub host: Entity,

    /// Socket на скелете host'а (например "RightHandSocket")
    pub socket: String,

    /// Transform socket'а в local space host'а (на момент attach)
    pub local_transform: Transform,

    /// Тип attachment (для logic/UI)
    pub attachment_type: AttachmentType,
}

impl Attachment {
    /// Создать attachment для weapon
    pub fn weapon(host: Entity, socket: impl Into<String>, local_transform: Transform) -> Self {
        Self {
            host,
            socket: socket.into(),
            local_transform,
            attachment_type: AttachmentType::Weapon,
        }
    }
}

/// Attachment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum AttachmentType {
    Weapon,
}

/// Владелец weapon entity (non-owning handle на персонажа)
///
/// Ставится при equip. Нужен чтобы при удалении оружия найти персонажа и
/// отменить его fire timer.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct WeaponOwner(pub Entity);
