//! Shooting domain — input intents игрока (прицеливание и стрельба)
//!
//! Input binding снаружи core: host мапит кнопки в эти события.
//! - RMB press/release → `AimIntent`
//! - LMB press/release → `FireButtonIntent`
//! - E → `EquipWeaponIntent` (см. equipment)

use bevy::prelude::*;

/// Event: начать / закончить прицеливание
///
/// # Flow
/// 1. Invoking сторона сразу меняет `is_aiming` + walk speed (prediction)
/// 2. Клиент шлёт `SetAiming` на server
/// 3. Server применяет то же самое, `is_aiming` реплицируется остальным
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AimIntent {
    pub character: Entity,
    pub aiming: bool,
}

/// Event: кнопка стрельбы нажата / отпущена
///
/// Press → немедленная попытка выстрела (semi-auto выстрел или первый
/// выстрел очереди). Release только снимает held флаг.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireButtonIntent {
    pub character: Entity,
    pub pressed: bool,
}
