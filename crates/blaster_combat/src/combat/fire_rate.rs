//! Fire-rate governor: cooldown между выстрелами + automatic очередь
//!
//! State machine (на персонажа):
//! ```text
//! Ready ──fire()──▶ Cooling ──FireTimer elapsed──▶ Ready
//!                                   │
//!                                   └─ held && automatic ──▶ fire() снова
//! ```
//!
//! `FireTimer` — one-shot task, keyed by owner: живёт на character entity.
//! Despawn персонажа = таймер исчез. Удаление оружия = явная отмена
//! (observer `cancel_fire_timer_on_weapon_removed`).

use bevy::prelude::*;

use crate::combat::{CombatState, Weapon};
use crate::components::WeaponOwner;
use crate::config::{CombatConfig, ReticleTuning};
use crate::reticle::ReticleModel;
use crate::shooting::FireButtonIntent;
use crate::logger;

/// One-shot fire cooldown (на character entity)
#[derive(Component, Debug, Clone)]
pub struct FireTimer {
    pub timer: Timer,
}

impl FireTimer {
    pub fn new(fire_delay: f32) -> Self {
        Self {
            timer: Timer::from_seconds(fire_delay.max(0.0), TimerMode::Once),
        }
    }
}

/// Event: governor разрешил выстрел → intent replicator (RequestFire)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FireRequested {
    pub character: Entity,
    pub hit_target: Vec3,
}

/// Попытка выстрела (чистая логика gate)
///
/// No-op (None) если `can_fire == false` или оружия нет. Иначе закрывает gate
/// и возвращает таймер на `fire_delay` оружия.
pub fn try_fire(state: &mut CombatState, weapon: Option<&Weapon>) -> Option<FireTimer> {
    if !state.can_fire || !state.has_weapon() {
        return None;
    }
    let weapon = weapon?;

    state.can_fire = false;
    Some(FireTimer::new(weapon.fire_delay))
}

/// Таймер истёк: открыть gate, вернуть нужен ли автоматический повтор
///
/// Оружие пропало до истечения → no-op, повтора нет.
pub fn finish_fire_timer(state: &mut CombatState, weapon: Option<&Weapon>) -> bool {
    let Some(weapon) = weapon else {
        return false;
    };

    state.can_fire = true;
    state.fire_button_held && weapon.automatic
}

/// Полный выстрел: gate + shooting kick + fire request
fn fire(
    character: Entity,
    state: &mut CombatState,
    reticle: Option<&mut ReticleModel>,
    weapon: Option<&Weapon>,
    tuning: &ReticleTuning,
    requests: &mut EventWriter<FireRequested>,
) -> Option<FireTimer> {
    let timer = try_fire(state, weapon)?;

    if let Some(reticle) = reticle {
        reticle.kick(tuning);
    }

    requests.write(FireRequested {
        character,
        hit_target: state.hit_target,
    });

    Some(timer)
}

/// System: обработка FireButtonIntent (press/release)
pub fn process_fire_buttons(
    mut commands: Commands,
    mut intents: EventReader<FireButtonIntent>,
    mut characters: Query<(&mut CombatState, Option<&mut ReticleModel>)>,
    weapons: Query<&Weapon>,
    config: Res<CombatConfig>,
    mut requests: EventWriter<FireRequested>,
) {
    for intent in intents.read() {
        let Ok((mut state, mut reticle)) = characters.get_mut(intent.character) else {
            continue;
        };

        state.fire_button_held = intent.pressed;
        if !intent.pressed {
            continue;
        }

        let weapon = state.equipped_weapon.and_then(|entity| weapons.get(entity).ok());
        if let Some(timer) = fire(
            intent.character,
            &mut state,
            reticle.as_deref_mut(),
            weapon,
            &config.reticle,
            &mut requests,
        ) {
            commands.entity(intent.character).insert(timer);
        }
    }
}

/// System: tick fire timers, re-trigger automatic очереди
pub fn tick_fire_timers(
    mut commands: Commands,
    time: Res<Time>,
    mut characters: Query<(Entity, &mut CombatState, Option<&mut ReticleModel>, &mut FireTimer)>,
    weapons: Query<&Weapon>,
    config: Res<CombatConfig>,
    mut requests: EventWriter<FireRequested>,
) {
    for (entity, mut state, mut reticle, mut fire_timer) in characters.iter_mut() {
        fire_timer.timer.tick(time.delta());
        if !fire_timer.timer.finished() {
            continue;
        }

        let weapon = state.equipped_weapon.and_then(|w| weapons.get(w).ok());
        if !finish_fire_timer(&mut state, weapon) {
            commands.entity(entity).remove::<FireTimer>();
            continue;
        }

        match fire(entity, &mut state, reticle.as_deref_mut(), weapon, &config.reticle, &mut requests) {
            // Переиспользуем component: очередь продолжается
            Some(next) => *fire_timer = next,
            None => {
                commands.entity(entity).remove::<FireTimer>();
            }
        }
    }
}

/// Observer: оружие удалено → отменить fire timer владельца
///
/// Gate открывается сразу, чтобы следующее оружие могло стрелять.
pub fn cancel_fire_timer_on_weapon_removed(
    trigger: Trigger<OnRemove, Weapon>,
    owners: Query<&WeaponOwner>,
    mut characters: Query<&mut CombatState>,
    mut commands: Commands,
) {
    let weapon = trigger.target();
    let Ok(WeaponOwner(owner)) = owners.get(weapon) else {
        return;
    };

    let Ok(mut state) = characters.get_mut(*owner) else {
        return;
    };

    if state.equipped_weapon != Some(weapon) {
        return;
    }

    state.equipped_weapon = None;
    state.can_fire = true;
    commands.entity(*owner).try_remove::<FireTimer>();

    logger::log(&format!(
        "🔫 Weapon {:?} removed while equipped by {:?} — fire timer cancelled",
        weapon, owner
    ));
}
