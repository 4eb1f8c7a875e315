//! Blaster Combat Core
//!
//! ECS combat subsystem на Bevy 0.16 для multiplayer shooter'а:
//! equip / aim / fire state, server-authoritative replication aim и fire
//! intent'ов, crosshair trace, reticle spread и FOV zoom.
//!
//! ARCHITECTURE:
//! - Core = combat rules + net intents (этот crate)
//! - Снаружи = locomotion, анимация, HUD rendering, projectile/damage,
//!   input binding, transport

use bevy::prelude::*;

// Публичные модули
pub mod camera;
pub mod combat;
pub mod components;
pub mod config;
pub mod equipment;
pub mod logger;
pub mod net;
pub mod reticle;
pub mod shooting;
pub mod targeting;

// Re-export базовых типов для удобства
pub use combat::{
    CombatPlugin, CombatState, CrosshairTextures, FireMontageRequested, FireRequested, FireTimer,
    InteractWithCrosshairs, Weapon, WeaponFired, WeaponState,
};
pub use components::*;
pub use config::{CombatConfig, ConfigError, ReticleTuning};
pub use equipment::{EquipWeaponIntent, EquipmentPlugin, EquippedWeaponReplicated};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter,
};
pub use net::{LoopbackNetwork, NetId, NetPlugin, NetRole};
pub use reticle::{CrosshairTint, HudPacket, ReticleModel};
pub use shooting::{AimIntent, FireButtonIntent};
pub use targeting::{CrosshairTrace, TraceOutcome};

/// Фазы combat тика (Update, строго по порядку)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Crosshair trace (hit_target для выстрелов этого кадра)
    Perception,
    /// Fire timers (cooldown, automatic очередь)
    ///
    /// До Input: таймер, запущенный нажатием, тикает начиная со следующего кадра.
    Timers,
    /// Input intents: aim, fire buttons
    Input,
    /// Разбор NetInbox
    Network,
    /// Equip, fire dispatch, исполнение подтверждённых выстрелов
    Authority,
    /// Reticle, FOV
    Presentation,
    /// Server → clients replicated поля
    Replication,
}

/// Шаги crosshair trace внутри `CombatSet::Perception`
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceSet {
    /// Построить ray (CrosshairTrace.request)
    Request,
    /// Visibility backend пишет CrosshairTrace.outcome
    Backend,
    /// hit_target + подсветка
    Apply,
}

/// Кто разрешает visibility ray
///
/// `External`: host (или тест) сам добавляет system в `TraceSet::Backend`,
/// которая заполняет `CrosshairTrace.outcome`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceBackend {
    #[default]
    Rapier,
    External,
}

/// Главный plugin combat core (объединяет все подсистемы)
///
/// `CombatConfig`, `NetRole`, `TraceBackend` можно вставить ДО plugin'а,
/// иначе ставятся defaults.
pub struct BlasterCombatPlugin;

impl Plugin for BlasterCombatPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<CombatConfig>() {
            app.insert_resource(CombatConfig::default());
        }

        app.init_resource::<TraceBackend>();

        app.add_event::<AimIntent>().add_event::<FireButtonIntent>();

        app.register_type::<components::Character>()
            .register_type::<components::LocallyControlled>()
            .register_type::<components::CharacterMovement>()
            .register_type::<components::FollowCamera>()
            .register_type::<CrosshairTrace>()
            .register_type::<ReticleModel>()
            .register_type::<HudPacket>();

        app.configure_sets(
            Update,
            (
                CombatSet::Perception,
                CombatSet::Timers,
                CombatSet::Input,
                CombatSet::Network,
                CombatSet::Authority,
                CombatSet::Presentation,
                CombatSet::Replication,
            )
                .chain(),
        )
        .configure_sets(
            Update,
            (TraceSet::Request, TraceSet::Backend, TraceSet::Apply)
                .chain()
                .in_set(CombatSet::Perception),
        );

        // Подсистемы
        app.add_plugins((CombatPlugin, EquipmentPlugin, NetPlugin));

        app.add_systems(
            Update,
            (
                targeting::aim_crosshair_rays.in_set(TraceSet::Request),
                targeting::rapier_backend::resolve_crosshair_traces_rapier
                    .run_if(resource_equals(TraceBackend::Rapier))
                    .in_set(TraceSet::Backend),
                targeting::apply_crosshair_traces.in_set(TraceSet::Apply),
                (reticle::update_reticle, camera::interp_fov)
                    .chain()
                    .in_set(CombatSet::Presentation),
            ),
        );
    }
}

/// Создаёт minimal Bevy App для headless симуляции (server, client, тесты)
///
/// Plugin НЕ добавлен: вызывающий сначала вставляет NetRole / config.
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Snapshot мира для сравнения детерминизма
///
/// Entity ID у разных App разные, поэтому компоненты сортируются по NetId и
/// в snapshot попадает только он.
pub fn world_snapshot<T: Component + std::fmt::Debug>(world: &mut World) -> Vec<u8> {
    let mut snapshot = Vec::new();

    let mut query = world.query::<(&NetId, &T)>();
    let mut entries: Vec<_> = query.iter(world).collect();

    // Сортируем по NetId для детерминизма
    entries.sort_by_key(|(id, _)| **id);

    for (id, component) in entries {
        snapshot.extend_from_slice(&id.0.to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
