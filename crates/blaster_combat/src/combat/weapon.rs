//! Weapon entity — компоненты и события
//!
//! Architecture:
//! - Weapon entity спавнится миром (снаружи core), core только attach'ит и вызывает
//! - Fire behaviour (projectile, damage) живёт снаружи: core шлёт `WeaponFired`
//! - Fire animation тоже снаружи: core шлёт `FireMontageRequested`

use bevy::prelude::*;

/// Lifecycle состояние оружия
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum WeaponState {
    /// Лежит в мире, никем не поднято
    #[default]
    Initial,
    /// В руках у персонажа
    Equipped,
    /// Выброшено (physics снаружи)
    Dropped,
}

/// Crosshair texture set оружия (5 слотов HUD)
///
/// Пути к asset'ам; загрузка и рендер снаружи core. `None` = слот пуст.
#[derive(Debug, Clone, Default, PartialEq, Eq, Reflect)]
pub struct CrosshairTextures {
    pub center: Option<String>,
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl CrosshairTextures {
    /// Стандартный набор: `<dir>/center.png`, `<dir>/top.png`, ...
    pub fn from_directory(dir: &str) -> Self {
        let slot = |name: &str| Some(format!("{}/{}.png", dir, name));
        Self {
            center: slot("center"),
            top: slot("top"),
            bottom: slot("bottom"),
            left: slot("left"),
            right: slot("right"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_none()
            && self.top.is_none()
            && self.bottom.is_none()
            && self.left.is_none()
            && self.right.is_none()
    }
}

/// Weapon component (на weapon entity)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Transform)]
pub struct Weapon {
    /// Пауза между выстрелами (секунды)
    pub fire_delay: f32,

    /// Automatic: удержание кнопки = очередь
    pub automatic: bool,

    /// FOV при прицеливании (градусы)
    pub zoomed_fov: f32,

    /// Скорость zoom-in к zoomed_fov
    pub zoomed_fov_interp_speed: f32,

    pub crosshairs: CrosshairTextures,

    state: WeaponState,
}

impl Default for Weapon {
    fn default() -> Self {
        Self::assault_rifle()
    }
}

impl Weapon {
    /// Automatic rifle
    pub fn assault_rifle() -> Self {
        Self {
            fire_delay: 0.15,
            automatic: true,
            zoomed_fov: 30.0,
            zoomed_fov_interp_speed: 20.0,
            crosshairs: CrosshairTextures::from_directory("textures/crosshairs/rifle"),
            state: WeaponState::Initial,
        }
    }

    /// Semi-automatic pistol
    pub fn pistol() -> Self {
        Self {
            fire_delay: 0.4,
            automatic: false,
            zoomed_fov: 55.0,
            zoomed_fov_interp_speed: 25.0,
            crosshairs: CrosshairTextures::from_directory("textures/crosshairs/pistol"),
            state: WeaponState::Initial,
        }
    }

    pub fn with_fire_delay(mut self, fire_delay: f32) -> Self {
        self.fire_delay = fire_delay;
        self
    }

    pub fn with_automatic(mut self, automatic: bool) -> Self {
        self.automatic = automatic;
        self
    }

    pub fn with_zoom(mut self, zoomed_fov: f32, interp_speed: f32) -> Self {
        self.zoomed_fov = zoomed_fov;
        self.zoomed_fov_interp_speed = interp_speed;
        self
    }

    pub fn state(&self) -> WeaponState {
        self.state
    }

    /// Сменить lifecycle состояние (equip / drop)
    pub fn set_state(&mut self, state: WeaponState) {
        self.state = state;
    }
}

/// Capability: entity подсвечивает crosshair (враг, интерактивный объект)
///
/// Tracer проверяет наличие компонента на hit entity.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct InteractWithCrosshairs;

/// Event: оружие выстрелило (core → projectile/damage layer)
///
/// Генерируется на КАЖДОМ observer после server-confirmed выстрела,
/// в server порядке. Projectile spawn / damage resolution — снаружи.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct WeaponFired {
    /// Какое оружие
    pub weapon: Entity,

    /// Кто стреляет
    pub shooter: Entity,

    /// Точка прицеливания (crosshair trace стрелка)
    pub hit_target: Vec3,
}

/// Event: проиграть fire animation (core → animation layer)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct FireMontageRequested {
    pub character: Entity,

    /// Ironsights вариант анимации
    pub aiming: bool,
}
