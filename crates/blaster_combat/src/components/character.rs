//! Character компоненты: movement slice, rotation mode, camera, sockets
//!
//! Locomotion/animation живут снаружи core. Здесь только узкий срез, который
//! combat читает (скорость, falling, позиция) и пишет (max walk speed,
//! rotation mode, FOV).

use bevy::prelude::*;
use std::collections::HashMap;

use crate::combat::CombatState;
use crate::net::ShotLedger;
use crate::reticle::ReticleModel;
use crate::targeting::CrosshairTrace;

/// Персонаж (игрок или remote replica)
///
/// Автоматически добавляет CombatState, CharacterMovement, RotationMode,
/// ReticleModel, ShotLedger, Transform через Required Components.
/// CombatState живёт и умирает вместе с персонажем.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(CombatState, CharacterMovement, RotationMode, ReticleModel, ShotLedger, Transform)]
pub struct Character;

/// Marker: персонаж управляется ЛОКАЛЬНО этим процессом
///
/// Crosshair trace, reticle и FOV работают только для него.
/// Remote replicas этого компонента не имеют.
///
/// # Possession
/// ```ignore
/// commands.entity(old_character).remove::<LocallyControlled>();
/// commands.entity(new_character).insert(LocallyControlled);
/// ```
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(CrosshairTrace)]
pub struct LocallyControlled;

/// Movement срез, который видит combat core
///
/// velocity/is_falling пишет locomotion (снаружи), max_walk_speed пишет combat
/// (aim slows down).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CharacterMovement {
    /// Max walk speed (world units/s)
    pub max_walk_speed: f32,
    /// Текущая velocity (world units/s)
    pub velocity: Vec3,
    /// В воздухе (прыжок / падение)
    pub is_falling: bool,
}

impl Default for CharacterMovement {
    fn default() -> Self {
        Self {
            max_walk_speed: 600.0,
            velocity: Vec3::ZERO,
            is_falling: false,
        }
    }
}

impl CharacterMovement {
    /// Горизонтальная скорость (Y = up, вертикаль игнорируется)
    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z).length()
    }
}

/// Как поворачивается тело персонажа
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum RotationMode {
    /// Тело смотрит по направлению движения (без оружия)
    #[default]
    OrientToMovement,
    /// Тело следует yaw контроллера (с оружием: torso целится независимо от движения)
    ControllerYaw,
}

/// Follow camera персонажа
///
/// `transform` — world pose камеры, ведётся camera rig'ом (снаружи core).
/// `field_of_view` — horizontal FOV в градусах; combat пишет его каждый кадр
/// при zoom interpolation.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct FollowCamera {
    pub transform: Transform,
    pub field_of_view: f32,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            field_of_view: 90.0,
        }
    }
}

/// Attachment sockets скелета (local space персонажа)
///
/// Заполняется при spawn из skeletal mesh (asset loading снаружи).
#[derive(Component, Debug, Clone, Default)]
pub struct SkeletonSockets {
    pub sockets: HashMap<String, Transform>,
}

impl SkeletonSockets {
    pub fn with_socket(mut self, name: impl Into<String>, transform: Transform) -> Self {
        self.sockets.insert(name.into(), transform);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Transform> {
        self.sockets.get(name)
    }
}

/// Размер game viewport (пикселей), пишет presentation layer
///
/// Отсутствие resource = deprojection невозможна (dedicated server).
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct GameViewport {
    pub size: Vec2,
}

impl GameViewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
        }
    }

    /// Центр экрана (crosshair location)
    pub fn center(&self) -> Vec2 {
        self.size / 2.0
    }
}
