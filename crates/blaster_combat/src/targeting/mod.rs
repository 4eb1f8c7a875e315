//! Targeting tracer — что находится под crosshair
//!
//! Каждый кадр, ТОЛЬКО для LocallyControlled (чисто client-local perception):
//! 1. aim_crosshair_rays: центр viewport → deproject через FollowCamera → ray
//!    (старт ray сдвинут за персонажа, чтобы не попасть в себя)
//! 2. visibility backend: ray → hit / miss (Rapier по умолчанию, host может подменить)
//! 3. apply_crosshair_traces: hit_target + подсветка interactive target
//!
//! Deprojection не удалась → кадр пропускается, hit_target остаётся прежним.

use bevy::prelude::*;

pub mod rapier_backend;

use crate::combat::{CombatState, InteractWithCrosshairs};
use crate::components::{FollowCamera, GameViewport, LocallyControlled};
use crate::config::CombatConfig;

/// Ray от crosshair в world space
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct CrosshairRay {
    pub origin: Vec3,
    /// Normalized
    pub direction: Vec3,
    pub max_distance: f32,
}

impl CrosshairRay {
    /// Дальний конец ray (fallback hit point при промахе)
    pub fn end(&self) -> Vec3 {
        self.origin + self.direction * self.max_distance
    }
}

/// Попадание visibility ray
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct TraceHit {
    pub entity: Entity,
    pub point: Vec3,
}

/// Результат visibility ray
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum TraceOutcome {
    Miss,
    Hit(TraceHit),
}

/// Crosshair trace текущего кадра (на LocallyControlled персонаже)
///
/// `request` пишет tracer, `outcome` пишет visibility backend.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CrosshairTrace {
    pub request: Option<CrosshairRay>,
    pub outcome: Option<TraceOutcome>,
}

impl CrosshairTrace {
    /// Разрешить pending request через backend
    pub fn resolve_with(&mut self, backend: &impl VisibilityTrace) {
        let Some(ray) = self.request else {
            return;
        };

        self.outcome = Some(match backend.cast_visibility_ray(&ray) {
            Some(hit) => TraceOutcome::Hit(hit),
            None => TraceOutcome::Miss,
        });
    }
}

/// World query: один ray по visibility collision group
pub trait VisibilityTrace {
    fn cast_visibility_ray(&self, ray: &CrosshairRay) -> Option<TraceHit>;
}

impl<F> VisibilityTrace for F
where
    F: Fn(&CrosshairRay) -> Option<TraceHit>,
{
    fn cast_visibility_ray(&self, ray: &CrosshairRay) -> Option<TraceHit> {
        self(ray)
    }
}

/// Deproject screen point → (world origin, world direction)
///
/// Perspective камера, `fov_degrees` — horizontal FOV, forward = −Z.
/// None если viewport вырожден или результат не finite.
pub fn deproject_screen_to_world(
    screen: Vec2,
    viewport: Vec2,
    camera: &Transform,
    fov_degrees: f32,
) -> Option<(Vec3, Vec3)> {
    if viewport.x <= 0.0 || viewport.y <= 0.0 || !viewport.is_finite() {
        return None;
    }
    if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
        return None;
    }

    // Screen (0,0 = top-left) → NDC [-1, 1], Y вверх
    let ndc = Vec2::new(
        screen.x / viewport.x * 2.0 - 1.0,
        1.0 - screen.y / viewport.y * 2.0,
    );

    let tan_half = (fov_degrees.to_radians() * 0.5).tan();
    let aspect = viewport.x / viewport.y;
    let local = Vec3::new(ndc.x * tan_half, ndc.y * tan_half / aspect, -1.0);

    let direction = (camera.rotation * local).try_normalize()?;
    let origin = camera.translation;

    if !origin.is_finite() {
        return None;
    }

    Some((origin, direction))
}

/// Crosshair ray для персонажа
///
/// Старт сдвигается вдоль ray на (distance до персонажа + margin), чтобы ray
/// начинался перед collision volume персонажа.
pub fn crosshair_ray(
    viewport: &GameViewport,
    camera: &FollowCamera,
    character_position: Vec3,
    config: &CombatConfig,
) -> Option<CrosshairRay> {
    let (origin, direction) = deproject_screen_to_world(
        viewport.center(),
        viewport.size,
        &camera.transform,
        camera.field_of_view,
    )?;

    let distance_to_character = (character_position - origin).length();
    let start = origin + direction * (distance_to_character + config.trace_start_margin);

    Some(CrosshairRay {
        origin: start,
        direction,
        max_distance: config.trace_length,
    })
}

/// Hit point: impact если попали, иначе дальний конец ray
pub fn resolve_hit_point(ray: &CrosshairRay, outcome: &TraceOutcome) -> Vec3 {
    match outcome {
        TraceOutcome::Hit(hit) => hit.point,
        TraceOutcome::Miss => ray.end(),
    }
}

/// System: построить crosshair ray (шаг 1)
pub fn aim_crosshair_rays(
    viewport: Option<Res<GameViewport>>,
    config: Res<CombatConfig>,
    mut characters: Query<(&Transform, Option<&FollowCamera>, &mut CrosshairTrace), With<LocallyControlled>>,
) {
    for (transform, camera, mut trace) in characters.iter_mut() {
        trace.outcome = None;
        trace.request = match (viewport.as_deref(), camera) {
            (Some(viewport), Some(camera)) => crosshair_ray(viewport, camera, transform.translation, &config),
            _ => None,
        };
    }
}

/// System: применить результат trace к CombatState (шаг 3)
pub fn apply_crosshair_traces(
    mut characters: Query<(&mut CombatState, &CrosshairTrace), With<LocallyControlled>>,
    interactive: Query<(), With<InteractWithCrosshairs>>,
) {
    for (mut state, trace) in characters.iter_mut() {
        // Нет request (deprojection fail) или backend не ответил → stale hit_target
        let (Some(ray), Some(outcome)) = (trace.request, trace.outcome) else {
            continue;
        };

        state.hit_target = resolve_hit_point(&ray, &outcome);
        state.target_highlighted = match outcome {
            TraceOutcome::Hit(hit) => interactive.contains(hit.entity),
            TraceOutcome::Miss => false,
        };
    }
}
