//! Rapier visibility backend для crosshair trace
//!
//! ## Collision groups:
//! - GROUP_1: Visibility (всё что блокирует взгляд: actors, стены, props)
//! - GROUP_2: Projectiles (НЕ блокируют visibility ray)
//!
//! ## Использование:
//! ```ignore
//! // Стена
//! commands.spawn((Collider::cuboid(5.0, 3.0, 0.2), CollisionGroups::new(VISIBILITY_GROUP, Group::ALL)));
//! ```

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::{CrosshairRay, CrosshairTrace, TraceHit};

/// Group 1: Visibility channel
pub const VISIBILITY_GROUP: Group = Group::GROUP_1;

/// Group 2: Projectiles
pub const PROJECTILE_GROUP: Group = Group::GROUP_2;

/// Filter для visibility ray: только объекты в VISIBILITY_GROUP, без самого стрелка
pub fn visibility_filter(shooter: Entity) -> QueryFilter<'static> {
    QueryFilter::default()
        .groups(CollisionGroups::new(Group::ALL, VISIBILITY_GROUP))
        .exclude_rigid_body(shooter)
        .exclude_collider(shooter)
}

/// System: разрешить crosshair traces через Rapier query pipeline
///
/// Нет Rapier контекста (dedicated server без physics, тесты) → outcome
/// остаётся None, apply шаг пропустит кадр.
pub fn resolve_crosshair_traces_rapier(
    rapier: ReadRapierContext,
    mut traces: Query<(Entity, &mut CrosshairTrace)>,
) {
    let Ok(context) = rapier.single() else {
        return;
    };

    for (shooter, mut trace) in traces.iter_mut() {
        trace.resolve_with(&|ray: &CrosshairRay| {
            let (entity, toi) = context.cast_ray(
                ray.origin,
                ray.direction,
                ray.max_distance,
                true,
                visibility_filter(shooter),
            )?;

            Some(TraceHit {
                entity,
                point: ray.origin + ray.direction * toi,
            })
        });
    }
}
