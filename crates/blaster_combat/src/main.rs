//! Headless демо Blaster combat core
//!
//! Server + один client через LoopbackNetwork: client экипирует rifle,
//! прицеливается и держит огонь 1 секунду.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use blaster_combat::net::LoopbackNetwork;
use blaster_combat::targeting::{CrosshairRay, TraceHit};
use blaster_combat::{
    create_headless_app, AimIntent, BlasterCombatPlugin, Character, CombatSet, CombatState, CrosshairTrace,
    EquipWeaponIntent, FireButtonIntent, FollowCamera, GameViewport, HudPacket, LocallyControlled, NetId, NetRole,
    SkeletonSockets, TraceBackend, TraceSet, Weapon, WeaponFired,
};

const CHARACTER_ID: NetId = NetId(1);
const RIFLE_ID: NetId = NetId(100);

/// Сколько WeaponFired увидел этот peer
#[derive(Resource, Default)]
struct ShotCount(usize);

fn count_shots(mut fired: EventReader<WeaponFired>, mut count: ResMut<ShotCount>) {
    count.0 += fired.read().count();
}

/// Visibility backend демо: бесконечная стена на z = −2000
fn wall_backend(mut traces: Query<&mut CrosshairTrace>) {
    for mut trace in traces.iter_mut() {
        trace.resolve_with(&|ray: &CrosshairRay| {
            if ray.direction.z >= 0.0 {
                return None;
            }
            let distance = (-2000.0 - ray.origin.z) / ray.direction.z;
            (distance >= 0.0 && distance <= ray.max_distance).then(|| TraceHit {
                entity: Entity::PLACEHOLDER,
                point: ray.origin + ray.direction * distance,
            })
        });
    }
}

fn build_peer(role: NetRole) -> App {
    let mut app = create_headless_app();
    app.insert_resource(role)
        .insert_resource(TraceBackend::External)
        .insert_resource(GameViewport::new(1280.0, 720.0))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)))
        .init_resource::<ShotCount>()
        .add_plugins(BlasterCombatPlugin)
        .add_systems(Update, wall_backend.in_set(TraceSet::Backend))
        .add_systems(Update, count_shots.after(CombatSet::Authority));
    app
}

/// Одинаковый мир на каждом peer (NetId совпадают)
fn spawn_world(app: &mut App, locally_controlled: bool) -> (Entity, Entity) {
    let world = app.world_mut();
    let rifle = world.spawn((Weapon::assault_rifle(), RIFLE_ID)).id();

    let mut character = world.spawn((
        Character,
        CHARACTER_ID,
        SkeletonSockets::default().with_socket("RightHandSocket", Transform::from_xyz(20.0, 90.0, 0.0)),
        FollowCamera {
            transform: Transform::from_xyz(0.0, 150.0, 300.0).looking_at(Vec3::new(0.0, 150.0, 0.0), Vec3::Y),
            field_of_view: 90.0,
        },
    ));
    if locally_controlled {
        character.insert((LocallyControlled, HudPacket::default()));
    }

    (character.id(), rifle)
}

fn main() {
    println!("Starting Blaster combat headless demo (server + 1 client)");

    let mut net = LoopbackNetwork::new(build_peer(NetRole::Server));
    let client_id = net.add_client(build_peer(NetRole::Client));

    spawn_world(&mut net.server, false);
    let Some(client) = net.client_mut(client_id) else {
        return;
    };
    let (character, rifle) = spawn_world(client, true);

    client.world_mut().send_event(EquipWeaponIntent { character, weapon: rifle });

    for tick in 0..120 {
        if let Some(client) = net.client_mut(client_id) {
            match tick {
                10 => {
                    client.world_mut().send_event(AimIntent { character, aiming: true });
                    client.world_mut().send_event(FireButtonIntent { character, pressed: true });
                }
                70 => {
                    client.world_mut().send_event(FireButtonIntent { character, pressed: false });
                }
                _ => {}
            }
        }

        if let Err(err) = net.update() {
            eprintln!("Loopback transport failed: {}", err);
            return;
        }

        if tick % 20 == 0 {
            if let Some(client) = net.client(client_id) {
                if let Some(state) = client.world().get::<CombatState>(character) {
                    println!(
                        "Tick {}: equipped={} aiming={} fov={:.1} hit={:?}",
                        tick,
                        state.has_weapon(),
                        state.is_aiming,
                        state.current_fov,
                        state.hit_target
                    );
                }
            }
        }
    }

    let server_shots = net.server.world().resource::<ShotCount>().0;
    let client_shots = net.client(client_id).map_or(0, |c| c.world().resource::<ShotCount>().0);
    println!("Shots executed: server={} client={}", server_shots, client_shots);
    println!("Demo complete!");
}
