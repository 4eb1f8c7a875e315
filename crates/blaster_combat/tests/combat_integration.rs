//! Combat integration test
//!
//! Server + clients через LoopbackNetwork (каждое сообщение через wire codec)
//! и standalone App с ручным шагом времени.
//!
//! Проверяем:
//! - Aim prediction + convergence на server и remote observers
//! - Ровно один подтверждённый выстрел на RequestFire, тот же hit point
//! - Equip replication: rotation switch без attachment
//! - Fire-rate governor в полном App (automatic, release)
//! - No-weapon: HUD пустой, FOV не трогаем
//! - Rapier visibility backend: collision groups, стрелок исключён
//! - Client mirror: смена replicated оружия отменяет fire timer

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy::transform::TransformPlugin;
use bevy_rapier3d::prelude::{Collider, CollisionGroups, Group, NoUserData, RapierPhysicsPlugin};
use std::time::Duration;

use blaster_combat::net::{NetInbox, NetMessage, NetOutbox, ReplicatedField, Sender};
use blaster_combat::targeting::rapier_backend::{PROJECTILE_GROUP, VISIBILITY_GROUP};
use blaster_combat::targeting::{CrosshairRay, TraceHit};
use blaster_combat::*;

const CHARACTER_ID: NetId = NetId(1);
const RIFLE_ID: NetId = NetId(100);

/// Точка, куда смотрит любой crosshair ray в этих тестах
const WALL_POINT: Vec3 = Vec3::new(12.5, 140.0, -1500.25);

/// Всё, что peer исполнил за прогон
#[derive(Resource, Default)]
struct Recorded {
    fired: Vec<WeaponFired>,
    montages: Vec<FireMontageRequested>,
}

fn record_fire(
    mut fired: EventReader<WeaponFired>,
    mut montages: EventReader<FireMontageRequested>,
    mut recorded: ResMut<Recorded>,
) {
    recorded.fired.extend(fired.read().cloned());
    recorded.montages.extend(montages.read().cloned());
}

/// Target под crosshair (InteractWithCrosshairs)
#[derive(Resource)]
struct WallTarget(Entity);

/// External visibility backend: любой ray попадает в WALL_POINT
fn wall_backend(wall: Option<Res<WallTarget>>, mut traces: Query<&mut CrosshairTrace>) {
    let entity = wall.map_or(Entity::PLACEHOLDER, |w| w.0);
    for mut trace in traces.iter_mut() {
        trace.resolve_with(&|_: &CrosshairRay| {
            Some(TraceHit {
                entity,
                point: WALL_POINT,
            })
        });
    }
}

/// Helper: App peer'а с шагом времени `step`
fn create_peer(role: NetRole, step: Duration) -> App {
    let mut app = create_headless_app();
    app.insert_resource(role)
        .insert_resource(TraceBackend::External)
        .insert_resource(GameViewport::new(1280.0, 720.0))
        .insert_resource(TimeUpdateStrategy::ManualDuration(step))
        .init_resource::<Recorded>()
        .add_plugins(BlasterCombatPlugin)
        .add_systems(Update, wall_backend.in_set(TraceSet::Backend))
        .add_systems(Update, record_fire.after(CombatSet::Authority));
    app
}

/// Helper: spawn персонажа + rifle (одинаковые NetId на всех peers)
fn spawn_world(app: &mut App, weapon: Weapon, locally_controlled: bool) -> (Entity, Entity) {
    let world = app.world_mut();
    let rifle = world.spawn((weapon, RIFLE_ID)).id();

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

/// Сессия: server + `clients` клиентов, клиент 0 управляет персонажем
struct Session {
    net: LoopbackNetwork,
    server_character: Entity,
    server_rifle: Entity,
    /// (character, rifle) на каждом клиенте
    client_world: Vec<(Entity, Entity)>,
}

impl Session {
    fn new(weapon: Weapon, clients: usize) -> Self {
        let step = Duration::from_millis(16);
        let mut net = LoopbackNetwork::new(create_peer(NetRole::Server, step));
        let (server_character, server_rifle) = spawn_world(&mut net.server, weapon.clone(), false);

        let mut client_world = Vec::new();
        for index in 0..clients {
            let mut client = create_peer(NetRole::Client, step);
            client_world.push(spawn_world(&mut client, weapon.clone(), index == 0));
            net.add_client(client);
        }

        Self {
            net,
            server_character,
            server_rifle,
            client_world,
        }
    }

    fn client(&mut self, index: usize) -> &mut App {
        &mut self.net.clients[index]
    }

    fn send_from_owner<E: Event>(&mut self, event: E) {
        self.net.clients[0].world_mut().send_event(event);
    }

    fn run(&mut self, frames: usize) {
        for _ in 0..frames {
            self.net.update().expect("loopback transport failed");
        }
    }

    fn equip(&mut self) {
        let (character, rifle) = self.client_world[0];
        self.send_from_owner(EquipWeaponIntent { character, weapon: rifle });
        self.run(3);
    }
}

/// Test: SetAiming — prediction сразу, server и remote observer сходятся
#[test]
fn test_aim_is_predicted_and_converges() {
    let mut session = Session::new(Weapon::assault_rifle(), 2);
    session.run(2);

    let (owner_character, _) = session.client_world[0];
    session.send_from_owner(AimIntent {
        character: owner_character,
        aiming: true,
    });
    session.run(1);

    // Owner: prediction в том же кадре
    let owner = session.client(0).world();
    assert!(owner.get::<CombatState>(owner_character).unwrap().is_aiming);
    assert_eq!(owner.get::<CharacterMovement>(owner_character).unwrap().max_walk_speed, 450.0);

    // Server применил SetAiming в том же сетевом кадре
    let server_character = session.server_character;
    assert!(session.net.server.world().get::<CombatState>(server_character).unwrap().is_aiming);

    // Remote observer получает replicated is_aiming
    session.run(1);
    let (remote_character, _) = session.client_world[1];
    let remote = session.client(1).world();
    assert!(remote.get::<CombatState>(remote_character).unwrap().is_aiming);
    assert_eq!(remote.get::<CharacterMovement>(remote_character).unwrap().max_walk_speed, 450.0);
}

/// Test: SetAiming(true) → SetAiming(false) до round trip → везде false
#[test]
fn test_aim_toggle_before_round_trip_converges_to_false() {
    let mut session = Session::new(Weapon::assault_rifle(), 2);
    session.run(2);

    let (character, _) = session.client_world[0];
    session.send_from_owner(AimIntent { character, aiming: true });
    session.send_from_owner(AimIntent { character, aiming: false });
    session.run(3);

    assert!(!session.client(0).world().get::<CombatState>(character).unwrap().is_aiming);

    let server_character = session.server_character;
    assert!(!session.net.server.world().get::<CombatState>(server_character).unwrap().is_aiming);

    let (remote_character, _) = session.client_world[1];
    assert!(!session.client(1).world().get::<CombatState>(remote_character).unwrap().is_aiming);
}

/// Test: server value is_aiming не перезаписывает prediction владельца
#[test]
fn test_replicated_aim_skips_owner() {
    let mut session = Session::new(Weapon::assault_rifle(), 2);
    session.run(2);

    let server_character = session.server_character;
    session
        .net
        .server
        .world_mut()
        .get_mut::<CombatState>(server_character)
        .unwrap()
        .is_aiming = true;
    session.run(2);

    let (owner_character, _) = session.client_world[0];
    let (remote_character, _) = session.client_world[1];
    assert!(!session.client(0).world().get::<CombatState>(owner_character).unwrap().is_aiming);
    assert!(session.client(1).world().get::<CombatState>(remote_character).unwrap().is_aiming);
}

/// Test: equip на server, replication на клиентах без attachment
#[test]
fn test_equip_replicates_rotation_without_attachment() {
    let mut session = Session::new(Weapon::assault_rifle(), 2);
    session.run(1);
    session.equip();

    // Server: полный equip
    let server = session.net.server.world();
    let state = server.get::<CombatState>(session.server_character).unwrap();
    assert_eq!(state.equipped_weapon, Some(session.server_rifle));
    assert_eq!(*server.get::<RotationMode>(session.server_character).unwrap(), RotationMode::ControllerYaw);
    assert_eq!(server.get::<Weapon>(session.server_rifle).unwrap().state(), WeaponState::Equipped);
    assert!(server.get::<Attachment>(session.server_rifle).is_some());

    // Клиенты: equipped_weapon + rotation, attachment НЕ повторяется
    for index in 0..2 {
        let (character, rifle) = session.client_world[index];
        let client = session.client(index).world();
        assert_eq!(client.get::<CombatState>(character).unwrap().equipped_weapon, Some(rifle));
        assert_eq!(*client.get::<RotationMode>(character).unwrap(), RotationMode::ControllerYaw);
        assert!(client.get::<Attachment>(rifle).is_none());
    }
}

/// Test: один press semi-auto → ровно один выстрел на каждом peer, тот же hit point
#[test]
fn test_fire_confirmed_exactly_once_with_same_hit_point() {
    let mut session = Session::new(Weapon::pistol(), 2);
    session.run(1);
    session.equip();

    let (character, _) = session.client_world[0];
    session.send_from_owner(FireButtonIntent { character, pressed: true });
    session.run(3);
    session.send_from_owner(FireButtonIntent { character, pressed: false });
    session.run(30);

    let server_fired = &session.net.server.world().resource::<Recorded>().fired;
    assert_eq!(server_fired.len(), 1);
    assert_eq!(server_fired[0].hit_target, WALL_POINT);
    assert_eq!(server_fired[0].shooter, session.server_character);
    assert_eq!(server_fired[0].weapon, session.server_rifle);

    for index in 0..2 {
        let (character, rifle) = session.client_world[index];
        let recorded = session.client(index).world().resource::<Recorded>();
        assert_eq!(recorded.fired.len(), 1, "client {} fired count", index);
        assert_eq!(recorded.fired[0].hit_target, WALL_POINT);
        assert_eq!(recorded.fired[0].shooter, character);
        assert_eq!(recorded.fired[0].weapon, rifle);
        assert_eq!(recorded.montages.len(), 1);
    }
}

/// Test: FireConfirmed раньше equip replication → no-op, потом исполняется
#[test]
fn test_fire_before_equip_replication_is_tolerated() {
    let mut client = create_peer(NetRole::Client, Duration::from_millis(16));
    let (character, rifle) = spawn_world(&mut client, Weapon::assault_rifle(), false);
    client.update();

    let push = |client: &mut App, message: NetMessage| {
        client.world_mut().resource_mut::<NetInbox>().push(Sender::Server, message);
    };

    push(
        &mut client,
        NetMessage::FireConfirmed {
            character: CHARACTER_ID,
            shot: 1,
            hit_target: WALL_POINT.into(),
        },
    );
    client.update();
    assert!(client.world().resource::<Recorded>().fired.is_empty());

    push(
        &mut client,
        NetMessage::Replicate {
            character: CHARACTER_ID,
            field: ReplicatedField::EquippedWeapon(Some(RIFLE_ID)),
        },
    );
    push(
        &mut client,
        NetMessage::FireConfirmed {
            character: CHARACTER_ID,
            shot: 2,
            hit_target: WALL_POINT.into(),
        },
    );
    // Повторная доставка того же выстрела
    push(
        &mut client,
        NetMessage::FireConfirmed {
            character: CHARACTER_ID,
            shot: 2,
            hit_target: WALL_POINT.into(),
        },
    );
    client.update();

    let recorded = client.world().resource::<Recorded>();
    assert_eq!(recorded.fired.len(), 1);
    assert_eq!(recorded.fired[0].weapon, rifle);
    assert_eq!(recorded.fired[0].shooter, character);
}

/// Test: replicated оружие, которого нет на этом peer → поле пропущено
#[test]
fn test_unknown_replicated_weapon_is_skipped() {
    let mut client = create_peer(NetRole::Client, Duration::from_millis(16));
    let (character, _) = spawn_world(&mut client, Weapon::assault_rifle(), false);
    client.update();

    client.world_mut().resource_mut::<NetInbox>().push(
        Sender::Server,
        NetMessage::Replicate {
            character: CHARACTER_ID,
            field: ReplicatedField::EquippedWeapon(Some(NetId(999))),
        },
    );
    client.update();

    let world = client.world();
    assert_eq!(world.get::<CombatState>(character).unwrap().equipped_weapon, None);
    assert_eq!(*world.get::<RotationMode>(character).unwrap(), RotationMode::OrientToMovement);
}

/// Helper: standalone App (100ms шаг) с экипированным оружием
fn standalone_armed(weapon: Weapon) -> (App, Entity) {
    let mut app = create_peer(NetRole::Standalone, Duration::from_millis(100));
    let (character, rifle) = spawn_world(&mut app, weapon, true);

    app.world_mut().send_event(EquipWeaponIntent { character, weapon: rifle });
    // Первый update: delta = 0, equip
    app.update();

    (app, character)
}

/// Test: automatic, fire_delay 0.5, держим → выстрелы на 0, 0.5, 1.0
#[test]
fn test_automatic_fire_while_held() {
    let (mut app, character) = standalone_armed(Weapon::assault_rifle().with_fire_delay(0.5));

    app.world_mut().send_event(FireButtonIntent { character, pressed: true });

    // Кадры по 100ms: press-кадр + 10 кадров = 1.0s
    let mut shots_at = Vec::new();
    for frame in 0..=10 {
        app.update();
        let total = app.world().resource::<Recorded>().fired.len();
        if total > shots_at.len() {
            shots_at.push(frame * 100);
        }
    }

    assert_eq!(shots_at, vec![0, 500, 1000]);
}

/// Test: release на 0.6 → выстрела на 1.0 нет
#[test]
fn test_release_stops_automatic_fire() {
    let (mut app, character) = standalone_armed(Weapon::assault_rifle().with_fire_delay(0.5));

    app.world_mut().send_event(FireButtonIntent { character, pressed: true });
    for frame in 0..=15 {
        if frame == 6 {
            app.world_mut().send_event(FireButtonIntent { character, pressed: false });
        }
        app.update();
    }

    assert_eq!(app.world().resource::<Recorded>().fired.len(), 2);

    let state = app.world().get::<CombatState>(character).unwrap();
    assert!(state.can_fire);
    assert!(!state.fire_button_held);
}

/// Test: crosshair trace → hit_target, подсветка и Alert tint
#[test]
fn test_external_trace_highlights_interactive_target() {
    let (mut app, character) = standalone_armed(Weapon::assault_rifle());

    let target = app.world_mut().spawn(InteractWithCrosshairs).id();
    app.insert_resource(WallTarget(target));
    app.update();

    let world = app.world();
    let state = world.get::<CombatState>(character).unwrap();
    assert_eq!(state.hit_target, WALL_POINT);
    assert!(state.target_highlighted);

    let hud = world.get::<HudPacket>(character).unwrap();
    assert_eq!(hud.tint, CrosshairTint::Alert);
    assert!(!hud.crosshairs.is_empty());
}

/// Test: выстрел использует hit_target того же кадра
#[test]
fn test_fire_uses_current_hit_target() {
    let (mut app, character) = standalone_armed(Weapon::pistol());

    app.world_mut().send_event(FireButtonIntent { character, pressed: true });
    app.update();

    let recorded = app.world().resource::<Recorded>();
    assert_eq!(recorded.fired.len(), 1);
    assert_eq!(recorded.fired[0].hit_target, WALL_POINT);
}

/// Test: без оружия — HUD пустой, FOV не меняется, выстрела нет
#[test]
fn test_no_weapon_hud_and_fov_noop() {
    let mut app = create_peer(NetRole::Standalone, Duration::from_millis(100));
    let (character, _) = spawn_world(&mut app, Weapon::assault_rifle(), true);
    app.update();

    app.world_mut().send_event(AimIntent { character, aiming: true });
    app.world_mut().send_event(FireButtonIntent { character, pressed: true });
    for _ in 0..10 {
        app.update();
    }

    let world = app.world();
    assert!(world.get::<HudPacket>(character).unwrap().crosshairs.is_empty());
    assert_eq!(world.get::<FollowCamera>(character).unwrap().field_of_view, 90.0);
    assert_eq!(world.get::<CombatState>(character).unwrap().current_fov, 90.0);
    assert!(world.resource::<Recorded>().fired.is_empty());
}

/// Test: aim с оружием → FOV идёт к zoomed_fov, без aim → обратно к default
#[test]
fn test_aim_zooms_camera_fov() {
    let (mut app, character) = standalone_armed(Weapon::assault_rifle().with_zoom(30.0, 20.0));

    app.world_mut().send_event(AimIntent { character, aiming: true });
    // 100ms × 20 = alpha 1 → сразу target
    app.update();
    assert_eq!(app.world().get::<FollowCamera>(character).unwrap().field_of_view, 30.0);

    app.world_mut().send_event(AimIntent { character, aiming: false });
    app.update();
    assert_eq!(app.world().get::<FollowCamera>(character).unwrap().field_of_view, 90.0);
}

/// Test: despawn оружия посреди cooldown → таймер отменён, без паники
#[test]
fn test_weapon_despawn_cancels_fire_timer() {
    let (mut app, character) = standalone_armed(Weapon::assault_rifle().with_fire_delay(0.5));
    let rifle = app.world().get::<CombatState>(character).unwrap().equipped_weapon.unwrap();

    app.world_mut().send_event(FireButtonIntent { character, pressed: true });
    app.update();
    assert!(app.world().get::<FireTimer>(character).is_some());

    app.world_mut().despawn(rifle);
    for _ in 0..10 {
        app.update();
    }

    let world = app.world();
    assert!(world.get::<FireTimer>(character).is_none());
    let state = world.get::<CombatState>(character).unwrap();
    assert!(state.can_fire);
    assert_eq!(state.equipped_weapon, None);
    assert_eq!(world.resource::<Recorded>().fired.len(), 1);
}

/// Test: client mirror — оружие снято посреди cooldown, re-equip → снова стреляет
#[test]
fn test_replicated_unequip_cancels_client_fire_timer() {
    let mut client = create_peer(NetRole::Client, Duration::from_millis(100));
    let (character, _) = spawn_world(&mut client, Weapon::assault_rifle().with_fire_delay(0.5), true);
    client.update();

    let replicate = |client: &mut App, weapon: Option<NetId>| {
        client.world_mut().resource_mut::<NetInbox>().push(
            Sender::Server,
            NetMessage::Replicate {
                character: CHARACTER_ID,
                field: ReplicatedField::EquippedWeapon(weapon),
            },
        );
    };
    let sent_fire_requests = |client: &mut App| {
        client
            .world_mut()
            .resource_mut::<NetOutbox>()
            .drain()
            .into_iter()
            .filter(|message| matches!(message, NetMessage::RequestFire { .. }))
            .count()
    };

    replicate(&mut client, Some(RIFLE_ID));
    client.update();

    client.world_mut().send_event(FireButtonIntent { character, pressed: true });
    client.update();
    assert_eq!(sent_fire_requests(&mut client), 1);
    assert!(client.world().get::<FireTimer>(character).is_some());

    // Server снял оружие до истечения cooldown
    replicate(&mut client, None);
    client.world_mut().send_event(FireButtonIntent { character, pressed: false });
    client.update();

    let state = client.world().get::<CombatState>(character).unwrap();
    assert_eq!(state.equipped_weapon, None);
    assert!(state.can_fire);
    assert!(client.world().get::<FireTimer>(character).is_none());

    for _ in 0..10 {
        client.update();
    }

    replicate(&mut client, Some(RIFLE_ID));
    client.update();
    client.world_mut().send_event(FireButtonIntent { character, pressed: true });
    client.update();

    assert_eq!(sent_fire_requests(&mut client), 1);
    assert!(!client.world().get::<CombatState>(character).unwrap().can_fire);
    assert!(client.world().get::<FireTimer>(character).is_some());
}

/// Стена на z = -500 (front face z = -499), блокирует visibility
const RAPIER_WALL_Z: f32 = -500.0;

/// Helper: standalone App с Rapier visibility backend (default TraceBackend)
fn create_rapier_peer() -> (App, Entity) {
    let mut app = create_headless_app();
    app.insert_resource(NetRole::Standalone)
        .insert_resource(GameViewport::new(1280.0, 720.0))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)))
        .add_plugins((TransformPlugin, RapierPhysicsPlugin::<NoUserData>::default()))
        .add_plugins(BlasterCombatPlugin);

    let (character, _) = spawn_world(&mut app, Weapon::assault_rifle(), true);
    (app, character)
}

fn spawn_slab(app: &mut App, z: f32, groups: CollisionGroups) -> Entity {
    app.world_mut()
        .spawn((
            Collider::cuboid(1000.0, 1000.0, 1.0),
            groups,
            Transform::from_xyz(0.0, 150.0, z),
        ))
        .id()
}

fn visibility_blocker() -> CollisionGroups {
    CollisionGroups::new(VISIBILITY_GROUP, Group::ALL)
}

/// Helper: несколько кадров, чтобы Rapier подхватил colliders
fn settle(app: &mut App) {
    for _ in 0..3 {
        app.update();
    }
}

fn assert_hit_on_wall(state: &CombatState) {
    let expected = Vec3::new(0.0, 150.0, RAPIER_WALL_Z + 1.0);
    assert!(
        (state.hit_target - expected).length() < 0.01,
        "hit_target {:?}, expected {:?}",
        state.hit_target,
        expected
    );
}

/// Test: Rapier backend — попадание в interactive стену и подсветка
#[test]
fn test_rapier_trace_hits_interactive_wall() {
    let (mut app, character) = create_rapier_peer();
    let wall = spawn_slab(&mut app, RAPIER_WALL_Z, visibility_blocker());
    app.world_mut().entity_mut(wall).insert(InteractWithCrosshairs);
    settle(&mut app);

    let state = app.world().get::<CombatState>(character).unwrap();
    assert_hit_on_wall(state);
    assert!(state.target_highlighted);
}

/// Test: collider самого стрелка (visibility group) не останавливает ray
#[test]
fn test_rapier_trace_ignores_shooter_collider() {
    let (mut app, character) = create_rapier_peer();
    // Ray стартует внутри этой сферы
    app.world_mut()
        .entity_mut(character)
        .insert((Collider::ball(200.0), visibility_blocker()));
    spawn_slab(&mut app, RAPIER_WALL_Z, visibility_blocker());
    settle(&mut app);

    let state = app.world().get::<CombatState>(character).unwrap();
    assert_hit_on_wall(state);
    assert!(!state.target_highlighted);
}

/// Test: projectile-only collider не блокирует visibility ray
#[test]
fn test_rapier_trace_passes_projectile_group() {
    let (mut app, character) = create_rapier_peer();
    let projectile_shield = spawn_slab(&mut app, -250.0, CollisionGroups::new(PROJECTILE_GROUP, Group::ALL));
    app.world_mut().entity_mut(projectile_shield).insert(InteractWithCrosshairs);
    spawn_slab(&mut app, RAPIER_WALL_Z, visibility_blocker());
    settle(&mut app);

    let state = app.world().get::<CombatState>(character).unwrap();
    assert_hit_on_wall(state);
    assert!(!state.target_highlighted);
}
