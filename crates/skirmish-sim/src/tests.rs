//! Tests for the world framework, the concrete systems and the session.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec2;

use skirmish_core::components::*;
use skirmish_core::constants::*;
use skirmish_core::defs::ScalingConfig;
use skirmish_core::events::GameEvent;
use skirmish_core::input::{ButtonAction, InputEvent};
use skirmish_core::state::EntityViewKind;
use skirmish_core::types::{EntityId, WorldBounds};

use crate::config::{basic_enemy, GameConfig, ObstacleConfig};
use crate::ecs::entity::EntityBuilder;
use crate::ecs::system::{System, SystemContext, SystemMembers};
use crate::ecs::world::World;
use crate::enemy_manager::{EnemyCatalog, EnemyManager};
use crate::engine::Session;
use crate::systems::ai_behavior::AiBehaviorSystem;
use crate::systems::character_controller::CharacterControllerSystem;
use crate::systems::collision::CollisionSystem;
use crate::systems::combat::{projectile, CombatSystem, HealthSystem, ProjectileSystem};
use crate::systems::wave_spawn::WaveSpawnSystem;
use crate::world_setup;

/// Records each tick it runs and can despawn every member it visits.
struct Recorder {
    name: &'static str,
    required: &'static [ComponentKind],
    members: SystemMembers,
    log: Rc<RefCell<Vec<String>>>,
    despawn_members: bool,
}

impl Recorder {
    fn new(name: &'static str, required: &'static [ComponentKind], log: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            name,
            required,
            members: SystemMembers::new(),
            log,
            despawn_members: false,
        }
    }
}

impl System for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn required_components(&self) -> &'static [ComponentKind] {
        self.required
    }

    fn members(&self) -> &SystemMembers {
        &self.members
    }

    fn members_mut(&mut self) -> &mut SystemMembers {
        &mut self.members
    }

    fn fixed_update(&mut self, ctx: &mut SystemContext<'_>, _dt: f32) {
        self.log.borrow_mut().push(self.name.to_string());
        for id in self.members.snapshot() {
            self.log.borrow_mut().push(format!("{}:{}", self.name, id));
            if self.despawn_members {
                ctx.commands.despawn(id);
            }
        }
    }
}

const TRANSFORM_HEALTH: &[ComponentKind] = &[ComponentKind::Transform, ComponentKind::Health];
const TRANSFORM_ONLY: &[ComponentKind] = &[ComponentKind::Transform];

fn empty_world() -> World {
    World::new(WorldBounds::default(), EnemyManager::new())
}

fn position(world: &World, id: EntityId) -> Vec2 {
    world.entity(id).unwrap().get::<Transform>().unwrap().position
}

fn body(x: f32, y: f32, radius: f32, layer: u8) -> EntityBuilder {
    EntityBuilder::new()
        .with(Transform::at(x, y))
        .with(Collider::new(radius, layer))
}

fn collision_world(strength: f32) -> World {
    let mut world = empty_world();
    let mut collision = CollisionSystem::new();
    collision.set_resolution_strength(strength);
    world.add_system(collision);
    world
}

fn basic_enemy_at(x: f32, y: f32) -> EntityBuilder {
    let def = basic_enemy();
    let scaled = ScalingConfig::default().scale(&def.stats, 1, 1);
    world_setup::build_enemy(&def, &scaled, Vec2::new(x, y), 1, 0.0).unwrap()
}

fn plain_player(x: f32, y: f32) -> EntityBuilder {
    EntityBuilder::new()
        .with(Player::default())
        .with(Transform::at(x, y))
        .with(Health::new(100.0))
}

// ---- Routing ----

#[test]
fn test_entity_routed_only_with_all_required_components() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = empty_world();
    world.add_system(Recorder::new("recorder", TRANSFORM_HEALTH, log));

    let full = world.add_entity(EntityBuilder::new().with(Transform::at(1.0, 1.0)).with(Health::new(10.0)));
    let partial = world.add_entity(EntityBuilder::new().with(Transform::at(2.0, 2.0)));

    let recorder = world.system::<Recorder>().unwrap();
    assert!(recorder.members().contains(full));
    assert!(!recorder.members().contains(partial));
}

#[test]
fn test_component_changes_reroute_entity() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = empty_world();
    world.add_system(Recorder::new("recorder", TRANSFORM_HEALTH, log));

    let id = world.add_entity(EntityBuilder::new().with(Transform::at(2.0, 2.0)));
    world.insert_component(id, Health::new(5.0));
    assert!(world.system::<Recorder>().unwrap().members().contains(id));

    world.remove_component(id, ComponentKind::Transform);
    assert!(!world.system::<Recorder>().unwrap().members().contains(id));
}

#[test]
fn test_late_system_receives_existing_entities() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = empty_world();
    let id = world.add_entity(EntityBuilder::new().with(Transform::at(0.0, 0.0)));
    world.add_system(Recorder::new("late", TRANSFORM_ONLY, log));
    assert!(world.system::<Recorder>().unwrap().members().contains(id));
}

#[test]
fn test_rejected_entity_gets_no_updates() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = empty_world();
    world.add_system(Recorder::new("recorder", TRANSFORM_HEALTH, Rc::clone(&log)));
    world.add_entity(EntityBuilder::new().with(Transform::at(0.0, 0.0)));

    world.fixed_update(DT);
    assert_eq!(*log.borrow(), vec!["recorder".to_string()]);
}

// ---- Lifecycle ----

#[test]
fn test_stale_id_after_removal() {
    let mut world = empty_world();
    let first = world.add_entity(EntityBuilder::new().with(Transform::at(0.0, 0.0)));
    assert!(world.remove_entity(first));
    assert!(!world.remove_entity(first));

    let second = world.add_entity(EntityBuilder::new().with(Transform::at(0.0, 0.0)));
    assert_eq!(second.index, first.index);
    assert_ne!(second.generation, first.generation);
    assert!(world.entity(first).is_none());
    assert!(world.entity(second).is_some());
}

#[test]
fn test_despawn_during_iteration_is_safe() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = empty_world();
    let mut reaper = Recorder::new("reaper", TRANSFORM_ONLY, Rc::clone(&log));
    reaper.despawn_members = true;
    world.add_system(reaper);
    world.add_system(Recorder::new("after", TRANSFORM_ONLY, Rc::clone(&log)));

    for i in 0..3 {
        world.add_entity(EntityBuilder::new().with(Transform::at(i as f32, 0.0)));
    }
    world.fixed_update(DT);

    let log = log.borrow();
    assert_eq!(log.iter().filter(|l| l.starts_with("reaper:")).count(), 3);
    assert_eq!(log.iter().filter(|l| l.starts_with("after:")).count(), 0);
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn test_systems_run_in_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = empty_world();
    world.add_system(Recorder::new("first", TRANSFORM_ONLY, Rc::clone(&log)));
    world.add_system(Recorder::new("second", TRANSFORM_ONLY, Rc::clone(&log)));

    world.fixed_update(DT);
    world.fixed_update(DT);
    assert_eq!(*log.borrow(), vec!["first", "second", "first", "second"]);
    assert_eq!(world.system_names(), vec!["first", "second"]);
}

#[test]
fn test_dead_enemy_is_swept_and_reported() {
    let mut world = empty_world();
    let enemy = world.add_entity(basic_enemy_at(300.0, 300.0));
    assert_eq!(world.enemies().active_count(), 1);
    world.drain_events();

    world.entity_mut(enemy).unwrap().get_mut::<Health>().unwrap().damage(1e6);
    world.fixed_update(DT);

    assert!(world.entity(enemy).is_none());
    assert_eq!(world.enemies().active_count(), 0);
    let events = world.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::EnemyDied { score_value: 100, .. })));
    assert!(events.contains(&GameEvent::AllEnemiesDefeated));
}

// ---- Collision ----

#[test]
fn test_collision_resolution_is_symmetric() {
    let mut world = collision_world(1.0);
    let a = world.add_entity(body(100.0, 100.0, 10.0, LAYER_ENEMY));
    let b = world.add_entity(body(110.0, 100.0, 10.0, LAYER_ENEMY));

    world.fixed_update(DT);

    assert_eq!(position(&world, a), Vec2::new(95.0, 100.0));
    assert_eq!(position(&world, b), Vec2::new(115.0, 100.0));
}

#[test]
fn test_partial_resolution_strength() {
    let mut world = collision_world(0.5);
    let a = world.add_entity(body(100.0, 100.0, 10.0, LAYER_ENEMY));
    let b = world.add_entity(body(110.0, 100.0, 10.0, LAYER_ENEMY));

    world.fixed_update(DT);

    let moved = (position(&world, a).x - 100.0).abs() + (position(&world, b).x - 110.0).abs();
    assert!((moved - 5.0).abs() < 1e-4);
}

#[test]
fn test_immovable_body_takes_no_correction() {
    let mut world = collision_world(1.0);
    let wall = world.add_entity(
        EntityBuilder::new()
            .with(Transform::at(100.0, 100.0))
            .with(Collider::new(10.0, LAYER_OBSTACLE).immovable()),
    );
    let mover = world.add_entity(body(110.0, 100.0, 10.0, LAYER_ENEMY));

    world.fixed_update(DT);

    assert_eq!(position(&world, wall), Vec2::new(100.0, 100.0));
    assert_eq!(position(&world, mover), Vec2::new(120.0, 100.0));
}

#[test]
fn test_disabled_layer_pair_never_resolves() {
    let mut world = collision_world(1.0);
    let a = world.add_entity(body(100.0, 100.0, 10.0, LAYER_PROJECTILE));
    let b = world.add_entity(body(110.0, 100.0, 10.0, LAYER_ENEMY));
    world.fixed_update(DT);
    assert_eq!(position(&world, a), Vec2::new(100.0, 100.0));
    assert_eq!(position(&world, b), Vec2::new(110.0, 100.0));

    world
        .system_mut::<CollisionSystem>()
        .unwrap()
        .set_layer_collision(LAYER_ENEMY, LAYER_ENEMY, false);
    let c = world.add_entity(body(300.0, 300.0, 10.0, LAYER_ENEMY));
    let d = world.add_entity(body(305.0, 300.0, 10.0, LAYER_ENEMY));
    world.fixed_update(DT);
    assert_eq!(position(&world, c), Vec2::new(300.0, 300.0));
    assert_eq!(position(&world, d), Vec2::new(305.0, 300.0));
}

#[test]
fn test_collision_clamps_into_bounds() {
    let mut world = collision_world(1.0);
    let id = world.add_entity(body(-50.0, 5000.0, 5.0, LAYER_ENEMY));
    world.fixed_update(DT);
    assert_eq!(position(&world, id), Vec2::new(WORLD_PADDING, WORLD_HEIGHT - WORLD_PADDING));
}

#[test]
fn test_debug_contacts_do_not_change_resolution() {
    let mut plain = collision_world(1.0);
    let mut debug = collision_world(1.0);
    debug.system_mut::<CollisionSystem>().unwrap().set_debug(true);

    let a1 = plain.add_entity(body(100.0, 100.0, 10.0, LAYER_ENEMY));
    plain.add_entity(body(110.0, 100.0, 10.0, LAYER_ENEMY));
    let a2 = debug.add_entity(body(100.0, 100.0, 10.0, LAYER_ENEMY));
    debug.add_entity(body(110.0, 100.0, 10.0, LAYER_ENEMY));

    plain.fixed_update(DT);
    debug.fixed_update(DT);

    assert_eq!(position(&plain, a1), position(&debug, a2));
    assert!(plain.system::<CollisionSystem>().unwrap().contacts().is_empty());
    let contacts = debug.system::<CollisionSystem>().unwrap().contacts();
    assert_eq!(contacts.len(), 1);
    assert!((contacts[0].penetration - 10.0).abs() < 1e-5);
    assert_eq!(contacts[0].normal, Vec2::X);
}

// ---- Character controller ----

fn controller_world() -> (World, EntityId) {
    let mut world = empty_world();
    world.add_system(CharacterControllerSystem::new());
    let player = world.add_entity(
        EntityBuilder::new()
            .with(Player::default())
            .with(Transform::at(960.0, 540.0))
            .with(CharacterController::default()),
    );
    (world, player)
}

#[test]
fn test_single_input_sustains_motion() {
    let (mut world, player) = controller_world();
    world.push_input(InputEvent::movement(Vec2::X));

    let mut last = position(&world, player).x;
    for _ in 0..30 {
        world.fixed_update(DT);
        let x = position(&world, player).x;
        assert!(x > last, "motion stopped without a new input");
        last = x;
    }
    let controller = world.entity(player).unwrap().get::<CharacterController>().unwrap();
    assert!(controller.speed() <= controller.max_speed + 1e-3);
}

#[test]
fn test_released_input_brakes_to_rest() {
    let (mut world, player) = controller_world();
    world.push_input(InputEvent::movement(Vec2::X));
    for _ in 0..10 {
        world.fixed_update(DT);
    }
    world.push_input(InputEvent::movement(Vec2::ZERO));
    for _ in 0..120 {
        world.fixed_update(DT);
    }
    let controller = world.entity(player).unwrap().get::<CharacterController>().unwrap();
    assert_eq!(controller.velocity, Vec2::ZERO);
}

#[test]
fn test_rotation_turns_toward_aim() {
    let (mut world, player) = controller_world();
    world.push_input(InputEvent::aim(Vec2::Y));

    world.fixed_update(DT);
    let after_one = world.entity(player).unwrap().get::<Transform>().unwrap().rotation;
    assert!(after_one > 0.0 && after_one < std::f32::consts::FRAC_PI_2);

    for _ in 0..30 {
        world.fixed_update(DT);
    }
    let rotation = world.entity(player).unwrap().get::<Transform>().unwrap().rotation;
    assert!((rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
}

#[test]
fn test_clamp_boundary_stops_at_edge() {
    let (mut world, player) = controller_world();
    world.push_input(InputEvent::movement(Vec2::NEG_X));
    for _ in 0..600 {
        world.fixed_update(DT);
    }
    assert_eq!(position(&world, player).x, WORLD_PADDING);
}

fn runaway(world: &mut World, x: f32) -> EntityId {
    world.add_entity(EntityBuilder::new().with(Transform::at(x, 0.0)).with(CharacterController {
        boundary: BoundaryBehavior::Free,
        velocity: Vec2::new(100.0, 0.0),
        ..CharacterController::default()
    }))
}

#[test]
fn test_safety_clamp_rescales_runaway_position() {
    let (mut world, _) = controller_world();
    let id = runaway(&mut world, 15_000.0);
    world.fixed_update(DT);

    let entity = world.entity(id).unwrap();
    assert!((entity.get::<Transform>().unwrap().position.x - SAFETY_CLAMP_DISTANCE).abs() < 1e-2);
    assert_eq!(entity.get::<CharacterController>().unwrap().velocity, Vec2::ZERO);
    assert!(world
        .drain_events()
        .contains(&GameEvent::SafetyClamp { entity: id, reset: false }));
}

#[test]
fn test_safety_clamp_resets_far_runaway() {
    let (mut world, _) = controller_world();
    let id = runaway(&mut world, 50_000.0);
    world.fixed_update(DT);

    assert_eq!(position(&world, id), Vec2::new(SAFE_RESET_POSITION.0, SAFE_RESET_POSITION.1));
    assert!(world
        .drain_events()
        .contains(&GameEvent::SafetyClamp { entity: id, reset: true }));
}

// ---- AI ----

fn ai_world() -> World {
    let mut world = empty_world();
    let catalog = Arc::new(EnemyCatalog::new([basic_enemy()]));
    world.add_system(AiBehaviorSystem::new(catalog));
    world.add_entity(plain_player(500.0, 500.0));
    world
}

fn ai_state(world: &World, id: EntityId) -> String {
    world.entity(id).unwrap().get::<AiBrain>().unwrap().state.clone()
}

#[test]
fn test_enemy_chases_visible_player() {
    let mut world = ai_world();
    let enemy = world.add_entity(basic_enemy_at(700.0, 500.0));
    world.fixed_update(DT);

    assert_eq!(ai_state(&world, enemy), "chase");
    let controller = world.entity(enemy).unwrap().get::<CharacterController>().unwrap();
    assert!(controller.move_direction.x < 0.0);
    assert!(controller.aim_direction.x < 0.0);
}

#[test]
fn test_obstacle_blocks_detection() {
    let mut world = ai_world();
    world.add_entity(world_setup::build_obstacle(&ObstacleConfig {
        position: Vec2::new(600.0, 500.0),
        radius: 30.0,
    }));
    let enemy = world.add_entity(basic_enemy_at(700.0, 500.0));
    world.fixed_update(DT);
    assert_eq!(ai_state(&world, enemy), "patrol");
}

#[test]
fn test_distant_enemy_keeps_patrolling() {
    let mut world = ai_world();
    let enemy = world.add_entity(basic_enemy_at(1200.0, 500.0));
    for _ in 0..10 {
        world.fixed_update(DT);
    }
    assert_eq!(ai_state(&world, enemy), "patrol");
    let brain = world.entity(enemy).unwrap().get::<AiBrain>().unwrap();
    assert_eq!(brain.pattern.name(), "search");
}

// ---- Combat ----

#[test]
fn test_enemy_contact_attack_respects_cooldown() {
    let mut world = empty_world();
    world.add_system(CombatSystem::new());
    world.add_system(HealthSystem::new());
    let player = world.add_entity(plain_player(500.0, 500.0));
    world.add_entity(basic_enemy_at(520.0, 500.0));

    world.fixed_update(DT);
    let health = world.entity(player).unwrap().get::<Health>().unwrap().current;
    assert_eq!(health, 90.0);

    world.fixed_update(DT);
    let health = world.entity(player).unwrap().get::<Health>().unwrap().current;
    assert_eq!(health, 90.0);

    let damaged = world
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::Damaged { .. }))
        .count();
    assert_eq!(damaged, 1);
}

#[test]
fn test_projectile_hits_target_once() {
    let mut world = empty_world();
    world.add_system(ProjectileSystem::new());
    world.add_system(HealthSystem::new());
    let target = world.add_entity(body(200.0, 100.0, 14.0, LAYER_ENEMY).with(Health::new(50.0)));
    let spec = ProjectileSpec {
        damage: 25.0,
        ..ProjectileSpec::default()
    };
    world.add_entity(projectile(EntityId::new(99, 0), Vec2::new(100.0, 100.0), Vec2::X, 0.0, &spec));

    for _ in 0..10 {
        world.fixed_update(DT);
    }

    assert_eq!(world.entity(target).unwrap().get::<Health>().unwrap().current, 25.0);
    assert!(world.entities().iter().all(|e| !e.has(ComponentKind::Projectile)));
}

#[test]
fn test_projectile_damage_waits_for_health_system() {
    let mut world = empty_world();
    world.add_system(ProjectileSystem::new());
    let target = world.add_entity(body(200.0, 100.0, 14.0, LAYER_ENEMY).with(Health::new(50.0)));
    let spec = ProjectileSpec {
        damage: 25.0,
        ..ProjectileSpec::default()
    };
    world.add_entity(projectile(EntityId::new(99, 0), Vec2::new(100.0, 100.0), Vec2::X, 0.0, &spec));

    for _ in 0..10 {
        world.fixed_update(DT);
    }

    // The projectile is consumed, but without a health system nothing writes the target.
    assert!(world.entities().iter().all(|e| !e.has(ComponentKind::Projectile)));
    assert_eq!(world.entity(target).unwrap().get::<Health>().unwrap().current, 50.0);
    assert!(!world
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::Damaged { .. })));
}

#[test]
fn test_projectile_expires() {
    let mut world = empty_world();
    world.add_system(ProjectileSystem::new());
    let spec = ProjectileSpec {
        speed: 0.0,
        lifetime_ms: 100.0,
        ..ProjectileSpec::default()
    };
    let id = world.add_entity(projectile(EntityId::new(99, 0), Vec2::new(500.0, 500.0), Vec2::X, 0.0, &spec));
    for _ in 0..3 {
        world.fixed_update(DT);
    }
    assert!(world.entity(id).is_some());
    for _ in 0..5 {
        world.fixed_update(DT);
    }
    assert!(world.entity(id).is_none());
}

// ---- Enemy registry ----

#[test]
fn test_removing_enemy_component_unregisters_enemy() {
    let mut world = empty_world();
    let id = world.add_entity(basic_enemy_at(300.0, 300.0));
    assert_eq!(world.enemies().active_count(), 1);

    world.remove_component(id, ComponentKind::Enemy);
    assert_eq!(world.enemies().active_count(), 0);
    assert_eq!(world.enemies().count_of("basic"), 0);

    world.remove_entity(id);
    assert_eq!(world.enemies().active_count(), 0);
    assert!(!world
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::EnemyDied { .. })));
}

#[test]
fn test_inserting_enemy_component_registers_enemy() {
    let mut world = empty_world();
    let id = world.add_entity(EntityBuilder::new().with(Transform::at(300.0, 300.0)).with(Health::new(20.0)));
    assert_eq!(world.enemies().active_count(), 0);

    world.insert_component(
        id,
        Enemy {
            type_id: "basic".into(),
            damage: 5.0,
            speed: 100.0,
            detection_range: 300.0,
            attack_range: 30.0,
            score_value: 40,
            wave: 1,
        },
    );
    assert_eq!(world.enemies().active_count(), 1);
    assert_eq!(world.enemies().count_of("basic"), 1);

    world.entity_mut(id).unwrap().get_mut::<Health>().unwrap().damage(100.0);
    world.fixed_update(DT);

    assert_eq!(world.enemies().active_count(), 0);
    let events = world.drain_events();
    assert!(events.iter().any(|e| matches!(e, GameEvent::EnemySpawned { entity, .. } if *entity == id)));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::EnemyDied { entity, score_value: 40, .. } if *entity == id)));
}

// ---- Session ----

#[test]
fn test_player_fire_spawns_projectile() {
    let mut session = Session::new(GameConfig::default());
    session.push_input(InputEvent::aim(Vec2::X));
    session.push_input(InputEvent::ActionStarted {
        action: ButtonAction::Fire,
    });
    session.fixed_update();

    let projectiles = session
        .world()
        .entities()
        .iter()
        .filter(|e| e.has(ComponentKind::Projectile))
        .count();
    assert_eq!(projectiles, 1);
    assert!(session
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::WeaponFired { .. })));
}

#[test]
fn test_wave_spawner_holds_no_members() {
    let mut session = Session::new(GameConfig::default());
    assert!(session.start_next_wave());
    session.fixed_update();
    session.fixed_update();

    assert!(session.world().enemies().active_count() > 0);
    let spawner = session.world().system::<WaveSpawnSystem>().unwrap();
    assert!(spawner.members().is_empty());
}

#[test]
fn test_player_is_never_removed() {
    let mut session = Session::new(GameConfig::default());
    let player = session.world().player().unwrap();
    session
        .world_mut()
        .entity_mut(player)
        .unwrap()
        .get_mut::<Health>()
        .unwrap()
        .damage(1e6);

    for _ in 0..3 {
        session.fixed_update();
    }

    assert!(session.world().entity(player).is_some());
    let defeated = session
        .drain_events()
        .iter()
        .filter(|e| matches!(e, GameEvent::PlayerDefeated { .. }))
        .count();
    assert_eq!(defeated, 1);
}

#[test]
fn test_determinism_same_seed() {
    let config = GameConfig {
        seed: 12345,
        ..GameConfig::default()
    };
    let mut a = Session::new(config.clone());
    let mut b = Session::new(config);
    assert!(a.start_next_wave());
    assert!(b.start_next_wave());
    a.push_input(InputEvent::movement(Vec2::new(0.3, -0.7)));
    b.push_input(InputEvent::movement(Vec2::new(0.3, -0.7)));

    for tick in 0..600 {
        a.fixed_update();
        b.fixed_update();
        if tick % 50 == 0 {
            let json_a = serde_json::to_string(&a.snapshot()).unwrap();
            let json_b = serde_json::to_string(&b.snapshot()).unwrap();
            assert_eq!(json_a, json_b, "snapshots diverged with the same seed");
        }
    }
}

#[test]
fn test_different_seeds_spawn_differently() {
    let mut a = Session::new(GameConfig {
        seed: 111,
        ..GameConfig::default()
    });
    let mut b = Session::new(GameConfig {
        seed: 222,
        ..GameConfig::default()
    });
    a.start_next_wave();
    b.start_next_wave();
    a.fixed_update();
    b.fixed_update();

    let enemy_position = |session: &Session| {
        session
            .world()
            .entities()
            .iter()
            .find(|e| e.has(ComponentKind::Enemy))
            .and_then(|e| e.get::<Transform>())
            .map(|t| t.position)
    };
    assert!(enemy_position(&a).is_some());
    assert_ne!(enemy_position(&a), enemy_position(&b));
}

#[test]
fn test_frame_runs_capped_fixed_ticks() {
    let mut session = Session::new(GameConfig::default());
    assert_eq!(session.frame(1.0), MAX_STEPS_PER_FRAME);
    assert_eq!(session.world().time().tick, MAX_STEPS_PER_FRAME as u64);
    assert_eq!(session.frame(0.0), 0);
}

#[test]
fn test_snapshot_views_and_redraw_flag() {
    let mut session = Session::new(GameConfig::default());
    session.request_redraw();

    let snapshot = session.snapshot();
    assert!(snapshot.force_redraw);
    let player = snapshot
        .entities
        .iter()
        .find(|e| e.kind == EntityViewKind::Player)
        .unwrap();
    assert_eq!(player.health_fraction, Some(1.0));
    assert_eq!(player.sprite.as_deref(), Some("player"));
    assert_eq!(snapshot.wave.total_waves, 2);

    assert!(!session.snapshot().force_redraw);
}

#[test]
fn test_save_and_restore_player_state() {
    let mut session = Session::new(GameConfig::default());
    let player = session.world().player().unwrap();
    session
        .world_mut()
        .entity_mut(player)
        .unwrap()
        .get_mut::<Health>()
        .unwrap()
        .damage(60.0);
    for _ in 0..10 {
        session.fixed_update();
    }

    let save = session.to_save("slot");
    let restored = Session::from_save(GameConfig::default(), &save);
    let player = restored.world().player().unwrap();
    let entity = restored.world().entity(player).unwrap();

    assert_eq!(entity.get::<Health>().unwrap().current, 40.0);
    assert_eq!(restored.world().time(), session.world().time());
    assert_eq!(restored.score(), session.score());
}
