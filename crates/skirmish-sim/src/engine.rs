//! Simulation session: the core of the game.
//!
//! `Session` owns the world, registers the systems in tick order, runs the
//! fixed-timestep loop, tallies score from events, and produces
//! `RenderSnapshot`s. Completely headless, so tests drive it directly.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use skirmish_core::components::{Health, Transform, Weapon};
use skirmish_core::defs::{ScalingConfig, WaveDef};
use skirmish_core::events::GameEvent;
use skirmish_core::input::InputEvent;
use skirmish_core::state::{RenderSnapshot, ScoreView};
use skirmish_core::types::WorldBounds;

use crate::config::GameConfig;
use crate::ecs::world::World;
use crate::enemy_manager::{EnemyCatalog, EnemyManager};
use crate::persistence::SessionSave;
use crate::scheduler::FixedTimestep;
use crate::systems::ai_behavior::AiBehaviorSystem;
use crate::systems::character_controller::CharacterControllerSystem;
use crate::systems::collision::{CollisionSystem, Contact, LayerMatrix};
use crate::systems::combat::{CombatSystem, HealthSystem, ProjectileSystem};
use crate::systems::snapshot::build_snapshot;
use crate::systems::wave_spawn::WaveSpawnSystem;
use crate::world_setup;

pub struct Session {
    world: World,
    config: GameConfig,
    timestep: FixedTimestep,
    score: ScoreView,
    events: Vec<GameEvent>,
}

impl Session {
    /// Build a session from a config. The config is sanitized first.
    pub fn new(config: GameConfig) -> Self {
        let config = config.sanitized();
        let catalog = Arc::new(EnemyCatalog::new(config.enemies.iter().cloned()));
        let mut world = World::new(config.world, EnemyManager::new());

        // Registration order is tick order.
        world.add_system(CharacterControllerSystem::new());
        world.add_system(collision_system(&config));
        world.add_system(AiBehaviorSystem::new(Arc::clone(&catalog)));
        world.add_system(CombatSystem::new());
        world.add_system(ProjectileSystem::new());
        world.add_system(HealthSystem::new());

        let mut spawner = WaveSpawnSystem::new(Arc::clone(&catalog), config.seed);
        spawner.configure(config.waves.clone(), config.world, config.scaling);
        spawner.set_auto_advance(config.auto_advance_waves);
        world.add_system(spawner);

        let spawn = config.player.spawn.unwrap_or_else(|| world.bounds().center());
        world.add_entity(world_setup::build_player(&config.player, spawn));
        for obstacle in &config.obstacles {
            world.add_entity(world_setup::build_obstacle(obstacle));
        }

        info!(
            seed = config.seed,
            enemy_types = catalog.len(),
            waves = config.waves.len(),
            "session started"
        );

        Self {
            world,
            config,
            timestep: FixedTimestep::default(),
            score: ScoreView::default(),
            events: Vec::new(),
        }
    }

    /// Queue an input event; it takes effect at the next fixed tick.
    pub fn push_input(&mut self, event: InputEvent) {
        self.world.push_input(event);
    }

    /// Run exactly one fixed tick.
    pub fn fixed_update(&mut self) {
        self.step(self.timestep.step());
    }

    /// Run one fixed tick with an explicit delta in seconds.
    pub fn step(&mut self, dt: f32) {
        self.world.fixed_update(dt);
        self.collect_events();
    }

    /// Advance by one rendered frame of `real_dt` seconds: as many fixed
    /// ticks as the accumulator allows, then one variable update.
    /// Returns the number of fixed ticks run.
    pub fn frame(&mut self, real_dt: f32) -> u32 {
        let steps = self.timestep.advance(real_dt);
        for _ in 0..steps {
            self.fixed_update();
        }
        self.world.update(real_dt);
        self.collect_events();
        steps
    }

    fn collect_events(&mut self) {
        for event in self.world.drain_events() {
            self.tally(&event);
            self.events.push(event);
        }
    }

    fn tally(&mut self, event: &GameEvent) {
        match event {
            GameEvent::EnemyDied { score_value, .. } => {
                self.score.score += *score_value as u64;
                self.score.kills += 1;
            }
            GameEvent::WaveCompleted { .. } => self.score.waves_completed += 1,
            _ => {}
        }
    }

    /// Begin the next wave. No-op returning false while a wave is active,
    /// during the post-wave delay, or when no waves remain.
    pub fn start_next_wave(&mut self) -> bool {
        self.world
            .system_mut::<WaveSpawnSystem>()
            .is_some_and(|spawner| spawner.start_next_wave())
    }

    pub fn configure_waves(&mut self, waves: Vec<WaveDef>, boundary: WorldBounds, scaling: ScalingConfig) {
        if let Some(spawner) = self.world.system_mut::<WaveSpawnSystem>() {
            spawner.configure(waves, boundary, scaling);
        }
    }

    pub fn snapshot(&mut self) -> RenderSnapshot {
        let enemies_alive = self.world.enemies().active_count();
        let wave = self
            .world
            .system::<WaveSpawnSystem>()
            .map(|spawner| spawner.wave_view(enemies_alive))
            .unwrap_or_default();
        let force_redraw = self.world.take_redraw();
        build_snapshot(&self.world, wave, self.score, self.timestep.alpha(), force_redraw)
    }

    /// Ask the renderer to redraw on the next snapshot.
    pub fn request_redraw(&mut self) {
        self.world.request_redraw();
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn score(&self) -> ScoreView {
        self.score
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Collision contacts of the last tick; empty unless collision debugging is on.
    pub fn contacts(&self) -> &[Contact] {
        self.world
            .system::<CollisionSystem>()
            .map(|collision| collision.contacts())
            .unwrap_or(&[])
    }

    pub fn set_collision_debug(&mut self, debug: bool) {
        if let Some(collision) = self.world.system_mut::<CollisionSystem>() {
            collision.set_debug(debug);
        }
    }

    pub fn to_save(&self, slot: &str) -> SessionSave {
        let player = self.world.player().and_then(|id| self.world.entity(id));
        SessionSave {
            slot_name: slot.to_string(),
            seed: self.config.seed,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            waves_completed: self
                .world
                .system::<WaveSpawnSystem>()
                .map_or(0, |spawner| spawner.waves_completed()),
            score: self.score,
            time: self.world.time(),
            player_position: player.and_then(|p| p.get::<Transform>()).map(|t| t.position),
            player_health: player
                .and_then(|p| p.get::<Health>())
                .map(Health::to_record)
                .unwrap_or_default(),
            player_weapon: player
                .and_then(|p| p.get::<Weapon>())
                .map(Weapon::to_record)
                .unwrap_or_default(),
        }
    }

    /// Rebuild a session from `config` and merge a save onto it. Enemies
    /// alive at save time are not restored; play resumes before the next wave.
    pub fn from_save(config: GameConfig, save: &SessionSave) -> Self {
        let mut session = Self::new(GameConfig {
            seed: save.seed,
            ..config
        });
        session.score = save.score;
        session.world.set_time(save.time);
        if let Some(spawner) = session.world.system_mut::<WaveSpawnSystem>() {
            spawner.resume_after(save.waves_completed);
        }

        let bounds = session.world.bounds();
        if let Some(player) = session.world.player().and_then(|id| session.world.entity_mut(id)) {
            if let Some(health) = player.get_mut::<Health>() {
                health.apply_record(&save.player_health);
            }
            if let Some(weapon) = player.get_mut::<Weapon>() {
                weapon.apply_record(&save.player_weapon);
            }
            if let (Some(position), Some(transform)) = (save.player_position, player.get_mut::<Transform>()) {
                transform.set_position(bounds.clamp(position));
            }
        }
        info!(slot = %save.slot_name, waves_completed = save.waves_completed, "session restored");
        session
    }
}

fn collision_system(config: &GameConfig) -> CollisionSystem {
    let mut layers = LayerMatrix::empty();
    for [a, b] in &config.collision.enabled_pairs {
        layers.set(*a, *b, true);
    }
    let mut collision = CollisionSystem::new();
    collision.set_layers(layers);
    collision.set_resolution_strength(config.collision.resolution_strength);
    collision.set_debug(config.collision.debug);
    collision
}
