//! Wave spawning: paces enemy spawns within a wave, detects wave completion
//! through the enemy registry, and gates the next wave behind a delay.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use skirmish_core::components::ComponentKind;
use skirmish_core::constants::{SPAWN_MIN_PLAYER_DISTANCE, SPAWN_POSITION_ATTEMPTS};
use skirmish_core::defs::{ScalingConfig, WaveDef};
use skirmish_core::events::GameEvent;
use skirmish_core::state::WaveView;
use skirmish_core::types::WorldBounds;

use crate::ecs::system::{System, SystemContext, SystemMembers};
use crate::enemy_manager::EnemyCatalog;
use crate::world_setup;

/// A wave that has started and not yet completed.
#[derive(Debug, Clone)]
struct ActiveWave {
    /// 1-based.
    number: u32,
    queue: VecDeque<String>,
    total: u32,
    spawn_delay_ms: f64,
    wave_delay_ms: f64,
    since_last_spawn_ms: f64,
}

pub struct WaveSpawnSystem {
    members: SystemMembers,
    catalog: Arc<EnemyCatalog>,
    waves: Vec<WaveDef>,
    boundary: WorldBounds,
    scaling: ScalingConfig,
    rng: ChaCha8Rng,
    /// Index of the next wave `start_next_wave` will begin.
    next_wave: usize,
    active: Option<ActiveWave>,
    /// Time left before the next wave becomes eligible.
    cooldown_ms: f64,
    auto_advance: bool,
    completed: u32,
    pending_events: Vec<GameEvent>,
}

impl WaveSpawnSystem {
    pub fn new(catalog: Arc<EnemyCatalog>, seed: u64) -> Self {
        Self {
            members: SystemMembers::new(),
            catalog,
            waves: Vec::new(),
            boundary: WorldBounds::default(),
            scaling: ScalingConfig::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_wave: 0,
            active: None,
            cooldown_ms: 0.0,
            auto_advance: false,
            completed: 0,
            pending_events: Vec::new(),
        }
    }

    /// Replace the wave list, spawn boundary and scaling law. Any wave in
    /// progress is abandoned; already spawned enemies stay in the world.
    pub fn configure(&mut self, waves: Vec<WaveDef>, boundary: WorldBounds, scaling: ScalingConfig) {
        self.waves = waves
            .into_iter()
            .map(|mut wave| {
                wave.spawn_delay_ms = non_negative(wave.spawn_delay_ms);
                wave.wave_delay_ms = non_negative(wave.wave_delay_ms);
                wave
            })
            .collect();
        self.boundary = boundary.sanitized();
        self.scaling = scaling.sanitized();
        self.next_wave = 0;
        self.active = None;
        self.cooldown_ms = 0.0;
        self.completed = 0;
        self.pending_events.clear();
    }

    /// Start the next unconsumed wave when no wave is active and the
    /// post-wave delay has elapsed. Returns false otherwise.
    pub fn start_next_wave(&mut self) -> bool {
        if self.active.is_some() || self.cooldown_ms > 0.0 {
            return false;
        }
        let Some(def) = self.waves.get(self.next_wave) else {
            return false;
        };

        let number = self.next_wave as u32 + 1;
        let queue: VecDeque<String> = def.spawn_queue().into();
        let total = queue.len() as u32;
        info!(wave = number, enemies = total, "wave started");

        self.active = Some(ActiveWave {
            number,
            queue,
            total,
            spawn_delay_ms: def.spawn_delay_ms,
            wave_delay_ms: def.wave_delay_ms,
            // The first enemy spawns on the next tick.
            since_last_spawn_ms: def.spawn_delay_ms,
        });
        self.next_wave += 1;
        self.pending_events.push(GameEvent::WaveStarted {
            wave: number,
            enemy_count: total,
        });
        true
    }

    pub fn set_auto_advance(&mut self, auto_advance: bool) {
        self.auto_advance = auto_advance;
    }

    pub fn is_wave_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn waves_completed(&self) -> u32 {
        self.completed
    }

    pub fn total_waves(&self) -> u32 {
        self.waves.len() as u32
    }

    /// 1-based number of the current or last started wave, 0 before the first.
    pub fn current_wave(&self) -> u32 {
        self.active
            .as_ref()
            .map_or(self.next_wave as u32, |w| w.number)
    }

    pub fn has_remaining_waves(&self) -> bool {
        self.next_wave < self.waves.len()
    }

    /// Skip the first `completed` waves, as when resuming a saved session.
    pub fn resume_after(&mut self, completed: u32) {
        self.next_wave = (completed as usize).min(self.waves.len());
        self.completed = completed.min(self.waves.len() as u32);
        self.active = None;
        self.cooldown_ms = 0.0;
    }

    pub fn wave_view(&self, enemies_alive: u32) -> WaveView {
        WaveView {
            wave: self.current_wave(),
            total_waves: self.total_waves(),
            active: self.active.is_some(),
            remaining_to_spawn: self.active.as_ref().map_or(0, |w| w.queue.len() as u32),
            enemies_alive,
            next_wave_in_ms: if self.active.is_none() && self.has_remaining_waves() {
                Some(self.cooldown_ms)
            } else {
                None
            },
        }
    }

    fn spawn_position(&mut self, player: Option<Vec2>) -> Vec2 {
        let min = self.boundary.min();
        let max = self.boundary.max();
        let Some(player) = player else {
            return point_on_edge(&mut self.rng, min, max);
        };
        let clearance = SPAWN_MIN_PLAYER_DISTANCE * SPAWN_MIN_PLAYER_DISTANCE;
        for _ in 0..SPAWN_POSITION_ATTEMPTS {
            let candidate = point_on_edge(&mut self.rng, min, max);
            if candidate.distance_squared(player) >= clearance {
                return candidate;
            }
        }
        farthest_corner(min, max, player)
    }
}

impl System for WaveSpawnSystem {
    fn name(&self) -> &'static str {
        "wave_spawn"
    }

    /// Spawning is timer driven and reads enemies through the registry.
    fn required_components(&self) -> &'static [ComponentKind] {
        &[]
    }

    fn members(&self) -> &SystemMembers {
        &self.members
    }

    fn members_mut(&mut self) -> &mut SystemMembers {
        &mut self.members
    }

    fn fixed_update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
        let dt_ms = dt as f64 * 1000.0;
        ctx.events.append(&mut self.pending_events);

        match self.active.as_mut() {
            Some(wave) if wave.queue.is_empty() => {
                // Spawns from earlier ticks are registered by now.
                if ctx.enemies.active_count() == 0 {
                    let number = wave.number;
                    self.cooldown_ms = wave.wave_delay_ms;
                    self.active = None;
                    self.completed += 1;
                    info!(wave = number, "wave completed");
                    ctx.events.push(GameEvent::WaveCompleted { wave: number });
                }
            }
            Some(wave) => {
                wave.since_last_spawn_ms += dt_ms;
                if wave.since_last_spawn_ms >= wave.spawn_delay_ms {
                    wave.since_last_spawn_ms = 0.0;
                    let number = wave.number;
                    if let Some(type_id) = wave.queue.pop_front() {
                        self.spawn(ctx, &type_id, number);
                    }
                }
            }
            None => {
                self.cooldown_ms = (self.cooldown_ms - dt_ms).max(0.0);
            }
        }

        if self.auto_advance && self.active.is_none() && self.start_next_wave() {
            ctx.events.append(&mut self.pending_events);
        }
    }
}

impl WaveSpawnSystem {
    fn spawn(&mut self, ctx: &mut SystemContext<'_>, type_id: &str, wave: u32) {
        let catalog = Arc::clone(&self.catalog);
        let Some(def) = catalog.get(type_id) else {
            warn!(type_id, "wave references unknown enemy type, skipping");
            return;
        };
        let scaled = self.scaling.scale(&def.stats, wave, ctx.player_level());
        let position = self.spawn_position(ctx.player_position());
        match world_setup::build_enemy(def, &scaled, position, wave, ctx.now_ms()) {
            Some(builder) => ctx.commands.spawn(builder),
            None => warn!(type_id, "enemy behaviour has no valid initial state, skipping"),
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Uniform point on the perimeter of the rectangle `[min, max]`.
fn point_on_edge(rng: &mut ChaCha8Rng, min: Vec2, max: Vec2) -> Vec2 {
    let t: f32 = rng.gen_range(0.0..=1.0);
    match rng.gen_range(0..4u8) {
        0 => Vec2::new(min.x + (max.x - min.x) * t, min.y),
        1 => Vec2::new(max.x, min.y + (max.y - min.y) * t),
        2 => Vec2::new(min.x + (max.x - min.x) * t, max.y),
        _ => Vec2::new(min.x, min.y + (max.y - min.y) * t),
    }
}

fn farthest_corner(min: Vec2, max: Vec2, from: Vec2) -> Vec2 {
    [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)]
        .into_iter()
        .fold(min, |best, corner| {
            if corner.distance_squared(from) > best.distance_squared(from) {
                corner
            } else {
                best
            }
        })
}
