//! Simulation constants and tuning parameters.

/// Fixed simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per fixed tick.
pub const DT: f32 = 1.0 / TICK_RATE as f32;

/// Maximum fixed ticks run for a single rendered frame.
pub const MAX_STEPS_PER_FRAME: u32 = 5;

// --- World bounds ---

/// Default play-field width (pixels).
pub const WORLD_WIDTH: f32 = 1920.0;

/// Default play-field height (pixels).
pub const WORLD_HEIGHT: f32 = 1080.0;

/// Margin kept clear between entities and the world edge.
pub const WORLD_PADDING: f32 = 16.0;

// --- Character controller ---

/// Default acceleration (pixels/s²).
pub const CONTROLLER_ACCELERATION: f32 = 2400.0;

/// Default top speed (pixels/s).
pub const CONTROLLER_MAX_SPEED: f32 = 320.0;

/// Default turn rate (radians/s).
pub const CONTROLLER_ROTATION_SPEED: f32 = 4.0 * std::f32::consts::PI;

/// Velocity damping applied per second when there is no move intent.
pub const CONTROLLER_FRICTION: f32 = 10.0;

/// Distance from the origin beyond which a position is rescaled back.
pub const SAFETY_CLAMP_DISTANCE: f32 = 10_000.0;

/// Position an entity is reset to when it escapes beyond twice the clamp distance.
pub const SAFE_RESET_POSITION: (f32, f32) = (WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0);

/// Analog input below this magnitude is treated as released.
pub const INPUT_DEADZONE: f32 = 0.05;

// --- Collision ---

/// Default fraction of penetration resolved per tick.
pub const COLLISION_RESOLUTION_STRENGTH: f32 = 0.5;

/// Number of distinct collision layers.
pub const COLLISION_LAYER_COUNT: usize = 32;

pub const LAYER_PLAYER: u8 = 0;
pub const LAYER_ENEMY: u8 = 1;
pub const LAYER_OBSTACLE: u8 = 2;
pub const LAYER_PROJECTILE: u8 = 3;

// --- Combat ---

/// Default player weapon cooldown (ms).
pub const PLAYER_WEAPON_COOLDOWN_MS: f64 = 250.0;

/// Default player weapon damage.
pub const PLAYER_WEAPON_DAMAGE: f32 = 25.0;

/// Default player health.
pub const PLAYER_MAX_HEALTH: f32 = 100.0;

/// Default player collider radius.
pub const PLAYER_RADIUS: f32 = 16.0;

/// Smallest allowed weapon cooldown (ms).
pub const MIN_COOLDOWN_MS: f64 = 1.0;

/// Default projectile lifetime (ms).
pub const PROJECTILE_LIFETIME_MS: f64 = 1500.0;

/// Default projectile speed (pixels/s).
pub const PROJECTILE_SPEED: f32 = 900.0;

/// Default projectile radius.
pub const PROJECTILE_SIZE: f32 = 4.0;

// --- Waves ---

/// Smallest allowed scaling multiplier.
pub const MIN_SCALE: f32 = 0.01;

/// Spawned enemies are kept at least this far from the player.
pub const SPAWN_MIN_PLAYER_DISTANCE: f32 = 200.0;

/// Candidate positions tried before falling back to the farthest corner.
pub const SPAWN_POSITION_ATTEMPTS: u32 = 8;

// --- AI ---

/// A patrol waypoint counts as reached within this distance.
pub const PATROL_ARRIVE_DISTANCE: f32 = 12.0;
