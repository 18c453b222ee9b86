//! Entity components.
//!
//! Components are plain data plus small behaviours scoped to their own fields
//! (health clamps itself, a weapon tracks its own cooldown). They never refer
//! to other components; systems join them by entity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::types::{clamp_axis, direction_of, wrap_angle, EntityId};

/// Closed set of component tags. An entity holds at most one component per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Transform,
    Health,
    Weapon,
    CharacterController,
    Collider,
    Enemy,
    Player,
    AiBrain,
    Projectile,
    Sprite,
    Obstacle,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Transform => "transform",
            ComponentKind::Health => "health",
            ComponentKind::Weapon => "weapon",
            ComponentKind::CharacterController => "character-controller",
            ComponentKind::Collider => "collider",
            ComponentKind::Enemy => "enemy",
            ComponentKind::Player => "player",
            ComponentKind::AiBrain => "ai-brain",
            ComponentKind::Projectile => "projectile",
            ComponentKind::Sprite => "sprite",
            ComponentKind::Obstacle => "obstacle",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and heading in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    /// Heading in radians, wrapped to `(-PI, PI]`.
    pub rotation: f32,
}

impl Transform {
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation: wrap_angle(rotation),
        }
    }

    pub fn at(x: f32, y: f32) -> Self {
        Self::new(Vec2::new(x, y), 0.0)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub fn rotate(&mut self, delta: f32) {
        self.rotation = wrap_angle(self.rotation + delta);
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = wrap_angle(rotation);
    }

    /// Unit vector the entity is facing.
    pub fn forward(&self) -> Vec2 {
        direction_of(self.rotation)
    }
}

/// Hit points with optional regeneration.
///
/// Invariant: `0 <= current <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    /// Units regenerated per second while alive and below max.
    pub regen_rate: f32,
    pub invulnerable: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(PLAYER_MAX_HEALTH)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = sanitize_max(max);
        Self {
            current: max,
            max,
            regen_rate: 0.0,
            invulnerable: false,
        }
    }

    pub fn with_regen(mut self, regen_rate: f32) -> Self {
        self.regen_rate = sanitize_amount(regen_rate);
        self
    }

    /// Apply damage. Returns the amount of health actually removed.
    pub fn damage(&mut self, amount: f32) -> f32 {
        if self.invulnerable {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current - sanitize_amount(amount)).clamp(0.0, self.max);
        before - self.current
    }

    /// Restore health. Returns the amount of health actually added.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + sanitize_amount(amount)).clamp(0.0, self.max);
        self.current - before
    }

    /// Regenerate over `dt` seconds. Dead entities do not regenerate.
    pub fn update(&mut self, dt: f32) {
        if self.regen_rate <= 0.0 || self.is_dead() || self.current >= self.max {
            return;
        }
        self.heal(self.regen_rate * dt.max(0.0));
    }

    pub fn set_max(&mut self, max: f32) {
        self.max = sanitize_max(max);
        self.current = self.current.clamp(0.0, self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Current health as a fraction of max, in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        (self.current / self.max).clamp(0.0, 1.0)
    }
}

fn sanitize_amount(amount: f32) -> f32 {
    if amount.is_finite() {
        amount.max(0.0)
    } else {
        0.0
    }
}

fn sanitize_max(max: f32) -> f32 {
    if max.is_finite() {
        max.max(f32::EPSILON)
    } else {
        f32::EPSILON
    }
}

/// Parameters of the projectile a weapon launches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub speed: f32,
    pub size: f32,
    pub damage: f32,
    pub lifetime_ms: f64,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            speed: PROJECTILE_SPEED,
            size: PROJECTILE_SIZE,
            damage: PLAYER_WEAPON_DAMAGE,
            lifetime_ms: PROJECTILE_LIFETIME_MS,
        }
    }
}

/// A cooldown-gated weapon. Timestamps are simulation milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub damage: f32,
    pub range: f32,
    pub cooldown_ms: f64,
    /// `None` until the first shot.
    pub last_fire_ms: Option<f64>,
    /// Direction of the last committed shot.
    pub direction: Vec2,
    /// Ranged weapons launch a projectile; `None` is a melee/contact attack.
    pub projectile: Option<ProjectileSpec>,
    pub automatic: bool,
}

impl Default for Weapon {
    fn default() -> Self {
        Self::new(PLAYER_WEAPON_DAMAGE, 600.0, PLAYER_WEAPON_COOLDOWN_MS)
    }
}

impl Weapon {
    pub fn new(damage: f32, range: f32, cooldown_ms: f64) -> Self {
        Self {
            damage: damage.max(0.0),
            range: range.max(0.0),
            cooldown_ms: sanitize_cooldown(cooldown_ms),
            last_fire_ms: None,
            direction: Vec2::X,
            projectile: None,
            automatic: false,
        }
    }

    pub fn with_projectile(mut self, projectile: ProjectileSpec) -> Self {
        self.projectile = Some(projectile);
        self
    }

    pub fn automatic(mut self, automatic: bool) -> Self {
        self.automatic = automatic;
        self
    }

    pub fn set_cooldown(&mut self, cooldown_ms: f64) {
        self.cooldown_ms = sanitize_cooldown(cooldown_ms);
    }

    pub fn can_fire(&self, now_ms: f64) -> bool {
        match self.last_fire_ms {
            Some(last) => now_ms - last >= self.cooldown_ms,
            None => true,
        }
    }

    /// Fire toward `direction`. Returns false (and changes nothing) while on cooldown.
    pub fn fire(&mut self, now_ms: f64, direction: Vec2) -> bool {
        if !self.can_fire(now_ms) {
            return false;
        }
        self.last_fire_ms = Some(now_ms);
        let direction = direction.normalize_or_zero();
        if direction != Vec2::ZERO {
            self.direction = direction;
        }
        true
    }

    /// Milliseconds until the weapon can fire again.
    pub fn cooldown_remaining(&self, now_ms: f64) -> f64 {
        match self.last_fire_ms {
            Some(last) => (self.cooldown_ms - (now_ms - last)).max(0.0),
            None => 0.0,
        }
    }
}

pub(crate) fn sanitize_cooldown(cooldown_ms: f64) -> f64 {
    if cooldown_ms.is_finite() {
        cooldown_ms.max(MIN_COOLDOWN_MS)
    } else {
        MIN_COOLDOWN_MS
    }
}

/// What a controller does when its entity reaches the world edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryBehavior {
    /// Stop at the edge and zero the velocity component pushing outward.
    #[default]
    Clamp,
    /// Re-enter from the opposite edge.
    Wrap,
    /// Leave boundary handling to the collision system.
    Free,
}

/// Movement state and tuning for a steerable body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterController {
    pub velocity: Vec2,
    /// Desired movement, magnitude in `[0, 1]`.
    pub move_direction: Vec2,
    /// Desired facing, magnitude in `[0, 1]`. Zero means "face movement".
    pub aim_direction: Vec2,
    /// Last non-zero movement direction, used for facing when not aiming.
    pub last_move_direction: Vec2,
    pub acceleration: f32,
    pub max_speed: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    /// Damping per second applied while there is no move intent.
    pub friction: f32,
    pub boundary: BoundaryBehavior,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            move_direction: Vec2::ZERO,
            aim_direction: Vec2::ZERO,
            last_move_direction: Vec2::ZERO,
            acceleration: CONTROLLER_ACCELERATION,
            max_speed: CONTROLLER_MAX_SPEED,
            rotation_speed: CONTROLLER_ROTATION_SPEED,
            friction: CONTROLLER_FRICTION,
            boundary: BoundaryBehavior::Clamp,
        }
    }
}

impl CharacterController {
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed.max(0.0);
        self
    }

    pub fn set_move_intent(&mut self, direction: Vec2) {
        self.move_direction = clamp_axis(direction);
    }

    pub fn set_aim_intent(&mut self, direction: Vec2) {
        self.aim_direction = clamp_axis(direction);
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Circle collider on a collision layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f32,
    pub layer: u8,
    /// Immovable bodies push others but are never pushed.
    pub immovable: bool,
}

impl Collider {
    pub fn new(radius: f32, layer: u8) -> Self {
        Self {
            radius: radius.max(0.0),
            layer: layer.min((COLLISION_LAYER_COUNT - 1) as u8),
            immovable: false,
        }
    }

    pub fn immovable(mut self) -> Self {
        self.immovable = true;
        self
    }
}

/// Enemy stats after wave scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub type_id: String,
    pub damage: f32,
    pub speed: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    pub score_value: u32,
    /// 1-based wave this enemy was spawned in.
    pub wave: u32,
}

/// Marks the player-controlled entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub level: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self { level: 1 }
    }
}

/// Runtime instance of a movement pattern, bound to the current AI state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementPattern {
    Idle,
    Pursue {
        speed_factor: f32,
        /// Stop closing in once within this distance.
        stop_distance: f32,
    },
    Retreat {
        speed_factor: f32,
        min_distance: f32,
        max_distance: f32,
    },
    Search {
        speed_factor: f32,
        center: Vec2,
        radius: f32,
        /// Patrol waypoints visited so far.
        waypoint: u32,
        target: Vec2,
    },
}

impl MovementPattern {
    pub fn name(&self) -> &'static str {
        match self {
            MovementPattern::Idle => "idle",
            MovementPattern::Pursue { .. } => "pursue",
            MovementPattern::Retreat { .. } => "retreat",
            MovementPattern::Search { .. } => "search",
        }
    }
}

/// AI state machine position for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiBrain {
    pub state: String,
    pub pattern: MovementPattern,
    /// Simulation time (ms) at which `state` was entered.
    pub entered_ms: f64,
}

/// A projectile in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: EntityId,
    pub velocity: Vec2,
    pub damage: f32,
    pub radius: f32,
    pub remaining_ms: f64,
    /// Layer of the colliders this projectile damages.
    pub target_layer: u8,
}

/// Visual tag for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub tag: String,
}

impl Sprite {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// Marks an entity that blocks line of sight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle;

/// Tagged union over every component type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Component {
    Transform(Transform),
    Health(Health),
    Weapon(Weapon),
    CharacterController(CharacterController),
    Collider(Collider),
    Enemy(Enemy),
    Player(Player),
    AiBrain(AiBrain),
    Projectile(Projectile),
    Sprite(Sprite),
    Obstacle(Obstacle),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Transform(_) => ComponentKind::Transform,
            Component::Health(_) => ComponentKind::Health,
            Component::Weapon(_) => ComponentKind::Weapon,
            Component::CharacterController(_) => ComponentKind::CharacterController,
            Component::Collider(_) => ComponentKind::Collider,
            Component::Enemy(_) => ComponentKind::Enemy,
            Component::Player(_) => ComponentKind::Player,
            Component::AiBrain(_) => ComponentKind::AiBrain,
            Component::Projectile(_) => ComponentKind::Projectile,
            Component::Sprite(_) => ComponentKind::Sprite,
            Component::Obstacle(_) => ComponentKind::Obstacle,
        }
    }
}

/// Typed access into [`Component`].
pub trait ComponentData: Sized {
    const KIND: ComponentKind;

    fn from_component(component: &Component) -> Option<&Self>;
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
    fn into_component(self) -> Component;
}

macro_rules! component_data {
    ($($ty:ident),* $(,)?) => {
        $(
            impl ComponentData for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn from_component(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$ty(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                    match component {
                        Component::$ty(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn into_component(self) -> Component {
                    Component::$ty(self)
                }
            }

            impl From<$ty> for Component {
                fn from(value: $ty) -> Self {
                    Component::$ty(value)
                }
            }
        )*
    };
}

component_data!(
    Transform,
    Health,
    Weapon,
    CharacterController,
    Collider,
    Enemy,
    Player,
    AiBrain,
    Projectile,
    Sprite,
    Obstacle,
);
