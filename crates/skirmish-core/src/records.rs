//! Plain persistence records for stateful components.
//!
//! Every field is optional: a partial record merges onto the component's
//! current values (or its defaults) instead of requiring a full dump.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::{sanitize_cooldown, Health, ProjectileSpec, Weapon};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regen_rate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invulnerable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_fire_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Vec2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projectile: Option<ProjectileSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic: Option<bool>,
}

impl Health {
    pub fn to_record(&self) -> HealthRecord {
        HealthRecord {
            current: Some(self.current),
            max: Some(self.max),
            regen_rate: Some(self.regen_rate),
            invulnerable: Some(self.invulnerable),
        }
    }

    /// Merge a record onto this component, keeping the health invariant.
    pub fn apply_record(&mut self, record: &HealthRecord) {
        if let Some(max) = record.max {
            self.set_max(max);
        }
        if let Some(current) = record.current {
            self.current = if current.is_finite() {
                current.clamp(0.0, self.max)
            } else {
                self.current
            };
        }
        if let Some(regen_rate) = record.regen_rate {
            self.regen_rate = if regen_rate.is_finite() {
                regen_rate.max(0.0)
            } else {
                0.0
            };
        }
        if let Some(invulnerable) = record.invulnerable {
            self.invulnerable = invulnerable;
        }
    }

    pub fn from_record(record: &HealthRecord) -> Self {
        let mut health = Health::default();
        health.apply_record(record);
        health
    }
}

impl Weapon {
    pub fn to_record(&self) -> WeaponRecord {
        WeaponRecord {
            damage: Some(self.damage),
            range: Some(self.range),
            cooldown_ms: Some(self.cooldown_ms),
            last_fire_ms: self.last_fire_ms,
            direction: Some(self.direction),
            projectile: self.projectile,
            automatic: Some(self.automatic),
        }
    }

    pub fn apply_record(&mut self, record: &WeaponRecord) {
        if let Some(damage) = record.damage {
            self.damage = damage.max(0.0);
        }
        if let Some(range) = record.range {
            self.range = range.max(0.0);
        }
        if let Some(cooldown_ms) = record.cooldown_ms {
            self.cooldown_ms = sanitize_cooldown(cooldown_ms);
        }
        if record.last_fire_ms.is_some() {
            self.last_fire_ms = record.last_fire_ms;
        }
        if let Some(direction) = record.direction {
            let direction = direction.normalize_or_zero();
            if direction != Vec2::ZERO {
                self.direction = direction;
            }
        }
        if record.projectile.is_some() {
            self.projectile = record.projectile;
        }
        if let Some(automatic) = record.automatic {
            self.automatic = automatic;
        }
    }

    pub fn from_record(record: &WeaponRecord) -> Self {
        let mut weapon = Weapon::default();
        weapon.apply_record(record);
        weapon
    }
}
