//! Session configuration.
//!
//! Every field has a default, so a partial JSON document only overrides what
//! it names.

use serde::{Deserialize, Serialize};

use crate::physics::{BodyMaterial, BodyShape};

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Playfield dimensions and boundary walls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    pub wall_thickness: f32,
    pub wall_elasticity: f32,
    pub wall_friction: f32,
    /// Gravity in world units/s², positive y is up.
    pub gravity: [f32; 2],
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 700.0,
            wall_thickness: 20.0,
            wall_elasticity: 1.0,
            wall_friction: 0.5,
            gravity: [0.0, -981.0],
        }
    }
}

/// Slingshot anchor and draw parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlingshotConfig {
    pub anchor: [f32; 2],
    pub pouch_radius: f32,
    pub pouch_elasticity: f32,
    pub max_draw_distance: f32,
    /// Multiplier from draw displacement to launch velocity.
    pub launch_scale: f32,
}

impl Default for SlingshotConfig {
    fn default() -> Self {
        Self {
            anchor: [150.0, 150.0],
            pouch_radius: 15.0,
            pouch_elasticity: 0.8,
            max_draw_distance: 200.0,
            launch_scale: 5.0,
        }
    }
}

/// Fired projectile body and retirement thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub radius: f32,
    pub mass: f32,
    pub elasticity: f32,
    pub friction: f32,
    /// Speed below which a live projectile is retired.
    pub settle_threshold: f32,
    /// Distance from the origin at which a live projectile is retired.
    pub max_travel_radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            radius: 15.0,
            mass: 20.0,
            elasticity: 0.3,
            friction: 0.5,
            settle_threshold: 50.0,
            max_travel_radius: 5000.0,
        }
    }
}

impl ProjectileConfig {
    pub fn shape(&self) -> BodyShape {
        BodyShape::Ball {
            radius: self.radius,
        }
    }

    pub fn material(&self) -> BodyMaterial {
        BodyMaterial {
            mass: self.mass,
            elasticity: self.elasticity,
            friction: self.friction,
        }
    }
}

/// Can body and spawn band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanConfig {
    pub width: f32,
    pub height: f32,
    pub mass: f32,
    pub elasticity: f32,
    pub friction: f32,
    /// Center of the spawn band. `None` uses the arena center.
    pub spawn_center: Option<[f32; 2]>,
    /// Cans spawn at `spawn_center.x ± spawn_jitter`.
    pub spawn_jitter: f32,
}

impl Default for CanConfig {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 50.0,
            mass: 20.0,
            elasticity: 0.2,
            friction: 1.0,
            spawn_center: None,
            spawn_jitter: 150.0,
        }
    }
}

impl CanConfig {
    pub fn shape(&self) -> BodyShape {
        BodyShape::Box {
            width: self.width,
            height: self.height,
        }
    }

    pub fn material(&self) -> BodyMaterial {
        BodyMaterial {
            mass: self.mass,
            elasticity: self.elasticity,
            friction: self.friction,
        }
    }
}

/// Pointer picking and Builder-phase grab steering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// Maximum distance from the pointer to a shape for a pick to hit.
    pub pick_radius: f32,
    /// Velocity per unit of pointer offset applied to a grabbed can.
    pub follow_gain: f32,
    pub max_follow_speed: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            pick_radius: 1.0,
            follow_gain: 20.0,
            max_follow_speed: 2000.0,
        }
    }
}

/// Complete configuration for a play session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub arena: ArenaConfig,
    pub slingshot: SlingshotConfig,
    pub projectile: ProjectileConfig,
    pub can: CanConfig,
    pub grab: GrabConfig,
}

impl GameConfig {
    /// Loads and validates a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Center of the can spawn band.
    pub fn spawn_center(&self) -> [f32; 2] {
        self.can
            .spawn_center
            .unwrap_or([self.arena.width / 2.0, self.arena.height / 2.0])
    }

    /// Checks that sizes are positive and every number is finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("arena.width", self.arena.width),
            ("arena.height", self.arena.height),
            ("arena.wall_thickness", self.arena.wall_thickness),
            ("slingshot.pouch_radius", self.slingshot.pouch_radius),
            ("slingshot.max_draw_distance", self.slingshot.max_draw_distance),
            ("projectile.radius", self.projectile.radius),
            ("projectile.mass", self.projectile.mass),
            ("projectile.max_travel_radius", self.projectile.max_travel_radius),
            ("can.width", self.can.width),
            ("can.height", self.can.height),
            ("can.mass", self.can.mass),
        ];
        for (field, value) in positive {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be finite",
                });
            }
            if value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be positive",
                });
            }
        }

        let finite = [
            ("arena.gravity", self.arena.gravity[0]),
            ("arena.gravity", self.arena.gravity[1]),
            ("slingshot.anchor", self.slingshot.anchor[0]),
            ("slingshot.anchor", self.slingshot.anchor[1]),
            ("slingshot.launch_scale", self.slingshot.launch_scale),
            ("projectile.settle_threshold", self.projectile.settle_threshold),
            ("can.spawn_jitter", self.can.spawn_jitter),
            ("grab.pick_radius", self.grab.pick_radius),
            ("grab.follow_gain", self.grab.follow_gain),
            ("grab.max_follow_speed", self.grab.max_follow_speed),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be finite",
                });
            }
        }

        if self.can.spawn_jitter < 0.0 {
            return Err(ConfigError::Invalid {
                field: "can.spawn_jitter",
                reason: "must not be negative",
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_layout() {
        let config = GameConfig::default();
        assert_eq!(config.slingshot.anchor, [150.0, 150.0]);
        assert_eq!(config.slingshot.max_draw_distance, 200.0);
        assert_eq!(config.projectile.settle_threshold, 50.0);
        assert_eq!(config.spawn_center(), [500.0, 350.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            GameConfig::from_json(r#"{ "slingshot": { "launch_scale": 8.0 } }"#).unwrap();
        assert_eq!(config.slingshot.launch_scale, 8.0);
        assert_eq!(config.slingshot.anchor, [150.0, 150.0]);
        assert_eq!(config.arena.width, 1000.0);
    }

    #[test]
    fn test_explicit_spawn_center() {
        let config =
            GameConfig::from_json(r#"{ "can": { "spawn_center": [300.0, 400.0] } }"#).unwrap();
        assert_eq!(config.spawn_center(), [300.0, 400.0]);
    }

    #[test]
    fn test_rejects_non_positive_size() {
        let err = GameConfig::from_json(r#"{ "can": { "width": 0.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "can.width",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_is_valid() {
        let json = GameConfig::default().to_json().unwrap();
        let config = GameConfig::from_json(&json).unwrap();
        assert_eq!(config.can.spawn_jitter, 150.0);
    }
}
