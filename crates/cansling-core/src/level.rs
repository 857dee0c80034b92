//! Level definitions and the pending level queue.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// Upper bound on cans per level.
pub const MAX_OBJECT_COUNT: usize = 256;

/// Error type for level authoring data.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("Failed to parse level JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Level `{level}`: builder time must be a positive number of seconds, got {value}")]
    BuilderTime { level: String, value: f32 },
    #[error("Level `{level}`: object count {count} exceeds the limit of {MAX_OBJECT_COUNT}")]
    TooManyObjects { level: String, count: usize },
    #[error("Level `{level}`: condition threshold must be finite")]
    ConditionThreshold { level: String },
}

/// Decorative hint marker, passed through to renderers untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintMarker {
    pub position: [f32; 2],
    #[serde(default)]
    pub label: String,
}

/// Immutable per-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub name: String,
    /// Number of cans spawned when the level becomes active.
    pub object_count: usize,
    /// Builder phase duration in seconds.
    #[serde(default = "default_builder_time")]
    pub builder_time: f32,
    /// Shots available in the Shooter phase.
    #[serde(default = "default_ammo")]
    pub ammo: u32,
    #[serde(default)]
    pub builder_conditions: Vec<Condition>,
    #[serde(default)]
    pub shooter_conditions: Vec<Condition>,
    #[serde(default)]
    pub hints: Vec<HintMarker>,
}

fn default_builder_time() -> f32 {
    60.0
}

fn default_ammo() -> u32 {
    4
}

impl Level {
    /// Creates a level without conditions or hints.
    pub fn new(name: impl Into<String>, object_count: usize, builder_time: f32, ammo: u32) -> Self {
        Self {
            name: name.into(),
            object_count,
            builder_time,
            ammo,
            builder_conditions: Vec::new(),
            shooter_conditions: Vec::new(),
            hints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_builder_condition(mut self, condition: Condition) -> Self {
        self.builder_conditions.push(condition);
        self
    }

    #[must_use]
    pub fn with_shooter_condition(mut self, condition: Condition) -> Self {
        self.shooter_conditions.push(condition);
        self
    }

    /// Checks the level for values the game loop cannot run with.
    pub fn validate(&self) -> Result<(), LevelError> {
        if !self.builder_time.is_finite() || self.builder_time <= 0.0 {
            return Err(LevelError::BuilderTime {
                level: self.name.clone(),
                value: self.builder_time,
            });
        }
        if self.object_count > MAX_OBJECT_COUNT {
            return Err(LevelError::TooManyObjects {
                level: self.name.clone(),
                count: self.object_count,
            });
        }
        let thresholds_finite = self
            .builder_conditions
            .iter()
            .chain(&self.shooter_conditions)
            .all(|c| c.threshold().is_finite());
        if !thresholds_finite {
            return Err(LevelError::ConditionThreshold {
                level: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Ordered level authoring data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    pub levels: Vec<Level>,
}

impl LevelSet {
    /// Loads and validates a level set from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let set: Self = serde_json::from_str(json)?;
        for level in &set.levels {
            level.validate()?;
        }
        Ok(set)
    }

    /// Serializes the level set to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The built-in campaign.
    /// Loaded from levels/default.json at compile time.
    pub fn default_campaign() -> Self {
        const DEFAULT_LEVELS_JSON: &str = include_str!("../levels/default.json");
        Self::from_json(DEFAULT_LEVELS_JSON).expect("Failed to parse default levels JSON")
    }
}

/// FIFO of levels waiting to be played.
#[derive(Debug, Clone, Default)]
pub struct LevelQueue {
    pending: VecDeque<Level>,
}

impl LevelQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `level` and appends it. Rejected levels leave the queue untouched.
    pub fn enqueue(&mut self, level: Level) -> Result<(), LevelError> {
        level.validate()?;
        self.pending.push_back(level);
        Ok(())
    }

    /// Removes and returns the next level.
    pub fn pop_next(&mut self) -> Option<Level> {
        self.pending.pop_front()
    }

    pub fn peek(&self) -> Option<&Level> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl TryFrom<Vec<Level>> for LevelQueue {
    type Error = LevelError;

    fn try_from(levels: Vec<Level>) -> Result<Self, Self::Error> {
        let mut queue = Self::new();
        for level in levels {
            queue.enqueue(level)?;
        }
        Ok(queue)
    }
}

impl TryFrom<LevelSet> for LevelQueue {
    type Error = LevelError;

    fn try_from(set: LevelSet) -> Result<Self, Self::Error> {
        Self::try_from(set.levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = LevelQueue::new();
        queue.enqueue(Level::new("one", 3, 10.0, 2)).unwrap();
        queue.enqueue(Level::new("two", 4, 10.0, 2)).unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek().map(|l| l.name.as_str()), Some("one"));
        assert_eq!(queue.pop_next().unwrap().name, "one");
        assert_eq!(queue.pop_next().unwrap().name, "two");
        assert!(queue.pop_next().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_level_defaults_from_json() {
        let set = LevelSet::from_json(r#"{ "levels": [ { "object_count": 6 } ] }"#).unwrap();
        let level = &set.levels[0];
        assert_eq!(level.builder_time, 60.0);
        assert_eq!(level.ammo, 4);
        assert!(level.builder_conditions.is_empty());
    }

    #[test]
    fn test_rejects_zero_builder_time() {
        let err = LevelSet::from_json(
            r#"{ "levels": [ { "name": "bad", "object_count": 6, "builder_time": 0 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LevelError::BuilderTime { .. }));
    }

    #[test]
    fn test_rejects_too_many_objects() {
        let level = Level::new("huge", MAX_OBJECT_COUNT + 1, 10.0, 1);
        assert!(matches!(
            level.validate(),
            Err(LevelError::TooManyObjects { .. })
        ));
    }

    #[test]
    fn test_rejects_non_finite_threshold() {
        let level = Level::new("nan", 3, 10.0, 1).with_shooter_condition(Condition::AllBelowHeight {
            threshold: f32::NAN,
        });
        assert!(matches!(
            level.validate(),
            Err(LevelError::ConditionThreshold { .. })
        ));
    }

    #[test]
    fn test_default_campaign_loads() {
        let campaign = LevelSet::default_campaign();
        assert!(!campaign.levels.is_empty());
        let queue = LevelQueue::try_from(campaign.clone()).unwrap();
        assert_eq!(queue.len(), campaign.levels.len());
        assert_eq!(queue.peek(), campaign.levels.first());
    }

    #[test]
    fn test_enqueue_rejects_invalid_levels() {
        let mut queue = LevelQueue::new();

        let err = queue.enqueue(Level::new("nan", 2, f32::NAN, 1)).unwrap_err();
        assert!(matches!(err, LevelError::BuilderTime { .. }));
        let err = queue.enqueue(Level::new("neg", 2, -5.0, 1)).unwrap_err();
        assert!(matches!(err, LevelError::BuilderTime { .. }));
        let err = queue
            .enqueue(Level::new("huge", 1000, 10.0, 1))
            .unwrap_err();
        assert!(matches!(err, LevelError::TooManyObjects { count: 1000, .. }));

        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_from_levels_stops_at_first_invalid() {
        let levels = vec![
            Level::new("ok", 3, 10.0, 1),
            Level::new("bad", 3, f32::INFINITY, 1),
        ];
        assert!(matches!(
            LevelQueue::try_from(levels),
            Err(LevelError::BuilderTime { .. })
        ));

        let set = LevelSet {
            levels: vec![Level::new("huge", MAX_OBJECT_COUNT + 1, 10.0, 1)],
        };
        assert!(LevelQueue::try_from(set).is_err());
    }

    #[test]
    fn test_level_set_json_roundtrip() {
        let campaign = LevelSet::default_campaign();
        let json = campaign.to_json().unwrap();
        assert_eq!(LevelSet::from_json(&json).unwrap(), campaign);
    }
}
