//! Fired projectile tracking.
//!
//! At most one projectile is live. Retired projectiles stay in the world as
//! ordinary settled bodies and are kept in a history list for rendering only.

use rapier2d::prelude::RigidBodyHandle;

use crate::config::ProjectileConfig;
use crate::physics::{BodyHandles, BodyKind, ObjectTransform, PhysicsWorld};

/// Why a live projectile stopped being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    /// Speed dropped below the settle threshold.
    Settled,
    /// Travelled past the maximum radius from the origin.
    OutOfBounds,
    /// The body was removed from the world while still live.
    Missing,
}

/// Owns the live projectile slot and the fired history.
#[derive(Debug, Clone, Default)]
pub struct ProjectileTracker {
    live: Option<BodyHandles>,
    history: Vec<BodyHandles>,
}

impl ProjectileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a projectile at `position` moving with `impulse` and makes it live.
    ///
    /// Callers must not spawn while a projectile is already live.
    pub fn spawn(
        &mut self,
        world: &mut PhysicsWorld,
        position: [f32; 2],
        impulse: [f32; 2],
        config: &ProjectileConfig,
    ) -> RigidBodyHandle {
        debug_assert!(self.live.is_none(), "spawn called with a projectile in flight");

        let handles = world.create_body(position, BodyKind::Dynamic, config.shape(), config.material());
        world.set_velocity(handles.body, impulse);

        self.history.push(handles);
        self.live = Some(handles);

        tracing::debug!(
            "[projectile] Spawned at ({:.1}, {:.1}) with velocity ({:.1}, {:.1})",
            position[0],
            position[1],
            impulse[0],
            impulse[1]
        );
        handles.body
    }

    /// Retires the live projectile once it settles or leaves the playable radius.
    ///
    /// Returns the reason when the live slot was cleared on this call.
    pub fn update(&mut self, world: &PhysicsWorld, config: &ProjectileConfig) -> Option<RetireReason> {
        let live = self.live?;

        let reason = match (world.read_velocity(live.body), world.read_transform(live.body)) {
            (Some(velocity), Some(transform)) => {
                let speed = velocity[0].hypot(velocity[1]);
                let distance = transform.position[0].hypot(transform.position[1]);
                if speed < config.settle_threshold {
                    Some(RetireReason::Settled)
                } else if distance >= config.max_travel_radius {
                    Some(RetireReason::OutOfBounds)
                } else {
                    None
                }
            }
            _ => Some(RetireReason::Missing),
        };

        if reason.is_some() {
            self.live = None;
            tracing::debug!("[projectile] Retired: {:?}", reason);
        }
        reason
    }

    /// Returns true while a projectile is in flight.
    pub fn in_flight(&self) -> bool {
        self.live.is_some()
    }

    pub fn live_body(&self) -> Option<RigidBodyHandle> {
        self.live.map(|h| h.body)
    }

    /// Number of projectiles fired since the last clear.
    pub fn fired_count(&self) -> usize {
        self.history.len()
    }

    /// Transform of the live projectile.
    pub fn live_transform(&self, world: &PhysicsWorld) -> Option<ObjectTransform> {
        self.live.and_then(|h| world.read_transform(h.body))
    }

    /// Transforms of retired projectiles, oldest first.
    pub fn retired_transforms(&self, world: &PhysicsWorld) -> Vec<ObjectTransform> {
        self.history
            .iter()
            .filter(|h| Some(**h) != self.live)
            .filter_map(|h| world.read_transform(h.body))
            .collect()
    }

    /// Removes every fired projectile from the world.
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        self.live = None;
        for handles in self.history.drain(..) {
            world.remove_body(handles.body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProjectileConfig {
        ProjectileConfig::default()
    }

    #[test]
    fn test_spawn_sets_live_and_velocity() {
        let mut world = PhysicsWorld::new();
        let mut tracker = ProjectileTracker::new();

        let body = tracker.spawn(&mut world, [150.0, 150.0], [500.0, 250.0], &config());

        assert!(tracker.in_flight());
        assert_eq!(tracker.live_body(), Some(body));
        assert_eq!(world.read_velocity(body), Some([500.0, 250.0]));
        assert_eq!(tracker.fired_count(), 1);
    }

    #[test]
    fn test_fast_projectile_stays_live() {
        let mut world = PhysicsWorld::new();
        let mut tracker = ProjectileTracker::new();
        tracker.spawn(&mut world, [150.0, 150.0], [800.0, 0.0], &config());

        assert_eq!(tracker.update(&world, &config()), None);
        assert!(tracker.in_flight());
    }

    #[test]
    fn test_near_zero_impulse_retires_immediately() {
        let mut world = PhysicsWorld::new();
        let mut tracker = ProjectileTracker::new();
        tracker.spawn(&mut world, [150.0, 150.0], [1.0, 0.0], &config());

        assert_eq!(tracker.update(&world, &config()), Some(RetireReason::Settled));
        assert!(!tracker.in_flight());
        // Retired body stays in the world as decoration.
        assert_eq!(world.body_count(), 1);
        assert_eq!(tracker.retired_transforms(&world).len(), 1);
    }

    #[test]
    fn test_out_of_bounds_retires() {
        let mut world = PhysicsWorld::new();
        let mut tracker = ProjectileTracker::new();
        tracker.spawn(&mut world, [5000.0, 0.0], [800.0, 0.0], &config());

        assert_eq!(tracker.update(&world, &config()), Some(RetireReason::OutOfBounds));
    }

    #[test]
    fn test_update_without_live_is_noop() {
        let world = PhysicsWorld::new();
        let mut tracker = ProjectileTracker::new();
        assert_eq!(tracker.update(&world, &config()), None);
    }

    #[test]
    fn test_clear_removes_history_bodies() {
        let mut world = PhysicsWorld::new();
        let mut tracker = ProjectileTracker::new();
        tracker.spawn(&mut world, [150.0, 150.0], [1.0, 0.0], &config());
        tracker.update(&world, &config());
        tracker.spawn(&mut world, [150.0, 150.0], [900.0, 0.0], &config());

        tracker.clear(&mut world);

        assert!(!tracker.in_flight());
        assert_eq!(tracker.fired_count(), 0);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_removed_body_retires_as_missing() {
        let mut world = PhysicsWorld::new();
        let mut tracker = ProjectileTracker::new();
        let body = tracker.spawn(&mut world, [150.0, 150.0], [800.0, 0.0], &config());

        world.remove_body(body);

        assert_eq!(tracker.update(&world, &config()), Some(RetireReason::Missing));
        assert!(!tracker.in_flight());
        assert!(tracker.retired_transforms(&world).is_empty());
    }
}
