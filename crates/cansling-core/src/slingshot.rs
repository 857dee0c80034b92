//! Slingshot draw-and-release launcher.
//!
//! The pouch is a kinematic ball that rests at the anchor. While a projectile
//! is in flight the pouch collider is taken out of the world, so the pouch can
//! be neither hit nor dragged until the projectile retires.

use rapier2d::prelude::{Collider, ColliderHandle, RigidBodyHandle};

use crate::config::SlingshotConfig;
use crate::physics::{BodyKind, BodyMaterial, BodyShape, PhysicsWorld};

/// Pouch state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlingState {
    /// Pouch sits at the anchor.
    Resting,
    /// Pouch follows the pointer, clamped to the maximum draw distance.
    Drawing,
}

/// Where and how hard a released pouch launches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    /// Pouch position at release.
    pub origin: [f32; 2],
    /// Initial projectile velocity.
    pub impulse: [f32; 2],
}

/// The launcher: anchor, kinematic pouch body, and draw state.
#[derive(Debug, Clone)]
pub struct Slingshot {
    anchor: [f32; 2],
    pouch: RigidBodyHandle,
    /// Pouch collider while it is in the world.
    attached: Option<ColliderHandle>,
    /// Pouch collider while a projectile is in flight.
    detached: Option<Collider>,
    pouch_position: [f32; 2],
    state: SlingState,
    max_draw_distance: f32,
    launch_scale: f32,
}

impl Slingshot {
    /// Creates the pouch body at the anchor.
    pub fn new(world: &mut PhysicsWorld, config: &SlingshotConfig) -> Self {
        let handles = world.create_body(
            config.anchor,
            BodyKind::Kinematic,
            BodyShape::Ball {
                radius: config.pouch_radius,
            },
            BodyMaterial {
                mass: 1.0,
                elasticity: config.pouch_elasticity,
                friction: 0.5,
            },
        );

        Self {
            anchor: config.anchor,
            pouch: handles.body,
            attached: Some(handles.collider),
            detached: None,
            pouch_position: config.anchor,
            state: SlingState::Resting,
            max_draw_distance: config.max_draw_distance,
            launch_scale: config.launch_scale,
        }
    }

    pub fn anchor(&self) -> [f32; 2] {
        self.anchor
    }

    pub fn state(&self) -> SlingState {
        self.state
    }

    pub fn pouch_body(&self) -> RigidBodyHandle {
        self.pouch
    }

    pub fn pouch_position(&self) -> [f32; 2] {
        self.pouch_position
    }

    /// True while the pouch collider is in the world, i.e. no projectile is in flight.
    pub fn is_loaded(&self) -> bool {
        self.attached.is_some()
    }

    /// Enters Drawing. Rejected outside the Shooter phase, while a projectile
    /// occupies the pouch, or while already drawing.
    pub fn begin_drag(&mut self, shooter_phase: bool) -> bool {
        if !shooter_phase || !self.is_loaded() || self.state == SlingState::Drawing {
            return false;
        }
        self.state = SlingState::Drawing;
        tracing::debug!("[slingshot] Drawing");
        true
    }

    /// Moves the pouch toward the pointer, clamped to the maximum draw distance.
    pub fn update_drag(&mut self, world: &mut PhysicsWorld, pointer: [f32; 2]) {
        if self.state != SlingState::Drawing {
            return;
        }
        let offset = clamp_magnitude(
            [pointer[0] - self.anchor[0], pointer[1] - self.anchor[1]],
            self.max_draw_distance,
        );
        self.move_pouch(world, [self.anchor[0] + offset[0], self.anchor[1] + offset[1]]);
    }

    /// Leaves Drawing and returns the launch computed from the draw.
    ///
    /// The caller decides whether the shot actually fires; the pouch springs
    /// back to the anchor on the next [`Slingshot::update`] either way.
    pub fn release(&mut self) -> Option<Launch> {
        if self.state != SlingState::Drawing {
            return None;
        }
        self.state = SlingState::Resting;

        let origin = self.pouch_position;
        let impulse = [
            (self.anchor[0] - origin[0]) * self.launch_scale,
            (self.anchor[1] - origin[1]) * self.launch_scale,
        ];
        Some(Launch { origin, impulse })
    }

    /// Per-tick pouch update: a pouch that is not being drawn rests at the anchor.
    pub fn update(&mut self, world: &mut PhysicsWorld) {
        if self.state == SlingState::Resting && self.pouch_position != self.anchor {
            self.move_pouch(world, self.anchor);
        }
    }

    /// Takes the pouch collider out of the world; the live projectile replaces it.
    pub fn detach_pouch(&mut self, world: &mut PhysicsWorld) {
        if let Some(handle) = self.attached.take() {
            self.detached = world.take_collider(handle);
        }
    }

    /// Puts the pouch collider back at the anchor.
    pub fn restore(&mut self, world: &mut PhysicsWorld) {
        self.state = SlingState::Resting;
        self.move_pouch(world, self.anchor);

        if let Some(collider) = self.detached.take() {
            self.attached = Some(world.add_collider(collider, self.pouch));
            tracing::debug!("[slingshot] Pouch restored");
        }
    }

    /// Returns the slingshot to Resting with the pouch loaded, for a new level.
    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        self.restore(world);
    }

    fn move_pouch(&mut self, world: &mut PhysicsWorld, position: [f32; 2]) {
        self.pouch_position = position;
        world.set_position(self.pouch, position);
    }
}

/// Scales `v` down so its length is at most `max`.
fn clamp_magnitude(v: [f32; 2], max: f32) -> [f32; 2] {
    let length = v[0].hypot(v[1]);
    if length > max && length > 0.0 {
        let scale = max / length;
        [v[0] * scale, v[1] * scale]
    } else {
        v
    }
}
