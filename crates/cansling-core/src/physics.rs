//! Physics adapter over `Rapier2D`.
//!
//! Everything in the crate that touches the physics engine goes through
//! [`PhysicsWorld`]: body creation and removal, velocity writes, transform
//! reads and the nearest-body point query used to resolve pointer hits.

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Fixed timestep for physics simulation (50Hz).
pub const PHYSICS_DT: f32 = 1.0 / 50.0;

/// Default gravity vector (downward, positive y is up).
pub fn default_gravity() -> Vector {
    Vector::new(0.0, -981.0)
}

/// Position and rotation of a body, as read back from the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    pub position: [f32; 2],
    /// Rotation in radians.
    pub rotation: f32,
}

/// How a body is driven by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Integrated by the solver.
    Dynamic,
    /// Moved explicitly by game code, pushes dynamic bodies but is never pushed.
    Kinematic,
}

/// Collision shape attached to a created body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyShape {
    Ball { radius: f32 },
    Box { width: f32, height: f32 },
}

/// Surface and mass parameters for a created body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMaterial {
    pub mass: f32,
    pub elasticity: f32,
    pub friction: f32,
}

/// Handles for a body and its single collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyHandles {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// Physics world containing all `Rapier2D` components for deterministic simulation.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub gravity: Vector,
    pub frame: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("frame", &self.frame)
            .field("rigid_body_count", &self.rigid_body_set.len())
            .field("collider_count", &self.collider_set.len())
            .field("gravity", &self.gravity)
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings.
    pub fn new() -> Self {
        Self::with_gravity(default_gravity())
    }

    /// Creates a new physics world with custom gravity.
    pub fn with_gravity(gravity: Vector) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: PHYSICS_DT,
            ..Default::default()
        };

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity,
            frame: 0,
        }
    }

    /// Advances the physics simulation by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.frame += 1;
    }

    /// Advances the physics simulation by multiple steps.
    pub fn step_n(&mut self, n: u32) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Creates a body with one collider at `position`.
    pub fn create_body(
        &mut self,
        position: [f32; 2],
        kind: BodyKind,
        shape: BodyShape,
        material: BodyMaterial,
    ) -> BodyHandles {
        let builder = match kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic().ccd_enabled(true),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
        };
        let body = self
            .rigid_body_set
            .insert(builder.translation(Vector::new(position[0], position[1])).build());

        let collider = match shape {
            BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
            BodyShape::Box { width, height } => ColliderBuilder::cuboid(width / 2.0, height / 2.0),
        }
        .mass(material.mass)
        .restitution(material.elasticity)
        .friction(material.friction)
        .build();

        let collider = self.add_collider(collider, body);
        BodyHandles { body, collider }
    }

    /// Adds an axis-aligned static box, used for the arena walls.
    pub fn add_static_box(
        &mut self,
        center: [f32; 2],
        size: [f32; 2],
        elasticity: f32,
        friction: f32,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(size[0] / 2.0, size[1] / 2.0)
            .translation(Vector::new(center[0], center[1]))
            .restitution(elasticity)
            .friction(friction)
            .build();
        self.collider_set.insert(collider)
    }

    /// Adds a collider attached to a rigid body.
    pub fn add_collider(&mut self, collider: Collider, parent: RigidBodyHandle) -> ColliderHandle {
        self.collider_set
            .insert_with_parent(collider, parent, &mut self.rigid_body_set)
    }

    /// Detaches a collider from the world, handing it back to the caller.
    pub fn take_collider(&mut self, handle: ColliderHandle) -> Option<Collider> {
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        )
    }

    /// Removes a rigid body and its attached colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Returns true if the handle still refers to a body in the world.
    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    /// Overwrites the linear velocity of a body. Returns false for a removed body.
    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: [f32; 2]) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        body.set_linvel(Vector::new(velocity[0], velocity[1]), true);
        true
    }

    /// Teleports a body. Used for the kinematic slingshot pouch.
    pub fn set_position(&mut self, handle: RigidBodyHandle, position: [f32; 2]) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        body.set_translation(Vector::new(position[0], position[1]), true);
        true
    }

    /// Reads the current position and rotation of a body.
    pub fn read_transform(&self, handle: RigidBodyHandle) -> Option<ObjectTransform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            ObjectTransform {
                position: [pos.x, pos.y],
                rotation: body.rotation().angle(),
            }
        })
    }

    /// Reads the linear velocity of a body.
    pub fn read_velocity(&self, handle: RigidBodyHandle) -> Option<[f32; 2]> {
        self.rigid_body_set.get(handle).map(|body| {
            let vel = body.linvel();
            [vel.x, vel.y]
        })
    }

    /// Returns the body whose shape lies closest to `position`, if within `radius`.
    ///
    /// Distances come from the shape's own point query, placed at its parent
    /// body's current transform, so a kinematic body that was just teleported is
    /// found at its new position before the next step. Colliders without a parent
    /// (walls) are never returned.
    pub fn query_nearest_point(&self, position: [f32; 2], radius: f32) -> Option<RigidBodyHandle> {
        let point = Vector::new(position[0], position[1]);
        let mut best: Option<(RigidBodyHandle, f32)> = None;

        for (handle, body) in self.rigid_body_set.iter() {
            for &collider_handle in body.colliders() {
                let Some(collider) = self.collider_set.get(collider_handle) else {
                    continue;
                };
                let pose = collider
                    .position_wrt_parent()
                    .map_or(*body.position(), |local| *body.position() * *local);
                let distance = collider.shape().distance_to_point(&pose, point, true);

                if distance <= radius && best.is_none_or(|(_, d)| distance < d) {
                    best = Some((handle, distance));
                }
            }
        }

        best.map(|(handle, _)| handle)
    }

    /// Computes a deterministic hash of the current physics state.
    pub fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.frame.hash(&mut hasher);

        for (handle, body) in self.rigid_body_set.iter() {
            let (index, generation) = handle.into_raw_parts();
            index.hash(&mut hasher);
            generation.hash(&mut hasher);

            let pos = body.translation();
            hash_f32(pos.x, &mut hasher);
            hash_f32(pos.y, &mut hasher);
            hash_f32(body.rotation().angle(), &mut hasher);

            let linvel = body.linvel();
            hash_f32(linvel.x, &mut hasher);
            hash_f32(linvel.y, &mut hasher);
            hash_f32(body.angvel(), &mut hasher);
        }

        hasher.finish()
    }

    /// Returns the current simulation frame number.
    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    /// Number of rigid bodies currently in the world.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}

fn hash_f32(value: f32, hasher: &mut impl Hasher) {
    value.to_bits().hash(hasher);
}
