pub mod util;

use std::collections::HashMap;

use bitflags::bitflags;
use cgmath::{Quaternion, Vector3};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;
use shipyard::EntityId;

use crate::{
    grab::{GrabPhysics, PhysicsHandoff, ReachResult, reach},
    physics_log,
    pose::{Pose, Rotator},
    time::Time,
};
use util::*;

/// How strongly the grab binding pulls the anchor toward the target position
/// (per second of separation)
const GRAB_LINEAR_STIFFNESS: f32 = 10.0;
/// Slerp rate toward the target orientation, per second
const GRAB_ANGULAR_STIFFNESS: f32 = 15.0;

bitflags! {
    /// Collision channels. Reach sweeps see only GRABBABLE, so scenery and
    /// the controlling entity are excluded by channel membership rather than
    /// exclusion lists.
    pub struct InternalCollisionGroups: u32 {
        const WORLD = 1 << 0;
        const GRABBABLE = 1 << 1;
        const ALL = Self::WORLD.bits | Self::GRABBABLE.bits;
    }
}

impl InternalCollisionGroups {
    fn to_group(self) -> Group {
        Group::from_bits_truncate(self.bits())
    }
}

pub struct CollisionGroup;

impl CollisionGroup {
    /// Static scenery: collides with everything, never grabbable
    pub fn world() -> InteractionGroups {
        InteractionGroups::new(
            InternalCollisionGroups::WORLD.to_group(),
            InternalCollisionGroups::ALL.to_group(),
        )
    }

    /// Objects that can be picked up
    pub fn grabbable() -> InteractionGroups {
        InteractionGroups::new(
            InternalCollisionGroups::GRABBABLE.to_group(),
            InternalCollisionGroups::ALL.to_group(),
        )
    }

    /// Filter used by reach sweeps: hits only the grabbable channel
    pub fn grabbable_query() -> InteractionGroups {
        InteractionGroups::new(
            InternalCollisionGroups::ALL.to_group(),
            InternalCollisionGroups::GRABBABLE.to_group(),
        )
    }
}

/// The active grab binding: one body driven toward a target pose each step.
#[derive(Clone, Copy, Debug)]
struct GrabBinding {
    body: RigidBodyHandle,
    /// Grab point in the body's local space, fixed at grab time
    local_anchor: Point<Real>,
    target_position: Vector3<f32>,
    target_orientation: Rotator,
}

/// Rapier-backed collision and simulation world.
///
/// Owns the rigid-body/collider sets, the stepping pipelines, the query
/// pipeline used by reach sweeps, the body<->entity maps, and the single
/// grab binding.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    body_to_entity: HashMap<RigidBodyHandle, EntityId>,
    entity_to_body: HashMap<EntityId, RigidBodyHandle>,
    binding: Option<GrabBinding>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector3<f32>) -> Self {
        PhysicsWorld {
            gravity: vec_to_nvec(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            body_to_entity: HashMap::new(),
            entity_to_body: HashMap::new(),
            binding: None,
        }
    }

    pub fn create_fixed_body(
        &mut self,
        isometry: Isometry<Real>,
        entity: Option<EntityId>,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed().position(isometry).build();
        let handle = self.bodies.insert(body);
        self.register_entity(handle, entity);
        handle
    }

    pub fn create_dynamic_body(
        &mut self,
        isometry: Isometry<Real>,
        entity: Option<EntityId>,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic().position(isometry).build();
        let handle = self.bodies.insert(body);
        self.register_entity(handle, entity);
        handle
    }

    fn register_entity(&mut self, handle: RigidBodyHandle, entity: Option<EntityId>) {
        if let Some(entity) = entity {
            self.body_to_entity.insert(handle, entity);
            self.entity_to_body.insert(entity, handle);
        }
    }

    pub fn attach_collider(
        &mut self,
        body: RigidBodyHandle,
        shape: SharedShape,
        density: f32,
        groups: InteractionGroups,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::new(shape)
            .density(density)
            .collision_groups(groups)
            .build();
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies)
    }

    /// Remove an entity's body and all attached colliders. Also drops the
    /// grab binding if it pointed at this body.
    pub fn remove(&mut self, entity: EntityId) {
        let Some(handle) = self.entity_to_body.remove(&entity) else {
            return;
        };
        self.body_to_entity.remove(&handle);
        if let Some(binding) = self.binding {
            if binding.body == handle {
                physics_log!(debug, "removing the body held by the grab binding");
                self.binding = None;
            }
        }
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn entity_for_body(&self, handle: RigidBodyHandle) -> Option<EntityId> {
        self.body_to_entity.get(&handle).copied()
    }

    pub fn body_for_entity(&self, entity: EntityId) -> Option<RigidBodyHandle> {
        self.entity_to_body.get(&entity).copied()
    }

    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vector3<f32>> {
        self.bodies.get(handle).map(|body| nvec_to_vec(*body.translation()))
    }

    pub fn body_rotation(&self, handle: RigidBodyHandle) -> Option<Quaternion<f32>> {
        self.bodies.get(handle).map(|body| nquat_to_quat(*body.rotation()))
    }

    /// Rebuild query acceleration structures after editing the scene outside
    /// of `update`. Reach sweeps see the world as of the last `update` or
    /// `refresh_queries` call.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.bodies, &self.colliders);
    }

    /// Advance the simulation by one tick, driving the grab binding first so
    /// the bound body chases the latest target pose.
    pub fn update(&mut self, time: &Time) {
        let dt = time.delta_seconds();
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;
        self.drive_grab_binding(dt);
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    fn drive_grab_binding(&mut self, dt: f32) {
        let Some(binding) = self.binding else {
            return;
        };
        let Some(body) = self.bodies.get_mut(binding.body) else {
            physics_log!(debug, "grab binding lost its body, clearing binding");
            self.binding = None;
            return;
        };

        let anchor_world = body.position() * binding.local_anchor;
        let to_target = vec_to_nvec(binding.target_position) - anchor_world.coords;
        body.set_linvel(to_target * GRAB_LINEAR_STIFFNESS, true);
        body.set_angvel(vector![0.0, 0.0, 0.0], true);

        let target_rotation = quat_to_nquat(binding.target_orientation.to_quaternion());
        let blended = body
            .rotation()
            .slerp(&target_rotation, (GRAB_ANGULAR_STIFFNESS * dt).min(1.0));
        body.set_rotation(blended, true);
    }

    /// Swept-sphere reach query against the grabbable channel. Pure: no
    /// mutation, first blocking hit wins.
    pub fn sweep_grabbable(
        &self,
        pose: &Pose,
        max_distance: f32,
        radius: f32,
    ) -> Option<ReachResult> {
        let (start, end) = reach::sweep_segment(pose, max_distance);
        physics_log!(
            trace,
            "reach sweep ({:.1}, {:.1}, {:.1}) -> ({:.1}, {:.1}, {:.1}) r={:.1}",
            start.x,
            start.y,
            start.z,
            end.x,
            end.y,
            end.z,
            radius
        );

        let shape = Ball::new(radius);
        let shape_pos = Isometry::translation(start.x, start.y, start.z);
        let shape_vel = vec_to_nvec(pose.forward * max_distance);
        let mut options = ShapeCastOptions::with_max_time_of_impact(1.0);
        options.stop_at_penetration = true;
        let filter = QueryFilter::default().groups(CollisionGroup::grabbable_query());

        let (collider_handle, hit) = self.query_pipeline.cast_shape(
            &self.bodies,
            &self.colliders,
            &shape_pos,
            &shape_vel,
            &shape,
            options,
            filter,
        )?;

        let collider = self.colliders.get(collider_handle)?;
        let body = collider.parent()?;
        let Some(entity) = self.body_to_entity.get(&body).copied() else {
            physics_log!(debug, "reach sweep hit a grabbable collider with no entity mapping");
            return None;
        };

        // witness1 is the contact on the hit shape, already in world space
        Some(ReachResult {
            impact_point: npoint_to_vec(hit.witness1),
            body,
            entity,
        })
    }
}

impl GrabPhysics for PhysicsWorld {
    fn sweep_grabbable(&self, pose: &Pose, max_distance: f32, radius: f32) -> Option<ReachResult> {
        PhysicsWorld::sweep_grabbable(self, pose, max_distance, radius)
    }

    fn activate_body(&mut self, body: RigidBodyHandle) {
        if let Some(body) = self.bodies.get_mut(body) {
            body.set_body_type(RigidBodyType::Dynamic, true);
            body.wake_up(true);
        }
    }

    fn handoff(&mut self) -> Option<&mut dyn PhysicsHandoff> {
        Some(self)
    }
}

impl PhysicsHandoff for PhysicsWorld {
    fn grabbed_body(&self) -> Option<RigidBodyHandle> {
        let binding = self.binding?;
        self.bodies.get(binding.body).map(|_| binding.body)
    }

    fn grab_at(&mut self, body: RigidBodyHandle, world_point: Vector3<f32>, orientation: Rotator) {
        self.release();
        let Some(rigid_body) = self.bodies.get_mut(body) else {
            physics_log!(warn, "grab_at called with a body that no longer exists");
            return;
        };

        let local_anchor = rigid_body
            .position()
            .inverse_transform_point(&vec_to_npoint(world_point));
        // The binding carries the body; normal gravity would only fight the
        // positional drive.
        rigid_body.set_gravity_scale(0.0, true);

        self.binding = Some(GrabBinding {
            body,
            local_anchor,
            target_position: world_point,
            target_orientation: orientation,
        });
    }

    fn set_target(&mut self, position: Vector3<f32>, orientation: Rotator) {
        if let Some(binding) = self.binding.as_mut() {
            binding.target_position = position;
            binding.target_orientation = orientation;
        }
    }

    fn release(&mut self) {
        if let Some(binding) = self.binding.take() {
            if let Some(body) = self.bodies.get_mut(binding.body) {
                body.set_gravity_scale(1.0, true);
                body.wake_up(true);
            }
        }
    }

    fn target_position(&self) -> Option<Vector3<f32>> {
        self.binding.map(|binding| binding.target_position)
    }

    fn target_orientation(&self) -> Option<Rotator> {
        self.binding.map(|binding| binding.target_orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, vec3};
    use shipyard::World;
    use std::time::Duration;

    fn pose_facing_x(position: Vector3<f32>) -> Pose {
        Pose {
            position,
            forward: vec3(1.0, 0.0, 0.0),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        }
    }

    fn tick() -> Time {
        Time {
            elapsed: Duration::from_secs_f32(1.0 / 60.0),
            total: Duration::ZERO,
        }
    }

    /// Scenery wall on the world channel at x=80, grabbable ball (radius 10)
    /// centered at (150, 0, 0).
    fn build_scene() -> (PhysicsWorld, World, EntityId, RigidBodyHandle) {
        let mut world = World::new();
        let entity = world.add_entity(());

        let mut physics = PhysicsWorld::new(vec3(0.0, -9.81, 0.0));

        let scenery = physics.create_fixed_body(Isometry::translation(80.0, 0.0, 0.0), None);
        physics.attach_collider(
            scenery,
            SharedShape::cuboid(5.0, 50.0, 50.0),
            1.0,
            CollisionGroup::world(),
        );

        let body = physics.create_dynamic_body(Isometry::translation(150.0, 0.0, 0.0), Some(entity));
        physics.attach_collider(body, SharedShape::ball(10.0), 1.0, CollisionGroup::grabbable());

        physics.refresh_queries();
        (physics, world, entity, body)
    }

    #[test]
    fn sweep_hits_grabbable_through_scenery_channel() {
        let (physics, _world, entity, body) = build_scene();

        let hit = physics
            .sweep_grabbable(&pose_facing_x(vec3(0.0, 0.0, 0.0)), 200.0, 10.0)
            .unwrap();

        assert_eq!(hit.entity, entity);
        assert_eq!(hit.body, body);
        // Sweep stops when the two spheres touch; impact is on the target's
        // surface facing the viewer.
        assert!((hit.impact_point - vec3(140.0, 0.0, 0.0)).magnitude() < 1e-2);
    }

    #[test]
    fn sweep_misses_out_of_range_targets() {
        let (physics, _world, _entity, _body) = build_scene();

        let hit = physics.sweep_grabbable(&pose_facing_x(vec3(0.0, 0.0, 0.0)), 100.0, 10.0);
        assert!(hit.is_none());
    }

    #[test]
    fn sweep_ignores_bodies_without_entities() {
        let mut physics = PhysicsWorld::new(vec3(0.0, -9.81, 0.0));
        let body = physics.create_dynamic_body(Isometry::translation(150.0, 0.0, 0.0), None);
        physics.attach_collider(body, SharedShape::ball(10.0), 1.0, CollisionGroup::grabbable());
        physics.refresh_queries();

        let hit = physics.sweep_grabbable(&pose_facing_x(vec3(0.0, 0.0, 0.0)), 200.0, 10.0);
        assert!(hit.is_none());
    }

    #[test]
    fn activate_body_forces_dynamic_and_awake() {
        let mut world = World::new();
        let entity = world.add_entity(());
        let mut physics = PhysicsWorld::new(vec3(0.0, -9.81, 0.0));
        let handle = physics.create_fixed_body(Isometry::translation(0.0, 0.0, 0.0), Some(entity));
        physics.attach_collider(handle, SharedShape::ball(1.0), 1.0, CollisionGroup::grabbable());

        GrabPhysics::activate_body(&mut physics, handle);

        let body = physics.bodies.get(handle).unwrap();
        assert_eq!(body.body_type(), RigidBodyType::Dynamic);
        assert!(!body.is_sleeping());
    }

    #[test]
    fn grab_binding_drives_body_toward_target() {
        let (mut physics, _world, _entity, body) = build_scene();

        PhysicsHandoff::grab_at(
            &mut physics,
            body,
            vec3(140.0, 0.0, 0.0),
            Rotator::default(),
        );
        PhysicsHandoff::set_target(&mut physics, vec3(100.0, 80.0, 0.0), Rotator::default());

        for _ in 0..180 {
            physics.update(&tick());
        }

        // Anchor converges on the target; the body center trails it by the
        // local anchor offset (10 along +X at identity orientation).
        let position = physics.body_position(body).unwrap();
        assert!((position - vec3(110.0, 80.0, 0.0)).magnitude() < 2.0);
    }

    #[test]
    fn release_restores_gravity_and_unbinds() {
        let (mut physics, _world, _entity, body) = build_scene();

        PhysicsHandoff::grab_at(
            &mut physics,
            body,
            vec3(140.0, 0.0, 0.0),
            Rotator::default(),
        );
        assert_eq!(PhysicsHandoff::grabbed_body(&physics), Some(body));
        assert_eq!(physics.bodies.get(body).unwrap().gravity_scale(), 0.0);

        PhysicsHandoff::release(&mut physics);
        assert_eq!(PhysicsHandoff::grabbed_body(&physics), None);
        assert_eq!(physics.bodies.get(body).unwrap().gravity_scale(), 1.0);
    }

    #[test]
    fn binding_reports_gone_after_body_removal() {
        let (mut physics, _world, entity, body) = build_scene();

        PhysicsHandoff::grab_at(
            &mut physics,
            body,
            vec3(140.0, 0.0, 0.0),
            Rotator::default(),
        );
        physics.remove(entity);

        assert_eq!(PhysicsHandoff::grabbed_body(&physics), None);
        // Stepping afterwards must not panic or resurrect the binding.
        physics.update(&tick());
        assert!(PhysicsHandoff::target_position(&physics).is_none());
    }
}
