use cgmath::{Quaternion, Rotation as _, Vector3, vec3};
use shipyard::{EntityId, Get, View, World};

use crate::properties::{AttachedTo, Position, Rotation};

/// Resolve an entity's world-space transform by walking its attachment chain.
pub fn world_pose(world: &World, entity: EntityId) -> (Vector3<f32>, Quaternion<f32>) {
    let v_position = world.borrow::<View<Position>>().unwrap();
    let v_rotation = world.borrow::<View<Rotation>>().unwrap();
    let v_attached = world.borrow::<View<AttachedTo>>().unwrap();

    resolve_pose(&v_position, &v_rotation, &v_attached, entity)
}

fn resolve_pose(
    v_position: &View<Position>,
    v_rotation: &View<Rotation>,
    v_attached: &View<AttachedTo>,
    entity: EntityId,
) -> (Vector3<f32>, Quaternion<f32>) {
    if let Ok(attached) = v_attached.get(entity) {
        let (parent_position, parent_rotation) =
            resolve_pose(v_position, v_rotation, v_attached, attached.parent);
        (
            parent_position + parent_rotation.rotate_vector(attached.local_position),
            parent_rotation * attached.local_rotation,
        )
    } else {
        let position = v_position
            .get(entity)
            .map(|p| p.0)
            .unwrap_or(vec3(0.0, 0.0, 0.0));
        let rotation = v_rotation
            .get(entity)
            .map(|r| r.0)
            .unwrap_or(Quaternion::new(1.0, 0.0, 0.0, 0.0));
        (position, rotation)
    }
}

/// Detach an entity from its scene-graph parent, keeping its world transform.
///
/// The resolved world pose is written into the entity's own
/// `Position`/`Rotation` components before the attachment is removed, so
/// target-pose math done afterwards is never relative to the old parent.
/// No-op for entities that are not attached.
pub fn detach_preserving_world(world: &mut World, entity: EntityId) -> bool {
    let is_attached = world
        .borrow::<View<AttachedTo>>()
        .unwrap()
        .get(entity)
        .is_ok();
    if !is_attached {
        return false;
    }

    let (position, rotation) = world_pose(world, entity);
    world.add_component(entity, (Position(position), Rotation(rotation)));
    world.remove::<(AttachedTo,)>(entity);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Euler, InnerSpace};

    fn yaw(degrees: f32) -> Quaternion<f32> {
        Quaternion::from(Euler::new(Deg(0.0), Deg(degrees), Deg(0.0)))
    }

    #[test]
    fn world_pose_composes_attachment_chain() {
        let mut world = World::new();

        let shelf = world.add_entity((Position(vec3(5.0, 0.0, 0.0)), Rotation(yaw(90.0))));
        let crate_entity = world.add_entity((AttachedTo {
            parent: shelf,
            local_position: vec3(0.0, 0.0, -2.0),
            local_rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        },));

        let (position, _rotation) = world_pose(&world, crate_entity);
        // parent at (5,0,0), yaw 90 turns local (0,0,-2) into (-2,0,0)
        assert!((position - vec3(3.0, 0.0, 0.0)).magnitude() < 1e-4);
    }

    #[test]
    fn detach_preserves_world_transform() {
        let mut world = World::new();

        let shelf = world.add_entity((Position(vec3(5.0, 1.0, 0.0)), Rotation(yaw(90.0))));
        let crate_entity = world.add_entity((AttachedTo {
            parent: shelf,
            local_position: vec3(0.0, 0.0, -2.0),
            local_rotation: yaw(45.0),
        },));

        let before = world_pose(&world, crate_entity);
        assert!(detach_preserving_world(&mut world, crate_entity));
        let after = world_pose(&world, crate_entity);

        assert!((before.0 - after.0).magnitude() < 1e-4);
        assert!((before.1.s - after.1.s).abs() < 1e-4);
        assert!((before.1.v - after.1.v).magnitude() < 1e-4);

        let v_attached = world.borrow::<View<AttachedTo>>().unwrap();
        assert!(v_attached.get(crate_entity).is_err());
    }

    #[test]
    fn detach_without_parent_is_a_no_op() {
        let mut world = World::new();
        let loose = world.add_entity((Position(vec3(1.0, 2.0, 3.0)),));

        assert!(!detach_preserving_world(&mut world, loose));

        let (position, _) = world_pose(&world, loose);
        assert!((position - vec3(1.0, 2.0, 3.0)).magnitude() < 1e-6);
    }

    #[test]
    fn detach_flattens_nested_attachments() {
        let mut world = World::new();

        let root = world.add_entity((Position(vec3(10.0, 0.0, 0.0)),));
        let middle = world.add_entity((AttachedTo {
            parent: root,
            local_position: vec3(0.0, 2.0, 0.0),
            local_rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        },));
        let leaf = world.add_entity((AttachedTo {
            parent: middle,
            local_position: vec3(1.0, 0.0, 0.0),
            local_rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        },));

        assert!(detach_preserving_world(&mut world, leaf));
        let (position, _) = world_pose(&world, leaf);
        assert!((position - vec3(11.0, 2.0, 0.0)).magnitude() < 1e-4);
    }
}
