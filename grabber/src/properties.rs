use cgmath::{Quaternion, Vector3};
use shipyard::{Component, EntityId};

/// Marker placed on an entity for as long as it is being carried.
///
/// External systems (scripts, AI, audio) query this component instead of
/// asking the grab system directly.
#[derive(Debug, Clone, Copy, Component)]
pub struct Grabbed;

/// World-space position of an entity while it is not attached to a parent.
#[derive(Debug, Clone, Copy, Component)]
pub struct Position(pub Vector3<f32>);

/// World-space rotation of an entity while it is not attached to a parent.
#[derive(Debug, Clone, Copy, Component)]
pub struct Rotation(pub Quaternion<f32>);

/// Scene-graph attachment. While present, the entity's world transform is the
/// parent's world transform composed with the local offset, and its own
/// `Position`/`Rotation` components are ignored. The attachment chain must be
/// acyclic.
#[derive(Debug, Clone, Copy, Component)]
pub struct AttachedTo {
    pub parent: EntityId,
    pub local_position: Vector3<f32>,
    pub local_rotation: Quaternion<f32>,
}
