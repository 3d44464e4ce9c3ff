use cgmath::Vector3;
use rapier3d::prelude::RigidBodyHandle;
use shipyard::EntityId;

use crate::pose::Pose;

/// Outcome of a reach sweep: the closest grabbable blocking the swept sphere.
///
/// Ephemeral by design. A result is produced, consumed, and discarded within
/// a single tick; it is never cached across ticks.
#[derive(Clone, Copy, Debug)]
pub struct ReachResult {
    /// World-space point where the sweep first touched the body
    pub impact_point: Vector3<f32>,
    pub body: RigidBodyHandle,
    pub entity: EntityId,
}

/// The segment a reach sweep travels along, from the view point outward.
pub fn sweep_segment(pose: &Pose, max_distance: f32) -> (Vector3<f32>, Vector3<f32>) {
    let start = pose.position;
    let end = start + pose.forward * max_distance;
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Quaternion, vec3};

    #[test]
    fn segment_extends_along_forward() {
        let pose = Pose {
            position: vec3(10.0, 0.0, 0.0),
            forward: vec3(1.0, 0.0, 0.0),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        };

        let (start, end) = sweep_segment(&pose, 200.0);
        assert_eq!(start, vec3(10.0, 0.0, 0.0));
        assert_eq!(end, vec3(210.0, 0.0, 0.0));
    }
}
