use cgmath::Vector3;
use rapier3d::prelude::RigidBodyHandle;

use super::reach::ReachResult;
use crate::pose::{Pose, Rotator};

/// Physics-side capabilities the grab system consumes. Injected per call;
/// the system never reaches into ambient global state.
pub trait GrabPhysics {
    /// Sweep a sphere of `radius` from the pose along its forward direction,
    /// restricted to the grabbable collision channel. Returns the closest
    /// blocking hit, if any. Pure query.
    fn sweep_grabbable(&self, pose: &Pose, max_distance: f32, radius: f32) -> Option<ReachResult>;

    /// Force a body into actively simulated, awake state so a freshly
    /// grabbed object responds even if it was resting or kinematic.
    fn activate_body(&mut self, body: RigidBodyHandle);

    /// Resolve the grab-binding capability. `None` means the capability is
    /// not configured; every dependent operation degrades to a no-op.
    fn handoff(&mut self) -> Option<&mut dyn PhysicsHandoff>;
}

/// A binding that drives one rigid body toward a controller-specified target
/// pose each physics step.
pub trait PhysicsHandoff {
    /// The body currently bound, if the binding is live.
    fn grabbed_body(&self) -> Option<RigidBodyHandle>;

    /// Bind `body` at `world_point`, with `orientation` as the initial
    /// target orientation. Replaces any existing binding.
    fn grab_at(&mut self, body: RigidBodyHandle, world_point: Vector3<f32>, orientation: Rotator);

    /// Update the target pose the bound body is driven toward.
    fn set_target(&mut self, position: Vector3<f32>, orientation: Rotator);

    /// Destroy the binding. No-op when nothing is bound.
    fn release(&mut self);

    fn target_position(&self) -> Option<Vector3<f32>>;
    fn target_orientation(&self) -> Option<Rotator>;
}
