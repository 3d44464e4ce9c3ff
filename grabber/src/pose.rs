use cgmath::{Deg, Euler, Quaternion, Rad, Rotation, Vector3, vec3};

/// World-space pose of the controlling view point, supplied externally every
/// tick. The grab system never mutates it.
#[derive(Clone, Copy, Debug)]
pub struct Pose {
    pub position: Vector3<f32>,
    /// Unit vector pointing where the controller is aiming
    pub forward: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl Pose {
    /// Build a pose from a position and rotation, deriving the aim direction
    /// from the rotation (-Z is forward, matching the camera convention).
    pub fn from_rotation(position: Vector3<f32>, rotation: Quaternion<f32>) -> Self {
        let forward = rotation.rotate_vector(vec3(0.0, 0.0, -1.0));
        Pose {
            position,
            forward,
            rotation,
        }
    }
}

/// Pitch/yaw/roll orientation in degrees.
///
/// The physics handoff stores its target orientation in this form so that
/// pitch and yaw adjustments while carrying are exact additions, with no
/// quaternion round-trip drift between them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub fn to_quaternion(self) -> Quaternion<f32> {
        Quaternion::from(Euler::new(Deg(self.pitch), Deg(self.yaw), Deg(self.roll)))
    }
}

impl From<Quaternion<f32>> for Rotator {
    fn from(rotation: Quaternion<f32>) -> Self {
        let euler: Euler<Rad<f32>> = Euler::from(rotation);
        Rotator {
            pitch: Deg::from(euler.x).0,
            yaw: Deg::from(euler.y).0,
            roll: Deg::from(euler.z).0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn pose_forward_follows_rotation() {
        // 90 degree yaw turns -Z into -X
        let rotation = Quaternion::from(Euler::new(Deg(0.0), Deg(90.0), Deg(0.0)));
        let pose = Pose::from_rotation(vec3(1.0, 2.0, 3.0), rotation);

        assert!((pose.forward - vec3(-1.0, 0.0, 0.0)).magnitude() < 1e-5);
        assert!((pose.forward.magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rotator_quaternion_round_trip() {
        let rotator = Rotator {
            pitch: 30.0,
            yaw: 45.0,
            roll: 0.0,
        };

        let recovered = Rotator::from(rotator.to_quaternion());
        assert!((recovered.pitch - 30.0).abs() < 1e-3);
        assert!((recovered.yaw - 45.0).abs() < 1e-3);
        assert!(recovered.roll.abs() < 1e-3);
    }

    #[test]
    fn rotator_rotates_vectors_like_its_quaternion() {
        let rotator = Rotator {
            pitch: 0.0,
            yaw: 90.0,
            roll: 0.0,
        };

        let rotated = rotator.to_quaternion().rotate_vector(vec3(0.0, 0.0, -1.0));
        assert!((rotated - vec3(-1.0, 0.0, 0.0)).magnitude() < 1e-5);
    }
}
