use cgmath::{Quaternion, Vector3, vec3};
use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::*;

pub fn vec_to_nvec(vec: Vector3<f32>) -> Vector<Real> {
    vector![vec.x, vec.y, vec.z]
}

pub fn vec_to_npoint(vec: Vector3<f32>) -> Point<Real> {
    point![vec.x, vec.y, vec.z]
}

pub fn nvec_to_vec(vec: Vector<Real>) -> Vector3<f32> {
    vec3(vec.x, vec.y, vec.z)
}

pub fn npoint_to_vec(point: Point<Real>) -> Vector3<f32> {
    vec3(point.x, point.y, point.z)
}

pub fn quat_to_nquat(quat: Quaternion<f32>) -> UnitQuaternion<f32> {
    let raw = rapier3d::na::Quaternion::new(quat.s, quat.v.x, quat.v.y, quat.v.z);
    UnitQuaternion::from_quaternion(raw)
}

pub fn nquat_to_quat(quat: UnitQuaternion<f32>) -> Quaternion<f32> {
    Quaternion::new(quat.w, quat.i, quat.j, quat.k)
}
