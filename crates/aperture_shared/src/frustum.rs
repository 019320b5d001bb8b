//! View volumes as eight corner points.
//!
//! Corner order is fixed: the four near corners (left-bottom, right-bottom,
//! right-top, left-top) followed by the four far corners in the same order.
//! A box built with [`Frustum::from_box`] uses the same order with `-z` as the
//! "near" face, which lines up with the OpenGL clip cube where `z = -1` is the
//! near plane.
//!
//! After [`Frustum::apply_projective`] the faces are no longer guaranteed to be
//! planar, so consumers must not assume they are.

use glam::{Mat4, Vec3};
use tracing::debug;

use crate::error::GeometryError;
use crate::pose::{CameraState, Pose};
use crate::visibility::Aabb;

/// Smallest `|w|` accepted by the homogeneous divide.
pub const W_EPSILON: f32 = 1.0e-6;

/// Smallest `|det|` accepted when inverting camera matrices.
const DETERMINANT_EPSILON: f32 = 1.0e-12;

pub const LEFT_BOTTOM_NEAR: usize = 0;
pub const RIGHT_BOTTOM_NEAR: usize = 1;
pub const RIGHT_TOP_NEAR: usize = 2;
pub const LEFT_TOP_NEAR: usize = 3;
pub const LEFT_BOTTOM_FAR: usize = 4;
pub const RIGHT_BOTTOM_FAR: usize = 5;
pub const RIGHT_TOP_FAR: usize = 6;
pub const LEFT_TOP_FAR: usize = 7;

/// Corner index pairs for the 12 hexahedron edges: near loop, far loop, then
/// the four near-to-far connectors.
pub const FRUSTUM_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub corners: [Vec3; 8],
}

impl Frustum {
    /// Axis-aligned box with the given center and full size.
    pub fn from_box(center: Vec3, size: Vec3) -> Self {
        let e = size * 0.5;
        Self {
            corners: [
                center + Vec3::new(-e.x, -e.y, -e.z),
                center + Vec3::new(e.x, -e.y, -e.z),
                center + Vec3::new(e.x, e.y, -e.z),
                center + Vec3::new(-e.x, e.y, -e.z),
                center + Vec3::new(-e.x, -e.y, e.z),
                center + Vec3::new(e.x, -e.y, e.z),
                center + Vec3::new(e.x, e.y, e.z),
                center + Vec3::new(-e.x, e.y, e.z),
            ],
        }
    }

    /// Symmetric perspective frustum for a camera at `pose`.
    ///
    /// Matches `Mat4::perspective_rh_gl` with the same parameters, so it agrees
    /// with [`Frustum::from_camera_state`] for the same camera.
    pub fn from_fov(pose: &Pose, fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let tan_half = (fov_y_deg.to_radians() * 0.5).tan();
        let half_height_near = tan_half * near;
        let half_width_near = half_height_near * aspect;
        let half_height_far = tan_half * far;
        let half_width_far = half_height_far * aspect;

        let forward = pose.forward();
        let right = pose.right();
        let up = pose.up();
        let near_center = pose.position + forward * near;
        let far_center = pose.position + forward * far;

        Self {
            corners: [
                near_center - right * half_width_near - up * half_height_near,
                near_center + right * half_width_near - up * half_height_near,
                near_center + right * half_width_near + up * half_height_near,
                near_center - right * half_width_near + up * half_height_near,
                far_center - right * half_width_far - up * half_height_far,
                far_center + right * half_width_far - up * half_height_far,
                far_center + right * half_width_far + up * half_height_far,
                far_center - right * half_width_far + up * half_height_far,
            ],
        }
    }

    /// Recovers the world-space view volume by unprojecting the clip cube.
    ///
    /// The inverse projection is applied with a homogeneous divide, the inverse
    /// view without one, since camera-to-world is affine.
    pub fn from_camera_state(view: Mat4, projection: Mat4) -> Result<Self, GeometryError> {
        if projection.determinant().abs() < DETERMINANT_EPSILON
            || view.determinant().abs() < DETERMINANT_EPSILON
        {
            return Err(GeometryError::SingularTransform);
        }

        let mut frustum = Self::from_box(Vec3::ZERO, Vec3::splat(2.0));
        frustum.apply_projective(projection.inverse())?;
        frustum.apply_affine(view.inverse());
        Ok(frustum)
    }

    pub fn from_camera(camera: &CameraState) -> Result<Self, GeometryError> {
        Self::from_camera_state(camera.view(), camera.projection())
    }

    /// Transforms every corner as a point without a homogeneous divide.
    /// Only correct for affine matrices.
    pub fn apply_affine(&mut self, matrix: Mat4) {
        for corner in &mut self.corners {
            *corner = matrix.transform_point3(*corner);
        }
    }

    /// Full 4x4 transform followed by the divide by `w`.
    ///
    /// Corners whose `|w|` falls under [`W_EPSILON`] keep their undivided
    /// coordinates and are reported in the error mask; the rest are still
    /// transformed.
    pub fn apply_projective(&mut self, matrix: Mat4) -> Result<(), GeometryError> {
        let mut mask = 0u8;
        for (index, corner) in self.corners.iter_mut().enumerate() {
            let clip = matrix * corner.extend(1.0);
            if clip.w.abs() < W_EPSILON {
                mask |= 1 << index;
                *corner = clip.truncate();
                continue;
            }
            *corner = clip.truncate() / clip.w;
        }

        if mask != 0 {
            debug!("perspective divide degenerate for corner mask {mask:#010b}");
            return Err(GeometryError::DegenerateCorners { mask });
        }
        Ok(())
    }

    pub fn near_corners(&self) -> [Vec3; 4] {
        [self.corners[0], self.corners[1], self.corners[2], self.corners[3]]
    }

    pub fn far_corners(&self) -> [Vec3; 4] {
        [self.corners[4], self.corners[5], self.corners[6], self.corners[7]]
    }

    /// Line segments for debug drawing.
    pub fn edges(&self) -> [(Vec3, Vec3); 12] {
        FRUSTUM_EDGES.map(|(a, b)| (self.corners[a], self.corners[b]))
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.corners)
    }
}
