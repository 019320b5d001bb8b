use glam::{Mat4, Vec2, Vec3};

use crate::error::GeometryError;
use crate::pose::{Pose, MIN_SCALE};
use crate::visibility::Aabb;

/// A window or portal: a `size.x` by `size.y` rectangle in the pose's local
/// XY plane, centered on the pose origin, with its outward face along local
/// `+Z`. `scale` stretches the node's local frame, so the world extent is
/// `size * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub pose: Pose,
    pub size: Vec2,
    pub scale: Vec3,
}

impl Rectangle {
    pub fn new(pose: Pose, size: Vec2) -> Self {
        Self {
            pose,
            size,
            scale: Vec3::ONE,
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Outward unit normal. A negative `scale.z` flips the face.
    pub fn normal(&self) -> Vec3 {
        (self.pose.rotation * (Vec3::Z / self.scale)).normalize_or_zero()
    }

    pub fn center(&self) -> Vec3 {
        self.pose.position
    }

    /// Left-bottom, right-bottom, right-top, left-top.
    pub fn corners(&self) -> [Vec3; 4] {
        let local_to_world = self.local_to_world();
        let half = self.size * 0.5;
        [
            Vec3::new(-half.x, -half.y, 0.0),
            Vec3::new(half.x, -half.y, 0.0),
            Vec3::new(half.x, half.y, 0.0),
            Vec3::new(-half.x, half.y, 0.0),
        ]
        .map(|corner| local_to_world.transform_point3(corner))
    }

    /// World-space width and height.
    pub fn world_size(&self) -> Vec2 {
        self.size * self.scale.truncate().abs()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.corners())
    }

    pub fn local_to_world(&self) -> Mat4 {
        self.pose.local_to_world(self.scale)
    }

    pub fn world_to_local(&self) -> Result<Mat4, GeometryError> {
        self.pose.world_to_local(self.scale)
    }

    pub fn has_valid_size(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0 && self.size.is_finite()
    }

    pub fn has_valid_scale(&self) -> bool {
        self.scale.abs().min_element() >= MIN_SCALE
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use glam::{Quat, Vec2, Vec3};

    use super::Rectangle;
    use crate::pose::Pose;

    #[test]
    fn corners_are_centered_on_pose() {
        let rect = Rectangle::new(
            Pose::new(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_y(FRAC_PI_2)),
            Vec2::new(2.0, 4.0),
        );
        let [lb, rb, rt, lt] = rect.corners();
        assert!(lb.abs_diff_eq(Vec3::new(0.0, -1.0, 1.0), 1.0e-6));
        assert!(rb.abs_diff_eq(Vec3::new(0.0, -1.0, -1.0), 1.0e-6));
        assert!(rt.abs_diff_eq(Vec3::new(0.0, 3.0, -1.0), 1.0e-6));
        assert!(lt.abs_diff_eq(Vec3::new(0.0, 3.0, 1.0), 1.0e-6));
        assert!(rect.normal().abs_diff_eq(Vec3::X, 1.0e-6));
    }

    #[test]
    fn scale_stretches_corners_and_keeps_normal_unit() {
        let rect = Rectangle::new(
            Pose::new(Vec3::new(4.0, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_2)),
            Vec2::new(1.0, 2.0),
        )
        .with_scale(Vec3::new(3.0, 2.0, 5.0));

        let [lb, _, rt, _] = rect.corners();
        assert!(lb.abs_diff_eq(Vec3::new(4.0, -2.0, 1.5), 1.0e-5));
        assert!(rt.abs_diff_eq(Vec3::new(4.0, 2.0, -1.5), 1.0e-5));
        assert!(rect.world_size().abs_diff_eq(Vec2::new(3.0, 4.0), 1.0e-6));
        assert!(rect.normal().abs_diff_eq(Vec3::X, 1.0e-6));

        let bounds = rect.bounds();
        assert!(bounds.min.abs_diff_eq(Vec3::new(4.0, -2.0, -1.5), 1.0e-5));
        assert!(bounds.max.abs_diff_eq(Vec3::new(4.0, 2.0, 1.5), 1.0e-5));

        let flipped = rect.with_scale(Vec3::new(1.0, 1.0, -1.0));
        assert!(flipped.normal().abs_diff_eq(-Vec3::X, 1.0e-6));
    }

    #[test]
    fn validity_checks_catch_bad_configuration() {
        let rect = Rectangle::new(Pose::default(), Vec2::new(1.0, 0.0));
        assert!(!rect.has_valid_size());
        let scaled = Rectangle::new(Pose::default(), Vec2::ONE).with_scale(Vec3::new(1.0, 1.0, 0.0));
        assert!(!scaled.has_valid_scale());
        assert!(scaled.world_to_local().is_err());
    }
}
