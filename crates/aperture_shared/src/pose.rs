use glam::{Mat3, Mat4, Quat, Vec3};

use crate::error::GeometryError;

/// Smallest scale component accepted before a transform counts as singular.
pub const MIN_SCALE: f32 = 1.0e-6;

/// Rigid pose snapshot read from a scene node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose from a position and YXZ euler angles in degrees (yaw, pitch, roll).
    pub fn from_euler_deg(position: Vec3, euler_deg: Vec3) -> Self {
        let rotation = Quat::from_euler(
            glam::EulerRot::YXZ,
            euler_deg.x.to_radians(),
            euler_deg.y.to_radians(),
            euler_deg.z.to_radians(),
        );
        Self { position, rotation }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn local_to_world(&self, scale: Vec3) -> Mat4 {
        Mat4::from_scale_rotation_translation(scale, self.rotation, self.position)
    }

    /// Inverse of [`Pose::local_to_world`]. Fails when any scale component is
    /// (near) zero, since the matrix would be singular.
    pub fn world_to_local(&self, scale: Vec3) -> Result<Mat4, GeometryError> {
        if scale.abs().min_element() < MIN_SCALE {
            return Err(GeometryError::SingularTransform);
        }
        let inv_rotation = self.rotation.inverse();
        let inv_scale = Mat4::from_scale(scale.recip());
        Ok(inv_scale * Mat4::from_quat(inv_rotation) * Mat4::from_translation(-self.position))
    }

    /// World-to-view matrix for a camera placed at this pose.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }
}

/// Applies an affine matrix to a pose: the position is transformed as a point
/// and the matrix's rotation is composed in front of the pose's rotation.
/// Scale is normalized out of the basis before the rotation is extracted.
pub fn transform_pose(matrix: Mat4, pose: &Pose) -> Pose {
    let basis = Mat3::from_mat4(matrix);
    let rotation = Mat3::from_cols(
        basis.x_axis.normalize_or_zero(),
        basis.y_axis.normalize_or_zero(),
        basis.z_axis.normalize_or_zero(),
    );
    let rotation = Quat::from_mat3(&rotation).normalize();

    Pose {
        position: matrix.transform_point3(pose.position),
        rotation: (rotation * pose.rotation).normalize(),
    }
}

/// A camera's pose plus its symmetric intrinsics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub pose: Pose,
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            pose: Pose::default(),
            fov_y_deg: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraState {
    pub fn view(&self) -> Mat4 {
        self.pose.view_matrix()
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Whether the intrinsics describe a usable perspective frustum.
    pub fn is_valid(&self) -> bool {
        self.near > 0.0
            && self.far > self.near
            && self.aspect > 0.0
            && self.fov_y_deg > 0.0
            && self.fov_y_deg < 180.0
    }
}
