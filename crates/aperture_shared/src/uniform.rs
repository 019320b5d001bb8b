use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::off_axis::WindowCamera;
use crate::portal::PortalView;
use crate::viewport::ViewportRect;

/// Per-camera data handed to the render invocation, laid out for a uniform
/// buffer upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
    /// `x, y, width, height` in normalized viewport space.
    pub viewport: [f32; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4, position: Vec3, viewport: ViewportRect) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            position: position.extend(1.0).to_array(),
            viewport: [viewport.x, viewport.y, viewport.width, viewport.height],
        }
    }
}

impl From<&WindowCamera> for CameraUniform {
    fn from(camera: &WindowCamera) -> Self {
        Self::new(camera.view_projection(), camera.pose.position, camera.viewport)
    }
}

impl From<&PortalView> for CameraUniform {
    fn from(view: &PortalView) -> Self {
        Self::new(view.view_projection(), view.camera.pose.position, view.viewport)
    }
}
