//! Off-axis projection through a rectangular window.
//!
//! The camera keeps the viewer's position but takes the window's orientation,
//! so its image plane is parallel to the window. The near plane is placed on
//! the window and bounded by its edges, which shears the frustum whenever the
//! viewer is not on the window's central axis.

use glam::{Mat4, Vec3, Vec4};
use tracing::debug;

use crate::error::GeometryError;
use crate::pose::{CameraState, Pose};
use crate::surface::Rectangle;
use crate::viewport::{viewport_window, ViewportRect};

/// Textbook asymmetric perspective matrix with OpenGL depth range.
pub fn frustum_matrix(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;

    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            -(far + near) / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}

/// Projection for a camera at `viewer` oriented like `window`, with the near
/// plane on the window rectangle.
pub fn off_axis_projection(
    viewer: Vec3,
    window: &Rectangle,
    far: f32,
) -> Result<Mat4, GeometryError> {
    // Unit scale: the extent is carried by `world_size`.
    let world_to_window = window.pose.world_to_local(Vec3::ONE)?;
    let eye = world_to_window.transform_point3(viewer);

    // The window center sits at depth `-eye.z` in the window-aligned camera frame.
    let near = eye.z;
    if near <= 0.0 {
        debug!("viewer behind window plane (near {near})");
        return Err(GeometryError::ViewerBehindWindow { near });
    }
    if far <= near {
        debug!("window beyond far plane (near {near}, far {far})");
        return Err(GeometryError::WindowBeyondFar { near, far });
    }

    let half = window.world_size() * 0.5;
    let right = half.x - eye.x;
    let left = -half.x - eye.x;
    let top = half.y - eye.y;
    let bottom = -half.y - eye.y;

    Ok(frustum_matrix(left, right, bottom, top, near, far))
}

/// Everything a renderer needs to draw the view through a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowCamera {
    pub pose: Pose,
    pub view: Mat4,
    pub projection: Mat4,
    /// Footprint of the window on the viewer's screen, unclamped.
    pub raw_viewport: ViewportRect,
    /// Clamped footprint; the render sub-region.
    pub viewport: ViewportRect,
}

impl WindowCamera {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

pub fn window_camera(
    viewer: &CameraState,
    window: &Rectangle,
    far: f32,
) -> Result<WindowCamera, GeometryError> {
    let projection = off_axis_projection(viewer.pose.position, window, far)?;
    let pose = Pose::new(viewer.pose.position, window.pose.rotation);

    let raw_viewport = viewport_window(&window.corners(), viewer.view(), viewer.projection())?;
    let viewport = raw_viewport.clamped();
    if viewport.is_empty() {
        return Err(GeometryError::EmptyViewport);
    }

    Ok(WindowCamera {
        pose,
        view: pose.view_matrix(),
        projection,
        raw_viewport,
        viewport,
    })
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Quat, Vec2, Vec3};

    use super::{frustum_matrix, off_axis_projection, window_camera};
    use crate::error::GeometryError;
    use crate::pose::{CameraState, Pose};
    use crate::surface::Rectangle;

    fn window() -> Rectangle {
        Rectangle::new(
            Pose::new(Vec3::new(1.0, 2.0, -3.0), Quat::from_rotation_y(0.3)),
            Vec2::new(2.0, 1.0),
        )
    }

    #[test]
    fn centered_viewer_gives_symmetric_perspective() {
        let window = window();
        let distance = 1.5;
        let viewer = window.pose.position + window.normal() * distance;

        let projection = off_axis_projection(viewer, &window, 100.0).expect("viewer in front");
        let fov_y = 2.0 * (0.5 / distance).atan();
        let expected = Mat4::perspective_rh_gl(fov_y, 2.0, distance, 100.0);

        assert!(projection.abs_diff_eq(expected, 1.0e-4), "{projection} != {expected}");
        assert_eq!(projection.row(3), glam::Vec4::new(0.0, 0.0, -1.0, 0.0));
    }

    #[test]
    fn lateral_offset_shears_the_frustum() {
        let window = window();
        let viewer = window.pose.position + window.normal() * 2.0 + window.pose.right() * 0.5;
        let projection = off_axis_projection(viewer, &window, 50.0).expect("viewer in front");

        // right = 1 - 0.5, left = -1 - 0.5
        let expected = frustum_matrix(-1.5, 0.5, -0.5, 0.5, 2.0, 50.0);
        assert!(projection.abs_diff_eq(expected, 1.0e-4));
        assert!(projection.z_axis.x < 0.0);
    }

    #[test]
    fn window_edges_land_on_clip_boundary() {
        let window = window();
        let viewer = window.pose.position + window.normal() * 3.0 + window.pose.up() * 0.7;
        let camera = window_camera(
            &CameraState {
                pose: Pose::new(viewer, window.pose.rotation),
                ..CameraState::default()
            },
            &window,
            100.0,
        )
        .expect("window is on screen");

        let view_proj = camera.view_projection();
        let expected = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        for (corner, (x, y)) in window.corners().into_iter().zip(expected) {
            let ndc = view_proj.project_point3(corner);
            assert!((ndc.x - x).abs() < 1.0e-3, "{ndc}");
            assert!((ndc.y - y).abs() < 1.0e-3, "{ndc}");
            assert!((ndc.z + 1.0).abs() < 1.0e-3, "{ndc}");
        }
    }

    #[test]
    fn viewer_behind_window_is_degenerate() {
        let window = window();
        let viewer = window.pose.position - window.normal() * 1.0;
        let err = off_axis_projection(viewer, &window, 100.0).expect_err("viewer is behind");
        assert!(matches!(err, GeometryError::ViewerBehindWindow { near } if near < 0.0));

        let on_plane = window.pose.position + window.pose.right() * 0.2;
        assert!(matches!(
            off_axis_projection(on_plane, &window, 100.0),
            Err(GeometryError::ViewerBehindWindow { .. })
        ));
    }

    #[test]
    fn window_past_far_plane_is_rejected() {
        let window = window();
        let viewer = window.pose.position + window.normal() * 5.0;
        let err = off_axis_projection(viewer, &window, 2.0).expect_err("far is in front of the window");
        assert!(matches!(
            err,
            GeometryError::WindowBeyondFar { near, far } if (near - 5.0).abs() < 1.0e-4 && far == 2.0
        ));
        assert!(matches!(
            off_axis_projection(viewer, &window, 5.0),
            Err(GeometryError::WindowBeyondFar { .. })
        ));
    }

    #[test]
    fn window_outside_the_viewers_screen_has_no_viewport() {
        let window = Rectangle::new(
            Pose::new(Vec3::new(20.0, 0.0, -3.0), Quat::IDENTITY),
            Vec2::new(2.0, 1.0),
        );
        let viewer = CameraState {
            pose: Pose::new(Vec3::new(0.0, 0.0, 5.0), Quat::IDENTITY),
            ..CameraState::default()
        };

        assert!(off_axis_projection(viewer.pose.position, &window, 100.0).is_ok());
        assert_eq!(
            window_camera(&viewer, &window, 100.0),
            Err(GeometryError::EmptyViewport)
        );
    }

    #[test]
    fn scaled_window_edges_land_on_clip_boundary() {
        let window = window().with_scale(Vec3::new(2.0, 3.0, 1.0));
        let viewer = window.pose.position + window.normal() * 3.0;
        let camera = window_camera(
            &CameraState {
                pose: Pose::new(viewer, window.pose.rotation),
                ..CameraState::default()
            },
            &window,
            100.0,
        )
        .expect("window is on screen");

        let view_proj = camera.view_projection();
        for corner in window.corners() {
            let ndc = view_proj.project_point3(corner);
            assert!((ndc.x.abs() - 1.0).abs() < 1.0e-3, "{ndc}");
            assert!((ndc.y.abs() - 1.0).abs() < 1.0e-3, "{ndc}");
        }
    }

    #[test]
    fn window_camera_uses_window_orientation_and_screen_footprint() {
        let window = window();
        let viewer_pose = Pose::new(window.pose.position + window.normal() * 4.0, window.pose.rotation);
        let viewer = CameraState {
            pose: viewer_pose,
            ..CameraState::default()
        };
        let camera = window_camera(&viewer, &window, 100.0).expect("window is on screen");

        assert_eq!(camera.pose.rotation, window.pose.rotation);
        assert_eq!(camera.pose.position, viewer_pose.position);
        let center = camera.viewport.center();
        assert!((center.x - 0.5).abs() < 1.0e-4 && (center.y - 0.5).abs() < 1.0e-4);
        assert!(camera.viewport.width < 1.0 && camera.viewport.height < 1.0);
    }
}
