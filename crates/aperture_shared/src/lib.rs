//! Projection matrices and view-volume geometry for cameras that render
//! through windows and portals.

pub mod error;
pub mod frustum;
pub mod off_axis;
pub mod portal;
pub mod pose;
pub mod surface;
pub mod uniform;
pub mod viewport;
pub mod visibility;

pub use error::GeometryError;
pub use frustum::Frustum;
pub use off_axis::{off_axis_projection, window_camera, WindowCamera};
pub use portal::{
    oblique_projection, portal_view, portal_view_with_intrinsics, world_to_portal, PortalView,
};
pub use pose::{CameraState, Pose};
pub use surface::Rectangle;
pub use viewport::{corner_viewport_points, viewport_window, PixelRect, ViewportRect};
pub use visibility::{is_visible, Aabb};
