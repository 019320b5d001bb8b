//! Portal cameras: the rigid mapping from a source portal to its destination,
//! the oblique near clip that starts rendering at the destination surface, and
//! the viewport remap that confines the render to the portal's footprint.

use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3, Vec4};
use tracing::debug;

use crate::error::GeometryError;
use crate::pose::{transform_pose, CameraState};
use crate::surface::Rectangle;
use crate::viewport::{corner_viewport_points, viewport_window, ViewportRect};

/// Minimum camera-to-plane distance for an oblique near clip.
pub const MIN_CLIP_DISTANCE: f32 = 1.0e-5;
/// Relative tolerance when comparing projection scale terms.
const BASIS_TOLERANCE: f32 = 1.0e-4;
const OBLIQUE_DENOM_EPSILON: f32 = 1.0e-6;
const MIN_VIEWPORT_EXTENT: f32 = 1.0e-6;

/// Maps world points on the source side to the equivalent points on the
/// destination side. The half turn about `Y` keeps traversal from mirroring.
pub fn world_to_portal(source: &Rectangle, dest: &Rectangle) -> Result<Mat4, GeometryError> {
    let source_world_to_local = source.world_to_local()?;
    Ok(dest.local_to_world() * Mat4::from_rotation_y(PI) * source_world_to_local)
}

/// Oblique near clip folded into a projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObliqueClip {
    pub projection: Mat4,
    /// Camera-space plane `(normal, d)`, normal pointing away from the camera.
    pub plane: Vec4,
    /// Distance from the camera to the plane.
    pub distance: f32,
}

/// Replaces the near plane of `base` with the plane through `plane_point`
/// with normal `plane_normal`, seen from a camera at `camera_position`.
pub fn oblique_clip(
    base: Mat4,
    world_to_view: Mat4,
    plane_normal: Vec3,
    plane_point: Vec3,
    camera_position: Vec3,
) -> Result<ObliqueClip, GeometryError> {
    let sign = plane_normal.dot(plane_point - camera_position).signum();

    let local_point = world_to_view.transform_point3(plane_point);
    let local_normal = world_to_view.transform_vector3(plane_normal).normalize_or_zero() * sign;
    if local_normal == Vec3::ZERO {
        return Err(GeometryError::ObliqueClipUnstable);
    }

    let d = -local_point.dot(local_normal);
    let distance = -d;
    if distance <= MIN_CLIP_DISTANCE {
        debug!("oblique clip plane at distance {distance}; skipping");
        return Err(GeometryError::NearClipNotPositive { distance });
    }

    let plane = local_normal.extend(d);
    let projection = apply_oblique_plane(base, plane)?;
    Ok(ObliqueClip {
        projection,
        plane,
        distance,
    })
}

/// Oblique near-clip projection; see [`oblique_clip`].
pub fn oblique_projection(
    base: Mat4,
    world_to_view: Mat4,
    plane_normal: Vec3,
    plane_point: Vec3,
    camera_position: Vec3,
) -> Result<Mat4, GeometryError> {
    oblique_clip(base, world_to_view, plane_normal, plane_point, camera_position)
        .map(|clip| clip.projection)
}

/// Lengyel's oblique frustum: rewrites the third row so `plane` maps to the
/// `z = -1` clip face while keeping the far corners of the frustum in place.
fn apply_oblique_plane(proj: Mat4, plane: Vec4) -> Result<Mat4, GeometryError> {
    let q = proj.inverse() * Vec4::new(plane.x.signum(), plane.y.signum(), 1.0, 1.0);
    let denom = plane.dot(q);
    if denom.abs() < OBLIQUE_DENOM_EPSILON {
        return Err(GeometryError::ObliqueClipUnstable);
    }

    let c = plane * (2.0 / denom);
    let mut m = proj.to_cols_array_2d();
    m[0][2] = c.x - m[0][3];
    m[1][2] = c.y - m[1][3];
    m[2][2] = c.z - m[2][3];
    m[3][2] = c.w - m[3][3];
    Ok(Mat4::from_cols_array_2d(&m))
}

/// Clip-space remap so that the part of the image inside `rect` fills the
/// whole `[-1, 1]` range: `offset * scale`.
pub fn viewport_remap(rect: &ViewportRect) -> Result<Mat4, GeometryError> {
    if rect.width < MIN_VIEWPORT_EXTENT || rect.height < MIN_VIEWPORT_EXTENT {
        return Err(GeometryError::EmptyViewport);
    }

    let ndc_center = rect.center() * 2.0 - glam::Vec2::ONE;
    let scale = Mat4::from_scale(Vec3::new(1.0 / rect.width, 1.0 / rect.height, 1.0));
    let offset = Mat4::from_translation(Vec3::new(
        -ndc_center.x / rect.width,
        -ndc_center.y / rect.height,
        0.0,
    ));
    Ok(offset * scale)
}

/// The viewer's footprint rectangle is only meaningful for the virtual camera
/// when both projections share the same horizontal and vertical scale.
pub fn ensure_matching_basis(viewer: Mat4, virtual_camera: Mat4) -> Result<(), GeometryError> {
    let close = |a: f32, b: f32| (a - b).abs() <= BASIS_TOLERANCE * a.abs().max(b.abs()).max(1.0);
    if close(viewer.x_axis.x, virtual_camera.x_axis.x)
        && close(viewer.y_axis.y, virtual_camera.y_axis.y)
    {
        Ok(())
    } else {
        Err(GeometryError::ProjectionBasisMismatch)
    }
}

/// A destination-side camera ready to render the view through a portal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalView {
    pub world_to_portal: Mat4,
    pub camera: CameraState,
    pub view: Mat4,
    /// Oblique projection before the viewport remap.
    pub oblique: Mat4,
    /// `remap * oblique`; the projection to render with.
    pub projection: Mat4,
    /// Camera-space clip plane of the destination surface.
    pub clip_plane: Vec4,
    pub near_distance: f32,
    pub raw_viewport: ViewportRect,
    pub viewport: ViewportRect,
    /// Source corners on the viewer's screen, for texturing the portal mesh.
    pub corner_points: [Option<Vec2>; 4],
}

impl PortalView {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Builds the virtual camera for looking from `viewer` through `source` out
/// of `dest`, with the viewer's own intrinsics.
///
/// The footprint is measured on the source rectangle through the viewer's own
/// camera; the mapping carries it onto the destination rectangle seen by the
/// virtual camera at the same screen position.
pub fn portal_view(
    viewer: &CameraState,
    source: &Rectangle,
    dest: &Rectangle,
) -> Result<PortalView, GeometryError> {
    portal_view_with_intrinsics(viewer, viewer, source, dest)
}

/// Like [`portal_view`], but the virtual camera takes its field of view,
/// aspect and clip range from `intrinsics`; its pose is ignored. Only the
/// clip range may differ from the viewer's.
pub fn portal_view_with_intrinsics(
    viewer: &CameraState,
    intrinsics: &CameraState,
    source: &Rectangle,
    dest: &Rectangle,
) -> Result<PortalView, GeometryError> {
    let viewer_projection = viewer.projection();
    let camera = CameraState {
        pose: viewer.pose,
        ..*intrinsics
    };
    let base = camera.projection();
    ensure_matching_basis(viewer_projection, base)?;

    let world_to_portal = world_to_portal(source, dest)?;
    let camera = CameraState {
        pose: transform_pose(world_to_portal, &viewer.pose),
        ..camera
    };
    let view = camera.view();

    let clip = oblique_clip(
        base,
        view,
        dest.normal(),
        dest.center(),
        camera.pose.position,
    )?;

    let source_corners = source.corners();
    let viewer_view = viewer.view();
    let raw_viewport = viewport_window(&source_corners, viewer_view, viewer_projection)?;
    let viewport = raw_viewport.clamped();
    if viewport.is_empty() {
        return Err(GeometryError::EmptyViewport);
    }
    let remap = viewport_remap(&viewport)?;

    Ok(PortalView {
        world_to_portal,
        camera,
        view,
        oblique: clip.projection,
        projection: remap * clip.projection,
        clip_plane: clip.plane,
        near_distance: clip.distance,
        raw_viewport,
        viewport,
        corner_points: corner_viewport_points(&source_corners, viewer_view, viewer_projection),
    })
}
