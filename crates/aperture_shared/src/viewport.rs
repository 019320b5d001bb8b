use glam::{Mat4, UVec2, Vec2, Vec3};
use tracing::debug;

use crate::error::GeometryError;
use crate::frustum::W_EPSILON;

/// Rectangle in normalized viewport space, `(0, 0)` bottom-left.
///
/// Unclamped values are fine for debug drawing; only [`ViewportRect::clamped`]
/// output may size a render region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            x: min.x,
            y: min.y,
            width: (max.x - min.x).max(0.0),
            height: (max.y - min.y).max(0.0),
        }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Clamps both corners into `[0, 1]^2` and recomputes the size from them.
    pub fn clamped(&self) -> Self {
        let min = self.min().clamp(Vec2::ZERO, Vec2::ONE);
        let max = self.max().clamp(Vec2::ZERO, Vec2::ONE);
        Self::from_min_max(min, max)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Integer sub-region of a render target. `None` when the target is
    /// missing or zero-sized or the clamped rectangle covers no pixel.
    pub fn to_pixels(&self, target: Option<UVec2>) -> Option<PixelRect> {
        let target = target?;
        if target.x == 0 || target.y == 0 {
            return None;
        }

        let clamped = self.clamped();
        let size = target.as_vec2();
        let min = (clamped.min() * size).floor();
        let max = (clamped.max() * size).ceil();
        let width = (max.x - min.x) as u32;
        let height = (max.y - min.y) as u32;
        if width == 0 || height == 0 {
            return None;
        }

        Some(PixelRect {
            x: min.x as u32,
            y: min.y as u32,
            width,
            height,
        })
    }
}

/// Pixel-space sub-region, origin at the bottom-left of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Projects a world point to viewport space. Returns `None` when the point is
/// on or behind the camera plane.
pub fn world_to_viewport(view_proj: Mat4, point: Vec3) -> Option<Vec2> {
    let clip = view_proj * point.extend(1.0);
    if clip.w < W_EPSILON {
        return None;
    }
    let ndc = clip.truncate().truncate() / clip.w;
    Some(ndc * 0.5 + Vec2::splat(0.5))
}

/// Unclamped on-screen bounding rectangle of `corners` seen through
/// `projection * view`.
///
/// If some corners are behind the camera the footprint straddles the eye plane
/// and cannot be bounded from the projected points, so the whole viewport is
/// returned. If all of them are, the surface is not on screen at all.
pub fn viewport_window(
    corners: &[Vec3],
    view: Mat4,
    projection: Mat4,
) -> Result<ViewportRect, GeometryError> {
    let view_proj = projection * view;
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    let mut behind = 0usize;

    for corner in corners {
        match world_to_viewport(view_proj, *corner) {
            Some(point) => {
                min = min.min(point);
                max = max.max(point);
            }
            None => behind += 1,
        }
    }

    if behind == corners.len() {
        return Err(GeometryError::BehindCamera);
    }
    if behind > 0 {
        debug!("{behind} of {} corners behind camera; using full viewport", corners.len());
        return Ok(ViewportRect::FULL);
    }

    Ok(ViewportRect::from_min_max(min, max))
}

/// Per-corner viewport coordinates of `corners` seen through
/// `projection * view`, in the same order. Corners behind the camera are
/// `None`. A surface mesh textured with the view through it samples its
/// render target at these coordinates.
pub fn corner_viewport_points<const N: usize>(
    corners: &[Vec3; N],
    view: Mat4,
    projection: Mat4,
) -> [Option<Vec2>; N] {
    let view_proj = projection * view;
    corners.map(|corner| world_to_viewport(view_proj, corner))
}
