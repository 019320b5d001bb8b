use std::fmt;

/// Per-frame geometric degeneracy. Always recoverable: the caller skips the
/// affected render for this frame and recomputes from fresh poses next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// The viewer is on or behind the window plane; `near` is the signed depth.
    ViewerBehindWindow { near: f32 },
    /// The window is farther from the viewer than the far plane.
    WindowBeyondFar { near: f32, far: f32 },
    /// The oblique clip plane sits on or behind the virtual camera.
    NearClipNotPositive { distance: f32 },
    /// A transform could not be inverted (zero scale component or determinant).
    SingularTransform,
    /// Homogeneous divide hit `|w| ~ 0`; bit `i` is set for each bad corner.
    DegenerateCorners { mask: u8 },
    /// Every projected point lies behind the camera.
    BehindCamera,
    /// The viewport rectangle has no area after clamping.
    EmptyViewport,
    /// Two projections that must share an aspect/FOV basis do not.
    ProjectionBasisMismatch,
    /// The clip plane is parallel to the projection's far corner direction.
    ObliqueClipUnstable,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ViewerBehindWindow { near } => {
                write!(f, "viewer is behind the window plane (near distance {near})")
            }
            Self::WindowBeyondFar { near, far } => {
                write!(f, "window depth {near} is beyond the far plane {far}")
            }
            Self::NearClipNotPositive { distance } => {
                write!(f, "oblique near clip distance is not positive ({distance})")
            }
            Self::SingularTransform => write!(f, "transform is not invertible"),
            Self::DegenerateCorners { mask } => {
                write!(f, "perspective divide by zero on corners {mask:#010b}")
            }
            Self::BehindCamera => write!(f, "all points are behind the camera"),
            Self::EmptyViewport => write!(f, "viewport rectangle is empty"),
            Self::ProjectionBasisMismatch => {
                write!(f, "viewer and virtual projections have different fov/aspect")
            }
            Self::ObliqueClipUnstable => {
                write!(f, "clip plane cannot be folded into the projection")
            }
        }
    }
}

impl std::error::Error for GeometryError {}
