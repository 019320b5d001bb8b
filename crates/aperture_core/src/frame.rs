//! Per-frame evaluation. Every instance is recomputed from the current poses;
//! nothing carries over between frames.

use aperture_shared::error::GeometryError;
use aperture_shared::off_axis::{window_camera, WindowCamera};
use aperture_shared::portal::{portal_view, PortalView};
use aperture_shared::pose::CameraState;
use aperture_shared::surface::Rectangle;
use aperture_shared::viewport::PixelRect;
use aperture_shared::visibility::is_visible;
use glam::{Mat4, UVec2};
use tracing::debug;

use crate::scene::{PortalId, Scene, WindowId};

#[derive(Debug, Clone, Copy)]
pub struct FrameInputs {
    pub viewer: CameraState,
    /// Pixel size of the render target, if one is allocated.
    pub render_target: Option<UVec2>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    NoRenderTarget,
    InvalidCamera,
    NotVisible,
    MissingLink,
    Degenerate(GeometryError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Ready(_) => None,
            Self::Skipped(reason) => Some(*reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalFrame {
    pub view: PortalView,
    pub pixels: PixelRect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowFrame {
    pub camera: WindowCamera,
    pub pixels: PixelRect,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutputs {
    pub portals: Vec<(PortalId, Outcome<PortalFrame>)>,
    pub windows: Vec<(WindowId, Outcome<WindowFrame>)>,
}

/// Evaluates every portal and window of `scene` for one frame.
pub fn evaluate(scene: &Scene, inputs: &FrameInputs) -> FrameOutputs {
    let view_proj = inputs.viewer.view_projection();
    FrameOutputs {
        portals: scene
            .portal_ids()
            .iter()
            .map(|&id| (id, evaluate_portal(scene, id, inputs, view_proj)))
            .collect(),
        windows: scene
            .windows()
            .iter()
            .map(|(id, surface)| (*id, evaluate_window(scene, *id, surface, inputs, view_proj)))
            .collect(),
    }
}

/// Common gate: render target present, viewer usable, surface on screen.
fn precheck(inputs: &FrameInputs, view_proj: Mat4, surface: &Rectangle) -> Option<SkipReason> {
    match inputs.render_target {
        Some(size) if size.x > 0 && size.y > 0 => {}
        _ => return Some(SkipReason::NoRenderTarget),
    }
    if !inputs.viewer.is_valid() {
        return Some(SkipReason::InvalidCamera);
    }
    if !is_visible(view_proj, &surface.bounds()) {
        return Some(SkipReason::NotVisible);
    }
    None
}

pub(crate) fn evaluate_portal(
    scene: &Scene,
    id: PortalId,
    inputs: &FrameInputs,
    view_proj: Mat4,
) -> Outcome<PortalFrame> {
    let Some((source, destination)) = scene.linked_pair(id) else {
        debug!("portal {} has no resolvable link", id.0);
        return Outcome::Skipped(SkipReason::MissingLink);
    };
    if let Some(reason) = precheck(inputs, view_proj, source) {
        debug!("portal {} skipped: {reason:?}", id.0);
        return Outcome::Skipped(reason);
    }

    let view = match portal_view(&inputs.viewer, source, destination) {
        Ok(view) => view,
        Err(err) => {
            debug!("portal {} skipped: {err}", id.0);
            return Outcome::Skipped(SkipReason::Degenerate(err));
        }
    };
    match view.viewport.to_pixels(inputs.render_target) {
        Some(pixels) => Outcome::Ready(PortalFrame { view, pixels }),
        None => Outcome::Skipped(SkipReason::Degenerate(GeometryError::EmptyViewport)),
    }
}

pub(crate) fn evaluate_window(
    scene: &Scene,
    id: WindowId,
    surface: &Rectangle,
    inputs: &FrameInputs,
    view_proj: Mat4,
) -> Outcome<WindowFrame> {
    if let Some(reason) = precheck(inputs, view_proj, surface) {
        debug!("window {} skipped: {reason:?}", id.0);
        return Outcome::Skipped(reason);
    }

    let camera = match window_camera(&inputs.viewer, surface, scene.far_distance()) {
        Ok(camera) => camera,
        Err(err) => {
            debug!("window {} skipped: {err}", id.0);
            return Outcome::Skipped(SkipReason::Degenerate(err));
        }
    };
    match camera.viewport.to_pixels(inputs.render_target) {
        Some(pixels) => Outcome::Ready(WindowFrame { camera, pixels }),
        None => Outcome::Skipped(SkipReason::Degenerate(GeometryError::EmptyViewport)),
    }
}

#[cfg(test)]
mod tests {
    use aperture_shared::error::GeometryError;
    use aperture_shared::pose::{CameraState, Pose};
    use aperture_shared::surface::Rectangle;
    use glam::{Quat, UVec2, Vec2, Vec3};

    use super::{evaluate, FrameInputs, SkipReason};
    use crate::scene::{PortalId, Scene, WindowId};

    fn test_scene() -> Scene {
        let mut scene = Scene::new(200.0).expect("valid far distance");
        let size = Vec2::new(1.0, 2.0);
        scene
            .add_portal(PortalId(1), Rectangle::new(Pose::new(Vec3::ZERO, Quat::IDENTITY), size))
            .expect("add portal 1");
        scene
            .add_portal(
                PortalId(2),
                Rectangle::new(Pose::new(Vec3::new(20.0, 0.0, 0.0), Quat::from_rotation_y(0.4)), size),
            )
            .expect("add portal 2");
        scene.link(PortalId(1), PortalId(2)).expect("link 1 -> 2");
        scene.link(PortalId(2), PortalId(1)).expect("link 2 -> 1");
        scene
            .add_window(
                WindowId(7),
                Rectangle::new(Pose::new(Vec3::new(0.0, 0.0, -3.0), Quat::IDENTITY), Vec2::new(2.0, 1.0)),
            )
            .expect("add window");
        scene
    }

    fn test_inputs() -> FrameInputs {
        FrameInputs {
            viewer: CameraState {
                pose: Pose::new(Vec3::new(0.0, 0.0, 5.0), Quat::IDENTITY),
                fov_y_deg: 60.0,
                aspect: 16.0 / 9.0,
                near: 0.1,
                far: 200.0,
            },
            render_target: Some(UVec2::new(1920, 1080)),
        }
    }

    #[test]
    fn visible_instances_are_ready() {
        let outputs = evaluate(&test_scene(), &test_inputs());

        let (id, portal) = &outputs.portals[0];
        assert_eq!(*id, PortalId(1));
        let frame = portal.ready().expect("portal 1 faces the viewer");
        assert!(frame.pixels.width > 0 && frame.pixels.width < 1920);
        assert!((frame.view.near_distance - 5.0).abs() < 1.0e-3);

        let (id, window) = &outputs.windows[0];
        assert_eq!(*id, WindowId(7));
        let frame = window.ready().expect("window is in front of the viewer");
        assert_eq!(frame.camera.pose.position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn off_screen_portal_is_culled_before_any_math() {
        let outputs = evaluate(&test_scene(), &test_inputs());
        let (id, portal) = &outputs.portals[1];
        assert_eq!(*id, PortalId(2));
        assert_eq!(portal.skip_reason(), Some(SkipReason::NotVisible));
    }

    #[test]
    fn missing_render_target_skips_everything() {
        for render_target in [None, Some(UVec2::new(0, 1080))] {
            let inputs = FrameInputs {
                render_target,
                ..test_inputs()
            };
            let outputs = evaluate(&test_scene(), &inputs);
            for (_, portal) in &outputs.portals {
                assert_eq!(portal.skip_reason(), Some(SkipReason::NoRenderTarget));
            }
            for (_, window) in &outputs.windows {
                assert_eq!(window.skip_reason(), Some(SkipReason::NoRenderTarget));
            }
        }
    }

    #[test]
    fn viewer_behind_window_is_a_per_frame_skip() {
        let mut inputs = test_inputs();
        inputs.viewer.pose = Pose::new(Vec3::new(0.0, 0.0, -6.0), Quat::from_rotation_y(std::f32::consts::PI));
        let outputs = evaluate(&test_scene(), &inputs);

        let (_, window) = &outputs.windows[0];
        assert!(matches!(
            window.skip_reason(),
            Some(SkipReason::Degenerate(GeometryError::ViewerBehindWindow { .. }))
        ));
    }

    #[test]
    fn unlinked_portal_is_skipped() {
        let mut scene = Scene::new(50.0).expect("valid far distance");
        scene
            .add_portal(PortalId(3), Rectangle::new(Pose::default(), Vec2::ONE))
            .expect("add portal");
        let outputs = evaluate(&scene, &test_inputs());
        assert_eq!(outputs.portals[0].1.skip_reason(), Some(SkipReason::MissingLink));
    }
}
