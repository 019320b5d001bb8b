use aperture_shared::pose::Pose;
use aperture_shared::surface::Rectangle;
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::config::{ConfigError, SceneConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

/// Portals, windows and the directional portal link table.
///
/// Links are plain id pairs resolved by lookup each frame, so a portal and its
/// destination never hold references to each other.
#[derive(Debug, Clone)]
pub struct Scene {
    far_distance: f32,
    portals: FxHashMap<PortalId, Rectangle>,
    portal_order: Vec<PortalId>,
    links: FxHashMap<PortalId, PortalId>,
    windows: Vec<(WindowId, Rectangle)>,
}

impl Scene {
    pub fn new(far_distance: f32) -> Result<Self, ConfigError> {
        if !(far_distance > 0.0 && far_distance.is_finite()) {
            return Err(ConfigError::InvalidClipRange { far_distance });
        }
        Ok(Self {
            far_distance,
            portals: FxHashMap::default(),
            portal_order: Vec::new(),
            links: FxHashMap::default(),
            windows: Vec::new(),
        })
    }

    pub fn from_config(config: &SceneConfig) -> Result<Self, ConfigError> {
        let mut scene = Self::new(config.far_distance)?;

        for portal in &config.portals {
            scene.add_portal(PortalId(portal.id), portal.rectangle())?;
        }
        for portal in &config.portals {
            let Some(linked) = portal.linked else {
                warn!("portal {} has no linked portal", portal.id);
                return Err(ConfigError::MissingLink { id: portal.id });
            };
            scene.link(PortalId(portal.id), PortalId(linked))?;
        }
        for window in &config.windows {
            scene.add_window(WindowId(window.id), window.rectangle())?;
        }

        info!(
            "Loaded scene with {} portals and {} windows",
            scene.portal_order.len(),
            scene.windows.len()
        );
        Ok(scene)
    }

    pub fn far_distance(&self) -> f32 {
        self.far_distance
    }

    pub fn add_portal(&mut self, id: PortalId, surface: Rectangle) -> Result<(), ConfigError> {
        validate_surface(id.0, &surface)?;
        if self.portals.contains_key(&id) {
            return Err(ConfigError::DuplicateId { id: id.0 });
        }
        self.portals.insert(id, surface);
        self.portal_order.push(id);
        Ok(())
    }

    /// Links `source` to `destination`. The reverse direction is a separate link.
    pub fn link(&mut self, source: PortalId, destination: PortalId) -> Result<(), ConfigError> {
        if source == destination {
            return Err(ConfigError::SelfLink { id: source.0 });
        }
        if !self.portals.contains_key(&source) || !self.portals.contains_key(&destination) {
            return Err(ConfigError::UnknownPortal {
                id: source.0,
                linked: destination.0,
            });
        }
        self.links.insert(source, destination);
        Ok(())
    }

    pub fn add_window(&mut self, id: WindowId, surface: Rectangle) -> Result<(), ConfigError> {
        if !surface.has_valid_size() {
            return Err(ConfigError::NonPositiveSize { id: id.0 });
        }
        if self.windows.iter().any(|(existing, _)| *existing == id) {
            return Err(ConfigError::DuplicateId { id: id.0 });
        }
        self.windows.push((id, surface));
        Ok(())
    }

    /// Updates a portal's pose from the scene graph. Returns `false` for an
    /// unknown id.
    pub fn set_portal_pose(&mut self, id: PortalId, pose: Pose) -> bool {
        match self.portals.get_mut(&id) {
            Some(surface) => {
                surface.pose = pose;
                true
            }
            None => false,
        }
    }

    pub fn set_window_pose(&mut self, id: WindowId, pose: Pose) -> bool {
        match self.windows.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, surface)) => {
                surface.pose = pose;
                true
            }
            None => false,
        }
    }

    pub fn portal(&self, id: PortalId) -> Option<&Rectangle> {
        self.portals.get(&id)
    }

    pub fn linked(&self, id: PortalId) -> Option<PortalId> {
        self.links.get(&id).copied()
    }

    /// Source and destination surfaces for the portal `id`.
    pub fn linked_pair(&self, id: PortalId) -> Option<(&Rectangle, &Rectangle)> {
        let source = self.portals.get(&id)?;
        let destination = self.portals.get(self.links.get(&id)?)?;
        Some((source, destination))
    }

    /// Portal ids in insertion order.
    pub fn portal_ids(&self) -> &[PortalId] {
        &self.portal_order
    }

    pub fn windows(&self) -> &[(WindowId, Rectangle)] {
        &self.windows
    }
}

fn validate_surface(id: u32, surface: &Rectangle) -> Result<(), ConfigError> {
    if !surface.has_valid_size() {
        return Err(ConfigError::NonPositiveSize { id });
    }
    if !surface.has_valid_scale() {
        return Err(ConfigError::ZeroScale { id });
    }
    Ok(())
}
