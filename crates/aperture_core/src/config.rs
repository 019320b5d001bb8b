use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use aperture_shared::pose::{CameraState, Pose};
use aperture_shared::surface::Rectangle;
use glam::{UVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Setup-time configuration problem. Reported once; never replaced by defaults.
#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: io::Error },
    Parse(toml::de::Error),
    NonPositiveSize { id: u32 },
    ZeroScale { id: u32 },
    InvalidClipRange { far_distance: f32 },
    InvalidCamera,
    MissingLink { id: u32 },
    UnknownPortal { id: u32, linked: u32 },
    DuplicateId { id: u32 },
    SelfLink { id: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read scene config {}: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse scene config: {err}"),
            Self::NonPositiveSize { id } => write!(f, "surface {id} has a non-positive size"),
            Self::ZeroScale { id } => write!(f, "surface {id} has a zero scale component"),
            Self::InvalidClipRange { far_distance } => {
                write!(f, "far distance must be positive, got {far_distance}")
            }
            Self::InvalidCamera => write!(f, "viewer camera intrinsics are invalid"),
            Self::MissingLink { id } => write!(f, "portal {id} has no linked portal"),
            Self::UnknownPortal { id, linked } => {
                write!(f, "link {id} -> {linked} references an unknown portal")
            }
            Self::DuplicateId { id } => write!(f, "id {id} is used more than once"),
            Self::SelfLink { id } => write!(f, "portal {id} links to itself"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

/// A portal surface and the id of the portal it leads to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    pub id: u32,
    pub position: Vec3,
    /// YXZ euler angles in degrees.
    #[serde(default)]
    pub rotation_deg: Vec3,
    pub size: Vec2,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked: Option<u32>,
}

impl PortalConfig {
    pub fn rectangle(&self) -> Rectangle {
        Rectangle::new(Pose::from_euler_deg(self.position, self.rotation_deg), self.size)
            .with_scale(self.scale)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub id: u32,
    pub position: Vec3,
    #[serde(default)]
    pub rotation_deg: Vec3,
    pub size: Vec2,
}

impl WindowConfig {
    pub fn rectangle(&self) -> Rectangle {
        Rectangle::new(Pose::from_euler_deg(self.position, self.rotation_deg), self.size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub position: Vec3,
    #[serde(default)]
    pub rotation_deg: Vec3,
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl ViewerConfig {
    pub fn camera(&self) -> Result<CameraState, ConfigError> {
        let camera = CameraState {
            pose: Pose::from_euler_deg(self.position, self.rotation_deg),
            fov_y_deg: self.fov_y_deg,
            aspect: self.aspect,
            near: self.near,
            far: self.far,
        };
        if !camera.is_valid() {
            return Err(ConfigError::InvalidCamera);
        }
        Ok(camera)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderTargetConfig {
    pub width: u32,
    pub height: u32,
}

impl RenderTargetConfig {
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

/// Scene description read from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub far_distance: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_target: Option<RenderTargetConfig>,
    #[serde(default)]
    pub portals: Vec<PortalConfig>,
    #[serde(default)]
    pub windows: Vec<WindowConfig>,
}

impl SceneConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(ConfigError::Parse)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use glam::{Vec2, Vec3};

    use super::{ConfigError, SceneConfig};

    const SCENE: &str = r#"
far_distance = 250.0

[viewer]
position = [0.0, 1.6, 4.0]
fov_y_deg = 60.0
aspect = 1.5
near = 0.1
far = 250.0

[render_target]
width = 1280
height = 720

[[portals]]
id = 1
position = [0.0, 1.0, 0.0]
size = [1.0, 2.0]
linked = 2

[[portals]]
id = 2
position = [8.0, 1.0, 0.0]
rotation_deg = [90.0, 0.0, 0.0]
size = [1.0, 2.0]
scale = [2.0, 2.0, 2.0]
linked = 1

[[windows]]
id = 10
position = [3.0, 1.5, -2.0]
size = [2.0, 1.0]
"#;

    #[test]
    fn parses_full_scene() {
        let config = SceneConfig::from_toml_str(SCENE).expect("valid scene toml");
        assert_eq!(config.far_distance, 250.0);
        assert_eq!(config.portals.len(), 2);
        assert_eq!(config.portals[0].scale, Vec3::ONE);
        assert_eq!(config.portals[0].rotation_deg, Vec3::ZERO);
        assert_eq!(config.portals[1].scale, Vec3::splat(2.0));
        assert_eq!(config.portals[1].linked, Some(1));
        assert_eq!(config.windows[0].size, Vec2::new(2.0, 1.0));
        assert_eq!(config.render_target.expect("render target").size().x, 1280);

        let camera = config.viewer.expect("viewer").camera().expect("valid camera");
        assert_eq!(camera.pose.position, Vec3::new(0.0, 1.6, 4.0));
    }

    #[test]
    fn yawed_portal_faces_sideways() {
        let config = SceneConfig::from_toml_str(SCENE).expect("valid scene toml");
        let normal = config.portals[1].rectangle().normal();
        assert!(normal.abs_diff_eq(Vec3::X, 1.0e-6), "{normal}");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SceneConfig::from_toml_str("far_distance = \"far\"").expect_err("wrong type");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = SceneConfig::load(Path::new("/nonexistent/aperture/scene.toml"))
            .expect_err("file does not exist");
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("scene.toml"));
    }
}
