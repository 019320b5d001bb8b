//! Scene integration for the window/portal projection engine: surface and
//! link tables, TOML configuration and per-frame evaluation.

pub mod config;
pub mod frame;
pub mod jobs;
pub mod scene;

pub use config::{ConfigError, SceneConfig};
pub use frame::{evaluate, FrameInputs, FrameOutputs, Outcome, SkipReason};
pub use jobs::JobSystem;
pub use scene::{PortalId, Scene, WindowId};
