//! Shared value types and engine configuration.

pub mod config;
pub mod types;

pub use config::{CameraMode, ChannelFillPolicy, ConfigError, EngineConfig, MAX_GRID_SIZE};
pub use types::{Transform, Viewport};
