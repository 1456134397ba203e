use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Largest accepted volume edge, matching the default 3D texture limit of GPU backends.
pub const MAX_GRID_SIZE: u32 = 2048;

/// Errors from loading or validating an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How the camera turns input into a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// WASD + mouse look, yaw/pitch integrated each frame.
    #[default]
    FreeFly,
    /// Yaw/pitch orbit around a fixed target at a zoomable distance.
    Orbit,
    /// Quaternion trackball around a fixed target; no pitch limit.
    Arcball,
}

impl FromStr for CameraMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free_fly" | "free-fly" | "fly" => Ok(Self::FreeFly),
            "orbit" => Ok(Self::Orbit),
            "arcball" => Ok(Self::Arcball),
            other => Err(ConfigError::Invalid(format!("unknown camera mode '{other}'"))),
        }
    }
}

/// How a noise sample is spread over the RGBA channels of a volume cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFillPolicy {
    /// Same density byte in R, G, B and A.
    #[default]
    Uniform,
    /// Density in G, B, A; an independent seeded random byte in R.
    RandomRed,
}

impl FromStr for ChannelFillPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(Self::Uniform),
            "random_red" | "random-red" => Ok(Self::RandomRed),
            other => Err(ConfigError::Invalid(format!(
                "unknown channel fill policy '{other}'"
            ))),
        }
    }
}

/// Engine tunables. Every field has a default so partial YAML files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Radians per unit of mouse delta per second.
    pub mouse_sensitivity: f32,
    /// World units per second.
    pub player_speed: f32,
    pub camera_mode: CameraMode,
    pub channel_fill: ChannelFillPolicy,
    /// Noise seed; out-of-range values fall back to the default seed.
    pub seed: u64,
    /// Edge length of the cubic volume grid.
    pub grid_size: u32,
    pub start_position: Vec3,
    /// Distance from the target in orbit and arcball modes.
    pub orbit_distance: f32,
    /// Directional light; `None` leaves the uniform slot zeroed.
    pub light_direction: Option<Vec3>,
    /// Optional upper bound on a single frame's `dt`, in seconds. Unset means
    /// `dt` is the raw wall-clock delta, so motion is frame-rate independent.
    pub max_frame_dt: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 1.0,
            player_speed: 1.1,
            camera_mode: CameraMode::FreeFly,
            channel_fill: ChannelFillPolicy::Uniform,
            seed: 42,
            grid_size: 128,
            start_position: Vec3::new(0.0, 0.0, -1.0),
            orbit_distance: 2.0,
            light_direction: None,
            max_frame_dt: None,
        }
    }
}

impl EngineConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML config text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mouse_sensitivity.is_finite() && self.mouse_sensitivity >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "mouse_sensitivity must be a non-negative number, got {}",
                self.mouse_sensitivity
            )));
        }
        if !(self.player_speed.is_finite() && self.player_speed >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "player_speed must be a non-negative number, got {}",
                self.player_speed
            )));
        }
        if !(1..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be in 1..={MAX_GRID_SIZE}, got {}",
                self.grid_size
            )));
        }
        if !(self.orbit_distance.is_finite() && self.orbit_distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "orbit_distance must be positive, got {}",
                self.orbit_distance
            )));
        }
        if let Some(max) = self.max_frame_dt {
            if !(max.is_finite() && max > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "max_frame_dt must be positive, got {max}"
                )));
            }
        }
        if let Some(light) = self.light_direction {
            if !light.is_finite() || light.length_squared() == 0.0 {
                return Err(ConfigError::Invalid(
                    "light_direction must be a finite non-zero vector".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_tuning() {
        let c = EngineConfig::default();
        assert_eq!(c.player_speed, 1.1);
        assert_eq!(c.mouse_sensitivity, 1.0);
        assert_eq!(c.grid_size, 128);
        assert_eq!(c.camera_mode, CameraMode::FreeFly);
        assert_eq!(c.max_frame_dt, None);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let c = EngineConfig::from_yaml_str("player_speed: 3.0\ncamera_mode: orbit\n").unwrap();
        assert_eq!(c.player_speed, 3.0);
        assert_eq!(c.camera_mode, CameraMode::Orbit);
        assert_eq!(c.seed, 42);
    }

    #[test]
    fn channel_fill_parses_from_yaml() {
        let c = EngineConfig::from_yaml_str("channel_fill: random_red").unwrap();
        assert_eq!(c.channel_fill, ChannelFillPolicy::RandomRed);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_yaml_str("grid_size: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("max_frame_dt: 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("light_direction: [0.0, 0.0, 0.0]"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("camera_mode: [1, 2]"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn grid_size_is_bounded() {
        assert!(matches!(
            EngineConfig::from_yaml_str("grid_size: 4194304"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("grid_size: 2049"),
            Err(ConfigError::Invalid(_))
        ));
        let c = EngineConfig::from_yaml_str("grid_size: 2048").unwrap();
        assert_eq!(c.grid_size, MAX_GRID_SIZE);
    }

    #[test]
    fn frame_dt_clamp_is_opt_in() {
        let c = EngineConfig::from_yaml_str("max_frame_dt: 0.25").unwrap();
        assert_eq!(c.max_frame_dt, Some(0.25));
        let c = EngineConfig::from_yaml_str("seed: 3").unwrap();
        assert_eq!(c.max_frame_dt, None);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed: 7\nlight_direction: [0.0, 1.0, 0.0]").unwrap();
        let c = EngineConfig::load(file.path()).unwrap();
        assert_eq!(c.seed, 7);
        assert_eq!(c.light_direction, Some(Vec3::Y));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!("arcball".parse::<CameraMode>().unwrap(), CameraMode::Arcball);
        assert_eq!("fly".parse::<CameraMode>().unwrap(), CameraMode::FreeFly);
        assert!("spin".parse::<CameraMode>().is_err());
        assert_eq!(
            "random-red".parse::<ChannelFillPolicy>().unwrap(),
            ChannelFillPolicy::RandomRed
        );
    }
}
