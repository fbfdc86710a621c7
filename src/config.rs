use anyhow::{Context, Result, bail};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "TEA_PARTY_CONFIG";
pub const SEED_ENV: &str = "TEA_PARTY_SEED";
pub const DEFAULT_CONFIG_FILE: &str = "tea_party.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Grid vertices per side.
    pub size: usize,
    pub cell_scale: f32,
    pub plateau_radius: f32,
    pub hill_radius: f32,
    pub hill_height: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 300,
            cell_scale: 0.201,
            plateau_radius: 50.0,
            hill_radius: 300.0,
            hill_height: 7.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Degrees.
    pub yaw: f32,
    /// Degrees.
    pub pitch: f32,
    pub speed: f32,
    pub eye_offset: f32,
    /// Degrees per pixel of pointer travel.
    pub sensitivity: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 4.0, 10.0),
            yaw: -90.0,
            pitch: 0.0,
            speed: 0.1,
            eye_offset: 4.0,
            sensitivity: 0.1,
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub position: Vec3,
    pub facing: Vec3,
    pub speed: f32,
    pub body_offset: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(1.0, 0.0, 1.0),
            facing: Vec3::Z,
            speed: 0.1,
            body_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub count: usize,
    /// Radians per second.
    pub speed: f32,
    pub radius: f32,
    pub center: Vec3,
    /// Radians between neighbouring props.
    pub spacing: f32,
    /// Chance per frame that an idle prop starts a jump.
    pub jump_probability: f32,
    pub jump_duration: f32,
    pub jump_height: f32,
    /// Fixed amount the jump timer loses each frame, independent of frame time.
    pub jump_step: f32,
    pub model_scale: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            count: 31,
            speed: 0.5,
            radius: 17.0,
            center: Vec3::new(150.0 * 0.2, 6.0, 150.0 * 0.2),
            spacing: 0.2,
            jump_probability: 0.01,
            jump_duration: 0.5,
            jump_height: 2.0,
            jump_step: 0.016,
            model_scale: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub asset_dir: PathBuf,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Witches tea party".to_string(),
            width: 800,
            height: 600,
            asset_dir: PathBuf::from("res"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub terrain: TerrainConfig,
    pub camera: CameraConfig,
    pub player: PlayerConfig,
    pub orbit: OrbitConfig,
    pub window: WindowConfig,
    /// Seed for the jump generator. Drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl SceneConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid scene configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would leave actors without a walkable area.
    pub fn validate(&self) -> Result<()> {
        let cell_scale = self.terrain.cell_scale;
        if !cell_scale.is_finite() || cell_scale <= 0.0 {
            bail!("terrain.cell_scale must be a positive number, got {}", cell_scale);
        }
        let speeds = [("camera.speed", self.camera.speed), ("player.speed", self.player.speed)];
        for (name, value) in speeds {
            if !value.is_finite() {
                bail!("{} must be finite, got {}", name, value);
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Reads the config file named by `TEA_PARTY_CONFIG` (or `tea_party.toml`
    /// when present) and applies the `TEA_PARTY_SEED` override.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                log::info!("no {} found, using built-in scene defaults", DEFAULT_CONFIG_FILE);
                Self::default()
            }
        };

        if let Ok(seed) = std::env::var(SEED_ENV) {
            let seed = seed
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be an unsigned integer", SEED_ENV))?;
            config.seed = Some(seed);
        }

        Ok(config)
    }

    /// Upper bound for horizontal actor movement on both axes.
    pub fn bounds_max(&self) -> f32 {
        self.terrain.size as f32 * self.terrain.cell_scale
    }
}
