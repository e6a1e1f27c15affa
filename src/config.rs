//! Scene configuration.
//!
//! [`SceneConfig::default`] reproduces the reference backdrop exactly; a JSON
//! file can override any subset of fields.
//!
//! ```ignore
//! let config = SceneConfig::from_json_str(r#"{ "field": { "count": 60, "seed": 7 } }"#)?;
//! assert_eq!(config.field.count, 60);
//! assert_eq!(config.field.repel_radius, 8.0);
//! ```

use std::path::Path;

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::field::FloatMotion;
use crate::smoothing::SmoothingMode;

/// Largest sphere subdivision level accepted by [`SceneConfig::validate`].
pub const MAX_MESH_DETAIL: u32 = 64;

/// An sRGB color with components in `0.0..=1.0`, written as `#rrggbb` in config.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ConfigError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| ConfigError::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

/// Accent color shared by the bodies, sphere, cloud and point light.
pub const ACCENT: Rgb = Rgb::new(0.0, 229.0 / 255.0, 1.0);

/// Half-open sampling range `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draw a uniform sample; a collapsed range always yields `min`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::invalid(field, "range bounds must be finite"));
        }
        if self.min > self.max {
            return Err(ConfigError::invalid(
                field,
                format!("min {} is greater than max {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// The orbiting, pointer-repelled body field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Number of bodies; fixed for the lifetime of the scene.
    pub count: usize,
    /// Full extents of the box that homes and start positions are drawn from.
    pub bounds: Vec3,
    /// Angular speed of each body's orbit, radians per second.
    pub speed: Range,
    pub scale: Range,
    pub phase: Range,
    pub orbit_radius: Range,
    pub rotation_speed: Range,
    /// Per-axis multipliers applied to `elapsed * rotation_speed`.
    pub rotation_rates: Vec3,
    pub repel_radius: f32,
    pub repel_strength: f32,
    /// Per-frame position smoothing factor at the reference rate.
    pub smoothing: f32,
    pub color: Rgb,
    pub emissive_intensity: f32,
    pub opacity: f32,
    /// Group bob and sway of the rendered field.
    pub float: FloatMotion,
    /// Fixed seed for reproducible layouts; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            count: 40,
            bounds: Vec3::new(30.0, 20.0, 10.0),
            speed: Range::new(0.05, 0.20),
            scale: Range::new(0.1, 0.5),
            phase: Range::new(0.0, 100.0),
            orbit_radius: Range::new(2.0, 7.0),
            rotation_speed: Range::new(-0.005, 0.005),
            rotation_rates: Vec3::new(10.0, 15.0, 5.0),
            repel_radius: 8.0,
            repel_strength: 4.0,
            smoothing: 0.03,
            color: ACCENT,
            emissive_intensity: 0.8,
            opacity: 0.4,
            float: FloatMotion::default(),
            seed: None,
        }
    }
}

/// The wobbling wireframe sphere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplacementConfig {
    pub radius: f32,
    /// Icosahedron subdivision level.
    pub detail: u32,
    pub color: Rgb,
    /// Mesh rotation rates `(x, y)` in radians per second.
    pub rotation_rate: Vec2,
    /// Scale target is `1 + |ndc.x * ndc.y| * pulse`.
    pub pulse: f32,
    pub scale_smoothing: f32,
}

impl Default for DisplacementConfig {
    fn default() -> Self {
        Self {
            radius: 1.5,
            detail: 15,
            color: ACCENT,
            rotation_rate: Vec2::new(0.1, 0.2),
            pulse: 0.5,
            scale_smoothing: 0.1,
        }
    }
}

/// The static depth-cue point cloud.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub count: usize,
    pub extent: Vec3,
    /// Rotation target is `(-ndc.y, ndc.x) * drift`.
    pub drift: f32,
    pub smoothing: f32,
    /// Constant yaw added every reference frame.
    pub auto_rotation: f32,
    pub color: Rgb,
    pub opacity: f32,
    pub seed: Option<u64>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            count: 4000,
            extent: Vec3::new(30.0, 30.0, 10.0),
            drift: 0.05,
            smoothing: 0.05,
            auto_rotation: 0.0001,
            color: ACCENT,
            opacity: 0.3,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub ambient: f32,
    pub intensity: f32,
    pub color: Rgb,
    /// Range beyond which the point light contributes nothing.
    pub distance: f32,
    /// Offset of the light in front of the pointer's world position.
    pub z_offset: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient: 0.4,
            intensity: 2.0,
            color: ACCENT,
            distance: 10.0,
            z_offset: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 12.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Complete scene description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub field: FieldConfig,
    pub displacement: DisplacementConfig,
    pub cloud: CloudConfig,
    pub light: LightConfig,
    pub camera: CameraConfig,
    pub smoothing: SmoothingMode,
    pub clear_color: Rgb,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            displacement: DisplacementConfig::default(),
            cloud: CloudConfig::default(),
            light: LightConfig::default(),
            camera: CameraConfig::default(),
            smoothing: SmoothingMode::default(),
            // #0a0a0a
            clear_color: Rgb::new(10.0 / 255.0, 10.0 / 255.0, 10.0 / 255.0),
        }
    }
}

impl SceneConfig {
    /// Parse and validate a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::debug!("loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = &self.field;
        if field.count == 0 {
            return Err(ConfigError::invalid("field.count", "must be at least 1"));
        }
        if field.count > u32::MAX as usize {
            return Err(ConfigError::invalid("field.count", "exceeds instance index range"));
        }
        finite_non_negative_vec3("field.bounds", field.bounds)?;
        field.speed.validate("field.speed")?;
        field.scale.validate("field.scale")?;
        field.phase.validate("field.phase")?;
        field.orbit_radius.validate("field.orbit_radius")?;
        field.rotation_speed.validate("field.rotation_speed")?;
        if !(field.repel_radius.is_finite() && field.repel_radius > 0.0) {
            return Err(ConfigError::invalid("field.repel_radius", "must be positive"));
        }
        if !field.repel_strength.is_finite() {
            return Err(ConfigError::invalid("field.repel_strength", "must be finite"));
        }
        unit_factor("field.smoothing", field.smoothing)?;
        finite("field.emissive_intensity", field.emissive_intensity)?;
        finite("field.opacity", field.opacity)?;
        finite("field.float.speed", field.float.speed)?;
        finite("field.float.rotation_intensity", field.float.rotation_intensity)?;
        finite("field.float.float_intensity", field.float.float_intensity)?;

        let sphere = &self.displacement;
        if !(sphere.radius.is_finite() && sphere.radius > 0.0) {
            return Err(ConfigError::invalid("displacement.radius", "must be positive"));
        }
        if sphere.detail > MAX_MESH_DETAIL {
            return Err(ConfigError::invalid(
                "displacement.detail",
                format!("must be at most {MAX_MESH_DETAIL}"),
            ));
        }
        unit_factor("displacement.scale_smoothing", sphere.scale_smoothing)?;
        finite("displacement.pulse", sphere.pulse)?;
        if !sphere.rotation_rate.is_finite() {
            return Err(ConfigError::invalid("displacement.rotation_rate", "must be finite"));
        }

        let cloud = &self.cloud;
        finite_non_negative_vec3("cloud.extent", cloud.extent)?;
        unit_factor("cloud.smoothing", cloud.smoothing)?;
        if !cloud.auto_rotation.is_finite() || !cloud.drift.is_finite() {
            return Err(ConfigError::invalid("cloud", "drift and auto_rotation must be finite"));
        }

        if !cloud.opacity.is_finite() {
            return Err(ConfigError::invalid("cloud.opacity", "must be finite"));
        }

        let light = &self.light;
        finite("light.ambient", light.ambient)?;
        finite("light.intensity", light.intensity)?;
        finite("light.distance", light.distance)?;
        finite("light.z_offset", light.z_offset)?;

        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::invalid("camera.fov_degrees", "must be in (0, 180)"));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::invalid("camera", "require 0 < near < far"));
        }
        if camera.position == camera.target {
            return Err(ConfigError::invalid("camera", "position and target coincide"));
        }

        if let SmoothingMode::FrameRateIndependent { reference_hz } = self.smoothing {
            if !(reference_hz.is_finite() && reference_hz > 0.0) {
                return Err(ConfigError::invalid("smoothing.reference_hz", "must be positive"));
            }
        }
        Ok(())
    }
}

fn unit_factor(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is outside (0, 1]")))
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be finite"))
    }
}

fn finite_non_negative_vec3(field: &'static str, v: Vec3) -> Result<(), ConfigError> {
    if v.is_finite() && v.min_element() >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "components must be finite and non-negative"))
    }
}
