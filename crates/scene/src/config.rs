//! Scene configuration.
//!
//! Every knob has a documented default; a JSON document may override any
//! subset at startup (`#[serde(default)]` on every section). Values are never
//! changed while the frame loop runs. `SceneConfig::validate` rejects
//! configurations the lift math is undefined for.

use std::f64::consts::PI;

use foundation::math::{MapExtent, Vec3};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("hover.radius must be > 0 (got {0})")]
    NonPositiveRadius(f64),
    #[error("hover.max_lift must be >= 0 (got {0})")]
    NegativeMaxLift(f64),
    #[error("hover.easing must be in (0, 1] (got {0})")]
    EasingOutOfRange(f64),
    #[error("hover.threshold must be >= 0 (got {0})")]
    NegativeThreshold(f64),
    #[error("interaction.decay must be in (0, 1) (got {0})")]
    DecayOutOfRange(f64),
    #[error("dots.spacing must be > 0 (got {0})")]
    NonPositiveSpacing(f64),
    #[error("{field} must be > 0 (got {value})")]
    NonPositiveDimension { field: &'static str, value: f64 },
    #[error("connector segments must be >= 1 (pair {pair})")]
    ZeroSegments { pair: String },
    #[error("controls.min_zoom ({min}) exceeds controls.max_zoom ({max})")]
    ZoomRange { min: f64, max: f64 },
    #[error("controls polar range [{min}, {max}] is empty or outside [0, pi]")]
    PolarRange { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
    /// Falloff radius in world units; influence extends to `radius * 1.4`.
    pub radius: f64,
    pub max_lift: f64,
    /// Fraction of the remaining distance covered per frame.
    pub easing: f64,
    /// Below this distance to target a dot counts as settled.
    pub threshold: f64,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            radius: 0.35,
            max_lift: 0.55,
            easing: 0.16,
            threshold: 0.001,
        }
    }
}

impl HoverConfig {
    /// Cutoff distance of the falloff.
    pub fn outer_radius(&self) -> f64 {
        self.radius * OUTER_RADIUS_FACTOR
    }
}

/// Influence cutoff relative to the falloff radius.
pub const OUTER_RADIUS_FACTOR: f64 = 1.4;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Frames a hover is held after the ray stops hitting.
    pub hover_cooldown_frames: u32,
    /// Per-frame multiplier applied to every target lift.
    pub decay: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hover_cooldown_frames: 2,
            decay: 0.92,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DotConfig {
    pub radius: f64,
    pub height: f64,
    pub color: u32,
    /// World units per logical grid unit.
    pub spacing: f64,
    /// Hover proxy cylinder radius relative to `radius`.
    pub proxy_radius_factor: f64,
    /// Hover proxy cylinder height relative to `height`.
    pub proxy_height_factor: f64,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            radius: 0.09,
            height: 0.3,
            color: 0x7ae0ff,
            spacing: 1.5,
            proxy_radius_factor: 1.8,
            proxy_height_factor: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HotspotConfig {
    pub radius_multiplier: f64,
    pub height_multiplier: f64,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            radius_multiplier: 1.5,
            height_multiplier: 2.2,
        }
    }
}

/// Tube style shared by every connector unless a pair overrides it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Whether the sequential connector through all hotspots is built.
    pub enabled: bool,
    pub color: u32,
    pub opacity: f64,
    /// Added to the hotspot center height at both endpoints.
    pub height_offset: f64,
    /// Peak of the `sin(pi * t)` arc above the chord, world units.
    pub arc_height: f64,
    /// Arc points per hotspot-to-hotspot span.
    pub segments: u32,
    /// Tube radius, world units.
    pub thickness: f64,
    pub radial_segments: u32,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color: 0x5a5a5a,
            opacity: 0.75,
            height_offset: 0.0,
            arc_height: 4.0,
            segments: 50,
            thickness: 0.03,
            radial_segments: 6,
        }
    }
}

/// Per-pair style overrides. Absent fields fall back to `ConnectorConfig`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectorOverrides {
    pub color: Option<u32>,
    pub opacity: Option<f64>,
    pub height_offset: Option<f64>,
    pub arc_height: Option<f64>,
    pub segments: Option<u32>,
    pub thickness: Option<f64>,
    pub radial_segments: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectorPair {
    pub from_id: String,
    pub to_id: String,
    #[serde(flatten)]
    pub overrides: ConnectorOverrides,
}

impl ConnectorPair {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            overrides: ConnectorOverrides::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Half-height of the orthographic frustum at zoom 1.
    pub frustum_size: f64,
    pub near: f64,
    pub far: f64,
    pub position: [f64; 3],
    pub zoom: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frustum_size: 15.0,
            near: 0.1,
            far: 100.0,
            position: [-3.0, 22.0, 22.0],
            zoom: 1.7,
        }
    }
}

impl CameraConfig {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    pub pan_speed: f64,
    pub min_polar_angle: f64,
    pub max_polar_angle: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.08,
            rotate_speed: 0.4,
            zoom_speed: 0.8,
            pan_speed: 0.8,
            min_polar_angle: PI / 25.0,
            max_polar_angle: PI / 3.0,
            min_zoom: 1.5,
            max_zoom: 3.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        let extent = MapExtent::default();
        Self {
            width: extent.width,
            height: extent.height,
        }
    }
}

impl MapConfig {
    pub fn extent(&self) -> MapExtent {
        MapExtent {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub hover: HoverConfig,
    pub interaction: InteractionConfig,
    pub dots: DotConfig,
    pub hotspots: HotspotConfig,
    pub connector: ConnectorConfig,
    pub pairs: Vec<ConnectorPair>,
    pub map: MapConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            hover: HoverConfig::default(),
            interaction: InteractionConfig::default(),
            dots: DotConfig::default(),
            hotspots: HotspotConfig::default(),
            connector: ConnectorConfig::default(),
            pairs: vec![ConnectorPair::new("johannesburg", "singapore")],
            map: MapConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Checks every invariant the frame loop relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let hover = &self.hover;
        if !(hover.radius > 0.0) {
            return Err(ConfigError::NonPositiveRadius(hover.radius));
        }
        if !(hover.max_lift >= 0.0) {
            return Err(ConfigError::NegativeMaxLift(hover.max_lift));
        }
        if !(hover.easing > 0.0 && hover.easing <= 1.0) {
            return Err(ConfigError::EasingOutOfRange(hover.easing));
        }
        if !(hover.threshold >= 0.0) {
            return Err(ConfigError::NegativeThreshold(hover.threshold));
        }

        let decay = self.interaction.decay;
        if !(decay > 0.0 && decay < 1.0) {
            return Err(ConfigError::DecayOutOfRange(decay));
        }

        if !(self.dots.spacing > 0.0) {
            return Err(ConfigError::NonPositiveSpacing(self.dots.spacing));
        }
        for (field, value) in [
            ("dots.radius", self.dots.radius),
            ("dots.height", self.dots.height),
            ("dots.proxy_radius_factor", self.dots.proxy_radius_factor),
            ("dots.proxy_height_factor", self.dots.proxy_height_factor),
            ("hotspots.radius_multiplier", self.hotspots.radius_multiplier),
            ("hotspots.height_multiplier", self.hotspots.height_multiplier),
            ("map.width", self.map.width),
            ("map.height", self.map.height),
            ("camera.frustum_size", self.camera.frustum_size),
            ("camera.zoom", self.camera.zoom),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveDimension { field, value });
            }
        }

        if self.connector.segments == 0 {
            return Err(ConfigError::ZeroSegments {
                pair: "sequential".to_string(),
            });
        }
        for pair in &self.pairs {
            if pair.overrides.segments == Some(0) {
                return Err(ConfigError::ZeroSegments {
                    pair: format!("{} -> {}", pair.from_id, pair.to_id),
                });
            }
        }

        let c = &self.controls;
        if !(c.min_zoom > 0.0 && c.min_zoom <= c.max_zoom) {
            return Err(ConfigError::ZoomRange {
                min: c.min_zoom,
                max: c.max_zoom,
            });
        }
        if !(c.min_polar_angle >= 0.0
            && c.min_polar_angle <= c.max_polar_angle
            && c.max_polar_angle <= PI)
        {
            return Err(ConfigError::PolarRange {
                min: c.min_polar_angle,
                max: c.max_polar_angle,
            });
        }

        Ok(())
    }

    /// Height of a hotspot marker cylinder.
    pub fn hotspot_height(&self) -> f64 {
        self.dots.height * self.hotspots.height_multiplier
    }

    /// Radius of a hotspot marker cylinder.
    pub fn hotspot_radius(&self) -> f64 {
        self.dots.radius * self.hotspots.radius_multiplier
    }
}
