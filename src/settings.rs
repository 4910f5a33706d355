//! Session settings
//!
//! Picked once per session and read-only while it runs. Loadable from JSON;
//! every field defaults to the arcade tuning in `consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::MayhemError;

/// How craft move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotionModel {
    /// One pixel per tick along the cardinal directions
    Direct,
    /// Fixed-step turning and forward translation
    Thrust,
    /// Thrust, gravity and drag with landings
    #[default]
    Gravity,
}

impl MotionModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionModel::Direct => "direct",
            MotionModel::Thrust => "thrust",
            MotionModel::Gravity => "gravity",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "direct" | "basic" => Some(MotionModel::Direct),
            "thrust" => Some(MotionModel::Thrust),
            "gravity" => Some(MotionModel::Gravity),
            _ => None,
        }
    }
}

/// Which probes feed the agent's observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SensorMode {
    #[default]
    None,
    /// Radial ray casts every `beam_angle_step` degrees
    Beam,
    /// Eight point probes, radius grows with speed
    Octo,
    /// Eight point probes at a fixed radius
    OctoFixed,
}

impl SensorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorMode::None => "none",
            SensorMode::Beam => "beam",
            SensorMode::Octo => "octo",
            SensorMode::OctoFixed => "octo_fixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "" | "none" => Some(SensorMode::None),
            "beam" => Some(SensorMode::Beam),
            "octo" => Some(SensorMode::Octo),
            "octo_fixed" | "octo-fixed" => Some(SensorMode::OctoFixed),
            _ => None,
        }
    }
}

/// How terrain crashes are detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    /// Full mask-based collision engine
    #[default]
    Engine,
    /// Skip the engine; sensor contact alone ends an episode (faster training)
    SensorOnly,
}

/// Gravity-model tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub thrust_max: f32,
    pub gravity: f32,
    pub turn_step: f32,
    pub x_drag: f32,
    pub y_drag: f32,
    pub accel_coeff: f32,
    pub velocity_coeff: f32,
    pub impact_coeff: f32,
    pub settle_speed: f32,
    /// Kinematic-thrust model step (pixels)
    pub kinematic_step: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            thrust_max: SHIP_THRUST_MAX,
            gravity: GRAVITY,
            turn_step: SHIP_ANGLE_STEP,
            x_drag: X_DRAG,
            y_drag: Y_DRAG,
            accel_coeff: ACCEL_COEFF,
            velocity_coeff: VELOCITY_COEFF,
            impact_coeff: IMPACT_COEFF,
            settle_speed: SETTLE_SPEED,
            kinematic_step: KINEMATIC_STEP,
        }
    }
}

/// Sensor probe geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub beam_angle_step: u32,
    /// Half-extent of the square beam probe volume
    pub beam_range: f32,
    pub octo_base_radius: f32,
    pub octo_speed_gain: f32,
    pub octo_fixed_radius: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            beam_angle_step: BEAM_ANGLE_STEP,
            beam_range: BEAM_VOLUME / 2.0,
            octo_base_radius: OCTO_BASE_RADIUS,
            octo_speed_gain: OCTO_SPEED_GAIN,
            octo_fixed_radius: OCTO_FIXED_RADIUS,
        }
    }
}

impl ProbeConfig {
    /// Number of readings a sensor mode produces
    pub fn count(&self, mode: SensorMode) -> usize {
        match mode {
            SensorMode::None => 0,
            SensorMode::Beam => 360usize.div_ceil(self.beam_angle_step.max(1) as usize),
            SensorMode::Octo | SensorMode::OctoFixed => 8,
        }
    }
}

/// Empirical `[min, max]` ranges used to scale observations into [-1, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationRanges {
    pub angle: [f32; 2],
    pub vx: [f32; 2],
    pub vy: [f32; 2],
    pub ax: [f32; 2],
    pub ay: [f32; 2],
}

impl Default for ObservationRanges {
    fn default() -> Self {
        Self {
            angle: [0.0, 360.0],
            vx: [-6.0, 6.0],
            vy: [-12.0, 12.0],
            ax: [-0.2, 0.2],
            ay: [-0.2, 0.2],
        }
    }
}

/// Reward shaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reward for a live tick that moved at least `min_displacement`
    pub alive: f32,
    pub min_displacement: f32,
    /// Terminal reward when a crash or contact ended the episode
    pub crash_penalty: f32,
    /// Weight of the net displacement from spawn in the terminal bonus
    pub displacement_weight: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            alive: 1.0,
            min_displacement: MIN_STEP_DISPLACEMENT,
            crash_penalty: CRASH_PENALTY,
            displacement_weight: 2.0,
        }
    }
}

/// How a policy's action vector maps onto controls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionMapping {
    /// `[steer, thrust]`: steer below `-turn_threshold` turns left, above
    /// `turn_threshold` turns right; thrust above `thrust_threshold` fires the engine
    Steer {
        turn_threshold: f32,
        thrust_threshold: f32,
    },
    /// `[left, right, thrust, shield, fire]`, each pressed above `threshold`
    Buttons { threshold: f32 },
}

impl Default for ActionMapping {
    fn default() -> Self {
        ActionMapping::Steer {
            turn_threshold: 0.5,
            thrust_threshold: 0.0,
        }
    }
}

impl ActionMapping {
    /// Length of the action vector a policy must produce
    pub fn width(&self) -> usize {
        match self {
            ActionMapping::Steer { .. } => 2,
            ActionMapping::Buttons { .. } => 5,
        }
    }
}

/// Complete session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub motion: MotionModel,
    pub sensor: SensorMode,
    pub collision: CollisionMode,
    pub physics: PhysicsConfig,
    pub probes: ProbeConfig,
    /// Shots in flight per craft
    pub max_shots: usize,
    pub observation: ObservationRanges,
    pub reward: RewardConfig,
    pub action: ActionMapping,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            motion: MotionModel::Gravity,
            sensor: SensorMode::None,
            collision: CollisionMode::Engine,
            physics: PhysicsConfig::default(),
            probes: ProbeConfig::default(),
            max_shots: MAX_SHOTS,
            observation: ObservationRanges::default(),
            reward: RewardConfig::default(),
            action: ActionMapping::default(),
        }
    }
}

impl Settings {
    /// Gravity flight with beam sensors, the usual training setup
    pub fn training() -> Self {
        Self {
            sensor: SensorMode::Beam,
            ..Self::default()
        }
    }

    /// Number of sensor readings in an observation
    pub fn sensor_count(&self) -> usize {
        self.probes.count(self.sensor)
    }

    /// Check value ranges; called before any session starts
    pub fn validate(&self) -> Result<(), MayhemError> {
        let p = &self.physics;
        for (name, drag) in [("x_drag", p.x_drag), ("y_drag", p.y_drag)] {
            if !(drag > 0.0 && drag < 1.0) {
                return Err(MayhemError::InvalidSettings(format!(
                    "{name} must lie in (0, 1), got {drag}"
                )));
            }
        }
        let finite = [
            p.thrust_max,
            p.gravity,
            p.turn_step,
            p.accel_coeff,
            p.velocity_coeff,
            p.impact_coeff,
            p.settle_speed,
            p.kinematic_step,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(MayhemError::InvalidSettings(
                "physics values must be finite".to_string(),
            ));
        }
        if p.thrust_max < 0.0 || p.settle_speed < 0.0 {
            return Err(MayhemError::InvalidSettings(
                "thrust_max and settle_speed must not be negative".to_string(),
            ));
        }

        let probes = &self.probes;
        if probes.beam_angle_step == 0 || probes.beam_angle_step > 360 {
            return Err(MayhemError::InvalidSettings(format!(
                "beam_angle_step must lie in 1..=360, got {}",
                probes.beam_angle_step
            )));
        }
        if !(probes.beam_range > 0.0 && probes.octo_base_radius >= 0.0 && probes.octo_fixed_radius > 0.0) {
            return Err(MayhemError::InvalidSettings(
                "probe ranges must be positive".to_string(),
            ));
        }
        // Ray casts march pixel by pixel out to these ranges
        for (name, value) in [
            ("beam_range", probes.beam_range),
            ("octo_base_radius", probes.octo_base_radius),
            ("octo_fixed_radius", probes.octo_fixed_radius),
        ] {
            if !(value <= MAX_PROBE_RANGE) {
                return Err(MayhemError::InvalidSettings(format!(
                    "{name} must not exceed {MAX_PROBE_RANGE}, got {value}"
                )));
            }
        }
        if !(probes.octo_speed_gain >= 0.0 && probes.octo_speed_gain.is_finite()) {
            return Err(MayhemError::InvalidSettings(format!(
                "octo_speed_gain must be finite and not negative, got {}",
                probes.octo_speed_gain
            )));
        }

        if self.collision == CollisionMode::SensorOnly && self.sensor == SensorMode::None {
            return Err(MayhemError::InvalidSettings(
                "sensor_only collision needs a sensor mode".to_string(),
            ));
        }

        let r = &self.observation;
        for (name, [lo, hi]) in [
            ("angle", r.angle),
            ("vx", r.vx),
            ("vy", r.vy),
            ("ax", r.ax),
            ("ay", r.ay),
        ] {
            if !(lo < hi) {
                return Err(MayhemError::InvalidSettings(format!(
                    "observation range {name} is empty: [{lo}, {hi}]"
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, MayhemError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, MayhemError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MayhemError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!(
            "Loaded settings from {} (motion={}, sensor={})",
            path.display(),
            settings.motion.as_str(),
            settings.sensor.as_str()
        );
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MayhemError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
