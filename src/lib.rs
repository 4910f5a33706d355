//! Mayhem - A gravity-flight arcade simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, craft dynamics, shots, collisions, sensors)
//! - `env`: Episodic reset/step/reward contract for autonomous policies
//! - `policy`: Policy trait and rollout helpers
//! - `replay`: Recorded control sequences
//! - `settings`: Data-driven session configuration

pub mod env;
pub mod error;
pub mod policy;
pub mod replay;
pub mod settings;
pub mod sim;

pub use env::{Episode, Observation, StepResult};
pub use error::MayhemError;
pub use policy::Policy;
pub use replay::{Playback, ReplayLog, ReplayPlayer};
pub use settings::{CollisionMode, MotionModel, SensorMode, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Craft sprite box edge (pixels); craft position is the box's top-left corner
    pub const SHIP_SPRITE_SIZE: i32 = 32;
    /// Offset from the sprite top-left to its center
    pub const SHIP_HALF_SIZE: f32 = SHIP_SPRITE_SIZE as f32 / 2.0;

    /// Forces are tuned for a double-rate tick and scaled down by this
    pub const SLOW_DOWN_COEF: f32 = 2.0;

    /// Thrust magnitude while the thrust control is held
    pub const SHIP_THRUST_MAX: f32 = 0.32 / SLOW_DOWN_COEF;
    /// Degrees turned per tick while a turn control is held
    pub const SHIP_ANGLE_STEP: f32 = 5.0;
    /// Half-width of the "level" cone that allows a landing (degrees)
    pub const SHIP_ANGLE_LAND: f32 = 30.0;
    pub const SHIP_MAX_LIVES: u32 = 100;

    /// Downward acceleration per tick
    pub const GRAVITY: f32 = 0.07 / SLOW_DOWN_COEF;
    /// Per-tick velocity retention (x axis)
    pub const X_DRAG: f32 = 0.984;
    /// Per-tick velocity retention (y axis)
    pub const Y_DRAG: f32 = 0.99;
    pub const ACCEL_COEFF: f32 = 0.6;
    pub const VELOCITY_COEFF: f32 = 0.6;
    /// Scale applied to a shield-absorbed shot velocity on the next tick
    pub const IMPACT_COEFF: f32 = 0.02;
    /// Both velocity components must fall under this after a bounce to settle
    pub const SETTLE_SPEED: f32 = 1.0 / SLOW_DOWN_COEF;

    /// Kinematic-thrust model: pixels moved per tick while thrusting
    pub const KINEMATIC_STEP: f32 = 2.0;

    /// Shots in flight per craft
    pub const MAX_SHOTS: usize = 20;
    /// Shot muzzle speed along the heading (pixels/tick)
    pub const SHOT_SPEED: f32 = 5.1;
    /// Shot spawn distance from the sprite's muzzle anchor
    pub const SHOT_NOSE_OFFSET: f32 = 18.0;
    /// Divisor applied to the shooter's velocity before it is added to a shot
    pub const SHOT_INHERIT_DIVISOR: f32 = 3.5;

    /// Beam sensor angular step (degrees)
    pub const BEAM_ANGLE_STEP: u32 = 30;
    /// Beam probe volume edge; rays are clipped to a square of half this size
    pub const BEAM_VOLUME: f32 = 400.0;
    /// Upper bound on any configured probe range (pixels)
    pub const MAX_PROBE_RANGE: f32 = 4096.0;

    /// Octagonal probe radius at rest (1.5 sprites)
    pub const OCTO_BASE_RADIUS: f32 = 48.0;
    /// Octagonal probe radius growth per unit of speed
    pub const OCTO_SPEED_GAIN: f32 = 12.0;
    /// Octagonal probe radius when the speed-adaptive mode is off (2 sprites)
    pub const OCTO_FIXED_RADIUS: f32 = 64.0;
    /// Diagonal probes are pulled in by this divisor to approximate equal range
    pub const OCTO_DIAGONAL_DIVISOR: f32 = 1.4;

    /// Displacement under which a step counts as "did not move" (pixels)
    pub const MIN_STEP_DISPLACEMENT: f32 = 1.0;
    /// Terminal reward when a crash or sensor contact ended the episode
    pub const CRASH_PENALTY: f32 = -1000.0;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Unit heading vector in screen space (y down) for an angle in degrees.
///
/// Angle 0 points up; increasing the angle turns the nose counter-clockwise.
#[inline]
pub fn heading(angle_deg: f32) -> Vec2 {
    let (s, c) = angle_deg.to_radians().sin_cos();
    Vec2::new(-s, -c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(365.0), 5.0);
        assert_eq!(normalize_degrees(-5.0), 355.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        let tiny = normalize_degrees(-1e-6);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_heading_cardinal() {
        let up = heading(0.0);
        assert!(up.x.abs() < 1e-6 && (up.y + 1.0).abs() < 1e-6);
        let left = heading(90.0);
        assert!((left.x + 1.0).abs() < 1e-6 && left.y.abs() < 1e-6);
        let down = heading(180.0);
        assert!(down.x.abs() < 1e-5 && (down.y - 1.0).abs() < 1e-5);
    }
}
