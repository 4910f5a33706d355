//! Motion models
//!
//! A session picks one model up front; each implements the same `advance`
//! contract:
//! - `DirectMotion`: one pixel per tick along the cardinal directions
//! - `KinematicMotion`: turn in fixed steps, move forward in fixed steps
//! - `GravityMotion`: thrust, gravity, drag and the landing/bounce machine

use glam::Vec2;

use super::craft::{ControlSet, CraftState};
use super::terrain::Platform;
use crate::heading;
use crate::normalize_degrees;
use crate::settings::{MotionModel, PhysicsConfig};

/// What happened at the platforms this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// No platform contact
    None,
    /// Touched a platform too fast and rebounded
    Bounced,
    /// Settled onto a platform this tick
    Touchdown,
}

/// One motion model. Inputs are assumed finite.
pub trait Motion: Send + Sync {
    fn name(&self) -> &'static str;

    /// Advance the craft by one tick
    fn advance(&self, craft: &mut CraftState, controls: &ControlSet, platforms: &[Platform]) -> Landing;
}

/// Build the strategy for a configured model
pub fn motion_for(model: MotionModel, physics: &PhysicsConfig) -> Box<dyn Motion> {
    match model {
        MotionModel::Direct => Box::new(DirectMotion),
        MotionModel::Thrust => Box::new(KinematicMotion {
            turn_step: physics.turn_step,
            step: physics.kinematic_step,
        }),
        MotionModel::Gravity => Box::new(GravityMotion {
            physics: physics.clone(),
        }),
    }
}

fn turn(craft: &mut CraftState, controls: &ControlSet, step: f32) {
    if controls.turn_left {
        craft.angle += step;
    }
    if controls.turn_right {
        craft.angle -= step;
    }
    craft.angle = normalize_degrees(craft.angle);
}

/// Unit translation per tick, no physics
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectMotion;

impl Motion for DirectMotion {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn advance(&self, craft: &mut CraftState, controls: &ControlSet, _platforms: &[Platform]) -> Landing {
        let mut delta = Vec2::ZERO;
        if controls.turn_left {
            delta.x = -1.0;
        }
        if controls.turn_right {
            delta.x = 1.0;
        }
        if controls.up {
            delta.y = -1.0;
        }
        if controls.down {
            delta.y = 1.0;
        }
        craft.shielded = controls.shield;
        craft.pos += delta;
        craft.sync_pixel();
        Landing::None
    }
}

/// Fixed-step rotation and forward translation, no velocity state
#[derive(Debug, Clone, Copy)]
pub struct KinematicMotion {
    pub turn_step: f32,
    pub step: f32,
}

impl Motion for KinematicMotion {
    fn name(&self) -> &'static str {
        "thrust"
    }

    fn advance(&self, craft: &mut CraftState, controls: &ControlSet, _platforms: &[Platform]) -> Landing {
        turn(craft, controls, self.turn_step);
        craft.shielded = controls.shield;
        if controls.thrust {
            craft.pos += heading(craft.angle) * self.step;
            craft.sync_pixel();
        }
        Landing::None
    }
}

/// Thrust/gravity/drag integration with landings
#[derive(Debug, Clone)]
pub struct GravityMotion {
    pub physics: PhysicsConfig,
}

impl GravityMotion {
    /// Apply the first matching platform's landing rules; list order wins
    fn check_landing(&self, craft: &mut CraftState, platforms: &[Platform]) -> Landing {
        let settle = self.physics.settle_speed;
        for platform in platforms {
            let zone = platform.landing_zone();
            let drop = craft.pixel.y - zone.y_flat;
            if !(zone.spans(craft.pixel.x) && (0..=3).contains(&drop) && craft.vel.y > 0.0 && craft.is_level()) {
                continue;
            }

            craft.vel.y = -craft.vel.y / 1.2;
            craft.vel.x /= 1.1;
            craft.angle = 0.0;
            craft.pixel.y = zone.y_flat;
            craft.pos.y = zone.y_flat as f32;

            let v = craft.vel;
            return if -settle <= v.x && v.x < settle && -settle < v.y && v.y < settle {
                craft.landed = true;
                craft.bouncing = false;
                Landing::Touchdown
            } else {
                craft.bouncing = true;
                Landing::Bounced
            };
        }
        Landing::None
    }
}

impl Motion for GravityMotion {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn advance(&self, craft: &mut CraftState, controls: &ControlSet, platforms: &[Platform]) -> Landing {
        let p = &self.physics;

        // Shield and thrust are exclusive; shield wins
        craft.thrust = 0.0;
        craft.shielded = controls.shield;
        if !controls.shield && controls.thrust {
            craft.thrust = p.thrust_max;
            craft.landed = false;
        }
        craft.bouncing = false;

        if !craft.landed {
            turn(craft, controls, p.turn_step);

            craft.accel = heading(craft.angle) * craft.thrust + Vec2::new(0.0, p.gravity);
            if craft.impact != Vec2::ZERO {
                craft.accel += craft.impact * p.impact_coeff;
                craft.impact = Vec2::ZERO;
            }

            craft.vel += craft.accel * p.accel_coeff;
            craft.vel *= Vec2::new(p.x_drag, p.y_drag);
            craft.pos += craft.vel * p.velocity_coeff;
        } else {
            craft.vel = Vec2::ZERO;
            craft.accel = Vec2::ZERO;
        }

        craft.sync_pixel();
        self.check_landing(craft, platforms)
    }
}
