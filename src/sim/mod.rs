//! Deterministic simulation module
//!
//! All flight logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (by craft id)
//! - No rendering, audio or input-device dependencies

pub mod collision;
pub mod craft;
pub mod mask;
pub mod motion;
pub mod projectile;
pub mod sensor;
pub mod state;
pub mod terrain;
pub mod tick;

pub use collision::Hit;
pub use craft::{ControlSet, CraftState};
pub use mask::CoverageMask;
pub use motion::{DirectMotion, GravityMotion, KinematicMotion, Landing, Motion, motion_for};
pub use projectile::Projectile;
pub use sensor::{BeamHit, SensorReading};
pub use state::{DestroyCause, GamePhase, GameState, SimEvent};
pub use terrain::{Flip, Level, LevelDescriptor, Platform, Spawn, Terrain};
pub use tick::{TickInput, step_craft, tick};
