//! Episodic reset/step/reward contract
//!
//! An `Episode` flies one craft over a shared level and exposes the usual
//! RL environment surface:
//!
//! ```text
//! let obs = episode.reset();
//! while let Some(step) = episode.step(&action, max_ticks) { ... }
//! ```
//!
//! Observations are `[angle, vx, vy, ax, ay, sensor_0 .. sensor_{N-1}]`, each
//! min-max scaled into [-1, 1]. Episodes are `Send` and own everything they
//! mutate, so independent rollouts can run on separate threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec2;

use crate::error::MayhemError;
use crate::settings::{ActionMapping, CollisionMode, ObservationRanges, Settings};
use crate::sim::collision::{in_grace_zone, touches_terrain};
use crate::sim::craft::{ControlSet, CraftState};
use crate::sim::mask::CoverageMask;
use crate::sim::motion::{Motion, motion_for};
use crate::sim::sensor::{self, SensorReading};
use crate::sim::state::{DestroyCause, SimEvent};
use crate::sim::terrain::Level;
use crate::sim::tick::step_craft;

/// Normalized state vector handed to a policy
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub values: Vec<f32>,
    /// Some probe touches terrain; the matching sensor value reads -1
    pub contact: bool,
}

impl Observation {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Sensor part of the vector
    pub fn sensors(&self) -> &[f32] {
        &self.values[Normalizer::STATE_LEN.min(self.values.len())..]
    }
}

/// Outcome of one `step`
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    /// Always empty; kept for the conventional step tuple
    pub info: BTreeMap<String, f32>,
}

/// Min-max scaling of craft state into [-1, 1]
#[derive(Debug, Clone)]
pub struct Normalizer {
    ranges: ObservationRanges,
}

impl Normalizer {
    /// angle, vx, vy, ax, ay
    pub const STATE_LEN: usize = 5;

    pub fn new(ranges: ObservationRanges) -> Self {
        Self { ranges }
    }

    #[inline]
    pub fn scale(value: f32, [lo, hi]: [f32; 2]) -> f32 {
        (2.0 * (value - lo) / (hi - lo) - 1.0).clamp(-1.0, 1.0)
    }

    pub fn observe(&self, craft: &CraftState, reading: &SensorReading) -> Observation {
        let r = &self.ranges;
        let mut values = Vec::with_capacity(Self::STATE_LEN + reading.len());
        values.extend([
            Self::scale(craft.angle, r.angle),
            Self::scale(craft.vel.x, r.vx),
            Self::scale(craft.vel.y, r.vy),
            Self::scale(craft.accel.x, r.ax),
            Self::scale(craft.accel.y, r.ay),
        ]);
        values.extend(reading.normalized());
        Observation {
            values,
            contact: reading.contact(),
        }
    }
}

/// Map a policy's action vector onto controls. Missing or NaN entries count
/// as not pressed.
pub fn decode_action(mapping: &ActionMapping, action: &[f32]) -> ControlSet {
    let at = |i: usize| action.get(i).copied().unwrap_or(0.0);
    match *mapping {
        ActionMapping::Steer {
            turn_threshold,
            thrust_threshold,
        } => {
            let steer = at(0);
            ControlSet {
                turn_left: steer < -turn_threshold,
                turn_right: steer > turn_threshold,
                thrust: action.get(1).is_some_and(|&t| t > thrust_threshold),
                ..ControlSet::idle()
            }
        }
        ActionMapping::Buttons { threshold } => {
            let pressed = |i: usize| action.get(i).is_some_and(|&v| v > threshold);
            ControlSet {
                turn_left: pressed(0),
                turn_right: pressed(1),
                thrust: pressed(2),
                shield: pressed(3),
                fire: pressed(4),
                ..ControlSet::idle()
            }
        }
    }
}

/// One craft flying attempts from a fixed spawn
pub struct Episode {
    level: Arc<Level>,
    settings: Settings,
    motion: Box<dyn Motion>,
    normalizer: Normalizer,
    craft: CraftState,
    reading: SensorReading,
    ticks: u32,
    total_distance: f32,
    done: bool,
    events: Vec<SimEvent>,
}

impl Episode {
    /// Episode for the craft at `spawn_index` of the level
    pub fn new(level: Arc<Level>, spawn_index: usize, settings: Settings) -> Result<Self, MayhemError> {
        settings.validate()?;
        let spawn = *level
            .spawns
            .get(spawn_index)
            .ok_or(MayhemError::NotEnoughSpawns {
                needed: spawn_index + 1,
                available: level.spawns.len(),
            })?;
        let craft = CraftState::new(0, spawn, CoverageMask::lander());
        let reading = sensor::read(settings.sensor, &level.terrain, &craft, &settings.probes);

        Ok(Self {
            motion: motion_for(settings.motion, &settings.physics),
            normalizer: Normalizer::new(settings.observation.clone()),
            level,
            settings,
            craft,
            reading,
            ticks: 0,
            total_distance: 0.0,
            done: false,
            events: Vec::new(),
        })
    }

    /// Start a new attempt: back to the spawn pose, one life spent, counters
    /// zeroed. Returns the initial observation.
    pub fn reset(&mut self) -> Observation {
        self.craft.respawn();
        self.craft.shots.clear();
        self.ticks = 0;
        self.total_distance = 0.0;
        self.done = false;
        self.events.clear();
        self.reading = sensor::read(
            self.settings.sensor,
            &self.level.terrain,
            &self.craft,
            &self.settings.probes,
        );
        log::debug!("Episode reset, {} lives left", self.craft.lives);
        self.render_observation()
    }

    /// Apply a raw action vector for one tick. Returns `None` once the
    /// episode is done; nothing is advanced after that.
    pub fn step(&mut self, action: &[f32], max_ticks: u32) -> Option<StepResult> {
        let controls = decode_action(&self.settings.action, action);
        self.step_controls(&controls, max_ticks)
    }

    /// Like `step`, with already-resolved controls
    pub fn step_controls(&mut self, controls: &ControlSet, max_ticks: u32) -> Option<StepResult> {
        if self.done {
            return None;
        }

        let before = self.craft.pos;
        step_craft(
            self.motion.as_ref(),
            &mut self.craft,
            controls,
            &self.level,
            &self.settings,
            &mut self.events,
        );

        if self.settings.collision == CollisionMode::Engine
            && !in_grace_zone(&self.craft, &self.level.platforms)
            && touches_terrain(&self.craft, &self.level.terrain)
        {
            self.craft.destroyed = true;
            self.events.push(SimEvent::Destroyed {
                craft: self.craft.id,
                cause: DestroyCause::Terrain,
            });
        }

        self.reading = sensor::read(
            self.settings.sensor,
            &self.level.terrain,
            &self.craft,
            &self.settings.probes,
        );
        self.ticks += 1;

        let rewards = &self.settings.reward;
        let moved = (self.craft.pos - before).length();
        let mut reward = if moved < rewards.min_displacement {
            0.0
        } else {
            self.total_distance += moved;
            rewards.alive
        };

        let crashed = self.craft.destroyed || self.reading.contact();
        if crashed || self.ticks > max_ticks {
            self.done = true;
            reward = if crashed {
                rewards.crash_penalty
            } else {
                let spawn = self.craft.spawn();
                let net = (self.craft.pos - Vec2::new(spawn.x as f32, spawn.y as f32)).length();
                reward + self.total_distance + rewards.displacement_weight * net
            };
            log::debug!(
                "Episode done after {} ticks (crashed={}, reward={:.1})",
                self.ticks,
                crashed,
                reward
            );
        }

        Some(StepResult {
            observation: self.render_observation(),
            reward,
            done: self.done,
            info: BTreeMap::new(),
        })
    }

    /// Current observation; never mutates
    pub fn render_observation(&self) -> Observation {
        self.normalizer.observe(&self.craft, &self.reading)
    }

    /// Length of every observation this episode produces
    pub fn observation_len(&self) -> usize {
        Normalizer::STATE_LEN + self.settings.sensor_count()
    }

    pub fn craft(&self) -> &CraftState {
        &self.craft
    }

    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn total_distance(&self) -> f32 {
        self.total_distance
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
