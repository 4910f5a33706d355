//! Game session state and core simulation types
//!
//! A session owns the craft set and shares the static level by reference
//! counting, so many sessions or episodes can fly the same terrain.

use std::sync::Arc;

use super::craft::CraftState;
use super::mask::CoverageMask;
use super::motion::{Motion, motion_for};
use super::sensor::SensorReading;
use super::terrain::Level;
use crate::error::MayhemError;
use crate::settings::Settings;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    Paused,
    /// Every craft has run out of lives
    GameOver,
}

/// What destroyed a craft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyCause {
    Terrain,
    Collision { other: u32 },
    Shot { shooter: u32 },
}

/// Something the presentation layer may want to play or draw.
/// Events are appended during a tick and drained by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    Fired { craft: u32 },
    Bounced { craft: u32 },
    Landed { craft: u32 },
    Destroyed { craft: u32, cause: DestroyCause },
    ShieldAbsorbed { craft: u32, shooter: u32 },
    Respawned { craft: u32, lives: u32 },
    /// Lives exhausted; the craft no longer takes part
    Eliminated { craft: u32 },
}

/// Complete state of a multi-craft session
pub struct GameState {
    pub level: Arc<Level>,
    /// Craft in id order; ids are their indices
    pub crafts: Vec<CraftState>,
    pub settings: Settings,
    pub phase: GamePhase,
    pub time_ticks: u64,
    /// Events produced since the last drain
    pub events: Vec<SimEvent>,
    /// Latest sensor readings, one per craft
    pub readings: Vec<SensorReading>,
    /// Respawn destroyed craft at the tick boundary
    pub auto_respawn: bool,
    pub(super) motion: Box<dyn Motion>,
}

impl GameState {
    /// Session with `players` craft placed on the level's first spawn points
    pub fn new(level: Arc<Level>, players: usize, settings: Settings) -> Result<Self, MayhemError> {
        settings.validate()?;
        if players > level.spawns.len() {
            return Err(MayhemError::NotEnoughSpawns {
                needed: players,
                available: level.spawns.len(),
            });
        }

        let silhouette = CoverageMask::lander();
        let crafts: Vec<CraftState> = level
            .spawns
            .iter()
            .take(players)
            .enumerate()
            .map(|(i, spawn)| CraftState::new(i as u32, *spawn, silhouette.clone()))
            .collect();
        let motion = motion_for(settings.motion, &settings.physics);

        log::info!(
            "New session: {} craft, motion={}, sensor={}",
            crafts.len(),
            motion.name(),
            settings.sensor.as_str()
        );

        Ok(Self {
            readings: vec![SensorReading::empty(); crafts.len()],
            level,
            crafts,
            settings,
            phase: GamePhase::Playing,
            time_ticks: 0,
            events: Vec::new(),
            auto_respawn: true,
            motion,
        })
    }

    pub fn motion(&self) -> &dyn Motion {
        self.motion.as_ref()
    }

    pub fn craft(&self, id: u32) -> Option<&CraftState> {
        self.crafts.get(id as usize)
    }

    /// Craft that still have lives
    pub fn active_count(&self) -> usize {
        self.crafts.iter().filter(|c| c.is_active()).count()
    }

    /// Take every event produced so far
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SHIP_MAX_LIVES;

    #[test]
    fn test_new_places_crafts_on_spawns() {
        let level = Arc::new(Level::demo());
        let state = GameState::new(level.clone(), 2, Settings::default()).unwrap();
        assert_eq!(state.crafts.len(), 2);
        assert_eq!(state.crafts[1].id, 1);
        assert_eq!(state.crafts[1].pixel.x, level.spawns[1].x);
        assert_eq!(state.crafts[0].lives, SHIP_MAX_LIVES);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.readings.len(), 2);
        assert_eq!(state.motion().name(), "gravity");
    }

    #[test]
    fn test_new_rejects_too_many_players() {
        let level = Arc::new(Level::demo());
        let err = GameState::new(level, 5, Settings::default()).err().unwrap();
        assert!(matches!(
            err,
            MayhemError::NotEnoughSpawns {
                needed: 5,
                available: 4
            }
        ));
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let mut settings = Settings::default();
        settings.physics.x_drag = 1.5;
        assert!(GameState::new(Arc::new(Level::demo()), 1, settings).is_err());
    }

    #[test]
    fn test_drain_events_empties_queue() {
        let mut state = GameState::new(Arc::new(Level::demo()), 1, Settings::default()).unwrap();
        state.events.push(SimEvent::Fired { craft: 0 });
        assert_eq!(state.drain_events(), vec![SimEvent::Fired { craft: 0 }]);
        assert!(state.events.is_empty());
    }
}
