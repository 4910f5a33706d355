//! Recorded control sequences
//!
//! A log stores one control tuple per tick for a single craft, in the
//! `[left, right, thrust, shield, fire]` order. Logs persist as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MayhemError;
use crate::sim::craft::ControlSet;

/// Per-tick controls of one craft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReplayLog {
    pub frames: Vec<[bool; 5]>,
}

impl ReplayLog {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Append this tick's controls
    pub fn record(&mut self, controls: &ControlSet) {
        self.frames.push(controls.to_tuple());
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Controls recorded for tick `i`, or `None` past the end of the log
    pub fn get_frame(&self, i: usize) -> Option<ControlSet> {
        self.frames.get(i).map(|t| ControlSet::from_tuple(*t))
    }

    pub fn to_json(&self) -> Result<String, MayhemError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, MayhemError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MayhemError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        log::info!("Replay saved to {} ({} frames)", path.display(), self.len());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MayhemError> {
        let path = path.as_ref();
        let log = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded replay {} ({} frames)", path.display(), log.len());
        Ok(log)
    }
}

/// What the player yields for a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Frame(ControlSet),
    /// The log ran out after `frames` ticks
    Ended { frames: usize },
}

/// Reads a log back one tick at a time
#[derive(Debug, Clone)]
pub struct ReplayPlayer {
    log: ReplayLog,
    cursor: usize,
}

impl ReplayPlayer {
    pub fn new(log: ReplayLog) -> Self {
        Self { log, cursor: 0 }
    }

    pub fn next_frame(&mut self) -> Playback {
        match self.log.get_frame(self.cursor) {
            Some(controls) => {
                self.cursor += 1;
                Playback::Frame(controls)
            }
            None => Playback::Ended {
                frames: self.log.len(),
            },
        }
    }

    /// Ticks played so far
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.log.len()
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}
