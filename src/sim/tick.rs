//! Fixed timestep simulation tick
//!
//! One call fully completes integration, landing, firing, shot flight,
//! collisions and sensing before returning.

use super::collision::{self, Hit};
use super::craft::{ControlSet, CraftState};
use super::motion::{Landing, Motion};
use super::projectile::{advance_all, pull_trigger};
use super::sensor;
use super::state::{DestroyCause, GamePhase, GameState, SimEvent};
use super::terrain::Level;
use crate::settings::{CollisionMode, Settings};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Controls per craft, by id; missing entries are idle
    pub controls: Vec<ControlSet>,
    /// Pause toggle
    pub pause: bool,
}

/// Move one craft and its shots through a tick: motion, landing, mask
/// refresh, trigger and shot flight. Collisions are left to the caller.
pub fn step_craft(
    motion: &dyn Motion,
    craft: &mut CraftState,
    controls: &ControlSet,
    level: &Level,
    settings: &Settings,
    events: &mut Vec<SimEvent>,
) {
    match motion.advance(craft, controls, &level.platforms) {
        Landing::Bounced => events.push(SimEvent::Bounced { craft: craft.id }),
        Landing::Touchdown => events.push(SimEvent::Landed { craft: craft.id }),
        Landing::None => {}
    }
    craft.refresh_mask();

    if pull_trigger(craft, controls.fire, settings.max_shots) {
        events.push(SimEvent::Fired { craft: craft.id });
    }
    advance_all(&mut craft.shots, &level.terrain);
}

/// Translate collision hits into session events
pub fn hit_events(hits: &[Hit], events: &mut Vec<SimEvent>) {
    for hit in hits {
        match *hit {
            Hit::Terrain { craft } => events.push(SimEvent::Destroyed {
                craft,
                cause: DestroyCause::Terrain,
            }),
            Hit::Craft { a, b } => {
                events.push(SimEvent::Destroyed {
                    craft: a,
                    cause: DestroyCause::Collision { other: b },
                });
                events.push(SimEvent::Destroyed {
                    craft: b,
                    cause: DestroyCause::Collision { other: a },
                });
            }
            Hit::Shot {
                shooter,
                target,
                absorbed: true,
            } => events.push(SimEvent::ShieldAbsorbed {
                craft: target,
                shooter,
            }),
            Hit::Shot {
                shooter,
                target,
                absorbed: false,
            } => events.push(SimEvent::Destroyed {
                craft: target,
                cause: DestroyCause::Shot { shooter },
            }),
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if state.phase != GamePhase::Playing {
        return;
    }

    if input.controls.len() > state.crafts.len() {
        log::warn!(
            "Tick input has {} control sets for {} craft; extras ignored",
            input.controls.len(),
            state.crafts.len()
        );
    }

    let level = state.level.clone();

    for (i, craft) in state.crafts.iter_mut().enumerate() {
        if !craft.is_active() || craft.destroyed {
            // Shots already in flight outlive their owner
            advance_all(&mut craft.shots, &level.terrain);
            continue;
        }
        let controls = input.controls.get(i).copied().unwrap_or_default();
        step_craft(
            state.motion.as_ref(),
            craft,
            &controls,
            &level,
            &state.settings,
            &mut state.events,
        );
    }

    let hits = match state.settings.collision {
        CollisionMode::Engine => collision::resolve(&mut state.crafts, &level.terrain, &level.platforms),
        CollisionMode::SensorOnly => {
            let live = collision::in_play(&state.crafts);
            let mut hits = collision::craft_vs_craft(&mut state.crafts, &live);
            hits.extend(collision::shots_vs_craft(&mut state.crafts, &live));
            hits
        }
    };
    hit_events(&hits, &mut state.events);

    for (craft, reading) in state.crafts.iter_mut().zip(state.readings.iter_mut()) {
        if !craft.is_active() {
            continue;
        }
        *reading = sensor::read(state.settings.sensor, &level.terrain, craft, &state.settings.probes);
        // Sensor contact stands in for the terrain phase
        if state.settings.collision == CollisionMode::SensorOnly && !craft.destroyed && reading.contact() {
            craft.destroyed = true;
            state.events.push(SimEvent::Destroyed {
                craft: craft.id,
                cause: DestroyCause::Terrain,
            });
        }
    }

    state.time_ticks += 1;

    // Destroyed craft reset here, never mid-tick
    if state.auto_respawn {
        for craft in state.crafts.iter_mut() {
            if !craft.destroyed || !craft.is_active() {
                continue;
            }
            craft.respawn();
            if craft.is_active() {
                state.events.push(SimEvent::Respawned {
                    craft: craft.id,
                    lives: craft.lives,
                });
            } else {
                craft.shots.clear();
                log::info!("Craft {} eliminated at tick {}", craft.id, state.time_ticks);
                state.events.push(SimEvent::Eliminated { craft: craft.id });
            }
        }
    }

    if state.active_count() == 0 {
        log::info!("Game over after {} ticks", state.time_ticks);
        state.phase = GamePhase::GameOver;
    }
}
