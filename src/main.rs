//! Mayhem headless entry point
//!
//! Flies a level without a window:
//! - a two-craft session with scripted pilots, recorded to a replay
//! - a batch of training rollouts with the stock policies
//!
//! Environment:
//! - `MAYHEM_SETTINGS`: JSON settings file (defaults otherwise)
//! - `MAYHEM_LEVEL`: JSON level descriptor (built-in demo cave otherwise)
//! - `MAYHEM_REPLAY`: replay file; played back for craft 0 when it exists,
//!   otherwise the session's craft 0 controls are recorded there

use std::path::PathBuf;
use std::sync::Arc;

use mayhem::MayhemError;
use mayhem::policy::{DoNothingPolicy, Policy, RandomPolicy, evaluate_all};
use mayhem::replay::{Playback, ReplayLog, ReplayPlayer};
use mayhem::settings::Settings;
use mayhem::sim::{ControlSet, CraftState, GameState, Level, SimEvent, TickInput, tick};

const SESSION_TICKS: u64 = 1200;
const EPISODE_TICKS: u32 = 1000;
const RANDOM_POLICIES: u64 = 7;

fn main() {
    env_logger::init();
    log::info!("Mayhem (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), MayhemError> {
    let settings = match std::env::var("MAYHEM_SETTINGS") {
        Ok(path) => Settings::load(path)?,
        Err(_) => Settings::default(),
    };
    let level = match std::env::var("MAYHEM_LEVEL") {
        Ok(path) => Level::from_json(&std::fs::read_to_string(path)?)?,
        Err(_) => Level::demo(),
    };
    let level = Arc::new(level);
    let replay_path = std::env::var("MAYHEM_REPLAY").ok().map(PathBuf::from);

    run_session(&level, &settings, replay_path)?;
    run_training(&level, &settings)?;
    Ok(())
}

/// Hover pilot: burn whenever sinking, otherwise coast
fn hover(craft: &CraftState) -> ControlSet {
    ControlSet {
        thrust: craft.vel.y > 0.3,
        ..ControlSet::idle()
    }
}

/// Gunner: taps fire every half second and shields between bursts
fn gunner(craft: &CraftState, t: u64) -> ControlSet {
    ControlSet {
        fire: t % 30 == 0,
        shield: t % 60 > 40,
        thrust: craft.vel.y > 0.6 && t % 60 <= 40,
        ..ControlSet::idle()
    }
}

fn run_session(level: &Arc<Level>, settings: &Settings, replay_path: Option<PathBuf>) -> Result<(), MayhemError> {
    let mut state = GameState::new(level.clone(), 2, settings.clone())?;

    let mut player = match &replay_path {
        Some(path) if path.exists() => Some(ReplayPlayer::new(ReplayLog::load(path)?)),
        _ => None,
    };
    let mut recording = ReplayLog::new();

    let (mut shots, mut crashes, mut landings) = (0, 0, 0);
    while state.time_ticks < SESSION_TICKS && !state.is_over() {
        let t = state.time_ticks;
        let pilot = match player.as_mut().map(|p| p.next_frame()) {
            Some(Playback::Frame(controls)) => controls,
            Some(Playback::Ended { frames }) => {
                log::info!("Replay ended after {frames} frames");
                break;
            }
            None => hover(&state.crafts[0]),
        };
        recording.record(&pilot);

        let input = TickInput {
            controls: vec![pilot, gunner(&state.crafts[1], t)],
            pause: false,
        };
        tick(&mut state, &input);

        for event in state.drain_events() {
            match event {
                SimEvent::Fired { .. } => shots += 1,
                SimEvent::Destroyed { craft, cause } => {
                    crashes += 1;
                    log::debug!("Craft {craft} destroyed: {cause:?}");
                }
                SimEvent::Landed { craft } => {
                    landings += 1;
                    log::debug!("Craft {craft} landed");
                }
                _ => {}
            }
        }
    }

    log::info!(
        "Session over after {} ticks: {} shots, {} destructions, {} landings",
        state.time_ticks,
        shots,
        crashes,
        landings
    );
    for craft in &state.crafts {
        println!(
            "craft {}: pos=({:.1}, {:.1}) angle={:.0} lives={} landed={}",
            craft.id, craft.pos.x, craft.pos.y, craft.angle, craft.lives, craft.landed
        );
    }

    if let (Some(path), None) = (replay_path, player) {
        recording.save(path)?;
    }
    Ok(())
}

fn run_training(level: &Arc<Level>, settings: &Settings) -> Result<(), MayhemError> {
    let mut training = settings.clone();
    if training.sensor == mayhem::SensorMode::None {
        training.sensor = mayhem::SensorMode::Beam;
    }
    let width = training.action.width();

    let mut policies: Vec<Box<dyn Policy>> = vec![Box::new(DoNothingPolicy)];
    policies.extend((0..RANDOM_POLICIES).map(|seed| Box::new(RandomPolicy::new(seed, width)) as Box<dyn Policy>));

    let results = evaluate_all(level, 0, &training, &mut policies, EPISODE_TICKS)?;

    println!("\n{:<12} {:>6} {:>10} {:>9} {:>8}", "policy", "ticks", "reward", "distance", "crashed");
    for r in &results {
        println!(
            "{:<12} {:>6} {:>10.1} {:>9.1} {:>8}",
            r.policy, r.ticks, r.total_reward, r.distance, r.crashed
        );
    }
    if let Some(best) = results.iter().max_by(|a, b| a.total_reward.total_cmp(&b.total_reward)) {
        log::info!("Best rollout: {} with reward {:.1}", best.policy, best.total_reward);
    }
    Ok(())
}
