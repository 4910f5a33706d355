//! Collision detection between craft, terrain and shots
//!
//! Three phases run in a fixed order each tick:
//! 1. craft vs terrain, for every craft
//! 2. craft vs craft, for every pair
//! 3. shots vs craft, for every shooter
//!
//! A phase can see destruction flags set by an earlier one. Nothing is reset
//! here; respawning happens at the tick boundary.

use glam::IVec2;

use super::craft::CraftState;
use super::terrain::{Platform, Terrain};
use crate::consts::SHIP_SPRITE_SIZE;

/// A collision found this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Terrain { craft: u32 },
    Craft { a: u32, b: u32 },
    Shot { shooter: u32, target: u32, absorbed: bool },
}

/// Whether the craft sits in a platform grace zone where terrain contact is
/// expected: shielded and level just above a ledge, or thrusting off one.
pub fn in_grace_zone(craft: &CraftState, platforms: &[Platform]) -> bool {
    platforms.iter().any(|platform| {
        let zone = platform.landing_zone();
        if !zone.spans(craft.pixel.x) {
            return false;
        }
        let drop = craft.pixel.y - zone.y_flat;
        let shield_rest = craft.shielded && (-1..=3).contains(&drop) && craft.is_level();
        let takeoff = craft.thrust > 0.0 && (-1..=1).contains(&drop);
        shield_rest || takeoff
    })
}

/// Whether the craft's rotated silhouette overlaps terrain inside its sprite
/// box. Silhouette cells that stick out of the box are not tested.
pub fn touches_terrain(craft: &CraftState, terrain: &Terrain) -> bool {
    let origin = craft.mask_origin();
    let box_min = craft.pixel;
    let box_max = craft.pixel + IVec2::splat(SHIP_SPRITE_SIZE);
    craft
        .mask()
        .iter_set()
        .map(|p| origin + p)
        .filter(|p| p.x >= box_min.x && p.y >= box_min.y && p.x < box_max.x && p.y < box_max.y)
        .any(|p| terrain.is_solid(p.x, p.y))
}

/// Which craft take part in this tick's collisions: craft with lives left
/// that were not already wrecked when the tick began. Taken once, before
/// phase 1, so flags set by an earlier phase don't pull a craft out.
pub fn in_play(crafts: &[CraftState]) -> Vec<bool> {
    crafts.iter().map(|c| c.is_active() && !c.destroyed).collect()
}

/// Phase 1: mark craft that crashed into terrain
pub fn craft_vs_terrain(
    crafts: &mut [CraftState],
    in_play: &[bool],
    terrain: &Terrain,
    platforms: &[Platform],
) -> Vec<Hit> {
    let mut hits = Vec::new();
    for (craft, _) in crafts.iter_mut().zip(in_play).filter(|(_, live)| **live) {
        if in_grace_zone(craft, platforms) {
            continue;
        }
        if touches_terrain(craft, terrain) {
            craft.destroyed = true;
            hits.push(Hit::Terrain { craft: craft.id });
        }
    }
    hits
}

/// Whether two craft silhouettes share a pixel
pub fn crafts_overlap(a: &CraftState, b: &CraftState) -> bool {
    let offset = b.mask_origin() - a.mask_origin();
    a.mask().overlaps(b.mask(), offset)
}

/// Phase 2: any silhouette overlap destroys both craft
pub fn craft_vs_craft(crafts: &mut [CraftState], in_play: &[bool]) -> Vec<Hit> {
    let live = |i: usize| in_play.get(i).copied().unwrap_or(false);
    let mut hits = Vec::new();
    for i in 0..crafts.len() {
        for j in (i + 1)..crafts.len() {
            if !live(i) || !live(j) {
                continue;
            }
            if crafts_overlap(&crafts[i], &crafts[j]) {
                crafts[i].destroyed = true;
                crafts[j].destroyed = true;
                hits.push(Hit::Craft {
                    a: crafts[i].id,
                    b: crafts[j].id,
                });
            }
        }
    }
    hits
}

/// Phase 3: shots against every craft other than their owner.
///
/// A shot that strikes a craft is consumed. A shielded target adds the
/// shot's velocity to its pending impact; an unshielded one is destroyed,
/// and the shooter's remaining shots skip that target for this tick.
/// Shots left behind by a craft with no lives are harmless.
pub fn shots_vs_craft(crafts: &mut [CraftState], in_play: &[bool]) -> Vec<Hit> {
    let live = |i: usize| in_play.get(i).copied().unwrap_or(false);
    let mut hits = Vec::new();
    for s in 0..crafts.len() {
        if !crafts[s].is_active() {
            continue;
        }
        for t in 0..crafts.len() {
            if s == t || !live(t) {
                continue;
            }
            let mut k = 0;
            while k < crafts[s].shots.len() {
                let shot = crafts[s].shots[k];
                if !crafts[t].covers(shot.pixel) {
                    k += 1;
                    continue;
                }

                crafts[s].shots.remove(k);
                let (shooter, target) = (crafts[s].id, crafts[t].id);
                if crafts[t].shielded {
                    crafts[t].impact += shot.vel;
                    hits.push(Hit::Shot {
                        shooter,
                        target,
                        absorbed: true,
                    });
                } else {
                    crafts[t].destroyed = true;
                    hits.push(Hit::Shot {
                        shooter,
                        target,
                        absorbed: false,
                    });
                    break;
                }
            }
        }
    }
    hits
}

/// Run all three phases in order over the craft in play at the start
pub fn resolve(crafts: &mut [CraftState], terrain: &Terrain, platforms: &[Platform]) -> Vec<Hit> {
    let live = in_play(crafts);
    let mut hits = craft_vs_terrain(crafts, &live, terrain, platforms);
    hits.extend(craft_vs_craft(crafts, &live));
    hits.extend(shots_vs_craft(crafts, &live));
    hits
}
