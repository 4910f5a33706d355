//! Shots fired by craft
//!
//! Each craft owns its shots. A shot flies in a straight line and is retired
//! when it enters solid terrain, leaves the map or strikes another craft.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::craft::CraftState;
use super::terrain::Terrain;
use crate::consts::*;

/// A shot in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub pixel: IVec2,
    pub vel: Vec2,
}

impl Projectile {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            pixel: pos.floor().as_ivec2(),
            vel,
        }
    }
}

/// Spawn a shot ahead of the craft's nose, or `None` when the craft already
/// has `max_shots` in flight.
///
/// Muzzle velocity runs along the heading; a fraction of the craft's own
/// velocity is composed on top of it.
pub fn fire(craft: &CraftState, max_shots: usize) -> Option<Projectile> {
    if craft.shots.len() >= max_shots {
        return None;
    }
    let dir = craft.heading();
    // Muzzle anchor sits one pixel left of the sprite center
    let anchor = craft.pixel.as_vec2() + Vec2::new(SHIP_HALF_SIZE - 1.0, SHIP_HALF_SIZE);
    let pos = anchor + dir * SHOT_NOSE_OFFSET;
    let vel = dir * SHOT_SPEED + craft.vel / SHOT_INHERIT_DIVISOR;
    Some(Projectile::new(pos, vel))
}

/// Edge-triggered fire: a shot leaves only on the tick the control goes from
/// released to pressed. Returns true when a shot was added.
pub fn pull_trigger(craft: &mut CraftState, pressed: bool, max_shots: usize) -> bool {
    let rising = pressed && !craft.shooting;
    craft.shooting = pressed;
    if !rising {
        return false;
    }
    match fire(craft, max_shots) {
        Some(shot) => {
            craft.shots.push(shot);
            true
        }
        None => false,
    }
}

/// Move every shot by its velocity and drop the ones that hit terrain or
/// left the map. Survivors keep their spawn order. Returns how many retired.
pub fn advance_all(shots: &mut Vec<Projectile>, terrain: &Terrain) -> usize {
    let before = shots.len();
    shots.retain_mut(|shot| {
        shot.pos += shot.vel;
        shot.pixel = shot.pos.floor().as_ivec2();
        terrain.in_bounds(shot.pixel.x, shot.pixel.y) && !terrain.is_solid(shot.pixel.x, shot.pixel.y)
    });
    before - shots.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mask::CoverageMask;
    use crate::sim::terrain::Spawn;

    fn open_terrain(w: usize, h: usize) -> Terrain {
        Terrain::from_cells(w, h, vec![false; w * h]).unwrap()
    }

    fn craft() -> CraftState {
        CraftState::new(1, Spawn::new(100, 100), CoverageMask::lander())
    }

    #[test]
    fn test_fire_spawns_ahead_of_nose() {
        let c = craft();
        let shot = fire(&c, MAX_SHOTS).unwrap();
        // Angle 0: straight up from the muzzle anchor
        assert!((shot.pos.x - 115.0).abs() < 1e-4);
        assert!((shot.pos.y - (116.0 - SHOT_NOSE_OFFSET)).abs() < 1e-4);
        assert!(shot.vel.x.abs() < 1e-4);
        assert!((shot.vel.y + SHOT_SPEED).abs() < 1e-4);
    }

    #[test]
    fn test_fire_inherits_craft_velocity() {
        let mut c = craft();
        c.vel = Vec2::new(3.5, 0.0);
        let shot = fire(&c, MAX_SHOTS).unwrap();
        assert!((shot.vel.x - 1.0).abs() < 1e-4);
        // Muzzle speed dominates
        assert!(shot.vel.y.abs() > shot.vel.x.abs());
    }

    #[test]
    fn test_fire_respects_cap() {
        let mut c = craft();
        for _ in 0..3 {
            c.shots.push(Projectile::new(Vec2::ZERO, Vec2::ZERO));
        }
        assert!(fire(&c, 3).is_none());
        assert!(fire(&c, 4).is_some());
    }

    #[test]
    fn test_trigger_is_edge_triggered() {
        let mut c = craft();
        assert!(pull_trigger(&mut c, true, MAX_SHOTS));
        // Holding the button does not auto-fire
        assert!(!pull_trigger(&mut c, true, MAX_SHOTS));
        assert!(!pull_trigger(&mut c, false, MAX_SHOTS));
        assert!(pull_trigger(&mut c, true, MAX_SHOTS));
        assert_eq!(c.shots.len(), 2);
    }

    #[test]
    fn test_advance_retires_on_terrain() {
        let terrain = Terrain::from_rows(&["......", "......", "...#..", "......"]).unwrap();
        let mut shots = vec![
            Projectile::new(Vec2::new(3.5, 0.5), Vec2::new(0.0, 1.0)),
            Projectile::new(Vec2::new(0.5, 0.5), Vec2::new(0.0, 1.0)),
        ];
        assert_eq!(advance_all(&mut shots, &terrain), 0);
        assert_eq!(advance_all(&mut shots, &terrain), 1);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].pixel, IVec2::new(0, 2));
    }

    #[test]
    fn test_advance_retires_off_map_and_keeps_order() {
        let terrain = open_terrain(10, 10);
        let mut shots = vec![
            Projectile::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0)),
            Projectile::new(Vec2::new(0.5, 5.0), Vec2::new(-1.0, 0.0)),
            Projectile::new(Vec2::new(2.0, 2.0), Vec2::new(0.0, 1.0)),
        ];
        assert_eq!(advance_all(&mut shots, &terrain), 1);
        assert_eq!(shots.len(), 2);
        assert_eq!(shots[0].pixel, IVec2::new(2, 1));
        assert_eq!(shots[1].pixel, IVec2::new(2, 3));
    }
}
