//! Craft state and per-tick control input

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::mask::CoverageMask;
use super::projectile::Projectile;
use super::terrain::Spawn;
use crate::consts::*;
use crate::heading;

/// Resolved per-tick controls for one craft.
///
/// Keyboard, joystick, replay and policy sources all reduce to this before
/// reaching the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSet {
    pub turn_left: bool,
    pub turn_right: bool,
    pub thrust: bool,
    pub shield: bool,
    pub fire: bool,
    /// Only read by the direct motion model
    #[serde(default)]
    pub up: bool,
    /// Only read by the direct motion model
    #[serde(default)]
    pub down: bool,
}

impl ControlSet {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Replay tuple order: left, right, thrust, shield, fire
    pub fn from_tuple(t: [bool; 5]) -> Self {
        Self {
            turn_left: t[0],
            turn_right: t[1],
            thrust: t[2],
            shield: t[3],
            fire: t[4],
            up: false,
            down: false,
        }
    }

    pub fn to_tuple(&self) -> [bool; 5] {
        [
            self.turn_left,
            self.turn_right,
            self.thrust,
            self.shield,
            self.fire,
        ]
    }
}

/// One flying craft
#[derive(Debug, Clone)]
pub struct CraftState {
    pub id: u32,
    /// Sprite top-left, sub-pixel precise
    pub pos: Vec2,
    /// Sprite top-left, floored to the pixel grid
    pub pixel: IVec2,
    pub vel: Vec2,
    pub accel: Vec2,
    /// Heading in degrees, always within [0, 360)
    pub angle: f32,
    pub thrust: f32,
    pub shielded: bool,
    /// Fire control held during the previous tick (edge trigger)
    pub shooting: bool,
    pub landed: bool,
    /// Set on the tick a landing attempt rebounded
    pub bouncing: bool,
    pub destroyed: bool,
    pub lives: u32,
    /// Shot velocity absorbed by the shield, applied on the next tick
    pub impact: Vec2,
    pub shots: Vec<Projectile>,
    spawn: Spawn,
    silhouette: CoverageMask,
    mask: CoverageMask,
    /// Rotated mask's top-left relative to the sprite box
    mask_offset: IVec2,
    /// Angle the current mask was rotated for
    mask_angle: f32,
}

impl CraftState {
    pub fn new(id: u32, spawn: Spawn, silhouette: CoverageMask) -> Self {
        let mut craft = Self {
            id,
            pos: Vec2::ZERO,
            pixel: IVec2::ZERO,
            vel: Vec2::ZERO,
            accel: Vec2::ZERO,
            angle: 0.0,
            thrust: 0.0,
            shielded: false,
            shooting: false,
            landed: false,
            bouncing: false,
            destroyed: false,
            lives: SHIP_MAX_LIVES,
            impact: Vec2::ZERO,
            shots: Vec::new(),
            spawn,
            mask: silhouette.clone(),
            silhouette,
            mask_offset: IVec2::ZERO,
            mask_angle: 0.0,
        };
        craft.place_at_spawn();
        craft
    }

    /// Reset dynamics to the spawn pose without touching lives or shots
    fn place_at_spawn(&mut self) {
        self.pixel = IVec2::new(self.spawn.x, self.spawn.y);
        self.pos = self.pixel.as_vec2();
        self.vel = Vec2::ZERO;
        self.accel = Vec2::ZERO;
        self.impact = Vec2::ZERO;
        self.angle = crate::normalize_degrees(self.spawn.angle);
        self.thrust = 0.0;
        self.shielded = false;
        self.shooting = false;
        self.landed = false;
        self.bouncing = false;
        self.destroyed = false;
        self.refresh_mask();
    }

    /// Return to the spawn pose, consuming one life
    pub fn respawn(&mut self) {
        self.place_at_spawn();
        self.lives = self.lives.saturating_sub(1);
    }

    pub fn spawn(&self) -> Spawn {
        self.spawn
    }

    /// Still has lives left to fly
    #[inline]
    pub fn is_active(&self) -> bool {
        self.lives > 0
    }

    /// Center of the sprite box in map coordinates
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pixel.as_vec2() + Vec2::splat(SHIP_HALF_SIZE)
    }

    /// Unit vector the nose points along
    #[inline]
    pub fn heading(&self) -> Vec2 {
        heading(self.angle)
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Sync the integer render position with the precise one
    #[inline]
    pub fn sync_pixel(&mut self) {
        self.pixel = self.pos.floor().as_ivec2();
    }

    /// Rotated silhouette for the current heading
    pub fn mask(&self) -> &CoverageMask {
        &self.mask
    }

    /// Map coordinates of the rotated mask's top-left corner
    #[inline]
    pub fn mask_origin(&self) -> IVec2 {
        self.pixel + self.mask_offset
    }

    /// Re-derive the coverage mask after the heading changed
    pub fn refresh_mask(&mut self) {
        if self.angle == self.mask_angle {
            return;
        }
        let (mask, offset) = self.silhouette.rotated(self.angle);
        self.mask = mask;
        self.mask_offset = offset;
        self.mask_angle = self.angle;
    }

    /// Whether a map point lies on the craft's silhouette
    pub fn covers(&self, point: IVec2) -> bool {
        let local = point - self.mask_origin();
        self.mask.get(local.x, local.y)
    }

    /// Whether the heading lies inside the landing cone
    #[inline]
    pub fn is_level(&self) -> bool {
        self.angle <= SHIP_ANGLE_LAND || self.angle >= 360.0 - SHIP_ANGLE_LAND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn craft() -> CraftState {
        CraftState::new(1, Spawn::new(100, 200), CoverageMask::lander())
    }

    #[test]
    fn test_new_craft_at_spawn() {
        let c = craft();
        assert_eq!(c.pixel, IVec2::new(100, 200));
        assert_eq!(c.pos, Vec2::new(100.0, 200.0));
        assert_eq!(c.lives, SHIP_MAX_LIVES);
        assert_eq!(c.center(), Vec2::new(116.0, 216.0));
    }

    #[test]
    fn test_respawn_consumes_life_and_clears_dynamics() {
        let mut c = craft();
        c.pos = Vec2::new(10.0, 10.0);
        c.vel = Vec2::new(3.0, -2.0);
        c.angle = 45.0;
        c.destroyed = true;
        c.impact = Vec2::ONE;
        c.respawn();
        assert_eq!(c.lives, SHIP_MAX_LIVES - 1);
        assert_eq!(c.vel, Vec2::ZERO);
        assert_eq!(c.angle, 0.0);
        assert_eq!(c.impact, Vec2::ZERO);
        assert!(!c.destroyed);
        assert_eq!(c.pixel, IVec2::new(100, 200));
    }

    #[test]
    fn test_covers_follows_rotation() {
        let mut c = craft();
        // Nose tip at the top center of the sprite
        assert!(c.covers(IVec2::new(115, 202)));
        c.angle = 180.0;
        c.refresh_mask();
        assert!(!c.covers(IVec2::new(115, 202)));
    }

    #[test]
    fn test_control_tuple() {
        let controls = ControlSet::from_tuple([true, false, true, false, true]);
        assert!(controls.turn_left && controls.thrust && controls.fire);
        assert_eq!(controls.to_tuple(), [true, false, true, false, true]);
    }

    #[test]
    fn test_level_cone() {
        let mut c = craft();
        for (angle, level) in [(0.0, true), (30.0, true), (31.0, false), (330.0, true), (200.0, false)] {
            c.angle = angle;
            assert_eq!(c.is_level(), level, "angle {angle}");
        }
    }
}
