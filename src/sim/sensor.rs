//! Agent perception: distances and contacts against the terrain
//!
//! Two probe strategies, picked per session:
//! - beam: radial ray casts at fixed angular steps, reporting hull distance
//! - octo: eight point probes around the craft, reporting contact or clear
//!
//! Every function here is side-effect free. `beam_trace` and `octo_points`
//! also expose the geometry a renderer needs to draw the probes.

use glam::{IVec2, Vec2};

use super::craft::CraftState;
use super::terrain::{Flip, Terrain};
use crate::consts::*;
use crate::settings::{ProbeConfig, SensorMode};

/// One tick's probe readings, in probe order, each within `[0, max_range]`.
/// A value of 0 means the hull is touching terrain.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub values: Vec<f32>,
    pub max_range: f32,
}

impl SensorReading {
    pub fn empty() -> Self {
        Self {
            values: Vec::new(),
            max_range: 1.0,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Any probe reports terrain contact
    pub fn contact(&self) -> bool {
        self.values.iter().any(|&v| v <= 0.0)
    }

    /// Readings scaled into [-1, 1]; -1 is contact, 1 is max range
    pub fn normalized(&self) -> impl Iterator<Item = f32> + '_ {
        let max = self.max_range;
        self.values
            .iter()
            .map(move |&v| (2.0 * v / max - 1.0).clamp(-1.0, 1.0))
    }
}

/// One ray of the beam sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamHit {
    pub angle: u32,
    /// First solid cell along the ray, in map coordinates
    pub hit: Option<IVec2>,
    /// Distance from the hull, clamped at 0; max range on a miss
    pub distance: f32,
}

/// Largest value a beam reports: the corner of the square probe volume
#[inline]
pub fn beam_max_range(range: f32) -> f32 {
    range * std::f32::consts::SQRT_2
}

/// Cast one ray per `angle_step` degrees from `center`.
///
/// Rays are clipped to the square of half-extent `range` around the center.
/// Each ray runs through the terrain copy mirrored into its quadrant, so
/// the march always heads toward +x/+y.
pub fn beam_trace(terrain: &Terrain, center: IVec2, angle_step: u32, range: f32) -> Vec<BeamHit> {
    let steps = range as i32;
    let miss = beam_max_range(range);
    (0..360)
        .step_by(angle_step.max(1) as usize)
        .map(|angle| {
            let (s, c) = (angle as f32).to_radians().sin_cos();
            let flip = Flip::for_direction(c, s);
            let dir = Vec2::new(c.abs(), s.abs());
            // Unit step along the major axis
            let stride = dir / dir.x.max(dir.y);
            let origin = terrain.flip_point(flip, center);

            // The center pixel itself never counts as a hit
            let hit = (1..steps)
                .map(|i| origin + (stride * i as f32).round().as_ivec2())
                .find(|p| terrain.is_solid_flipped(flip, p.x, p.y))
                .map(|p| terrain.flip_point(flip, p));

            let distance = match hit {
                Some(p) => {
                    let d = (p - center).as_vec2().length() - (SHIP_HALF_SIZE - 1.0);
                    d.max(0.0)
                }
                None => miss,
            };
            BeamHit {
                angle,
                hit,
                distance,
            }
        })
        .collect()
}

/// Beam distances for a craft, in increasing-angle order
pub fn beam(terrain: &Terrain, craft: &CraftState, probes: &ProbeConfig) -> SensorReading {
    let center = craft.pixel + IVec2::splat(SHIP_SPRITE_SIZE / 2);
    let values = beam_trace(terrain, center, probes.beam_angle_step, probes.beam_range)
        .into_iter()
        .map(|b| b.distance)
        .collect();
    SensorReading {
        values,
        max_range: beam_max_range(probes.beam_range),
    }
}

/// Octagonal probe radius: fixed, or growing with the craft's speed
pub fn octo_radius(craft: &CraftState, fixed: bool, probes: &ProbeConfig) -> f32 {
    if fixed {
        probes.octo_fixed_radius
    } else {
        probes.octo_base_radius.trunc() + probes.octo_speed_gain * craft.speed()
    }
}

/// Probe points: left, right, up, down, up-left, up-right, down-left, down-right
pub fn octo_points(craft: &CraftState, radius: f32) -> [IVec2; 8] {
    let c = craft.pixel.as_vec2() + Vec2::splat(SHIP_HALF_SIZE);
    let r = radius;
    let d = radius / OCTO_DIAGONAL_DIVISOR;
    let offsets = [
        Vec2::new(-r, 0.0),
        Vec2::new(r, 0.0),
        Vec2::new(0.0, -r),
        Vec2::new(0.0, r),
        Vec2::new(-d, -d),
        Vec2::new(d, -d),
        Vec2::new(-d, d),
        Vec2::new(d, d),
    ];
    // Pixel lookups truncate toward zero
    offsets.map(|o| {
        let p = c + o;
        IVec2::new(p.x as i32, p.y as i32)
    })
}

/// Contact flags for the eight probes; off-map points are clear
pub fn octo_contacts(terrain: &Terrain, craft: &CraftState, radius: f32) -> [bool; 8] {
    octo_points(craft, radius).map(|p| terrain.is_solid(p.x, p.y))
}

/// Octagonal probe as a reading: 0 on contact, the probe radius when clear
pub fn octo(terrain: &Terrain, craft: &CraftState, fixed: bool, probes: &ProbeConfig) -> SensorReading {
    let radius = octo_radius(craft, fixed, probes);
    let values = octo_contacts(terrain, craft, radius)
        .iter()
        .map(|&hit| if hit { 0.0 } else { radius })
        .collect();
    SensorReading {
        values,
        max_range: radius,
    }
}

/// Read the configured sensor for a craft
pub fn read(mode: SensorMode, terrain: &Terrain, craft: &CraftState, probes: &ProbeConfig) -> SensorReading {
    match mode {
        SensorMode::None => SensorReading::empty(),
        SensorMode::Beam => beam(terrain, craft, probes),
        SensorMode::Octo => octo(terrain, craft, false, probes),
        SensorMode::OctoFixed => octo(terrain, craft, true, probes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mask::CoverageMask;
    use crate::sim::terrain::Spawn;

    fn open(w: usize, h: usize) -> Terrain {
        Terrain::from_cells(w, h, vec![false; w * h]).unwrap()
    }

    /// Open map with a solid column at `x = wall_x`
    fn wall_at(w: usize, h: usize, wall_x: usize) -> Terrain {
        let mut cells = vec![false; w * h];
        for y in 0..h {
            cells[y * w + wall_x] = true;
        }
        Terrain::from_cells(w, h, cells).unwrap()
    }

    fn craft_at(x: i32, y: i32) -> CraftState {
        CraftState::new(1, Spawn::new(x, y), CoverageMask::lander())
    }

    #[test]
    fn test_beam_open_space_reports_max_range() {
        let terrain = open(800, 800);
        let craft = craft_at(384, 384);
        let probes = ProbeConfig::default();
        let reading = beam(&terrain, &craft, &probes);
        assert_eq!(reading.len(), 12);
        let expected = probes.beam_range * std::f32::consts::SQRT_2;
        for v in &reading.values {
            assert_eq!(*v, expected);
        }
        assert!(!reading.contact());
        assert!(reading.normalized().all(|v| v == 1.0));
    }

    #[test]
    fn test_beam_measures_to_hull() {
        let terrain = wall_at(400, 400, 250);
        // Center at x = 200
        let craft = craft_at(184, 184);
        let reading = beam(&terrain, &craft, &ProbeConfig::default());
        // Angle 0 looks along +x: 50 px to the wall, minus 15 to the hull
        assert!((reading.values[0] - 35.0).abs() < 1e-4);
        // Angle 180 looks at open space
        assert_eq!(reading.values[6], beam_max_range(200.0));
    }

    #[test]
    fn test_beam_mirrored_quadrants() {
        let terrain = wall_at(400, 400, 150);
        let craft = craft_at(184, 184);
        let reading = beam(&terrain, &craft, &ProbeConfig::default());
        // Angle 180 looks along -x through the flipped copy
        assert!((reading.values[6] - 35.0).abs() < 1e-4);
        assert_eq!(reading.values[0], beam_max_range(200.0));
    }

    #[test]
    fn test_beam_trace_hit_points() {
        let terrain = wall_at(400, 400, 250);
        let hits = beam_trace(&terrain, IVec2::new(200, 200), 90, 200.0);
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].hit, Some(IVec2::new(250, 200)));
        assert!(hits[1].hit.is_none());
        assert!(hits[2].hit.is_none());
        assert_eq!(hits[3].angle, 270);
    }

    #[test]
    fn test_beam_contact_clamps_to_zero() {
        let terrain = wall_at(400, 400, 205);
        let craft = craft_at(184, 184);
        let reading = beam(&terrain, &craft, &ProbeConfig::default());
        assert_eq!(reading.values[0], 0.0);
        assert!(reading.contact());
        assert_eq!(reading.normalized().next(), Some(-1.0));
    }

    #[test]
    fn test_beam_off_map_is_clear() {
        // Craft near the map edge: rays leave the map without error
        let terrain = open(100, 100);
        let craft = craft_at(0, 0);
        let reading = beam(&terrain, &craft, &ProbeConfig::default());
        assert!(reading.values.iter().all(|&v| v == beam_max_range(200.0)));
    }

    #[test]
    fn test_octo_clear_in_open_region() {
        let terrain = open(400, 400);
        let craft = craft_at(184, 184);
        let probes = ProbeConfig::default();
        assert_eq!(octo_contacts(&terrain, &craft, octo_radius(&craft, false, &probes)), [false; 8]);
        let reading = octo(&terrain, &craft, true, &probes);
        assert_eq!(reading.len(), 8);
        assert!(!reading.contact());
    }

    #[test]
    fn test_octo_contact_against_wall() {
        let terrain = wall_at(400, 400, 248);
        let craft = craft_at(184, 184);
        let probes = ProbeConfig::default();
        // At rest the radius is 48: the right probe lands on x = 248
        let contacts = octo_contacts(&terrain, &craft, octo_radius(&craft, false, &probes));
        assert!(contacts[1]);
        assert!(contacts.iter().filter(|&&c| c).count() >= 1);
        let reading = octo(&terrain, &craft, false, &probes);
        assert!(reading.contact());
        assert_eq!(reading.values[1], 0.0);
    }

    #[test]
    fn test_octo_radius_grows_with_speed() {
        let mut craft = craft_at(0, 0);
        let probes = ProbeConfig::default();
        assert_eq!(octo_radius(&craft, false, &probes), 48.0);
        craft.vel = Vec2::new(3.0, 4.0);
        assert_eq!(octo_radius(&craft, false, &probes), 48.0 + 60.0);
        assert_eq!(octo_radius(&craft, true, &probes), 64.0);
    }

    #[test]
    fn test_octo_points_order() {
        let craft = craft_at(100, 100);
        let pts = octo_points(&craft, 14.0);
        assert_eq!(pts[0], IVec2::new(102, 116));
        assert_eq!(pts[1], IVec2::new(130, 116));
        assert_eq!(pts[2], IVec2::new(116, 102));
        assert_eq!(pts[3], IVec2::new(116, 130));
        assert_eq!(pts[4], IVec2::new(106, 106));
        assert_eq!(pts[7], IVec2::new(126, 126));
    }

    #[test]
    fn test_read_dispatch() {
        let terrain = open(100, 100);
        let craft = craft_at(30, 30);
        let probes = ProbeConfig::default();
        assert!(read(SensorMode::None, &terrain, &craft, &probes).is_empty());
        assert_eq!(read(SensorMode::Beam, &terrain, &craft, &probes).len(), 12);
        assert_eq!(read(SensorMode::OctoFixed, &terrain, &craft, &probes).len(), 8);
    }
}
