//! Level geometry: terrain silhouette, landing platforms and spawn points
//!
//! Terrain is built once per level and read-only afterwards. It keeps four
//! mirrored copies so a ray cast in any quadrant can be run as a search in
//! the positive x/y direction.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::mask::CoverageMask;
use crate::consts::SHIP_SPRITE_SIZE;
use crate::error::MayhemError;

/// Which mirrored copy of the terrain to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flip {
    pub x: bool,
    pub y: bool,
}

impl Flip {
    pub const NONE: Flip = Flip { x: false, y: false };

    /// Flip that turns a direction into a positive-x/positive-y one
    pub fn for_direction(dx: f32, dy: f32) -> Self {
        Self {
            x: dx < 0.0,
            y: dy < 0.0,
        }
    }

    #[inline]
    fn index(self) -> usize {
        (self.x as usize) << 1 | self.y as usize
    }
}

/// Immutable solid/empty silhouette of a level
#[derive(Debug, Clone)]
pub struct Terrain {
    /// Indexed by `Flip::index`: none, flip-y, flip-x, flip-both
    variants: [CoverageMask; 4],
}

impl Terrain {
    pub fn new(mask: CoverageMask) -> Self {
        let variants = [
            mask.flipped(false, false),
            mask.flipped(false, true),
            mask.flipped(true, false),
            mask.flipped(true, true),
        ];
        Self { variants }
    }

    /// Build from a row-major cell vector (`true` = solid)
    pub fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Result<Self, MayhemError> {
        Ok(Self::new(CoverageMask::from_cells(width, height, cells)?))
    }

    /// Build from text rows (`#` solid)
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, MayhemError> {
        Ok(Self::new(CoverageMask::from_rows(rows)?))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.variants[0].width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.variants[0].height()
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.variants[0].contains(x, y)
    }

    /// Whether a map cell is solid; anything off the map is clear
    #[inline]
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.variants[0].get(x, y)
    }

    /// Query a mirrored copy in its own (flipped) coordinates
    #[inline]
    pub fn is_solid_flipped(&self, flip: Flip, x: i32, y: i32) -> bool {
        self.variants[flip.index()].get(x, y)
    }

    /// Map a point between true and flipped coordinates (the mapping is its own inverse)
    #[inline]
    pub fn flip_point(&self, flip: Flip, p: IVec2) -> IVec2 {
        IVec2::new(
            if flip.x { self.width() as i32 - 1 - p.x } else { p.x },
            if flip.y { self.height() as i32 - 1 - p.y } else { p.y },
        )
    }

    /// The unflipped silhouette
    pub fn mask(&self) -> &CoverageMask {
        &self.variants[0]
    }
}

/// A horizontal landing ledge in map coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x_min: i32,
    pub x_max: i32,
    /// Row of the ledge surface
    pub y_flat: i32,
}

/// Platform bounds translated into the craft's top-left sprite space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandingZone {
    pub x_min: i32,
    pub x_max: i32,
    pub y_flat: i32,
}

impl LandingZone {
    /// Craft's left edge lies within the zone
    #[inline]
    pub fn spans(&self, x: i32) -> bool {
        self.x_min <= x && x <= self.x_max
    }
}

impl Platform {
    pub const fn new(x_min: i32, x_max: i32, y_flat: i32) -> Self {
        Self {
            x_min,
            x_max,
            y_flat,
        }
    }

    /// The legs sit 9 px in from the sprite's left edge and 23 px from its
    /// right one; the feet rest two rows above the sprite's bottom edge.
    pub fn landing_zone(&self) -> LandingZone {
        LandingZone {
            x_min: self.x_min - (SHIP_SPRITE_SIZE - 23),
            x_max: self.x_max - (SHIP_SPRITE_SIZE - 9),
            y_flat: self.y_flat - (SHIP_SPRITE_SIZE - 2),
        }
    }
}

/// Craft spawn pose (top-left of the sprite box)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub angle: f32,
}

impl Spawn {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y, angle: 0.0 }
    }
}

/// Serialized level description handed over by an asset loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Text rows, `#` = solid
    pub rows: Vec<String>,
    pub platforms: Vec<Platform>,
    pub spawns: Vec<Spawn>,
}

/// Everything static about a level; shared read-only across episodes
#[derive(Debug, Clone)]
pub struct Level {
    pub terrain: Terrain,
    pub platforms: Vec<Platform>,
    pub spawns: Vec<Spawn>,
}

impl Level {
    /// Validate and assemble a level
    pub fn new(
        terrain: Terrain,
        platforms: Vec<Platform>,
        spawns: Vec<Spawn>,
    ) -> Result<Self, MayhemError> {
        let (w, h) = (terrain.width() as i32, terrain.height() as i32);

        for (index, p) in platforms.iter().enumerate() {
            let reason = if p.x_min > p.x_max {
                Some(format!("x_min {} is greater than x_max {}", p.x_min, p.x_max))
            } else if p.x_min < 0 || p.x_max >= w {
                Some(format!("x range {}..={} leaves the {}px map", p.x_min, p.x_max, w))
            } else if p.y_flat < 0 || p.y_flat >= h {
                Some(format!("y_flat {} leaves the {}px map", p.y_flat, h))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(MayhemError::InvalidPlatform { index, reason });
            }
        }

        if spawns.is_empty() {
            return Err(MayhemError::NoSpawnPoints);
        }
        for (index, s) in spawns.iter().enumerate() {
            if !terrain.in_bounds(s.x, s.y) {
                return Err(MayhemError::SpawnOutOfBounds {
                    index,
                    x: s.x,
                    y: s.y,
                });
            }
        }

        log::info!(
            "Level loaded: {}x{}, {} platforms, {} spawns",
            w,
            h,
            platforms.len(),
            spawns.len()
        );

        Ok(Self {
            terrain,
            platforms,
            spawns,
        })
    }

    pub fn from_descriptor(desc: LevelDescriptor) -> Result<Self, MayhemError> {
        let terrain = Terrain::from_rows(&desc.rows)?;
        Self::new(terrain, desc.platforms, desc.spawns)
    }

    pub fn from_json(json: &str) -> Result<Self, MayhemError> {
        let desc: LevelDescriptor = serde_json::from_str(json)?;
        Self::from_descriptor(desc)
    }

    /// Built-in cave used by the demo binary: a walled box with a floor
    /// ledge, a central pillar and four landing platforms.
    pub fn demo() -> Self {
        const W: i32 = 480;
        const H: i32 = 640;
        let mut mask = CoverageMask::new(W as usize, H as usize);
        let mut fill = |x0: i32, y0: i32, x1: i32, y1: i32| {
            for y in y0..y1 {
                for x in x0..x1 {
                    mask.set(x, y, true);
                }
            }
        };

        // Walls
        fill(0, 0, W, 8);
        fill(0, H - 8, W, H);
        fill(0, 0, 8, H);
        fill(W - 8, 0, W, H);
        // Pillar
        fill(220, 260, 260, 460);

        let platforms = vec![
            Platform::new(60, 140, 600),
            Platform::new(320, 420, 600),
            Platform::new(40, 120, 300),
            Platform::new(340, 440, 220),
        ];
        // Ledges under each platform
        for p in &platforms {
            fill(p.x_min, p.y_flat, p.x_max + 1, p.y_flat + 6);
        }

        let spawns = vec![
            Spawn::new(84, 500),
            Spawn::new(354, 500),
            Spawn::new(60, 150),
            Spawn::new(360, 120),
        ];

        // The layout above is fixed, so validation cannot fail
        Self {
            terrain: Terrain::new(mask),
            platforms,
            spawns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner_terrain() -> Terrain {
        Terrain::from_rows(&["#...", "....", "...."]).unwrap()
    }

    #[test]
    fn test_out_of_bounds_is_clear() {
        let t = corner_terrain();
        assert!(t.is_solid(0, 0));
        assert!(!t.is_solid(-1, 0));
        assert!(!t.is_solid(0, -1));
        assert!(!t.is_solid(4, 0));
        assert!(!t.is_solid(0, 3));
    }

    #[test]
    fn test_flip_variants() {
        let t = corner_terrain();
        assert!(t.is_solid_flipped(Flip { x: true, y: false }, 3, 0));
        assert!(t.is_solid_flipped(Flip { x: false, y: true }, 0, 2));
        assert!(t.is_solid_flipped(Flip { x: true, y: true }, 3, 2));
        let p = IVec2::new(1, 2);
        let flip = Flip { x: true, y: true };
        assert_eq!(t.flip_point(flip, t.flip_point(flip, p)), p);
    }

    #[test]
    fn test_flip_for_direction() {
        assert_eq!(Flip::for_direction(1.0, 0.0), Flip::NONE);
        assert_eq!(Flip::for_direction(-1.0, 0.5), Flip { x: true, y: false });
        assert_eq!(Flip::for_direction(0.2, -0.5), Flip { x: false, y: true });
    }

    #[test]
    fn test_landing_zone_offsets() {
        let zone = Platform::new(464, 513, 333).landing_zone();
        assert_eq!(zone.x_min, 455);
        assert_eq!(zone.x_max, 490);
        assert_eq!(zone.y_flat, 303);
        assert!(zone.spans(473));
        assert!(!zone.spans(491));
    }

    #[test]
    fn test_level_rejects_bad_platform() {
        let terrain = Terrain::from_rows(&["....", "...."]).unwrap();
        let err = Level::new(terrain, vec![Platform::new(3, 1, 1)], vec![Spawn::new(0, 0)])
            .unwrap_err();
        assert!(matches!(err, MayhemError::InvalidPlatform { index: 0, .. }));
    }

    #[test]
    fn test_level_rejects_missing_spawns() {
        let terrain = Terrain::from_rows(&["....", "...."]).unwrap();
        let err = Level::new(terrain, vec![], vec![]).unwrap_err();
        assert!(matches!(err, MayhemError::NoSpawnPoints));
    }

    #[test]
    fn test_level_rejects_spawn_outside() {
        let terrain = Terrain::from_rows(&["....", "...."]).unwrap();
        let err = Level::new(terrain, vec![], vec![Spawn::new(9, 0)]).unwrap_err();
        assert!(matches!(err, MayhemError::SpawnOutOfBounds { index: 0, x: 9, .. }));
    }

    #[test]
    fn test_level_from_json() {
        let json = r#"{
            "rows": ["....", "....", "XXXX"],
            "platforms": [{ "x_min": 0, "x_max": 3, "y_flat": 2 }],
            "spawns": [{ "x": 1, "y": 0 }]
        }"#;
        let level = Level::from_json(json).unwrap();
        assert_eq!(level.terrain.width(), 4);
        assert!(level.terrain.is_solid(2, 2));
        assert_eq!(level.platforms.len(), 1);
        assert_eq!(level.spawns[0].angle, 0.0);
    }

    #[test]
    fn test_demo_level_is_valid() {
        let demo = Level::demo();
        let rebuilt = Level::new(demo.terrain.clone(), demo.platforms.clone(), demo.spawns.clone());
        assert!(rebuilt.is_ok());
        // Spawns start in open air
        for s in &demo.spawns {
            assert!(!demo.terrain.is_solid(s.x + 16, s.y + 16));
        }
    }
}
