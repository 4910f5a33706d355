//! Coverage masks for pixel-accurate overlap tests
//!
//! A mask is a boolean occupancy grid local to an entity's bounding box.
//! Overlap between two masks is an offset AND-reduction over the rectangle
//! the two boxes share.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::SHIP_SPRITE_SIZE;
use crate::error::MayhemError;

/// Boolean occupancy grid, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageMask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl CoverageMask {
    /// An empty (all clear) mask
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Build a mask from a row-major cell vector
    pub fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Result<Self, MayhemError> {
        if width == 0 || height == 0 {
            return Err(MayhemError::EmptyTerrain { width, height });
        }
        if cells.len() != width * height {
            return Err(MayhemError::TerrainSize {
                width,
                height,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a mask from text rows; `#` and `X` are solid, anything else is clear
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, MayhemError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        let mut cells = Vec::with_capacity(width * height);
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let actual = line.chars().count();
            if actual != width {
                return Err(MayhemError::RaggedRow {
                    row,
                    expected: width,
                    actual,
                });
            }
            cells.extend(line.chars().map(|c| c == '#' || c == 'X'));
        }
        Self::from_cells(width, height, cells)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether a point lies inside the grid
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Cell value; anything outside the grid is clear
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        self.contains(x, y) && self.cells[y as usize * self.width + x as usize]
    }

    /// Set a cell; writes outside the grid are ignored
    pub fn set(&mut self, x: i32, y: i32, value: bool) {
        if self.contains(x, y) {
            self.cells[y as usize * self.width + x as usize] = value;
        }
    }

    /// Number of set cells
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Iterate set cells in row-major order
    pub fn iter_set(&self) -> impl Iterator<Item = IVec2> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c)
            .map(move |(i, _)| IVec2::new((i % width) as i32, (i / width) as i32))
    }

    /// First cell set in both masks, with `other` placed at `offset` in this
    /// mask's coordinates. The returned point is in this mask's coordinates.
    pub fn overlap(&self, other: &CoverageMask, offset: IVec2) -> Option<IVec2> {
        let x0 = offset.x.max(0);
        let y0 = offset.y.max(0);
        let x1 = (offset.x + other.width as i32).min(self.width as i32);
        let y1 = (offset.y + other.height as i32).min(self.height as i32);

        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) && other.get(x - offset.x, y - offset.y) {
                    return Some(IVec2::new(x, y));
                }
            }
        }
        None
    }

    /// Whether the two masks share at least one cell at the given offset
    #[inline]
    pub fn overlaps(&self, other: &CoverageMask, offset: IVec2) -> bool {
        self.overlap(other, offset).is_some()
    }

    /// Mirror the grid along either axis
    pub fn flipped(&self, flip_x: bool, flip_y: bool) -> Self {
        let mut out = Self::new(self.width, self.height);
        let (w, h) = (self.width as i32, self.height as i32);
        for p in self.iter_set() {
            let x = if flip_x { w - 1 - p.x } else { p.x };
            let y = if flip_y { h - 1 - p.y } else { p.y };
            out.set(x, y, true);
        }
        out
    }

    /// Rotate counter-clockwise (on screen) by `angle_deg`, growing the box to
    /// fit the rotated corners.
    ///
    /// Returns the rotated mask and the offset of its top-left corner from the
    /// original box's top-left, so both share the same center.
    pub fn rotated(&self, angle_deg: f32) -> (Self, IVec2) {
        let rad = angle_deg.to_radians();
        let (sin, cos) = rad.sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);

        // Shave float noise so a quarter turn keeps its exact extent
        let new_w = ((w * cos.abs() + h * sin.abs()) - 1e-3).ceil().max(1.0) as usize;
        let new_h = ((w * sin.abs() + h * cos.abs()) - 1e-3).ceil().max(1.0) as usize;

        let mut out = Self::new(new_w, new_h);
        let (cx, cy) = (new_w as f32 / 2.0, new_h as f32 / 2.0);
        for dy in 0..new_h {
            for dx in 0..new_w {
                let u = dx as f32 + 0.5 - cx;
                let v = dy as f32 + 0.5 - cy;
                let sx = u * cos - v * sin + w / 2.0;
                let sy = u * sin + v * cos + h / 2.0;
                if self.get(sx.floor() as i32, sy.floor() as i32) {
                    out.cells[dy * new_w + dx] = true;
                }
            }
        }

        let offset = IVec2::new(
            (self.width as i32 - new_w as i32) / 2,
            (self.height as i32 - new_h as i32) / 2,
        );
        (out, offset)
    }

    /// Default lander silhouette: a nose cone over a body with two legs,
    /// filling the sprite box down to its second-to-last row.
    pub fn lander() -> Self {
        let size = SHIP_SPRITE_SIZE;
        let mut mask = Self::new(size as usize, size as usize);
        for y in 2..=21 {
            let half = 1 + (y - 2) / 3;
            for x in (16 - half)..=(15 + half) {
                mask.set(x, y, true);
            }
        }
        for y in 22..=25 {
            for x in 7..=24 {
                mask.set(x, y, true);
            }
        }
        for y in 26..=29 {
            for x in (5..=8).chain(23..=26) {
                mask.set(x, y, true);
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(w: usize, h: usize) -> CoverageMask {
        CoverageMask::from_cells(w, h, vec![true; w * h]).unwrap()
    }

    #[test]
    fn test_from_rows() {
        let mask = CoverageMask::from_rows(&["#..", ".X.", "..."]).unwrap();
        assert_eq!(mask.width(), 3);
        assert_eq!(mask.height(), 3);
        assert!(mask.get(0, 0));
        assert!(mask.get(1, 1));
        assert!(!mask.get(2, 2));
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn test_from_rows_ragged() {
        let err = CoverageMask::from_rows(&["###", "##"]).unwrap_err();
        assert!(matches!(err, MayhemError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn test_from_cells_size_mismatch() {
        let err = CoverageMask::from_cells(4, 4, vec![false; 15]).unwrap_err();
        assert!(matches!(err, MayhemError::TerrainSize { actual: 15, .. }));
    }

    #[test]
    fn test_out_of_bounds_is_clear() {
        let mask = block(4, 4);
        assert!(!mask.get(-1, 0));
        assert!(!mask.get(0, 4));
        assert!(mask.get(3, 3));
    }

    #[test]
    fn test_overlap_single_pixel() {
        let a = block(4, 4);
        let b = block(4, 4);
        // Corners touch on exactly one cell
        assert_eq!(a.overlap(&b, IVec2::new(3, 3)), Some(IVec2::new(3, 3)));
        assert!(!a.overlaps(&b, IVec2::new(4, 3)));
        assert!(a.overlaps(&b, IVec2::new(-3, -3)));
        assert!(!a.overlaps(&b, IVec2::new(-4, 0)));
    }

    #[test]
    fn test_overlap_respects_holes() {
        let ring = CoverageMask::from_rows(&["###", "#.#", "###"]).unwrap();
        let dot = block(1, 1);
        assert!(!ring.overlaps(&dot, IVec2::new(1, 1)));
        assert!(ring.overlaps(&dot, IVec2::new(0, 1)));
    }

    #[test]
    fn test_flipped() {
        let mask = CoverageMask::from_rows(&["#..", "...", "..."]).unwrap();
        assert!(mask.flipped(true, false).get(2, 0));
        assert!(mask.flipped(false, true).get(0, 2));
        assert!(mask.flipped(true, true).get(2, 2));
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let lander = CoverageMask::lander();
        let (rotated, offset) = lander.rotated(0.0);
        assert_eq!(offset, IVec2::ZERO);
        assert_eq!(rotated, lander);
    }

    #[test]
    fn test_rotate_quarter_turn_moves_nose_left() {
        let lander = CoverageMask::lander();
        let (rotated, offset) = lander.rotated(90.0);
        assert_eq!(offset, IVec2::ZERO);
        assert_eq!(rotated.width(), 32);
        // Nose tip was at the top center; counter-clockwise puts it on the left
        assert!(rotated.get(2, 15) || rotated.get(2, 16));
        assert!(!rotated.get(29, 15) && !rotated.get(29, 16));
    }

    #[test]
    fn test_rotate_diagonal_grows_box() {
        let lander = CoverageMask::lander();
        let (rotated, offset) = lander.rotated(45.0);
        assert_eq!(rotated.width(), 46);
        assert_eq!(offset, IVec2::new(-7, -7));
        // Roughly area-preserving
        let before = lander.count() as f32;
        let after = rotated.count() as f32;
        assert!((after - before).abs() / before < 0.15);
    }

    #[test]
    fn test_lander_bottom_row() {
        let lander = CoverageMask::lander();
        assert!(lander.get(5, 29));
        assert!((0..32).all(|x| !lander.get(x, 30) && !lander.get(x, 31)));
    }
}
