//! Uniform spatial hash grid for broad-phase queries
//!
//! Movable entities are re-inserted every frame (clear + insert), bucketed
//! by `floor(pos / cell_size)`. Queries return a superset of candidates
//! (broad phase); `get_within_radius` narrows by exact center distance
//! minus combined radii. Converts collision and targeting from O(n*m) to
//! near O(n) for the clustered hundreds-of-enemies case.

use std::collections::HashMap;

use glam::Vec2;

use crate::consts::GRID_CELL_SIZE;

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: u32,
    pos: Vec2,
    radius: f32,
}

/// Spatial hash over entity ids. Rebuilt from scratch each frame; holds no
/// state between frames.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<Entry>>,
    /// Largest radius inserted since the last clear. Queries expand their
    /// bounding box by this so entities wider than a cell are still found.
    max_radius: f32,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(GRID_CELL_SIZE)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            max_radius: 0.0,
        }
    }

    #[inline]
    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Reset all buckets. Called once per frame before re-insertion.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.max_radius = 0.0;
    }

    /// Bucket an entity into the single cell containing its center.
    pub fn insert(&mut self, id: u32, pos: Vec2, radius: f32) {
        if !pos.is_finite() || radius < 0.0 {
            return;
        }
        let cell = self.cell_of(pos);
        self.cells.entry(cell).or_default().push(Entry { id, pos, radius });
        self.max_radius = self.max_radius.max(radius);
    }

    /// Broad phase: ids of all entities in cells overlapping the query's
    /// bounding box. A superset, not exact - callers narrow with distance
    /// checks. De-duplicated (single-cell insertion keeps ids unique, but
    /// the contract is a set either way).
    pub fn get_nearby(&self, point: Vec2, radius: f32) -> Vec<u32> {
        let reach = radius + self.max_radius;
        let (min_cx, min_cy) = self.cell_of(point - Vec2::splat(reach));
        let (max_cx, max_cy) = self.cell_of(point + Vec2::splat(reach));

        let mut out = Vec::new();
        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    out.extend(bucket.iter().map(|e| e.id));
                }
            }
        }
        out
    }

    /// Narrow phase: ids whose center-to-center distance minus combined
    /// radii is within `radius` of `point`.
    pub fn get_within_radius(&self, point: Vec2, radius: f32) -> Vec<u32> {
        let reach = radius + self.max_radius;
        let (min_cx, min_cy) = self.cell_of(point - Vec2::splat(reach));
        let (max_cx, max_cy) = self.cell_of(point + Vec2::splat(reach));

        let mut out = Vec::new();
        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    for e in bucket {
                        if point.distance(e.pos) - e.radius <= radius {
                            out.push(e.id);
                        }
                    }
                }
            }
        }
        out
    }
}
