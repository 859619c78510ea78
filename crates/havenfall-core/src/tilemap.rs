//! Tile map — terrain generation, moisture, resources, temperature,
//! nearest-tile queries and the fixed food-spawning hotspots.

use havenfall_logic::climate;
use havenfall_logic::constants::WORLD_SIZE;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Water,
    Grass,
    Forest,
    Fertile,
    Rock,
}

/// One grid cell. Created once at generation, mutated in place by
/// harvesting, disasters, and moisture decay; never destroyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    /// Clamped to [0, 1] at every mutation site. Water stays at 1.
    pub moisture: f32,
    /// Harvestable wood/stone units; water tiles never hold any.
    pub resource: f32,
}

impl Tile {
    pub fn add_moisture(&mut self, amount: f32) {
        self.moisture = (self.moisture + amount).clamp(0.0, 1.0);
    }
}

/// Fixed-size square grid plus the read-only scalar fields generated with
/// it (base temperature, elevation, ground noise).
pub struct TileMap {
    tiles: Vec<Tile>,
    base_temp: Vec<f32>,
    elevation: Vec<f32>,
    ground_noise: Vec<f32>,
    /// Precomputed fertile spawn hubs; filled lazily on first use.
    hotspots: Option<Vec<(usize, usize)>>,
}

impl TileMap {
    pub const SIZE: usize = WORLD_SIZE;

    /// Generate the world. Runs exactly once per map.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let n = Self::SIZE;
        let mut tiles = Vec::with_capacity(n * n);
        let mut base_temp = vec![0.0; n * n];
        let mut elevation = vec![0.0; n * n];
        let mut ground_noise = vec![0.0; n * n];

        let seed_x: f32 = rng.gen::<f32>() * 1000.0;
        let seed_y: f32 = rng.gen::<f32>() * 1000.0;

        for y in 0..n {
            for x in 0..n {
                let fx = x as f32;
                let fy = y as f32;
                let elev_noise = 0.5
                    + 0.3 * (fx * 0.18).sin() * (fy * 0.14).cos()
                    + (rng.gen::<f32>() - 0.5) * 0.12;
                let elev = elev_noise.clamp(0.0, 1.0);
                elevation[idx(x, y)] = elev;
                ground_noise[idx(x, y)] = rng.gen();

                // Land height: radial falloff from the center, low-frequency
                // ridges, and a little noise.
                let nx = fx / n as f32 - 0.5;
                let ny = fy / n as f32 - 0.5;
                let radial = 1.0 - (nx * nx + ny * ny).sqrt() * 1.2;
                let ridge =
                    ((fx + seed_x) * 0.12).sin() * 0.15 + ((fy + seed_y) * 0.1).sin() * 0.15;
                let height =
                    radial * 0.7 + ridge + elev * 0.2 + (rng.gen::<f32>() - 0.5) * 0.08;

                let kind = if height < 0.18 {
                    TileKind::Water
                } else if height < 0.26 {
                    if rng.gen::<f32>() < 0.6 {
                        TileKind::Water
                    } else {
                        TileKind::Rock
                    }
                } else if height < 0.38 {
                    TileKind::Fertile
                } else if height < 0.6 {
                    TileKind::Forest
                } else {
                    TileKind::Grass
                };

                let moisture = if kind == TileKind::Water {
                    1.0
                } else {
                    0.45 + rng.gen::<f32>() * 0.25
                };
                let resource = match kind {
                    TileKind::Forest | TileKind::Rock => 3.0 + rng.gen::<f32>() * 2.0,
                    _ => 0.0,
                };
                tiles.push(Tile {
                    kind,
                    moisture,
                    resource,
                });
            }
        }

        // Latitude-like base temperature band plus noise.
        for y in 0..n {
            for x in 0..n {
                let base = 15.0 + 10.0 * ((y as f32 / n as f32) * std::f32::consts::PI).sin();
                base_temp[idx(x, y)] = base + (rng.gen::<f32>() - 0.5) * 4.0;
            }
        }

        Self {
            tiles,
            base_temp,
            elevation,
            ground_noise,
            hotspots: None,
        }
    }

    /// Tile under a world-space point, or `None` outside the grid.
    pub fn tile_at(&self, x: f32, y: f32) -> Option<&Tile> {
        let (tx, ty) = floor_coords(x, y)?;
        Some(&self.tiles[idx(tx, ty)])
    }

    pub fn tile_at_mut(&mut self, x: f32, y: f32) -> Option<&mut Tile> {
        let (tx, ty) = floor_coords(x, y)?;
        Some(&mut self.tiles[idx(tx, ty)])
    }

    pub fn tile(&self, tx: usize, ty: usize) -> &Tile {
        &self.tiles[idx(tx, ty)]
    }

    pub fn tile_mut(&mut self, tx: usize, ty: usize) -> &mut Tile {
        &mut self.tiles[idx(tx, ty)]
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn ground_noise(&self, tx: usize, ty: usize) -> f32 {
        self.ground_noise[idx(tx, ty)]
    }

    pub fn elevation(&self, tx: usize, ty: usize) -> f32 {
        self.elevation[idx(tx, ty)]
    }

    /// Instantaneous temperature at a tile for the given month.
    pub fn temperature(&self, tx: usize, ty: usize, month: u32) -> f32 {
        let i = idx(tx.min(Self::SIZE - 1), ty.min(Self::SIZE - 1));
        climate::tile_temperature(self.base_temp[i], month, self.elevation[i])
    }

    /// Decay moisture on every non-water tile. Called once per tick.
    pub fn decay_moisture(&mut self, dt: f32) {
        for tile in &mut self.tiles {
            if tile.kind != TileKind::Water {
                tile.moisture = (tile.moisture - dt * 0.02).clamp(0.0, 1.0);
            }
        }
    }

    /// Center of the Euclidean-nearest tile of `kind`, by linear scan.
    /// O(grid area); callers throttle with probabilistic gating.
    pub fn nearest_of_kind(&self, from_x: f32, from_y: f32, kind: TileKind) -> Option<(f32, f32)> {
        let mut best = None;
        let mut best_dist = f32::INFINITY;
        for y in 0..Self::SIZE {
            for x in 0..Self::SIZE {
                if self.tiles[idx(x, y)].kind != kind {
                    continue;
                }
                let cx = x as f32 + 0.5;
                let cy = y as f32 + 0.5;
                let d = (cx - from_x).hypot(cy - from_y);
                if d < best_dist {
                    best = Some((cx, cy));
                    best_dist = d;
                }
            }
        }
        best
    }

    /// Is the tile a non-water tile with a 4-adjacent water neighbor?
    pub fn is_shore(&self, tx: usize, ty: usize) -> bool {
        if self.tiles[idx(tx, ty)].kind == TileKind::Water {
            return false;
        }
        let n = Self::SIZE as i64;
        [(1i64, 0i64), (-1, 0), (0, 1), (0, -1)].iter().any(|&(dx, dy)| {
            let nx = tx as i64 + dx;
            let ny = ty as i64 + dy;
            nx >= 0
                && ny >= 0
                && nx < n
                && ny < n
                && self.tiles[idx(nx as usize, ny as usize)].kind == TileKind::Water
        })
    }

    /// Center of the nearest shoreline tile, by linear scan.
    pub fn nearest_shore(&self, from_x: f32, from_y: f32) -> Option<(f32, f32)> {
        let mut best = None;
        let mut best_dist = f32::INFINITY;
        for y in 0..Self::SIZE {
            for x in 0..Self::SIZE {
                if !self.is_shore(x, y) {
                    continue;
                }
                let cx = x as f32 + 0.5;
                let cy = y as f32 + 0.5;
                let d = (cx - from_x).hypot(cy - from_y);
                if d < best_dist {
                    best = Some((cx, cy));
                    best_dist = d;
                }
            }
        }
        best
    }

    /// Any water tile within `radius` of the point, probing the
    /// 8-neighborhood offsets.
    pub fn has_water_neighbor(&self, x: f32, y: f32, radius: f32) -> bool {
        let r = radius;
        let offsets = [
            (0.0, 0.0),
            (r, 0.0),
            (-r, 0.0),
            (0.0, r),
            (0.0, -r),
            (r, r),
            (r, -r),
            (-r, r),
            (-r, -r),
        ];
        offsets.iter().any(|&(dx, dy)| {
            matches!(self.tile_at(x + dx, y + dy), Some(t) if t.kind == TileKind::Water)
        })
    }

    /// The fixed set of fertile, moist spawn hubs: scored by moisture plus
    /// ground noise, ranked, mutually > 6 tiles apart, 3-7 of them.
    /// Computed once and cached.
    pub fn hotspots(&mut self) -> &[(usize, usize)] {
        if self.hotspots.is_none() {
            let mut candidates: Vec<(usize, usize, f32)> = Vec::new();
            for y in 0..Self::SIZE {
                for x in 0..Self::SIZE {
                    let t = &self.tiles[idx(x, y)];
                    if t.kind != TileKind::Fertile || t.moisture < 0.5 {
                        continue;
                    }
                    candidates.push((x, y, t.moisture + self.ground_noise[idx(x, y)] * 0.3));
                }
            }
            candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
            let pick_count = (Self::SIZE / 14).clamp(3, 7);
            let mut picked: Vec<(usize, usize)> = Vec::new();
            for (x, y, _) in candidates {
                if picked.len() >= pick_count {
                    break;
                }
                let far_enough = picked.iter().all(|&(hx, hy)| {
                    (hx as f32 - x as f32).hypot(hy as f32 - y as f32) > 6.0
                });
                if far_enough {
                    picked.push((x, y));
                }
            }
            self.hotspots = Some(picked);
        }
        self.hotspots.as_deref().unwrap_or(&[])
    }
}

fn idx(x: usize, y: usize) -> usize {
    y * TileMap::SIZE + x
}

fn floor_coords(x: f32, y: f32) -> Option<(usize, usize)> {
    let tx = x.floor();
    let ty = y.floor();
    if tx < 0.0 || ty < 0.0 || tx >= TileMap::SIZE as f32 || ty >= TileMap::SIZE as f32 {
        return None;
    }
    Some((tx as usize, ty as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn map() -> TileMap {
        TileMap::generate(&mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_generation_invariants() {
        let map = map();
        for tile in map.tiles() {
            assert!((0.0..=1.0).contains(&tile.moisture));
            if tile.kind == TileKind::Water {
                assert_eq!(tile.resource, 0.0, "water tiles never hold resource");
                assert_eq!(tile.moisture, 1.0);
            }
            if matches!(tile.kind, TileKind::Forest | TileKind::Rock) {
                assert!((3.0..=5.0).contains(&tile.resource));
            }
        }
    }

    #[test]
    fn test_bounds_checks() {
        let map = map();
        assert!(map.tile_at(-0.1, 5.0).is_none());
        assert!(map.tile_at(5.0, TileMap::SIZE as f32).is_none());
        assert!(map.tile_at(0.0, 0.0).is_some());
        assert!(map.tile_at(TileMap::SIZE as f32 - 0.01, 0.5).is_some());
    }

    #[test]
    fn test_moisture_decay_clamps_at_zero() {
        let mut map = map();
        for _ in 0..1000 {
            map.decay_moisture(0.12);
        }
        for tile in map.tiles() {
            assert!(tile.moisture >= 0.0);
            if tile.kind == TileKind::Water {
                assert_eq!(tile.moisture, 1.0, "water never dries out");
            }
        }
    }

    #[test]
    fn test_nearest_of_kind_finds_closest() {
        let mut map = map();
        // Force a known layout: two forests on an otherwise bare map.
        for y in 0..TileMap::SIZE {
            for x in 0..TileMap::SIZE {
                map.tile_mut(x, y).kind = TileKind::Grass;
            }
        }
        map.tile_mut(10, 10).kind = TileKind::Forest;
        map.tile_mut(20, 20).kind = TileKind::Forest;
        let (x, y) = map.nearest_of_kind(10.6, 10.4, TileKind::Forest).unwrap();
        assert_eq!((x, y), (10.5, 10.5));
    }

    #[test]
    fn test_nearest_of_kind_none_when_absent() {
        let mut map = map();
        for tile in 0..(TileMap::SIZE * TileMap::SIZE) {
            let (x, y) = (tile % TileMap::SIZE, tile / TileMap::SIZE);
            map.tile_mut(x, y).kind = TileKind::Grass;
        }
        assert!(map.nearest_of_kind(5.0, 5.0, TileKind::Rock).is_none());
    }

    #[test]
    fn test_shore_detection() {
        let mut map = map();
        for y in 0..TileMap::SIZE {
            for x in 0..TileMap::SIZE {
                map.tile_mut(x, y).kind = TileKind::Grass;
            }
        }
        map.tile_mut(10, 10).kind = TileKind::Water;
        assert!(map.is_shore(10, 11));
        assert!(map.is_shore(9, 10));
        assert!(!map.is_shore(10, 10), "water itself is not shore");
        assert!(!map.is_shore(20, 20));
        let (sx, sy) = map.nearest_shore(12.5, 10.5).unwrap();
        assert_eq!((sx, sy), (11.5, 10.5));
    }

    #[test]
    fn test_hotspots_spacing_and_count() {
        let mut map = map();
        let hubs: Vec<_> = map.hotspots().to_vec();
        assert!(hubs.len() <= 7);
        for (i, &(ax, ay)) in hubs.iter().enumerate() {
            for &(bx, by) in hubs.iter().skip(i + 1) {
                let d = (ax as f32 - bx as f32).hypot(ay as f32 - by as f32);
                assert!(d > 6.0, "hotspots too close: {d}");
            }
        }
        // Cached: second call returns the same set.
        assert_eq!(map.hotspots().to_vec(), hubs);
    }

    #[test]
    fn test_temperature_season_swing() {
        let map = map();
        let winter = map.temperature(24, 24, 1);
        let summer = map.temperature(24, 24, 7);
        assert!(winter < summer);
        assert!((summer - winter - 16.0).abs() < 0.01);
    }
}
