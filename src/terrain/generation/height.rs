// ============================================
// Height Map - Генерация карты высот
// ============================================
// Генератор - внешний коллаборатор воркеров: заполняет весь
// буфер (с ореолом) детерминированно по сектору и конфигу.

use crate::terrain::config::TerrainConfig;
use crate::terrain::lod::LodGrid;
use crate::terrain::sector::{Sector, SectorIndexer};

use super::noise::fbm2d;
use super::thread_local::with_erosion_context;

/// Генератор высот, вызывается из потоков-воркеров
pub trait TerrainGenerator: Send + Sync {
    /// Заполнить heightmap (grid.heightmap_len значений, включая ореол)
    fn generate_heightmap(&self, heightmap: &mut [f32], sector: Sector, grid: &LodGrid, config: &TerrainConfig);

    /// Эрозия поверх готовой heightmap
    fn erode(&self, _heightmap: &mut [f32], _sector: Sector, _grid: &LodGrid, _config: &TerrainConfig) {}
}

/// FBM-рельеф + термальная эрозия
#[derive(Clone, Copy, Debug, Default)]
pub struct NoiseTerrainGenerator;

impl NoiseTerrainGenerator {
    /// Высота в мировой точке (без эрозии)
    #[inline]
    pub fn height_at(world_x: f32, world_y: f32, config: &TerrainConfig) -> f32 {
        let params = &config.generation;
        let seed = params.seed as u32 ^ (params.seed >> 32) as u32;
        let f = params.base_frequency;
        fbm2d(world_x * f, world_y * f, params.octaves, seed) * params.height_scale
    }
}

impl TerrainGenerator for NoiseTerrainGenerator {
    fn generate_heightmap(&self, heightmap: &mut [f32], sector: Sector, grid: &LodGrid, config: &TerrainConfig) {
        let origin = SectorIndexer::new(config).tile_origin(sector);
        let cell = grid.cell_size(config);
        let stride = grid.heightmap_stride();

        for (idx, h) in heightmap.iter_mut().enumerate() {
            // Ореол: колонка/строка 0 лежит на шаг левее/ниже тайла
            let x = (idx % stride) as f32 - 1.0;
            let y = (idx / stride) as f32 - 1.0;
            *h = Self::height_at(origin.x + x * cell, origin.y + y * cell, config);
        }
    }

    fn erode(&self, heightmap: &mut [f32], _sector: Sector, grid: &LodGrid, config: &TerrainConfig) {
        let cell = grid.cell_size(config);
        with_erosion_context(|erosion| {
            erosion.apply(heightmap, grid.heightmap_stride(), cell, &config.generation)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TerrainConfig {
        TerrainConfig { tile_x_units: 8, tile_y_units: 8, unit_size: 10.0, ..TerrainConfig::default() }
    }

    #[test]
    fn test_heightmap_is_deterministic() {
        let cfg = config();
        let grid = LodGrid::new(&cfg, 0);
        let mut a = vec![0.0; grid.heightmap_len];
        let mut b = vec![0.0; grid.heightmap_len];

        NoiseTerrainGenerator.generate_heightmap(&mut a, Sector::new(2, -1), &grid, &cfg);
        NoiseTerrainGenerator.erode(&mut a, Sector::new(2, -1), &grid, &cfg);
        NoiseTerrainGenerator.generate_heightmap(&mut b, Sector::new(2, -1), &grid, &cfg);
        NoiseTerrainGenerator.erode(&mut b, Sector::new(2, -1), &grid, &cfg);

        assert_eq!(a, b);
    }

    #[test]
    fn test_adjacent_tiles_share_edge_heights() {
        let cfg = config();
        let grid = LodGrid::new(&cfg, 0);
        let mut left = vec![0.0; grid.heightmap_len];
        let mut right = vec![0.0; grid.heightmap_len];

        NoiseTerrainGenerator.generate_heightmap(&mut left, Sector::new(0, 0), &grid, &cfg);
        NoiseTerrainGenerator.generate_heightmap(&mut right, Sector::new(1, 0), &grid, &cfg);

        // Правый край левого тайла == левый край правого
        for y in 0..grid.column_length() {
            let a = left[grid.heightmap_index(grid.quads_x as usize, y)];
            let b = right[grid.heightmap_index(0, y)];
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_halo_is_filled() {
        let cfg = config();
        let grid = LodGrid::new(&cfg, 0);
        let mut heights = vec![f32::NAN; grid.heightmap_len];
        NoiseTerrainGenerator.generate_heightmap(&mut heights, Sector::new(0, 0), &grid, &cfg);
        assert!(heights.iter().all(|h| h.is_finite()));
    }
}
