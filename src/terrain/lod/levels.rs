// ============================================
// LOD Levels - Размеры сетки по уровню детализации
// ============================================

use crate::terrain::config::TerrainConfig;

/// Геометрия сетки одного LOD и размеры его буферов
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodGrid {
    pub lod: u8,
    /// Квадов по X / Y
    pub quads_x: u32,
    pub quads_y: u32,
    /// Шаг сетки в клетках тайла (1 для LOD 0)
    pub divisor: u32,
    /// Вершин на буфер (одинаково считается от полного разрешения тайла)
    pub vertex_count: usize,
    /// Индексов треугольников: сетка + юбки
    pub index_count: usize,
    /// Размер heightmap с ореолом в одну клетку
    pub heightmap_len: usize,
}

impl LodGrid {
    pub fn new(config: &TerrainConfig, lod: u8) -> Self {
        // LOD 0 всегда полное разрешение, делитель игнорируется
        let divisor = if lod == 0 {
            1
        } else {
            config.lods[lod as usize].resolution_divisor
        };
        let quads_x = config.tile_x_units / divisor;
        let quads_y = config.tile_y_units / divisor;

        let row_x = quads_x as usize + 1;
        let row_y = quads_y as usize + 1;

        let vertex_count = row_x * row_y
            + 2 * config.tile_x_units as usize
            + 2 * config.tile_y_units as usize
            + 4;

        let terrain_indices = quads_x as usize * quads_y as usize * 6;
        let skirt_indices = (2 * quads_x as usize + 2 * quads_y as usize) * 6;

        Self {
            lod,
            quads_x,
            quads_y,
            divisor,
            vertex_count,
            index_count: terrain_indices + skirt_indices,
            heightmap_len: (row_x + 2) * (row_y + 2),
        }
    }

    /// Все LOD из конфига
    pub fn all(config: &TerrainConfig) -> Vec<LodGrid> {
        (0..config.lods.len() as u8).map(|lod| Self::new(config, lod)).collect()
    }

    /// Вершин в строке сетки
    #[inline]
    pub fn row_length(&self) -> usize {
        self.quads_x as usize + 1
    }

    #[inline]
    pub fn column_length(&self) -> usize {
        self.quads_y as usize + 1
    }

    /// Вершин внутренней сетки (без юбок)
    #[inline]
    pub fn grid_vertex_count(&self) -> usize {
        self.row_length() * self.column_length()
    }

    /// Ширина строки heightmap с ореолом
    #[inline]
    pub fn heightmap_stride(&self) -> usize {
        self.row_length() + 2
    }

    /// Индекс в heightmap для вершины сетки (x, y); ореол сдвигает на 1
    #[inline]
    pub fn heightmap_index(&self, x: usize, y: usize) -> usize {
        (y + 1) * self.heightmap_stride() + (x + 1)
    }

    /// Масштаб UV: 1 для LOD 0, иначе 1/lod
    #[inline]
    pub fn uv_scale(&self) -> f32 {
        if self.lod == 0 { 1.0 } else { 1.0 / self.lod as f32 }
    }

    /// Шаг сетки в мировых единицах
    #[inline]
    pub fn cell_size(&self, config: &TerrainConfig) -> f32 {
        self.divisor as f32 * config.unit_size
    }
}
