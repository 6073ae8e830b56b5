// ============================================
// Mesh Topology - Статические индексы и UV
// ============================================
// Считается один раз на LOD при конфигурации и копируется
// в каждый слот пула. Квад = два треугольника с единым обходом.

use crate::terrain::lod::LodGrid;

/// Раскладка вершин юбки после внутренней сетки:
/// нижний ряд, верхний ряд, левая колонка, правая колонка
#[derive(Clone, Copy, Debug)]
pub struct SkirtLayout {
    base: u32,
    row: u32,
    column: u32,
}

impl SkirtLayout {
    pub fn new(grid: &LodGrid) -> Self {
        Self {
            base: grid.grid_vertex_count() as u32,
            row: grid.row_length() as u32,
            column: grid.column_length() as u32,
        }
    }

    /// Юбка под вершиной (x, 0)
    #[inline]
    pub fn bottom(&self, x: u32) -> u32 {
        self.base + x
    }

    /// Юбка под вершиной (x, quads_y)
    #[inline]
    pub fn top(&self, x: u32) -> u32 {
        self.base + self.row + x
    }

    /// Юбка под вершиной (0, y)
    #[inline]
    pub fn left(&self, y: u32) -> u32 {
        self.base + 2 * self.row + y
    }

    /// Юбка под вершиной (quads_x, y)
    #[inline]
    pub fn right(&self, y: u32) -> u32 {
        self.base + 2 * self.row + self.column + y
    }

    /// Всего вершин юбки
    #[inline]
    pub fn vertex_count(&self) -> usize {
        (2 * self.row + 2 * self.column) as usize
    }
}

/// Индексы и UV одного LOD
#[derive(Clone, Debug, PartialEq)]
pub struct MeshTopology {
    pub triangles: Vec<u32>,
    /// UV для сетки и юбки (хвост буфера вершин не трогается)
    pub uvs: Vec<[f32; 2]>,
}

/// Квад (p00, p10, p01, p11) -> [p01, p10, p00] [p10, p01, p11]
#[inline]
fn push_quad(out: &mut Vec<u32>, p00: u32, p10: u32, p01: u32, p11: u32) {
    out.extend_from_slice(&[p01, p10, p00, p10, p01, p11]);
}

impl MeshTopology {
    pub fn build(grid: &LodGrid) -> Self {
        let row = grid.row_length() as u32;
        let qx = grid.quads_x;
        let qy = grid.quads_y;
        let uv_scale = grid.uv_scale();
        let skirt = SkirtLayout::new(grid);

        let mut triangles = Vec::with_capacity(grid.index_count);
        let mut uvs = vec![[0.0f32; 2]; grid.grid_vertex_count() + skirt.vertex_count()];

        // Внутренняя сетка
        for y in 0..qy {
            for x in 0..qx {
                let p00 = x + y * row;
                let p10 = (x + 1) + y * row;
                let p01 = x + (y + 1) * row;
                let p11 = (x + 1) + (y + 1) * row;
                push_quad(&mut triangles, p00, p10, p01, p11);
            }
        }
        for y in 0..=qy {
            for x in 0..=qx {
                uvs[(x + y * row) as usize] = [x as f32 * uv_scale, y as f32 * uv_scale];
            }
        }

        // Юбки: стенки смотрят наружу от тайла
        // -Y edge
        for x in 0..qx {
            push_quad(&mut triangles, skirt.bottom(x), skirt.bottom(x + 1), x, x + 1);
        }
        // +Y edge
        for x in 0..qx {
            let top = qy * row;
            push_quad(&mut triangles, skirt.top(x + 1), skirt.top(x), top + x + 1, top + x);
        }
        // -X edge
        for y in 0..qy {
            push_quad(&mut triangles, skirt.left(y + 1), skirt.left(y), (y + 1) * row, y * row);
        }
        // +X edge
        for y in 0..qy {
            push_quad(&mut triangles, skirt.right(y), skirt.right(y + 1), qx + y * row, qx + (y + 1) * row);
        }

        for x in 0..=qx {
            uvs[skirt.bottom(x) as usize] = uvs[x as usize];
            uvs[skirt.top(x) as usize] = uvs[(x + qy * row) as usize];
        }
        for y in 0..=qy {
            uvs[skirt.left(y) as usize] = uvs[(y * row) as usize];
            uvs[skirt.right(y) as usize] = uvs[(qx + y * row) as usize];
        }

        debug_assert_eq!(triangles.len(), grid.index_count);
        Self { triangles, uvs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::config::{LodConfig, TerrainConfig};

    fn config() -> TerrainConfig {
        TerrainConfig {
            tile_x_units: 4,
            tile_y_units: 3,
            unit_size: 1.0,
            lods: vec![
                LodConfig { resolution_divisor: 1, sector_distance: 3 },
                LodConfig { resolution_divisor: 1, sector_distance: 5 },
            ],
            ..TerrainConfig::default()
        }
    }

    /// Плоская позиция вершины для проверки обхода
    fn position(grid: &LodGrid, index: u32) -> [f32; 3] {
        let row = grid.row_length() as u32;
        let grid_count = grid.grid_vertex_count() as u32;
        if index < grid_count {
            return [(index % row) as f32, (index / row) as f32, 0.0];
        }
        let skirt = SkirtLayout::new(grid);
        for x in 0..=grid.quads_x {
            if skirt.bottom(x) == index { return [x as f32, 0.0, -1.0]; }
            if skirt.top(x) == index { return [x as f32, grid.quads_y as f32, -1.0]; }
        }
        for y in 0..=grid.quads_y {
            if skirt.left(y) == index { return [0.0, y as f32, -1.0]; }
            if skirt.right(y) == index { return [grid.quads_x as f32, y as f32, -1.0]; }
        }
        panic!("index {} outside of layout", index);
    }

    fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        [u[1] * v[2] - u[2] * v[1], u[2] * v[0] - u[0] * v[2], u[0] * v[1] - u[1] * v[0]]
    }

    #[test]
    fn test_first_quad_matches_fixed_winding() {
        let grid = LodGrid::new(&config(), 0);
        let topology = MeshTopology::build(&grid);
        // row = 5: TR=5, BL=1, BR=0 / BL=1, TR=5, TL=6
        assert_eq!(&topology.triangles[..6], &[5, 1, 0, 1, 5, 6]);
    }

    #[test]
    fn test_indices_stay_inside_vertex_buffer() {
        let grid = LodGrid::new(&config(), 0);
        let topology = MeshTopology::build(&grid);
        assert_eq!(topology.triangles.len(), grid.index_count);
        let used = grid.grid_vertex_count() + SkirtLayout::new(&grid).vertex_count();
        assert!(used <= grid.vertex_count);
        assert!(topology.triangles.iter().all(|&i| (i as usize) < used));
    }

    #[test]
    fn test_winding_is_consistent() {
        let grid = LodGrid::new(&config(), 0);
        let topology = MeshTopology::build(&grid);
        let interior = (grid.quads_x * grid.quads_y * 6) as usize;

        for tri in topology.triangles[..interior].chunks(3) {
            let n = face_normal(position(&grid, tri[0]), position(&grid, tri[1]), position(&grid, tri[2]));
            // Лицевая сторона сетки смотрит вверх при обходе по часовой
            assert!(n[2] < 0.0);
        }

        let center = [grid.quads_x as f32 * 0.5, grid.quads_y as f32 * 0.5];
        for tri in topology.triangles[interior..].chunks(3) {
            let a = position(&grid, tri[0]);
            let b = position(&grid, tri[1]);
            let c = position(&grid, tri[2]);
            let n = face_normal(a, b, c);
            let mid = [(a[0] + b[0] + c[0]) / 3.0 - center[0], (a[1] + b[1] + c[1]) / 3.0 - center[1]];
            // Юбка смотрит наружу: -n направлена от центра
            assert!(-(n[0] * mid[0] + n[1] * mid[1]) > 0.0);
        }
    }

    #[test]
    fn test_uv_scale_per_lod() {
        let cfg = config();
        let lod0 = MeshTopology::build(&LodGrid::new(&cfg, 0));
        assert_eq!(lod0.uvs[6], [1.0, 1.0]);

        let mut cfg2 = cfg.clone();
        cfg2.lods.push(LodConfig { resolution_divisor: 1, sector_distance: 7 });
        let lod2 = MeshTopology::build(&LodGrid::new(&cfg2, 2));
        assert_eq!(lod2.uvs[6], [0.5, 0.5]);
    }

    #[test]
    fn test_skirt_uvs_copy_edge() {
        let grid = LodGrid::new(&config(), 0);
        let topology = MeshTopology::build(&grid);
        let skirt = SkirtLayout::new(&grid);
        assert_eq!(topology.uvs[skirt.right(2) as usize], topology.uvs[(4 + 2 * 5) as usize]);
        assert_eq!(topology.uvs[skirt.top(1) as usize], topology.uvs[(1 + 3 * 5) as usize]);
    }

    #[test]
    fn test_topology_is_deterministic() {
        let grid = LodGrid::new(&config(), 1);
        let a = MeshTopology::build(&grid);
        let b = MeshTopology::build(&grid);
        let a_bytes: &[u8] = bytemuck::cast_slice(&a.triangles);
        let b_bytes: &[u8] = bytemuck::cast_slice(&b.triangles);
        assert_eq!(a_bytes, b_bytes);
        let a_uv: &[u8] = bytemuck::cast_slice(&a.uvs);
        let b_uv: &[u8] = bytemuck::cast_slice(&b.uvs);
        assert_eq!(a_uv, b_uv);
    }
}
