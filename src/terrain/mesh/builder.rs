// ============================================
// Mesh Builder - Вершины из heightmap
// ============================================
// Выполняется в воркере поверх заимствованного MeshData.
// Топология уже лежит в слоте, здесь пишутся только позиции,
// нормали, тангенты и цвета (сетка + юбки).

use ultraviolet::Vec3;

use crate::terrain::config::TerrainConfig;
use crate::terrain::generation::terrain_color;
use crate::terrain::lod::LodGrid;
use super::data::MeshData;
use super::topology::SkirtLayout;

#[inline]
fn to_array(v: Vec3) -> [f32; 3] {
    [v.x, v.y, v.z]
}

/// Заполнить вершинные буферы по уже сгенерированной heightmap
pub fn build_mesh(data: &mut MeshData, grid: &LodGrid, config: &TerrainConfig) {
    let cell = grid.cell_size(config);
    let row = grid.row_length();
    let stride = grid.heightmap_stride();
    let height_scale = config.generation.height_scale.max(f32::EPSILON);

    for y in 0..grid.column_length() {
        for x in 0..row {
            let hi = grid.heightmap_index(x, y);
            let h = data.heightmap[hi];
            // Ореол гарантирует соседей даже на краю
            let h_left = data.heightmap[hi - 1];
            let h_right = data.heightmap[hi + 1];
            let h_down = data.heightmap[hi - stride];
            let h_up = data.heightmap[hi + stride];

            let normal = Vec3::new(h_left - h_right, h_down - h_up, 2.0 * cell).normalized();
            let tangent = Vec3::new(2.0 * cell, 0.0, h_right - h_left).normalized();
            let slope = 1.0 - normal.z;

            let vi = x + y * row;
            data.vertices[vi] = [x as f32 * cell, y as f32 * cell, h];
            data.normals[vi] = to_array(normal);
            data.tangents[vi] = to_array(tangent);
            data.colors[vi] = terrain_color(h / height_scale, slope);
        }
    }

    build_skirts(data, grid, config.skirt_depth);
}

/// Юбка: копия краевой вершины, опущенная на `depth`
fn build_skirts(data: &mut MeshData, grid: &LodGrid, depth: f32) {
    let skirt = SkirtLayout::new(grid);
    let row = grid.row_length() as u32;
    let qx = grid.quads_x;
    let qy = grid.quads_y;

    let mut pairs = Vec::with_capacity(skirt.vertex_count());
    for x in 0..=qx {
        pairs.push((x, skirt.bottom(x)));
        pairs.push((x + qy * row, skirt.top(x)));
    }
    for y in 0..=qy {
        pairs.push((y * row, skirt.left(y)));
        pairs.push((qx + y * row, skirt.right(y)));
    }

    for (edge, skirt_index) in pairs {
        let (edge, skirt_index) = (edge as usize, skirt_index as usize);
        let [px, py, pz] = data.vertices[edge];
        data.vertices[skirt_index] = [px, py, pz - depth];
        data.normals[skirt_index] = data.normals[edge];
        data.tangents[skirt_index] = data.tangents[edge];
        data.colors[skirt_index] = data.colors[edge];
    }
}
