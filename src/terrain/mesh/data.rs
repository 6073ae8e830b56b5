// ============================================
// Mesh Data - Преаллоцированные буферы меша
// ============================================
//
// Принцип "Alloc Once, Reuse Forever": буферы создаются один раз
// при конфигурации и никогда не меняют размер. Топология
// (индексы и UV) заполняется сразу, per-job меняются только
// позиции, нормали, тангенты, цвета и heightmap.

use crate::terrain::lod::LodGrid;
use super::topology::MeshTopology;

/// Цвет вершины RGBA8
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl VertexColor {
    pub const BLACK: VertexColor = VertexColor { r: 0, g: 0, b: 0, a: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Набор буферов одного слота пула
#[derive(Clone, Debug)]
pub struct MeshData {
    pub vertices: Vec<[f32; 3]>,
    pub triangles: Vec<u32>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<VertexColor>,
    pub tangents: Vec<[f32; 3]>,
    /// Высоты с ореолом в одну клетку по периметру
    pub heightmap: Vec<f32>,
}

impl MeshData {
    /// Выделить буферы под LOD и скопировать в них статическую топологию
    pub fn allocate(grid: &LodGrid, topology: &MeshTopology) -> Self {
        let n = grid.vertex_count;

        let mut uvs = vec![[0.0f32; 2]; n];
        uvs[..topology.uvs.len()].copy_from_slice(&topology.uvs);

        Self {
            vertices: vec![[0.0; 3]; n],
            triangles: topology.triangles.clone(),
            normals: vec![[0.0, 0.0, 1.0]; n],
            uvs,
            colors: vec![VertexColor::BLACK; n],
            tangents: vec![[0.0; 3]; n],
            heightmap: vec![0.0; grid.heightmap_len],
        }
    }

    /// Байтовое представление позиций для загрузки на GPU
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }
}
