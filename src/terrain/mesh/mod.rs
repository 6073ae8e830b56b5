// ============================================
// Mesh Module - Буферы, топология, сборка
// ============================================

pub mod data;
pub mod topology;
pub mod builder;

pub use data::{MeshData, VertexColor};
pub use topology::{MeshTopology, SkirtLayout};
pub use builder::build_mesh;
