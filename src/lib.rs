// ============================================
// Terrain Stream - Стриминг тайлов террейна
// ============================================
// Координатор на одном потоке + N фоновых воркеров,
// пулы тайлов и mesh-буферов без аллокаций в рантайме

pub mod terrain;

pub use terrain::{
    TerrainConfig, TerrainManager, TerrainError, Sector, SectorIndexer,
    HeadlessWorld, HeadlessTile, HeadlessPawn,
};
