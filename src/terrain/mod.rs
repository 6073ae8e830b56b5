// ============================================
// Terrain Module - Стриминг тайлов террейна
// ============================================

pub mod config;
pub mod error;
pub mod sector;
pub mod lod;
pub mod mesh;
pub mod pool;
pub mod generation;
pub mod job;
pub mod worker;
pub mod host;
pub mod diagnostics;
pub mod headless;
pub mod manager;

// Re-exports
pub use config::{TerrainConfig, LodConfig, GenerationConfig};
pub use error::{TerrainError, ConfigError, PoolError};
pub use sector::{Sector, SectorIndexer};
pub use lod::LodGrid;
pub use mesh::{MeshData, VertexColor};
pub use pool::{MeshDataPool, MeshLease, TileId, TileHandle, TileStatus};
pub use generation::{TerrainGenerator, NoiseTerrainGenerator};
pub use job::{Job, JobState, JobTimings, LOD_CANCELLED};
pub use host::{World, TerrainTile, Observer, Clock, SystemClock};
pub use diagnostics::{DiagnosticsSink, Metric, NullDiagnostics, LogDiagnostics};
pub use headless::{HeadlessWorld, HeadlessTile, HeadlessPawn, ManualClock, RecordingDiagnostics};
pub use manager::{TerrainManager, ManagerStats, LodPoolStats, PawnId};
