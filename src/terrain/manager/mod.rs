pub mod manager;
pub mod tick;
pub mod types;

pub use manager::TerrainManager;
pub use types::{LodPoolStats, ManagerStats, PawnId};
