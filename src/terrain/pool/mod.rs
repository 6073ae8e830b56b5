pub mod mesh_pool;
pub mod tile_pool;

pub use mesh_pool::{MeshDataPool, MeshLease};
pub use tile_pool::{TileHandle, TileId, TilePool, TileStatus, TILE_EXPIRY};
