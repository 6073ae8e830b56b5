pub mod noise;
pub mod erosion;
pub mod height;
pub mod color;
pub mod thread_local;

pub use height::{TerrainGenerator, NoiseTerrainGenerator};
pub use erosion::ThermalErosion;
pub use color::terrain_color;
pub use noise::{fbm2d, noise2d, hash2d};
