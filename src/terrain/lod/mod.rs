pub mod levels;

pub use levels::LodGrid;
