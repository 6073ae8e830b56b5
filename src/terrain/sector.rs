// ============================================
// Sector - Идентификатор тайла в сетке мира
// ============================================

use std::ops::Sub;

use ultraviolet::Vec3;

use super::config::TerrainConfig;

/// Сдвиг окна сканирования от корневого сектора.
/// Не зависит от радиуса: окно 3*radius начинается с root - 5.
pub const SECTOR_SCAN_OFFSET: i32 = 5;

/// Наибольший радиус обхода в секторах
pub const MAX_SECTOR_DISTANCE: i32 = 256;

/// Целочисленная координата сектора (x, y)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct Sector {
    pub x: i32,
    pub y: i32,
}

impl Sector {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Квадрат расстояния в секторах
    #[inline]
    pub fn distance_squared(self, other: Sector) -> i32 {
        let d = self - other;
        d.x * d.x + d.y * d.y
    }
}

impl Sub for Sector {
    type Output = Sector;

    fn sub(self, rhs: Sector) -> Sector {
        Sector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Перевод мировых координат в секторы
#[derive(Clone, Copy, Debug)]
pub struct SectorIndexer {
    tile_width: f32,
    tile_height: f32,
}

impl SectorIndexer {
    pub fn new(config: &TerrainConfig) -> Self {
        let (tile_width, tile_height) = config.tile_world_size();
        Self { tile_width, tile_height }
    }

    /// Сектор по мировой позиции.
    ///
    /// Позиция сначала усекается до целого, затем делится на размер тайла
    /// с усечением к нулю. Для отрицательных координат это НЕ floor:
    /// x = -50 при тайле 100 даёт сектор 0, а не -1.
    #[inline]
    pub fn sector_of(&self, position: Vec3) -> Sector {
        let x = (position.x as i32) as f32 / self.tile_width;
        let y = (position.y as i32) as f32 / self.tile_height;
        Sector::new(x as i32, y as i32)
    }

    /// Мировая позиция начала тайла сектора
    #[inline]
    pub fn tile_origin(&self, sector: Sector) -> Vec3 {
        Vec3::new(
            sector.x as f32 * self.tile_width,
            sector.y as f32 * self.tile_height,
            0.0,
        )
    }

    /// Секторы вокруг наблюдателя в круге радиуса `radius`.
    ///
    /// Сканирует квадрат 3*radius x 3*radius от root - SECTOR_SCAN_OFFSET
    /// по строкам (x снаружи, y внутри) и оставляет секторы с d² < radius².
    pub fn relevant_sectors(&self, position: Vec3, radius: i32) -> Vec<Sector> {
        let root = self.sector_of(position);
        let radius = radius.clamp(0, MAX_SECTOR_DISTANCE);
        let range2 = radius * radius;
        let window = radius * 3;

        let mut result = Vec::new();
        for x in 0..window {
            for y in 0..window {
                // Секторы за пределами i32 пропускаются
                let (Ok(sx), Ok(sy)) = (
                    i32::try_from(root.x as i64 - SECTOR_SCAN_OFFSET as i64 + x as i64),
                    i32::try_from(root.y as i64 - SECTOR_SCAN_OFFSET as i64 + y as i64),
                ) else {
                    continue;
                };
                let sector = Sector::new(sx, sy);
                if sector.distance_squared(root) < range2 {
                    result.push(sector);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer() -> SectorIndexer {
        let config = TerrainConfig {
            tile_x_units: 100,
            tile_y_units: 100,
            unit_size: 1.0,
            ..TerrainConfig::default()
        };
        SectorIndexer::new(&config)
    }

    #[test]
    fn test_sector_of_positive() {
        let idx = indexer();
        assert_eq!(idx.sector_of(Vec3::new(0.0, 0.0, 0.0)), Sector::new(0, 0));
        assert_eq!(idx.sector_of(Vec3::new(99.9, 100.0, 50.0)), Sector::new(0, 1));
        assert_eq!(idx.sector_of(Vec3::new(250.0, 399.0, 0.0)), Sector::new(2, 3));
    }

    #[test]
    fn test_sector_of_truncates_toward_zero() {
        let idx = indexer();
        // -50 / 100 -> 0, не -1
        assert_eq!(idx.sector_of(Vec3::new(-50.0, -99.0, 0.0)), Sector::new(0, 0));
        assert_eq!(idx.sector_of(Vec3::new(-100.0, -150.0, 0.0)), Sector::new(-1, -1));
        assert_eq!(idx.sector_of(Vec3::new(-250.0, 10.0, 0.0)), Sector::new(-2, 0));
    }

    #[test]
    fn test_tile_origin_matches_sector() {
        let idx = indexer();
        let origin = idx.tile_origin(Sector::new(3, -2));
        assert_eq!((origin.x, origin.y, origin.z), (300.0, -200.0, 0.0));
        assert_eq!(idx.sector_of(origin), Sector::new(3, -2));
    }

    #[test]
    fn test_relevant_sectors_radius_three() {
        let idx = indexer();
        let sectors = idx.relevant_sectors(Vec3::new(10.0, 10.0, 0.0), 3);

        // d² < 9 внутри окна [-5, 3] -> квадрат 5x5
        assert_eq!(sectors.len(), 25);
        for s in &sectors {
            assert!(s.distance_squared(Sector::new(0, 0)) < 9);
        }
        assert!(sectors.contains(&Sector::new(0, 0)));
        assert!(sectors.contains(&Sector::new(-2, 2)));
        // Порядок строк: x снаружи, y внутри
        assert_eq!(sectors[0], Sector::new(-2, -2));
        assert_eq!(sectors[1], Sector::new(-2, -1));
    }

    #[test]
    fn test_relevant_sectors_window_clips_large_radius() {
        let idx = indexer();
        // radius 8: окно x в [-5, 18], поэтому сектор -6 не попадает, хотя 36 < 64
        let sectors = idx.relevant_sectors(Vec3::new(0.0, 0.0, 0.0), 8);
        assert!(!sectors.contains(&Sector::new(-6, 0)));
        assert!(sectors.contains(&Sector::new(7, 0)));
        assert!(sectors.contains(&Sector::new(-5, 0)));
        assert!(sectors.iter().all(|s| s.x >= -5 && s.y >= -5));
        assert!(sectors.iter().all(|s| s.distance_squared(Sector::new(0, 0)) < 64));
    }

    #[test]
    fn test_relevant_sectors_have_no_duplicates() {
        let idx = indexer();
        let mut sectors = idx.relevant_sectors(Vec3::new(-340.0, 720.0, 0.0), 4);
        let count = sectors.len();
        sectors.sort();
        sectors.dedup();
        assert_eq!(sectors.len(), count);
    }

    #[test]
    fn test_relevant_sectors_at_i32_limits() {
        let config = TerrainConfig { tile_x_units: 1, tile_y_units: 1, unit_size: 1.0, ..TerrainConfig::default() };
        let idx = SectorIndexer::new(&config);

        // x насыщается до i32::MAX: правее корня секторов нет
        let high = idx.relevant_sectors(Vec3::new(3.0e9, 0.0, 0.0), 3);
        assert!(!high.is_empty());
        assert!(high.iter().all(|s| s.x >= i32::MAX - 2));
        assert!(high.contains(&Sector::new(i32::MAX, 0)));
        assert!(high.contains(&Sector::new(i32::MAX - 2, 0)));

        // Окно начинается ниже i32::MIN: остаётся четверть круга
        let low = idx.relevant_sectors(Vec3::new(-3.0e9, -3.0e9, 0.0), 3);
        let root = Sector::new(i32::MIN, i32::MIN);
        assert!(low.contains(&root));
        assert!(low.iter().all(|s| s.x <= i32::MIN + 2 && s.y <= i32::MIN + 2));
        assert!(low.iter().all(|s| s.distance_squared(root) < 9));
    }

    #[test]
    fn test_relevant_sectors_clamps_radius() {
        let idx = indexer();
        let huge = idx.relevant_sectors(Vec3::zero(), i32::MAX);
        let capped = idx.relevant_sectors(Vec3::zero(), MAX_SECTOR_DISTANCE);
        assert_eq!(huge, capped);
    }
}
