// ============================================
// Terrain Config - Конфигурация террейна
// ============================================
// Data-Driven: конфиг читается из JSON, после set_terrain_config
// замораживается в Arc и раздаётся воркерам только на чтение

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::job::LOD_CANCELLED;
use super::sector::MAX_SECTOR_DISTANCE;

/// Встроенный конфиг по умолчанию
pub const DEFAULT_CONFIG_JSON: &str = include_str!("../../assets/terrain/default.json");

/// Описание одного уровня детализации
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodConfig {
    /// Делитель разрешения сетки (LOD 0 всегда в полном разрешении)
    pub resolution_divisor: u32,
    /// Радиус в секторах, в котором нужен этот LOD
    pub sector_distance: i32,
}

/// Параметры генератора высот и эрозии
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub seed: u64,
    /// Максимальная высота рельефа в мировых единицах
    pub height_scale: f32,
    /// Частота первой октавы (на мировую единицу)
    pub base_frequency: f32,
    pub octaves: u32,
    /// Проходов термальной эрозии (0 = выключено)
    pub erosion_iterations: u32,
    /// Допустимый перепад высот на один шаг сетки, в долях шага
    pub talus: f32,
    /// Доля излишка, переносимая за проход
    pub erosion_rate: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            height_scale: 120.0,
            base_frequency: 0.002,
            octaves: 5,
            erosion_iterations: 8,
            talus: 0.6,
            erosion_rate: 0.25,
        }
    }
}

/// Полная конфигурация менеджера террейна
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Клеток сетки по X в одном тайле
    pub tile_x_units: u32,
    /// Клеток сетки по Y в одном тайле
    pub tile_y_units: u32,
    /// Размер клетки в мировых единицах
    pub unit_size: f32,
    pub num_threads: usize,
    pub lods: Vec<LodConfig>,
    /// Сколько готовых мешей применяем за кадр
    pub mesh_updates_per_frame: u32,
    /// Буферов на каждый LOD
    pub mesh_data_pool_size: usize,
    /// Интервал обхода наблюдателей, секунды
    pub sweep_interval: f32,
    /// Ёмкость приватной очереди воркера
    pub worker_queue_capacity: usize,
    pub worker_shutdown_timeout_ms: u64,
    /// Глубина юбки под краем тайла
    pub skirt_depth: f32,
    pub generation: GenerationConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            tile_x_units: 64,
            tile_y_units: 64,
            unit_size: 100.0,
            num_threads: 2,
            lods: vec![LodConfig { resolution_divisor: 1, sector_distance: 3 }],
            mesh_updates_per_frame: 2,
            mesh_data_pool_size: 4,
            sweep_interval: 1.0,
            worker_queue_capacity: 2,
            worker_shutdown_timeout_ms: 500,
            skirt_depth: 8.0,
            generation: GenerationConfig::default(),
        }
    }
}

impl TerrainConfig {
    /// Загрузить конфиг из JSON строки (без валидации)
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Загрузить конфиг из файла
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Встроенный конфиг из assets/terrain/default.json
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(DEFAULT_CONFIG_JSON)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Проверка инвариантов, на которые опираются пулы и воркеры
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_x_units == 0 {
            return Err(ConfigError::invalid("tile_x_units", "must be positive"));
        }
        if self.tile_y_units == 0 {
            return Err(ConfigError::invalid("tile_y_units", "must be positive"));
        }
        if !(self.unit_size > 0.0) {
            return Err(ConfigError::invalid("unit_size", "must be positive"));
        }
        if self.num_threads == 0 {
            return Err(ConfigError::invalid("num_threads", "at least one worker is required"));
        }
        if self.lods.is_empty() {
            return Err(ConfigError::invalid("lods", "at least one LOD is required"));
        }
        if self.lods.len() > LOD_CANCELLED as usize {
            return Err(ConfigError::invalid(
                "lods",
                format!("at most {} LODs are supported", LOD_CANCELLED),
            ));
        }
        for (lod, desc) in self.lods.iter().enumerate() {
            if desc.resolution_divisor == 0 {
                return Err(ConfigError::invalid("lods.resolution_divisor", format!("LOD {} has zero divisor", lod)));
            }
            if lod > 0
                && (self.tile_x_units % desc.resolution_divisor != 0
                    || self.tile_y_units % desc.resolution_divisor != 0)
            {
                return Err(ConfigError::invalid(
                    "lods.resolution_divisor",
                    format!("LOD {} divisor {} does not divide the tile size", lod, desc.resolution_divisor),
                ));
            }
            if desc.sector_distance <= 0 {
                return Err(ConfigError::invalid("lods.sector_distance", format!("LOD {} radius must be positive", lod)));
            }
            if desc.sector_distance > MAX_SECTOR_DISTANCE {
                return Err(ConfigError::invalid(
                    "lods.sector_distance",
                    format!("LOD {} radius exceeds {}", lod, MAX_SECTOR_DISTANCE),
                ));
            }
        }
        if self.mesh_data_pool_size == 0 {
            return Err(ConfigError::invalid("mesh_data_pool_size", "must be positive"));
        }
        if !(self.sweep_interval > 0.0) {
            return Err(ConfigError::invalid("sweep_interval", "must be positive"));
        }
        if self.worker_queue_capacity == 0 {
            return Err(ConfigError::invalid("worker_queue_capacity", "must be positive"));
        }
        Ok(())
    }

    /// Размер тайла в мировых единицах (X, Y)
    #[inline]
    pub fn tile_world_size(&self) -> (f32, f32) {
        (
            self.tile_x_units as f32 * self.unit_size,
            self.tile_y_units as f32 * self.unit_size,
        )
    }

    pub fn worker_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_shutdown_timeout_ms)
    }
}
