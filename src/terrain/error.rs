// ============================================
// Terrain Errors - Ошибки конфигурации и пулов
// ============================================

use thiserror::Error;

/// Ошибки загрузки/валидации конфигурации
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { field, reason: reason.into() }
    }
}

/// Ошибки возврата mesh-буфера в пул
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Аренда выдана пулом, который уже пересоздан
    #[error("lease belongs to pool epoch {lease}, current epoch is {current}")]
    StaleEpoch { lease: u64, current: u64 },

    #[error("LOD {0} has no mesh data pool")]
    UnknownLod(u8),

    /// Слот свободен или поколение не совпадает (двойной release)
    #[error("slot {slot} of LOD {lod} is not leased with generation {generation}")]
    NotLeased { lod: u8, slot: usize, generation: u32 },
}

/// Ошибки менеджера террейна
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("failed to spawn terrain worker thread: {0}")]
    WorkerSpawn(std::io::Error),

    /// Конфиг нельзя менять после регистрации наблюдателей
    #[error("terrain config cannot change while observers are tracked")]
    ConfigLocked,
}
