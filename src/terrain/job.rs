// ============================================
// Mesh Job - Задача перестройки одного тайла
// ============================================

use std::time::Duration;

use super::pool::{MeshLease, TileId};
use super::sector::Sector;

/// LOD-маркер отменённой задачи, такие задачи не ставятся в очередь
pub const LOD_CANCELLED: u8 = 10;

/// Жизненный цикл задачи
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Created,
    /// В общей очереди координатора
    Pending,
    /// Отдана воркеру с данным индексом
    Dispatched(usize),
    /// Меш посчитан, ждёт применения
    Computed,
    Applied,
}

/// Время стадий генерации
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JobTimings {
    pub heightmap: Duration,
    pub erosion: Duration,
    pub mesh_build: Duration,
}

impl JobTimings {
    pub fn total(&self) -> Duration {
        self.heightmap + self.erosion + self.mesh_build
    }
}

/// Задача: какой тайл, какой сектор, какой LOD, и буферы под результат
#[derive(Debug)]
pub struct Job {
    pub tile: TileId,
    pub sector: Sector,
    pub lod: u8,
    /// Обновить существующий меш вместо создания секции
    pub in_place: bool,
    /// Арендуется при диспетчеризации, возвращается при применении
    pub mesh: Option<MeshLease>,
    pub timings: JobTimings,
    pub state: JobState,
}

impl Job {
    pub fn new(tile: TileId, sector: Sector, lod: u8, in_place: bool) -> Self {
        Self {
            tile,
            sector,
            lod,
            in_place,
            mesh: None,
            timings: JobTimings::default(),
            state: JobState::Created,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.lod == LOD_CANCELLED
    }
}
