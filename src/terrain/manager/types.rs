use std::sync::Arc;

use crate::terrain::host::Observer;
use crate::terrain::sector::Sector;

/// Идентификатор отслеживаемого наблюдателя
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PawnId(pub(crate) u64);

/// Наблюдатель + последний известный сектор
pub(crate) struct TrackedPawn {
    pub id: PawnId,
    pub observer: Arc<dyn Observer>,
    pub sector: Sector,
}

/// Загрузка пула mesh-данных одного LOD
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LodPoolStats {
    pub free: usize,
    pub in_use: usize,
}

/// Снимок состояния менеджера
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManagerStats {
    pub live_tiles: usize,
    pub free_tiles: usize,
    pub spawned_tiles: usize,
    pub pending_jobs: usize,
    /// Тайлы с задачей в полёте (очередь, воркер или ожидание применения)
    pub queued_tiles: usize,
    pub mesh_pools: Vec<LodPoolStats>,
    pub applied_jobs: u64,
    /// Результаты для уже выселенных тайлов
    pub discarded_jobs: u64,
    pub tracked_pawns: usize,
}
