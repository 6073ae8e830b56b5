// ============================================
// Terrain Manager - Координатор стриминга тайлов
// ============================================
//
// Владеет конфигом, пулами, очередью задач и картой живых тайлов.
// Все мутации тайлов - только здесь, на потоке вызывающего tick().

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::terrain::config::TerrainConfig;
use crate::terrain::diagnostics::{DiagnosticsSink, LogDiagnostics, NullDiagnostics};
use crate::terrain::error::TerrainError;
use crate::terrain::generation::{NoiseTerrainGenerator, TerrainGenerator};
use crate::terrain::host::{Clock, Observer, SystemClock, TerrainTile, World};
use crate::terrain::job::Job;
use crate::terrain::pool::{MeshDataPool, TileHandle, TileId, TilePool};
use crate::terrain::sector::{Sector, SectorIndexer};
use crate::terrain::worker::WorkerPool;

use super::types::{LodPoolStats, ManagerStats, PawnId, TrackedPawn};

/// Менеджер террейна поверх произвольного хоста
pub struct TerrainManager<W: World> {
    pub(super) world: W,
    pub(super) config: Arc<TerrainConfig>,
    pub(super) indexer: SectorIndexer,
    pub(super) generator: Arc<dyn TerrainGenerator>,
    pub(super) clock: Box<dyn Clock>,
    pub(super) diagnostics: Box<dyn DiagnosticsSink>,

    pub(super) tiles: TilePool<W::Tile>,
    pub(super) mesh_pool: MeshDataPool,
    /// Общая очередь задач, ждущих mesh-буфер и свободного воркера
    pub(super) pending: VecDeque<Job>,
    /// Сколько задач в полёте у каждого тайла
    pub(super) queued_tiles: HashMap<TileId, u32>,
    pub(super) workers: Option<WorkerPool>,

    pub(super) pawns: Vec<TrackedPawn>,
    next_pawn_id: u64,
    pub(super) sweep_accumulator: f32,

    pub(super) applied_jobs: u64,
    pub(super) discarded_jobs: u64,
}

fn default_diagnostics() -> Box<dyn DiagnosticsSink> {
    if cfg!(debug_assertions) {
        Box::new(LogDiagnostics)
    } else {
        Box::new(NullDiagnostics)
    }
}

impl<W: World> TerrainManager<W> {
    /// Проверить конфиг и выделить пулы. Воркеры стартуют в begin_play()
    pub fn new(world: W, config: TerrainConfig) -> Result<Self, TerrainError> {
        config.validate()?;
        let config = Arc::new(config);

        Ok(Self {
            world,
            indexer: SectorIndexer::new(&config),
            mesh_pool: MeshDataPool::new(&config),
            config,
            generator: Arc::new(NoiseTerrainGenerator),
            clock: Box::new(SystemClock),
            diagnostics: default_diagnostics(),
            tiles: TilePool::new(),
            pending: VecDeque::new(),
            queued_tiles: HashMap::new(),
            workers: None,
            pawns: Vec::new(),
            next_pawn_id: 0,
            sweep_accumulator: 0.0,
            applied_jobs: 0,
            discarded_jobs: 0,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: impl DiagnosticsSink + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Заменить генератор высот. Работающие воркеры перезапускаются
    pub fn set_generator(&mut self, generator: impl TerrainGenerator + 'static) -> Result<(), TerrainError> {
        if !self.pawns.is_empty() {
            return Err(TerrainError::ConfigLocked);
        }
        let restart = self.stop_workers();
        self.reset_streaming();
        self.generator = Arc::new(generator);
        if restart {
            self.start_workers()?;
        }
        Ok(())
    }

    /// Заменить конфиг и пересоздать пулы.
    /// Только пока нет отслеживаемых наблюдателей
    pub fn set_terrain_config(&mut self, config: TerrainConfig) -> Result<(), TerrainError> {
        if !self.pawns.is_empty() {
            return Err(TerrainError::ConfigLocked);
        }
        config.validate()?;

        let restart = self.stop_workers();
        self.reset_streaming();

        self.config = Arc::new(config);
        self.indexer = SectorIndexer::new(&self.config);
        self.mesh_pool = MeshDataPool::new(&self.config);

        if restart {
            self.start_workers()?;
        }
        Ok(())
    }

    /// Запустить воркеров
    pub fn begin_play(&mut self) -> Result<(), TerrainError> {
        if self.workers.is_none() {
            self.start_workers()?;
        }
        Ok(())
    }

    /// Остановить воркеров и сбросить все живые тайлы.
    /// Наблюдатели остаются, следующий обход создаст тайлы заново
    pub fn end_play(&mut self) {
        if self.stop_workers() {
            self.reset_streaming();
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.workers.is_some()
    }

    /// Начать отслеживать наблюдателя.
    /// Все нужные ему секторы сразу создаются и ставятся в очередь
    pub fn add_pawn(&mut self, observer: Arc<dyn Observer>) -> PawnId {
        let now = self.clock.now();
        let location = observer.location();
        let sector = self.indexer.sector_of(location);

        for relevant in self.indexer.relevant_sectors(location, self.sweep_radius()) {
            if self.tiles.touch(relevant, now) {
                continue;
            }
            let origin = self.indexer.tile_origin(relevant);
            self.spawn_sector(relevant, origin, true, now);
        }

        let id = PawnId(self.next_pawn_id);
        self.next_pawn_id += 1;
        self.pawns.push(TrackedPawn { id, observer, sector });
        log::debug!("Tracking pawn {:?} at sector {:?}", id, sector);
        id
    }

    /// Перестать отслеживать. Его тайлы уйдут по устареванию
    pub fn remove_pawn(&mut self, id: PawnId) -> bool {
        let before = self.pawns.len();
        self.pawns.retain(|pawn| pawn.id != id);
        self.pawns.len() != before
    }

    /// Радиус обхода - дистанция LOD 0
    pub(super) fn sweep_radius(&self) -> i32 {
        self.config.lods.first().map_or(0, |lod| lod.sector_distance)
    }

    fn start_workers(&mut self) -> Result<(), TerrainError> {
        let workers = WorkerPool::start(Arc::clone(&self.config), Arc::clone(&self.generator))?;
        self.workers = Some(workers);
        Ok(())
    }

    /// Остановить воркеров и вернуть буферы пришедших результатов.
    /// false если воркеры не работали
    fn stop_workers(&mut self) -> bool {
        let Some(mut workers) = self.workers.take() else {
            return false;
        };
        workers.shutdown();
        for mut job in workers.drain_updates() {
            self.finish_job(&mut job);
        }
        true
    }

    /// Освободить все живые тайлы и очереди
    fn reset_streaming(&mut self) {
        for id in self.tiles.release_all() {
            if let Some(tile) = self.tiles.tile_mut(id) {
                tile.set_hidden(true);
            }
        }
        self.pending.clear();
        self.queued_tiles.clear();
        self.sweep_accumulator = 0.0;

        let leaked: usize = (0..self.mesh_pool.lod_count() as u8)
            .map(|lod| self.mesh_pool.in_use_count(lod))
            .sum();
        if leaked > 0 {
            log::warn!("{} mesh buffers lost with abandoned workers, reallocating pools", leaked);
            self.mesh_pool = MeshDataPool::new(&self.config);
            log::debug!("Mesh pools reallocated, epoch {}", self.mesh_pool.epoch());
        }
    }

    // ============================================
    // Accessors
    // ============================================

    #[inline]
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    #[inline]
    pub fn indexer(&self) -> &SectorIndexer {
        &self.indexer
    }

    #[inline]
    pub fn world(&self) -> &W {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    #[inline]
    pub fn mesh_pool(&self) -> &MeshDataPool {
        &self.mesh_pool
    }

    pub fn tile(&self, id: TileId) -> Option<&W::Tile> {
        self.tiles.tile(id)
    }

    pub fn live_tile(&self, sector: Sector) -> Option<&TileHandle> {
        self.tiles.get(sector)
    }

    /// Тайл, покрывающий сектор
    pub fn tile_at(&self, sector: Sector) -> Option<&W::Tile> {
        self.tiles.get(sector).and_then(|handle| self.tiles.tile(handle.tile))
    }

    pub fn is_tile_queued(&self, id: TileId) -> bool {
        self.queued_tiles.contains_key(&id)
    }

    pub fn pending_jobs(&self) -> impl Iterator<Item = &Job> {
        self.pending.iter()
    }

    pub fn pawn_sector(&self, id: PawnId) -> Option<Sector> {
        self.pawns.iter().find(|pawn| pawn.id == id).map(|pawn| pawn.sector)
    }

    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            live_tiles: self.tiles.live_count(),
            free_tiles: self.tiles.free_count(),
            spawned_tiles: self.tiles.spawned_count(),
            pending_jobs: self.pending.len(),
            queued_tiles: self.queued_tiles.len(),
            mesh_pools: (0..self.mesh_pool.lod_count() as u8)
                .map(|lod| LodPoolStats {
                    free: self.mesh_pool.free_count(lod),
                    in_use: self.mesh_pool.in_use_count(lod),
                })
                .collect(),
            applied_jobs: self.applied_jobs,
            discarded_jobs: self.discarded_jobs,
            tracked_pawns: self.pawns.len(),
        }
    }
}
