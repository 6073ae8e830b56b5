// ============================================
// Coordinator Tick - Один кадр координатора
// ============================================
//
// Порядок: диспетчеризация -> применение -> обход наблюдателей
// (раз в sweep_interval) -> выселение устаревших.
// Ничего здесь не блокирует.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ultraviolet::{Rotor3, Vec3};

use crate::terrain::diagnostics::Metric;
use crate::terrain::host::{TerrainTile, World};
use crate::terrain::job::{Job, JobState, LOD_CANCELLED};
use crate::terrain::pool::{MeshDataPool, MeshLease, TileHandle, TileId, TileStatus, TILE_EXPIRY};
use crate::terrain::sector::Sector;

use super::manager::TerrainManager;

/// На сколько тайл уводится под мир до первого меша
const HIDE_DISTANCE: f32 = 10.0;

#[inline]
fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn release_lease(pool: &mut MeshDataPool, lease: MeshLease) {
    if let Err(err) = pool.release(lease) {
        log::warn!("Mesh data not returned to pool: {}", err);
    }
}

fn clear_queued(queued: &mut HashMap<TileId, u32>, tile: TileId) {
    if let Some(count) = queued.get_mut(&tile) {
        *count -= 1;
        if *count == 0 {
            queued.remove(&tile);
        }
    }
}

impl<W: World> TerrainManager<W> {
    /// Один кадр. `delta_seconds` - время с прошлого кадра
    pub fn tick(&mut self, delta_seconds: f32) {
        self.sweep_accumulator += delta_seconds;

        self.dispatch_pending();
        self.apply_updates();

        if self.sweep_accumulator >= self.config.sweep_interval {
            self.sweep_observers();
            self.sweep_accumulator = 0.0;
        }

        self.evict_stale_tiles();
    }

    /// По одной задаче на воркера, если для её LOD есть свободный буфер.
    /// Голова очереди не снимается, пока буфер не выделен
    fn dispatch_pending(&mut self) {
        let Some(workers) = self.workers.as_ref() else {
            return;
        };

        for worker in 0..workers.worker_count() {
            let Some(lod) = self.pending.front().map(|job| job.lod) else {
                break;
            };
            if workers.is_full(worker) {
                continue;
            }
            let Some(lease) = self.mesh_pool.allocate(lod) else {
                continue;
            };
            let Some(mut job) = self.pending.pop_front() else {
                release_lease(&mut self.mesh_pool, lease);
                break;
            };

            job.mesh = Some(lease);
            job.state = JobState::Dispatched(worker);

            if let Err(mut job) = workers.try_dispatch(worker, job) {
                log::error!("terrain-worker-{} rejected job for sector {:?}", worker, job.sector);
                if let Some(lease) = job.mesh.take() {
                    release_lease(&mut self.mesh_pool, lease);
                }
                job.state = JobState::Pending;
                self.pending.push_front(job);
            }
        }
    }

    /// Применить не больше mesh_updates_per_frame готовых результатов
    fn apply_updates(&mut self) {
        for _ in 0..self.config.mesh_updates_per_frame {
            let Some(job) = self.workers.as_ref().and_then(|workers| workers.try_recv_update()) else {
                break;
            };
            self.apply_job(job);
        }
    }

    /// Загрузить результат в тайл, если задача досчитана и тайл всё ещё
    /// покрывает её сектор. Буфер и маркер очереди освобождаются в любом случае
    pub(super) fn apply_job(&mut self, mut job: Job) {
        let start = Instant::now();
        let computed = job.state == JobState::Computed;

        if !computed {
            log::warn!(
                "Discarding LOD {} job for sector {:?}: worker returned it unfinished ({:?})",
                job.lod, job.sector, job.state
            );
            self.discarded_jobs += 1;
        } else if self.tiles.is_assigned(job.sector, job.tile) {
            if let (Some(tile), Some(lease)) = (self.tiles.tile_mut(job.tile), job.mesh.as_ref()) {
                tile.update_mesh(job.lod, job.in_place, lease.data());
                tile.set_hidden(false);
            }
            if let Some(handle) = self.tiles.get_mut(job.sector) {
                handle.status = TileStatus::Active;
            }
            log::trace!(
                "Applied LOD {} mesh for sector {:?}, generated in {:?}",
                job.lod, job.sector, job.timings.total()
            );
            job.state = JobState::Applied;
            self.applied_jobs += 1;
        } else {
            log::warn!(
                "Discarding LOD {} mesh for sector {:?}: tile {:?} was evicted",
                job.lod, job.sector, job.tile
            );
            self.discarded_jobs += 1;
        }

        if computed && job.lod == 0 && cfg!(debug_assertions) {
            self.diagnostics.record(Metric::HeightmapGenerationMs, millis(job.timings.heightmap));
            self.diagnostics.record(Metric::ErosionGenerationMs, millis(job.timings.erosion));
            self.diagnostics.record(Metric::MeshBuildMs, millis(job.timings.mesh_build));
            self.diagnostics.record(Metric::MeshUpdateMs, millis(start.elapsed()));
        }

        self.finish_job(&mut job);
    }

    /// Вернуть буфер задачи в пул и снять маркер очереди с тайла
    pub(super) fn finish_job(&mut self, job: &mut Job) {
        if let Some(lease) = job.mesh.take() {
            release_lease(&mut self.mesh_pool, lease);
        }
        clear_queued(&mut self.queued_tiles, job.tile);
    }

    /// Обновить секторы наблюдателей и создать недостающие тайлы
    fn sweep_observers(&mut self) {
        let now = self.clock.now();
        let radius = self.sweep_radius();

        for index in 0..self.pawns.len() {
            let location = self.pawns[index].observer.location();
            let sector = self.indexer.sector_of(location);

            let pawn = &mut self.pawns[index];
            if sector != pawn.sector {
                log::debug!("Pawn {:?} sector change {:?} -> {:?}", pawn.id, pawn.sector, sector);
                pawn.sector = sector;
            }

            for relevant in self.indexer.relevant_sectors(location, radius) {
                if self.tiles.touch(relevant, now) {
                    continue;
                }
                self.spawn_sector(relevant, Vec3::zero(), false, now);
            }
        }
    }

    /// Выселить тайлы, не подтверждённые дольше TILE_EXPIRY.
    /// Их задачи, ещё не отданные воркерам, снимаются
    fn evict_stale_tiles(&mut self) {
        let now = self.clock.now();
        let evicted = self.tiles.evict_stale(now, TILE_EXPIRY);
        if evicted.is_empty() {
            return;
        }

        for (_, id) in &evicted {
            if let Some(tile) = self.tiles.tile_mut(*id) {
                tile.set_hidden(true);
            }
        }

        let before = self.pending.len();
        let queued = &mut self.queued_tiles;
        self.pending.retain(|job| {
            let stale = evicted.iter().any(|(sector, id)| *sector == job.sector && *id == job.tile);
            if stale {
                clear_queued(queued, job.tile);
            }
            !stale
        });

        log::debug!(
            "Evicted {} stale terrain tiles, dropped {} pending jobs",
            evicted.len(),
            before - self.pending.len()
        );
    }

    /// Взять тайл из пула (или создать в `spawn_position`), привязать к сектору,
    /// скрыть и поставить задачу LOD 0
    pub(super) fn spawn_sector(&mut self, sector: Sector, spawn_position: Vec3, in_place: bool, now: Instant) {
        let world = &mut self.world;
        let id = self.tiles.acquire(|| world.spawn_tile(spawn_position, Rotor3::identity()));

        if let Some(tile) = self.tiles.tile_mut(id) {
            tile.setup(sector, &self.config, Vec3::zero());
            tile.reposition_and_hide(HIDE_DISTANCE);
        }

        if let Some(previous) = self.tiles.insert(sector, TileHandle::new(id, now)) {
            // Прежний тайл сектора возвращается в пул
            self.tiles.release(previous.tile);
        }

        self.create_tile_refresh_job(id, sector, 0, in_place);
    }

    /// Поставить задачу в общую очередь. Отменённый LOD отбрасывается
    pub(super) fn create_tile_refresh_job(&mut self, tile: TileId, sector: Sector, lod: u8, in_place: bool) -> bool {
        if lod == LOD_CANCELLED {
            return false;
        }

        let mut job = Job::new(tile, sector, lod, in_place);
        job.state = JobState::Pending;
        self.pending.push_back(job);
        *self.queued_tiles.entry(tile).or_insert(0) += 1;

        if let Some(handle) = self.tiles.get_mut(sector) {
            if handle.tile == tile {
                handle.status = TileStatus::Queued;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::terrain::config::{LodConfig, TerrainConfig};
    use crate::terrain::generation::NoiseTerrainGenerator;
    use crate::terrain::host::Clock;
    use crate::terrain::headless::{HeadlessPawn, HeadlessWorld, ManualClock, RecordingDiagnostics};
    use crate::terrain::worker::compute_job;

    fn scenario_config() -> TerrainConfig {
        TerrainConfig {
            tile_x_units: 100,
            tile_y_units: 100,
            unit_size: 1.0,
            num_threads: 1,
            lods: vec![LodConfig { resolution_divisor: 1, sector_distance: 3 }],
            mesh_data_pool_size: 4,
            ..TerrainConfig::default()
        }
    }

    fn manager(clock: &ManualClock) -> TerrainManager<HeadlessWorld> {
        TerrainManager::new(HeadlessWorld::new(), scenario_config())
            .unwrap()
            .with_clock(clock.clone())
    }

    fn assert_pool_partition(manager: &TerrainManager<HeadlessWorld>) {
        let pool = manager.mesh_pool();
        assert_eq!(pool.free_count(0) + pool.in_use_count(0), pool.pool_size(0));
    }

    #[test]
    fn test_end_to_end_jobs_are_applied() {
        let clock = ManualClock::new();
        let diagnostics = RecordingDiagnostics::new();
        let mut manager = manager(&clock).with_diagnostics(diagnostics.clone());
        manager.begin_play().unwrap();
        manager.add_pawn(HeadlessPawn::new(Vec3::zero()));

        assert!(manager.world().spawned() >= 1);
        assert!(manager.live_tile(Sector::new(0, 0)).is_some());
        let expected = manager.stats().pending_jobs as u64;
        assert_eq!(expected, 25);

        let deadline = Instant::now() + Duration::from_secs(60);
        while manager.stats().applied_jobs < expected && Instant::now() < deadline {
            manager.tick(0.016);
            assert_pool_partition(&manager);
            assert!(manager.mesh_pool().in_use_count(0) <= 4);
            thread::sleep(Duration::from_millis(1));
        }

        let stats = manager.stats();
        assert_eq!(stats.applied_jobs, expected);
        assert_eq!(stats.discarded_jobs, 0);
        assert_eq!(stats.pending_jobs, 0);
        assert_eq!(stats.queued_tiles, 0);
        assert_eq!(stats.mesh_pools[0].in_use, 0);
        assert_eq!(stats.mesh_pools[0].free, 4);

        let handle = manager.live_tile(Sector::new(0, 0)).unwrap();
        assert_eq!(handle.status, TileStatus::Active);
        let tile = manager.tile(handle.tile).unwrap();
        assert!(!tile.hidden);
        assert_eq!(tile.mesh_updates, 1);
        assert_eq!(tile.last_lod, Some(0));
        assert_eq!(tile.last_in_place, Some(true));
        let grid = manager.mesh_pool().grid(0).unwrap();
        assert_eq!(tile.vertex_count, grid.vertex_count);
        assert_eq!(tile.uploaded_bytes, grid.vertex_count * (12 + 8 + 4) + grid.index_count * 4);

        if cfg!(debug_assertions) {
            assert_eq!(diagnostics.count(Metric::HeightmapGenerationMs), 25);
            assert_eq!(diagnostics.count(Metric::MeshUpdateMs), 25);
        }
        manager.end_play();
    }

    #[test]
    fn test_sweep_touches_without_duplicates() {
        let clock = ManualClock::new();
        let mut manager = manager(&clock);
        manager.add_pawn(HeadlessPawn::new(Vec3::zero()));

        clock.advance(Duration::from_secs(3));
        manager.tick(1.0);
        manager.tick(1.0);

        let stats = manager.stats();
        assert_eq!(stats.live_tiles, 25);
        assert_eq!(stats.pending_jobs, 25);
        assert_eq!(manager.world().spawned(), 25);
        let touched = manager.live_tile(Sector::new(1, 1)).unwrap();
        assert_eq!(touched.last_required, clock.now());
    }

    #[test]
    fn test_stale_tiles_are_evicted_once_and_reused() {
        let clock = ManualClock::new();
        let mut manager = manager(&clock);
        let pawn = HeadlessPawn::new(Vec3::zero());
        let id = manager.add_pawn(pawn.clone());
        let first = manager.live_tile(Sector::new(0, 0)).unwrap().tile;

        // Ровно 5 секунд - ещё нужен
        clock.advance(Duration::from_secs(5));
        manager.tick(0.0);
        assert_eq!(manager.stats().live_tiles, 25);

        pawn.set_location(Vec3::new(5000.0, 5000.0, 0.0));
        clock.advance(Duration::from_millis(10));
        manager.tick(0.0);

        let stats = manager.stats();
        assert_eq!(stats.live_tiles, 0);
        assert_eq!(stats.free_tiles, 25);
        assert_eq!(stats.pending_jobs, 0);
        assert_eq!(stats.queued_tiles, 0);
        assert!(manager.tile(first).unwrap().hidden);

        // Второй тик ничего не выселяет повторно
        manager.tick(0.0);
        assert_eq!(manager.stats().free_tiles, 25);

        manager.tick(1.0);
        assert_eq!(manager.pawn_sector(id), Some(Sector::new(50, 50)));
        let stats = manager.stats();
        assert_eq!(stats.live_tiles, 25);
        assert_eq!(stats.free_tiles, 0);
        assert_eq!(manager.world().spawned(), 25);

        let job = manager.pending_jobs().find(|job| job.sector == Sector::new(50, 50)).unwrap();
        assert!(!job.in_place);
        let tile = manager.tile_at(Sector::new(50, 50)).unwrap();
        assert_eq!((tile.position.x, tile.position.y), (5000.0, 5000.0));
    }

    #[test]
    fn test_result_for_evicted_tile_is_discarded() {
        let clock = ManualClock::new();
        let mut manager = manager(&clock);
        let pawn = HeadlessPawn::new(Vec3::zero());
        manager.add_pawn(pawn.clone());

        // Задача "у воркера": снять с очереди и посчитать вручную
        let mut job = manager.pending.pop_front().unwrap();
        job.mesh = manager.mesh_pool.allocate(0);
        compute_job(&mut job, &manager.config, &NoiseTerrainGenerator);
        let tile = job.tile;

        pawn.set_location(Vec3::new(5000.0, 5000.0, 0.0));
        clock.advance(Duration::from_secs(6));
        manager.tick(1.0);
        assert!(manager.is_tile_queued(tile));

        manager.apply_job(job);

        let stats = manager.stats();
        assert_eq!(stats.discarded_jobs, 1);
        assert_eq!(stats.applied_jobs, 0);
        assert_eq!(stats.mesh_pools[0].in_use, 0);
        assert_eq!(manager.tile(tile).unwrap().mesh_updates, 0);
        assert_pool_partition(&manager);
    }

    #[test]
    fn test_cancelled_lod_is_never_enqueued() {
        let clock = ManualClock::new();
        let mut manager = manager(&clock);
        let world = &mut manager.world;
        let id = manager.tiles.acquire(|| world.spawn_tile(Vec3::zero(), Rotor3::identity()));

        assert!(!manager.create_tile_refresh_job(id, Sector::new(0, 0), LOD_CANCELLED, false));
        assert_eq!(manager.stats().pending_jobs, 0);
        assert!(!manager.is_tile_queued(id));

        assert!(manager.create_tile_refresh_job(id, Sector::new(0, 0), 0, false));
        assert!(manager.is_tile_queued(id));
    }

    #[test]
    fn test_dispatch_waits_for_free_mesh_data() {
        let clock = ManualClock::new();
        let config = TerrainConfig { mesh_data_pool_size: 1, ..scenario_config() };
        let mut manager = TerrainManager::new(HeadlessWorld::new(), config).unwrap().with_clock(clock.clone());
        manager.add_pawn(HeadlessPawn::new(Vec3::zero()));

        // Держим единственный буфер - очередь стоит
        let held = manager.mesh_pool.allocate(0).unwrap();
        manager.begin_play().unwrap();
        manager.tick(0.0);
        assert_eq!(manager.stats().pending_jobs, 25);

        manager.mesh_pool.release(held).unwrap();
        manager.tick(0.0);
        assert_eq!(manager.stats().pending_jobs, 24);
        assert_pool_partition(&manager);
        manager.end_play();
    }
}
