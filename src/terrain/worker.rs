// ============================================
// Worker Pool - Фоновая генерация мешей
// ============================================
//
// N именованных потоков. У каждого своя ограниченная очередь задач,
// результаты идут в одну общую очередь обновлений.
// Воркеры видят только Job и арендованные буферы.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};

use super::config::TerrainConfig;
use super::error::TerrainError;
use super::generation::TerrainGenerator;
use super::job::{Job, JobState};
use super::mesh::build_mesh;

/// Как часто воркер проверяет флаг остановки
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

pub struct WorkerPool {
    senders: Vec<Sender<Job>>,
    updates: Receiver<Job>,
    handles: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    timeout: Duration,
}

impl WorkerPool {
    /// Запустить `config.num_threads` воркеров
    pub fn start(config: Arc<TerrainConfig>, generator: Arc<dyn TerrainGenerator>) -> Result<Self, TerrainError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (update_tx, update_rx) = unbounded::<Job>();

        let mut pool = Self {
            senders: Vec::with_capacity(config.num_threads),
            updates: update_rx,
            handles: Vec::with_capacity(config.num_threads),
            shutdown: Arc::clone(&shutdown),
            timeout: config.worker_shutdown_timeout(),
        };

        for index in 0..config.num_threads {
            let (job_tx, job_rx) = bounded::<Job>(config.worker_queue_capacity);
            let updates = update_tx.clone();
            let config = Arc::clone(&config);
            let generator = Arc::clone(&generator);
            let shutdown = Arc::clone(&shutdown);

            let handle = thread::Builder::new()
                .name(format!("terrain-worker-{}", index))
                .spawn(move || run_worker(index, job_rx, updates, config, generator, shutdown))
                // Уже запущенные потоки остановит Drop
                .map_err(TerrainError::WorkerSpawn)?;

            pool.senders.push(job_tx);
            pool.handles.push(handle);
        }

        log::info!("Started {} terrain workers", pool.handles.len());
        Ok(pool)
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    /// Приватная очередь воркера заполнена
    pub fn is_full(&self, worker: usize) -> bool {
        self.senders.get(worker).map_or(true, |tx| tx.is_full())
    }

    /// Отдать задачу воркеру без ожидания. При неудаче задача возвращается
    pub fn try_dispatch(&self, worker: usize, job: Job) -> Result<(), Job> {
        let Some(tx) = self.senders.get(worker) else {
            return Err(job);
        };
        tx.try_send(job).map_err(|err| match err {
            TrySendError::Full(job) | TrySendError::Disconnected(job) => job,
        })
    }

    /// Забрать один готовый результат без ожидания
    pub fn try_recv_update(&self) -> Option<Job> {
        match self.updates.try_recv() {
            Ok(job) => Some(job),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Остановить воркеров. Кто не успел за таймаут - брошен
    pub fn shutdown(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        self.shutdown.store(true, Ordering::Release);
        self.senders.clear();

        let deadline = Instant::now() + self.timeout;
        let mut running = std::mem::take(&mut self.handles);
        loop {
            let (finished, still_running): (Vec<_>, Vec<_>) =
                running.into_iter().partition(|handle| handle.is_finished());
            for handle in finished {
                if handle.join().is_err() {
                    log::error!("Terrain worker panicked");
                }
            }
            running = still_running;

            if running.is_empty() || Instant::now() >= deadline {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        if !running.is_empty() {
            log::warn!("Abandoning {} terrain workers still computing", running.len());
        }
    }

    /// Вернуть результаты, которые успели прийти после остановки
    pub fn drain_updates(&self) -> Vec<Job> {
        self.updates.try_iter().collect()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    index: usize,
    jobs: Receiver<Job>,
    updates: Sender<Job>,
    config: Arc<TerrainConfig>,
    generator: Arc<dyn TerrainGenerator>,
    shutdown: Arc<AtomicBool>,
) {
    log::debug!("terrain-worker-{} running", index);

    while !shutdown.load(Ordering::Acquire) {
        let mut job = match jobs.recv_timeout(SHUTDOWN_POLL) {
            Ok(job) => job,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        // Задача с буферами возвращается и при панике генератора
        let computed = panic::catch_unwind(AssertUnwindSafe(|| {
            compute_job(&mut job, &config, generator.as_ref())
        }));
        if computed.is_err() {
            log::error!("terrain-worker-{} generator panicked on sector {:?}", index, job.sector);
        }

        if updates.send(job).is_err() {
            break;
        }
    }

    log::debug!("terrain-worker-{} stopped", index);
}

/// Heightmap -> эрозия -> вершины, с таймингами по стадиям
pub fn compute_job(job: &mut Job, config: &TerrainConfig, generator: &dyn TerrainGenerator) {
    let Some(lease) = job.mesh.as_mut() else {
        log::error!("Job for sector {:?} reached a worker without mesh data", job.sector);
        return;
    };
    let grid = *lease.grid();
    let data = lease.data_mut();

    let start = Instant::now();
    generator.generate_heightmap(&mut data.heightmap, job.sector, &grid, config);
    job.timings.heightmap = start.elapsed();

    let start = Instant::now();
    generator.erode(&mut data.heightmap, job.sector, &grid, config);
    job.timings.erosion = start.elapsed();

    let start = Instant::now();
    build_mesh(data, &grid, config);
    job.timings.mesh_build = start.elapsed();

    job.state = JobState::Computed;
}
