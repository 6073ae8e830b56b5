// ============================================
// Headless Host - Мир без движка
// ============================================
// Реализации host-трейтов для тестов и демо-бинарника.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use ultraviolet::{Rotor3, Vec3};

use super::config::TerrainConfig;
use super::diagnostics::{DiagnosticsSink, Metric};
use super::host::{Clock, Observer, TerrainTile, World};
use super::mesh::MeshData;
use super::sector::{Sector, SectorIndexer};

/// Тайл, который просто запоминает, что с ним делали
#[derive(Clone, Debug)]
pub struct HeadlessTile {
    pub id: usize,
    pub sector: Option<Sector>,
    pub position: Vec3,
    pub hidden: bool,
    pub mesh_updates: u32,
    pub last_lod: Option<u8>,
    pub last_in_place: Option<bool>,
    pub vertex_count: usize,
    pub index_count: usize,
    /// Байт, переданных последним обновлением меша
    pub uploaded_bytes: usize,
}

impl HeadlessTile {
    fn new(id: usize, position: Vec3) -> Self {
        Self {
            id,
            sector: None,
            position,
            hidden: false,
            mesh_updates: 0,
            last_lod: None,
            last_in_place: None,
            vertex_count: 0,
            index_count: 0,
            uploaded_bytes: 0,
        }
    }
}

impl TerrainTile for HeadlessTile {
    fn setup(&mut self, sector: Sector, config: &TerrainConfig, origin: Vec3) {
        self.sector = Some(sector);
        self.position = origin + SectorIndexer::new(config).tile_origin(sector);
    }

    fn reposition_and_hide(&mut self, far_distance: f32) {
        self.position.z = -far_distance;
        self.hidden = true;
    }

    fn update_mesh(&mut self, lod: u8, in_place: bool, mesh: &MeshData) {
        self.mesh_updates += 1;
        self.last_lod = Some(lod);
        self.last_in_place = Some(in_place);
        self.vertex_count = mesh.vertices.len();
        self.index_count = mesh.triangles.len();
        self.uploaded_bytes = mesh.vertex_bytes().len()
            + mesh.index_bytes().len()
            + mesh.uv_bytes().len()
            + mesh.color_bytes().len();
        // Поднять тайл обратно на уровень мира
        self.position.z = 0.0;
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }
}

/// Мир, считающий созданные тайлы
#[derive(Debug, Default)]
pub struct HeadlessWorld {
    spawned: usize,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawned(&self) -> usize {
        self.spawned
    }
}

impl World for HeadlessWorld {
    type Tile = HeadlessTile;

    fn spawn_tile(&mut self, position: Vec3, _rotation: Rotor3) -> HeadlessTile {
        let tile = HeadlessTile::new(self.spawned, position);
        self.spawned += 1;
        tile
    }
}

/// Наблюдатель, которого можно двигать снаружи
#[derive(Debug)]
pub struct HeadlessPawn {
    location: RwLock<Vec3>,
}

impl HeadlessPawn {
    pub fn new(location: Vec3) -> Arc<Self> {
        Arc::new(Self { location: RwLock::new(location) })
    }

    pub fn set_location(&self, location: Vec3) {
        if let Ok(mut guard) = self.location.write() {
            *guard = location;
        }
    }
}

impl Observer for HeadlessPawn {
    fn location(&self) -> Vec3 {
        self.location.read().map(|guard| *guard).unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Часы, которые двигаются только вручную
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { now: Arc::new(Mutex::new(Instant::now())) }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.lock().map(|now| *now).unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Собирает все записанные метрики
#[derive(Clone, Debug, Default)]
pub struct RecordingDiagnostics {
    records: Arc<Mutex<Vec<(Metric, f64)>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Metric, f64)> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn count(&self, metric: Metric) -> usize {
        self.records().iter().filter(|(m, _)| *m == metric).count()
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn record(&self, metric: Metric, value: f64) {
        if let Ok(mut records) = self.records.lock() {
            records.push((metric, value));
        }
    }
}
