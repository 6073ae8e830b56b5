// ============================================
// Tile Pool - Арена тайлов + живые сектора
// ============================================
//
// Тайлы живут в арене и адресуются TileId. Задачи несут только id,
// сам тайл всегда принадлежит координатору.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::terrain::sector::Sector;

/// Время без подтверждения, после которого сектор выселяется
pub const TILE_EXPIRY: Duration = Duration::from_secs(5);

/// Индекс тайла в арене
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(usize);

impl TileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Стадия жизни тайла в живой карте
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileStatus {
    /// Тайл назначен сектору, задача ещё не создана
    Spawned,
    /// Задача в очереди или у воркера
    Queued,
    /// Меш применён хотя бы раз
    Active,
}

/// Запись живой карты: какой тайл покрывает сектор
#[derive(Clone, Copy, Debug)]
pub struct TileHandle {
    pub tile: TileId,
    pub status: TileStatus,
    pub last_required: Instant,
}

impl TileHandle {
    pub fn new(tile: TileId, now: Instant) -> Self {
        Self { tile, status: TileStatus::Spawned, last_required: now }
    }
}

/// Арена тайлов, стек свободных, карта сектор -> тайл
pub struct TilePool<T> {
    tiles: Vec<T>,
    free: Vec<TileId>,
    live: HashMap<Sector, TileHandle>,
}

impl<T> TilePool<T> {
    pub fn new() -> Self {
        Self { tiles: Vec::new(), free: Vec::new(), live: HashMap::new() }
    }

    /// Взять тайл со стека свободных, иначе создать новый через `spawn`
    pub fn acquire(&mut self, spawn: impl FnOnce() -> T) -> TileId {
        if let Some(id) = self.free.pop() {
            return id;
        }
        let id = TileId(self.tiles.len());
        self.tiles.push(spawn());
        id
    }

    /// Вернуть тайл в стек свободных
    pub fn release(&mut self, id: TileId) {
        debug_assert!(!self.free.contains(&id), "tile {:?} released twice", id);
        self.free.push(id);
    }

    /// Назначить тайл сектору. Возвращает прежнюю запись, если была
    pub fn insert(&mut self, sector: Sector, handle: TileHandle) -> Option<TileHandle> {
        self.live.insert(sector, handle)
    }

    /// Продлить жизнь сектора. false если сектор не живой
    pub fn touch(&mut self, sector: Sector, now: Instant) -> bool {
        match self.live.get_mut(&sector) {
            Some(handle) => {
                handle.last_required = now;
                true
            }
            None => false,
        }
    }

    /// Выселить сектора, не подтверждённые дольше `max_age`.
    /// Тайлы уходят в стек свободных; результат отсортирован по сектору
    pub fn evict_stale(&mut self, now: Instant, max_age: Duration) -> Vec<(Sector, TileId)> {
        let mut evicted: Vec<(Sector, TileId)> = self
            .live
            .iter()
            .filter(|(_, h)| now.saturating_duration_since(h.last_required) > max_age)
            .map(|(s, h)| (*s, h.tile))
            .collect();
        evicted.sort();

        for (sector, id) in &evicted {
            self.live.remove(sector);
            self.free.push(*id);
        }
        evicted
    }

    /// Очистить живую карту, все тайлы становятся свободными
    pub fn release_all(&mut self) -> Vec<TileId> {
        let ids: Vec<TileId> = self.live.drain().map(|(_, h)| h.tile).collect();
        self.free.extend(ids.iter().copied());
        ids
    }

    #[inline]
    pub fn get(&self, sector: Sector) -> Option<&TileHandle> {
        self.live.get(&sector)
    }

    #[inline]
    pub fn get_mut(&mut self, sector: Sector) -> Option<&mut TileHandle> {
        self.live.get_mut(&sector)
    }

    /// Сектор всё ещё покрыт именно этим тайлом
    #[inline]
    pub fn is_assigned(&self, sector: Sector, id: TileId) -> bool {
        self.live.get(&sector).map_or(false, |h| h.tile == id)
    }

    #[inline]
    pub fn tile(&self, id: TileId) -> Option<&T> {
        self.tiles.get(id.0)
    }

    #[inline]
    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut T> {
        self.tiles.get_mut(id.0)
    }

    pub fn live(&self) -> impl Iterator<Item = (&Sector, &TileHandle)> {
        self.live.iter()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Всего тайлов в арене (живые + свободные)
    pub fn spawned_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_free(&self, id: TileId) -> bool {
        self.free.contains(&id)
    }
}

impl<T> Default for TilePool<T> {
    fn default() -> Self {
        Self::new()
    }
}
