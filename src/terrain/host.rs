// ============================================
// Host Interfaces - Мир, тайлы, наблюдатели, время
// ============================================
//
// Менеджер не знает о движке: тайлы создаёт World,
// позицию даёт Observer, время - Clock.

use std::time::Instant;

use ultraviolet::{Rotor3, Vec3};

use super::config::TerrainConfig;
use super::mesh::MeshData;
use super::sector::Sector;

/// Патч террейна в мире. Живёт только на потоке координатора
pub trait TerrainTile {
    /// Привязать тайл к сектору. `origin` - смещение начала мира
    fn setup(&mut self, sector: Sector, config: &TerrainConfig, origin: Vec3);

    /// Убрать тайл далеко под мир и скрыть до первого меша
    fn reposition_and_hide(&mut self, far_distance: f32);

    /// Загрузить готовые буферы. `in_place` - обновить существующую секцию
    fn update_mesh(&mut self, lod: u8, in_place: bool, mesh: &MeshData);

    fn set_hidden(&mut self, hidden: bool);
}

/// Фабрика тайлов
pub trait World {
    type Tile: TerrainTile;

    fn spawn_tile(&mut self, position: Vec3, rotation: Rotor3) -> Self::Tile;
}

/// Отслеживаемый наблюдатель (игрок, камера)
pub trait Observer {
    fn location(&self) -> Vec3;
}

/// Источник времени для устаревания тайлов
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Обычные часы
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}
