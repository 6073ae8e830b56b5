// ============================================
// Mesh Data Pool - Пул буферов по LOD
// ============================================
//
// Слоты выделяются один раз при конфигурации и не меняют размер.
// Аренда забирает буферы из слота (слот помечается Leased),
// release возвращает их обратно. Слот идентифицируется индексом +
// поколением, пул - эпохой: аренда от старого пула не может
// вернуться в новый.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::terrain::config::TerrainConfig;
use crate::terrain::error::PoolError;
use crate::terrain::lod::LodGrid;
use crate::terrain::mesh::{MeshData, MeshTopology};

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

enum SlotState {
    Free(MeshData),
    Leased,
}

struct PoolSlot {
    generation: u32,
    state: SlotState,
}

/// Пул одного LOD: слоты + множества свободных и занятых
struct LodPool {
    grid: LodGrid,
    slots: Vec<PoolSlot>,
    free: VecDeque<usize>,
    in_use: HashSet<usize>,
}

/// Буферы, арендованные одной задачей
#[derive(Debug)]
pub struct MeshLease {
    epoch: u64,
    lod: u8,
    slot: usize,
    generation: u32,
    grid: LodGrid,
    data: MeshData,
}

impl MeshLease {
    #[inline]
    pub fn lod(&self) -> u8 {
        self.lod
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn grid(&self) -> &LodGrid {
        &self.grid
    }

    #[inline]
    pub fn data(&self) -> &MeshData {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut MeshData {
        &mut self.data
    }
}

/// Пул mesh-буферов для всех LOD
pub struct MeshDataPool {
    epoch: u64,
    lods: Vec<LodPool>,
}

impl MeshDataPool {
    /// Пустой пул (до первой конфигурации)
    pub fn empty() -> Self {
        Self { epoch: NEXT_EPOCH.fetch_add(1, Ordering::Relaxed), lods: Vec::new() }
    }

    /// Выделить `mesh_data_pool_size` слотов на каждый LOD
    pub fn new(config: &TerrainConfig) -> Self {
        let lods = LodGrid::all(config)
            .into_iter()
            .map(|grid| {
                let topology = MeshTopology::build(&grid);
                let slots: Vec<PoolSlot> = (0..config.mesh_data_pool_size)
                    .into_par_iter()
                    .map(|_| PoolSlot {
                        generation: 0,
                        state: SlotState::Free(MeshData::allocate(&grid, &topology)),
                    })
                    .collect();

                log::info!(
                    "LOD {}: {} mesh data slots, {} vertices / {} indices each",
                    grid.lod, slots.len(), grid.vertex_count, grid.index_count
                );

                LodPool {
                    grid,
                    free: (0..slots.len()).collect(),
                    in_use: HashSet::with_capacity(slots.len()),
                    slots,
                }
            })
            .collect();

        Self { epoch: NEXT_EPOCH.fetch_add(1, Ordering::Relaxed), lods }
    }

    /// Взять свободный слот. None если LOD исчерпан (задача ждёт следующего тика)
    pub fn allocate(&mut self, lod: u8) -> Option<MeshLease> {
        let pool = self.lods.get_mut(lod as usize)?;
        let slot_index = pool.free.pop_front()?;
        let slot = &mut pool.slots[slot_index];

        match std::mem::replace(&mut slot.state, SlotState::Leased) {
            SlotState::Free(data) => {
                pool.in_use.insert(slot_index);
                Some(MeshLease {
                    epoch: self.epoch,
                    lod,
                    slot: slot_index,
                    generation: slot.generation,
                    grid: pool.grid,
                    data,
                })
            }
            SlotState::Leased => {
                // Слот в free не может быть арендован; чиним множества
                log::error!("LOD {} slot {} was listed free while leased", lod, slot_index);
                pool.in_use.insert(slot_index);
                None
            }
        }
    }

    /// Вернуть аренду. Ровно один раз на успешный allocate
    pub fn release(&mut self, lease: MeshLease) -> Result<(), PoolError> {
        if lease.epoch != self.epoch {
            return Err(PoolError::StaleEpoch { lease: lease.epoch, current: self.epoch });
        }
        let pool = self.lods.get_mut(lease.lod as usize).ok_or(PoolError::UnknownLod(lease.lod))?;
        let not_leased = PoolError::NotLeased { lod: lease.lod, slot: lease.slot, generation: lease.generation };
        let slot = pool.slots.get_mut(lease.slot).ok_or_else(|| not_leased.clone())?;

        if !matches!(slot.state, SlotState::Leased) || slot.generation != lease.generation {
            return Err(not_leased);
        }

        slot.state = SlotState::Free(lease.data);
        slot.generation = slot.generation.wrapping_add(1);
        pool.in_use.remove(&lease.slot);
        pool.free.push_back(lease.slot);
        Ok(())
    }

    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[inline]
    pub fn lod_count(&self) -> usize {
        self.lods.len()
    }

    pub fn grid(&self, lod: u8) -> Option<&LodGrid> {
        self.lods.get(lod as usize).map(|p| &p.grid)
    }

    pub fn pool_size(&self, lod: u8) -> usize {
        self.lods.get(lod as usize).map_or(0, |p| p.slots.len())
    }

    pub fn free_count(&self, lod: u8) -> usize {
        self.lods.get(lod as usize).map_or(0, |p| p.free.len())
    }

    pub fn in_use_count(&self, lod: u8) -> usize {
        self.lods.get(lod as usize).map_or(0, |p| p.in_use.len())
    }

    pub fn is_free(&self, lod: u8, slot: usize) -> bool {
        self.lods.get(lod as usize).map_or(false, |p| p.free.contains(&slot))
    }

    pub fn is_in_use(&self, lod: u8, slot: usize) -> bool {
        self.lods.get(lod as usize).map_or(false, |p| p.in_use.contains(&slot))
    }
}

impl Default for MeshDataPool {
    fn default() -> Self {
        Self::empty()
    }
}
