use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use dimensions_benchmark::PreviewMetrics;
use dimensions_storage::{SaveGame, SaveGameExt};

use crate::slot::{SlotId, SubDimension, SLOT_ID_LIMIT};
use crate::table::SlotTable;

/// Save-game key holding the free-list.
pub const FREE_DIMENSIONS_KEY: &str = "dimensions.freeDimensions";

/// Hands out slot ids, preferring ids that were previously freed.
///
/// Freed ids are reused oldest first. Once `free` returns, the id may be given
/// to an unrelated owner by the next `allocate`, which overwrites the stale
/// table entry. Callers must drop every reference to a slot id before freeing it;
/// a reference that survives will observe the next owner's contents.
pub struct SlotAllocator {
    free: VecDeque<SlotId>,
    // True if `free` should be written again at the next world save
    dirty: bool,
    metrics: Arc<PreviewMetrics>,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(PreviewMetrics::default()))
    }

    pub fn with_metrics(metrics: Arc<PreviewMetrics>) -> Self {
        Self { free: VecDeque::new(), dirty: false, metrics }
    }

    pub fn metrics(&self) -> &Arc<PreviewMetrics> {
        &self.metrics
    }

    /// Register `slot` in the table and return its id. Fails only when the
    /// free-list is empty and the table already spans the whole slot grid.
    pub fn allocate(&mut self, table: &mut dyn SlotTable, mut slot: SubDimension) -> Result<SlotId> {
        if let Some(id) = self.free.pop_front() {
            slot.set_sub_dimension_id(id);
            table.replace(id, slot);
            self.dirty = true;
            self.metrics.record_allocation(true);
            log::info!("Recycled subdimension id {}", id);
            return Ok(id);
        }

        if table.len() >= SLOT_ID_LIMIT as usize {
            bail!("No free subdimension and the table is full ({} slots)", SLOT_ID_LIMIT);
        }
        let id = table.append(slot);
        // The table does not set the id for us
        if let Some(slot) = table.get_mut(id) {
            slot.set_sub_dimension_id(id);
        }
        self.metrics.record_allocation(false);
        log::info!("Allocated new subdimension id {}", id);
        Ok(id)
    }

    /// Clear the slot's contents and queue its id for reuse.
    pub fn free(&mut self, table: &mut dyn SlotTable, id: SlotId) {
        if self.free.contains(&id) {
            log::warn!("Subdimension id {} is already free, ignoring double free", id);
            return;
        }

        match table.get_mut(id) {
            Some(slot) => {
                if slot.sub_dimension_id() != Some(id) {
                    log::warn!(
                        "Subdimension at table position {} carries id {:?}",
                        id,
                        slot.sub_dimension_id()
                    );
                }
                slot.clear_chunks();
                slot.unload_unused_regions();
            }
            None => log::warn!("Freeing subdimension id {} with no registered contents", id),
        }

        self.free.push_back(id);
        self.dirty = true;
        self.metrics.record_free();
        log::info!("Freed subdimension id {}", id);
    }

    /// Re-register a slot at an id its owner persisted before a restart.
    ///
    /// The table registration itself is not saved, so the owner rebuilds the
    /// slot and puts it back at the same position.
    pub fn restore(&mut self, table: &mut dyn SlotTable, id: SlotId, mut slot: SubDimension) {
        if let Some(index) = self.free.iter().position(|free| *free == id) {
            log::warn!("Restored subdimension id {} was queued as free, dequeuing it", id);
            self.free.remove(index);
            self.dirty = true;
        }
        if table.get(id).is_some_and(|existing| !existing.is_empty()) {
            log::warn!("Restoring subdimension id {} over live contents", id);
        }

        slot.set_sub_dimension_id(id);
        table.replace(id, slot);
        self.metrics.record_restore();
        log::info!("Restored subdimension id {}", id);
    }

    pub fn free_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.free.iter().copied()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the free-list with the persisted one. A missing or unreadable
    /// entry leaves the list empty.
    pub fn on_save_game_loaded(&mut self, save: &dyn SaveGame) {
        self.free.clear();
        self.dirty = false;

        let raw = match save.get_data::<Vec<i32>>(FREE_DIMENSIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                log::error!("Discarding unreadable free subdimension list: {:#}", e);
                return;
            }
        };

        for value in raw {
            match SlotId::from_raw(value) {
                Some(id) if !self.free.contains(&id) => self.free.push_back(id),
                Some(id) => log::warn!("Dropping duplicate free subdimension id {}", id),
                None => log::warn!("Dropping invalid free subdimension id {}", value),
            }
        }
        log::debug!("Loaded {} free subdimension ids", self.free.len());
    }

    /// Persist the free-list if it changed since the last save.
    pub fn on_game_world_save(&mut self, save: &mut dyn SaveGame) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let raw: Vec<i32> = self.free.iter().map(|id| id.as_raw()).collect();
        save.store_data(FREE_DIMENSIONS_KEY, &raw)
            .context("Failed to store free subdimension list")?;
        self.dirty = false;
        self.metrics.record_free_list_save();
        Ok(())
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}
