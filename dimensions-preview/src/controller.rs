use std::sync::Arc;

use dimensions_slots::{slot_center, SlotAllocator, SlotId, SlotTable, SubDimension};
use dimensions_template::StructureTemplate;
use dimensions_world::{BlockAccess, BlockPos, BlockRegistry};

use crate::attributes::{PreviewAttributes, NO_PREVIEW};
use crate::forward::{Handling, InteractForward};
use crate::placer::{DiffPlacer, ReconcileReport};

/// Everything a controller touches on the authoritative side.
pub struct ServerContext<'a> {
    pub allocator: &'a mut SlotAllocator,
    pub table: &'a mut dyn SlotTable,
    pub world: &'a dyn BlockAccess,
    pub registry: &'a dyn BlockRegistry,
    pub placer: &'a DiffPlacer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Inactive,
    Active(SlotId),
}

/// Authoritative preview state of one structure.
///
/// While active the controller owns exactly one slot, anchored at the
/// structure's position and holding the blocks the structure is missing.
pub struct PreviewController {
    pos: BlockPos,
    template: Arc<StructureTemplate>,
    preview_dimension_id: i32,
    // Whether the slot for `preview_dimension_id` is registered in this process
    has_slot: bool,
    // Attributes changed since the last `take_sync`
    dirty: bool,
}

impl PreviewController {
    pub fn new(pos: BlockPos, template: Arc<StructureTemplate>) -> Self {
        Self {
            pos,
            template,
            preview_dimension_id: NO_PREVIEW,
            has_slot: false,
            dirty: false,
        }
    }

    /// Restore a controller from its saved attributes. The slot itself is
    /// re-registered by [`initialize`](Self::initialize).
    pub fn from_attributes(pos: BlockPos, template: Arc<StructureTemplate>, attributes: PreviewAttributes) -> Self {
        let mut controller = Self::new(pos, template);
        match attributes.slot_id() {
            Some(id) => controller.preview_dimension_id = id.as_raw(),
            None if attributes.preview_dimension_id != NO_PREVIEW => {
                log::warn!(
                    "Structure at {} saved invalid preview id {}, treating it as inactive",
                    pos,
                    attributes.preview_dimension_id
                );
            }
            None => {}
        }
        controller
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn template(&self) -> &Arc<StructureTemplate> {
        &self.template
    }

    pub fn preview_dimension_id(&self) -> i32 {
        self.preview_dimension_id
    }

    pub fn has_slot(&self) -> bool {
        self.has_slot
    }

    pub fn state(&self) -> PreviewState {
        match SlotId::from_raw(self.preview_dimension_id) {
            Some(id) => PreviewState::Active(id),
            None => PreviewState::Inactive,
        }
    }

    /// Bring a loaded controller back in sync with the slot table: if a
    /// preview was active when the world was saved, re-register its slot at
    /// the same id and fill it again.
    ///
    /// Must run before any slot is allocated in the new session.
    pub fn initialize(&mut self, ctx: &mut ServerContext<'_>) {
        let PreviewState::Active(id) = self.state() else {
            return;
        };
        if self.has_slot {
            return;
        }

        ctx.allocator.restore(ctx.table, id, SubDimension::new(self.pos));
        self.has_slot = true;
        self.populate(ctx, id);
        log::info!("Rehydrated preview of structure at {} in subdimension {}", self.pos, id);
    }

    /// Toggle the preview and return the new state.
    pub fn on_interact(&mut self, ctx: &mut ServerContext<'_>) -> PreviewState {
        match self.state() {
            PreviewState::Inactive => {
                let id = match ctx.allocator.allocate(ctx.table, SubDimension::new(self.pos)) {
                    Ok(id) => id,
                    Err(e) => {
                        log::error!("Cannot open preview of structure at {}: {:#}", self.pos, e);
                        return self.state();
                    }
                };
                self.preview_dimension_id = id.as_raw();
                self.has_slot = true;
                self.populate(ctx, id);
                log::info!("Opened preview of structure at {} in subdimension {}", self.pos, id);
            }
            PreviewState::Active(id) => {
                self.close(ctx, id);
                log::info!("Closed preview of structure at {}", self.pos);
            }
        }
        self.dirty = true;
        self.state()
    }

    /// The structure was broken; release its slot if it holds one.
    pub fn on_removed(&mut self, ctx: &mut ServerContext<'_>) {
        if let PreviewState::Active(id) = self.state() {
            self.close(ctx, id);
            self.dirty = true;
            log::info!("Structure at {} removed, released subdimension {}", self.pos, id);
        }
    }

    pub fn to_attributes(&self) -> PreviewAttributes {
        PreviewAttributes::new(self.preview_dimension_id)
    }

    /// Attributes to publish to observers, if they changed since last time.
    pub fn take_sync(&mut self) -> Option<PreviewAttributes> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.to_attributes())
    }

    fn close(&mut self, ctx: &mut ServerContext<'_>, id: SlotId) {
        ctx.allocator.free(ctx.table, id);
        self.preview_dimension_id = NO_PREVIEW;
        self.has_slot = false;
    }

    fn populate(&self, ctx: &mut ServerContext<'_>, id: SlotId) -> Option<ReconcileReport> {
        let Some(slot) = ctx.table.get_mut(id) else {
            log::warn!("Subdimension {} is not registered, cannot fill preview", id);
            return None;
        };
        // Slot-relative origin is the centre of its storage cell
        let report = ctx.placer.reconcile(&self.template, ctx.world, ctx.registry, self.pos, slot, slot_center(id));
        Some(report)
    }
}

impl<'a> InteractForward<ServerContext<'a>> for PreviewController {
    fn on_interact_start(&mut self, ctx: &mut ServerContext<'a>, handling: &mut Handling) -> bool {
        self.on_interact(ctx);
        *handling = Handling::Handled;
        true
    }
}
