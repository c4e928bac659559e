use anyhow::Result;
use dimensions_slots::{SlotId, SlotTable, SubDimension};
use dimensions_world::BlockPos;

use crate::attributes::{PreviewAttributes, NO_PREVIEW};
use crate::forward::InteractForward;
use crate::render::PreviewTracker;

/// Everything a mirror touches on the observing side.
pub struct MirrorContext<'a> {
    pub table: &'a mut dyn SlotTable,
    pub tracker: &'a mut PreviewTracker,
}

/// Observer-side view of a structure's preview.
///
/// A mirror never allocates or frees. It follows the id published by the
/// controller, keeps a slot registered at that id so streamed contents have
/// somewhere to land, and (if `set_preview` is on) points the tracker at it.
pub struct PreviewMirror {
    pos: BlockPos,
    set_preview: bool,
    preview_dimension_id: i32,
}

impl PreviewMirror {
    pub fn new(pos: BlockPos, set_preview: bool) -> Self {
        Self { pos, set_preview, preview_dimension_id: NO_PREVIEW }
    }

    pub fn from_attributes(pos: BlockPos, set_preview: bool, attributes: PreviewAttributes) -> Self {
        let mut mirror = Self::new(pos, set_preview);
        mirror.preview_dimension_id = attributes.slot_id().map_or(NO_PREVIEW, SlotId::as_raw);
        mirror
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn set_preview(&self) -> bool {
        self.set_preview
    }

    pub fn preview_dimension_id(&self) -> i32 {
        self.preview_dimension_id
    }

    pub fn slot_id(&self) -> Option<SlotId> {
        SlotId::from_raw(self.preview_dimension_id)
    }

    /// Called when the mirror is placed or loaded with attributes already set.
    pub fn initialize(&mut self, ctx: &mut MirrorContext<'_>) {
        if let Some(id) = self.slot_id() {
            self.ensure_placeholder(ctx.table, id);
            if self.set_preview {
                ctx.tracker.set_blocks_preview_dimension(id.as_raw());
            }
        }
    }

    /// Apply attributes published by the controller.
    pub fn on_sync(&mut self, attributes: PreviewAttributes, ctx: &mut MirrorContext<'_>) {
        let previous = self.slot_id();
        let next = attributes.slot_id();
        self.preview_dimension_id = next.map_or(NO_PREVIEW, SlotId::as_raw);

        match next {
            Some(id) => {
                self.ensure_placeholder(ctx.table, id);
                if self.set_preview {
                    ctx.tracker.set_blocks_preview_dimension(id.as_raw());
                }
            }
            None => {
                if let (true, Some(old)) = (self.set_preview, previous) {
                    ctx.tracker.release(old);
                }
            }
        }
        log::debug!("Structure at {} now previews {:?}", self.pos, next);
    }

    /// Decode an attribute packet and apply it. A malformed packet leaves the
    /// mirror unchanged.
    pub fn on_sync_bytes(&mut self, bytes: &[u8], ctx: &mut MirrorContext<'_>) -> Result<()> {
        let attributes = PreviewAttributes::from_nbt(bytes)?;
        self.on_sync(attributes, ctx);
        Ok(())
    }

    pub fn on_removed(&mut self, ctx: &mut MirrorContext<'_>) {
        if let (true, Some(id)) = (self.set_preview, self.slot_id()) {
            ctx.tracker.release(id);
        }
    }

    fn ensure_placeholder(&self, table: &mut dyn SlotTable, id: SlotId) {
        match table.get_mut(id) {
            // Keep whatever was already streamed into it
            Some(slot) if slot.sub_dimension_id() == Some(id) => slot.set_anchor(self.pos),
            _ => {
                let mut slot = SubDimension::new(self.pos);
                slot.set_sub_dimension_id(id);
                table.replace(id, slot);
                log::debug!("Registered placeholder subdimension {} for structure at {}", id, self.pos);
            }
        }
    }
}

// Observers pass every interaction through to the host.
impl<C: ?Sized> InteractForward<C> for PreviewMirror {}
