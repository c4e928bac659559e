use dimensions_slots::{SlotId, SlotTable, SubDimension};
use dimensions_world::BlockPos;

/// Translation applied to a slot's storage coordinates when it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderOffset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RenderOffset {
    pub const ZERO: RenderOffset = RenderOffset { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Offset that moves `from` onto `to`.
    pub fn between(from: BlockPos, to: BlockPos) -> Self {
        Self::new(
            f64::from(to.x) - f64::from(from.x),
            f64::from(to.y) - f64::from(from.y),
            f64::from(to.z) - f64::from(from.z),
        )
    }
}

/// The single slot the local renderer shows at its anchor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PreviewTracker {
    tracked: Option<SlotId>,
}

impl PreviewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the slot with raw id `raw`; a negative value stops tracking.
    pub fn set_blocks_preview_dimension(&mut self, raw: i32) {
        self.tracked = SlotId::from_raw(raw);
    }

    pub fn tracked(&self) -> Option<SlotId> {
        self.tracked
    }

    /// Stop tracking `id`, leaving any other tracked slot alone.
    pub fn release(&mut self, id: SlotId) {
        if self.tracked == Some(id) {
            self.tracked = None;
        }
    }
}

pub trait RenderOffsetPolicy {
    fn render_offset(&self, slot: &SubDimension, tracked: bool) -> RenderOffset;
}

/// Draws the tracked slot over its anchor. Every other slot stays in its
/// storage cell, at least half a cell away from the real world.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnchoredOffset;

impl RenderOffsetPolicy for AnchoredOffset {
    fn render_offset(&self, slot: &SubDimension, tracked: bool) -> RenderOffset {
        if !tracked {
            return RenderOffset::ZERO;
        }
        match slot.center() {
            Some(center) => RenderOffset::between(center, slot.anchor()),
            None => RenderOffset::ZERO,
        }
    }
}

/// World position where the slot's origin ends up once `offset` is applied.
pub fn render_origin(slot: &SubDimension, offset: RenderOffset) -> Option<RenderOffset> {
    slot.center().map(|center| {
        RenderOffset::new(
            f64::from(center.x) + offset.x,
            f64::from(center.y) + offset.y,
            f64::from(center.z) + offset.z,
        )
    })
}

/// Offsets for every loaded slot, in table order.
pub fn render_offsets(
    table: &dyn SlotTable,
    tracker: &PreviewTracker,
    policy: &dyn RenderOffsetPolicy,
) -> Vec<(SlotId, RenderOffset)> {
    table
        .loaded_ids()
        .into_iter()
        .filter_map(|id| {
            let slot = table.get(id)?;
            let tracked = tracker.tracked() == Some(id);
            Some((id, policy.render_offset(slot, tracked)))
        })
        .collect()
}
