//! Structure previews rendered through sub-dimension slots.
//!
//! The authoritative side runs a [`PreviewController`] per structure: on
//! interaction it takes a slot from the allocator, fills it with the blocks
//! the live world is missing ([`DiffPlacer`]) and publishes the slot id.
//! The observing side runs a [`PreviewMirror`] that only follows the published
//! id, and a [`RenderOffsetPolicy`] keeps every slot but the tracked one out
//! of view.

pub mod attributes;
pub mod controller;
pub mod forward;
pub mod mirror;
pub mod placer;
pub mod render;

pub use attributes::{PreviewAttributes, NO_PREVIEW};
pub use controller::{PreviewController, PreviewState, ServerContext};
pub use forward::{forward_interaction, Handling, InteractForward, InteractOutcome};
pub use mirror::{MirrorContext, PreviewMirror};
pub use placer::{DiffPlacer, ReconcileReport};
pub use render::{
    render_offsets, render_origin, AnchoredOffset, PreviewTracker, RenderOffset, RenderOffsetPolicy,
};
