//! Multi-block structure templates.
//!
//! A [`TemplateDefinition`] is the raw JSON description; a
//! [`StructureTemplate`] is the parsed, immutable form served to every
//! structure instance built from that definition through the
//! [`TemplateRegistry`].

pub mod definition;
pub mod registry;
pub mod template;

pub use definition::{OffsetEntry, TemplateDefinition, MAX_OFFSET_EXTENT};
pub use registry::{TemplateKey, TemplateRegistry};
pub use template::{StructureTemplate, TemplateOffset};
