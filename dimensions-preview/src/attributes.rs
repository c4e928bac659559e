use anyhow::{Context, Result};
use dimensions_slots::SlotId;
use serde::{Deserialize, Serialize};

/// `previewDimensionId` value meaning "no active preview".
pub const NO_PREVIEW: i32 = -1;

fn no_preview() -> i32 {
    NO_PREVIEW
}

/// Attributes a structure saves with itself and sends to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewAttributes {
    // Absent means no preview; 0 is a valid slot id
    #[serde(rename = "previewDimensionId", default = "no_preview")]
    pub preview_dimension_id: i32,
}

impl PreviewAttributes {
    pub fn new(preview_dimension_id: i32) -> Self {
        Self { preview_dimension_id }
    }

    pub fn slot_id(&self) -> Option<SlotId> {
        SlotId::from_raw(self.preview_dimension_id)
    }

    pub fn to_nbt(&self) -> Result<Vec<u8>> {
        fastnbt::to_bytes(self).context("Failed to encode preview attributes")
    }

    pub fn from_nbt(bytes: &[u8]) -> Result<Self> {
        fastnbt::from_bytes(bytes).context("Failed to decode preview attributes")
    }
}

impl Default for PreviewAttributes {
    fn default() -> Self {
        Self::new(NO_PREVIEW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Unrelated {
        other: i32,
    }

    #[test]
    fn test_nbt_round_trip() {
        let attributes = PreviewAttributes::new(12);
        let bytes = attributes.to_nbt().expect("Should encode");
        assert_eq!(PreviewAttributes::from_nbt(&bytes).expect("Should decode"), attributes);
        assert_eq!(attributes.slot_id(), Some(SlotId(12)));
    }

    #[test]
    fn test_missing_field_is_no_preview() {
        let bytes = fastnbt::to_bytes(&Unrelated { other: 0 }).expect("Should encode");
        let attributes = PreviewAttributes::from_nbt(&bytes).expect("Should decode");
        assert_eq!(attributes.preview_dimension_id, NO_PREVIEW);
        assert_eq!(attributes.slot_id(), None);
    }

    #[test]
    fn test_default_is_no_preview() {
        assert_eq!(PreviewAttributes::default().slot_id(), None);
    }
}
