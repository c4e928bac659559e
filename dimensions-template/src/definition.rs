use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use dimensions_world::BlockPattern;
use serde::{Deserialize, Serialize};

use crate::template::TemplateOffset;

/// Number of horizontal rotations a definition can be resolved into.
pub const VARIANT_COUNT: u8 = 4;

/// Offsets must stay strictly below this on every axis so a preview never
/// leaves its slot's storage cell.
pub const MAX_OFFSET_EXTENT: i32 = 8192;

/// Raw structure definition as authored in JSON.
///
/// ```json
/// {
///   "name": "furnace",
///   "blockNumbers": { "stone_bricks": 0, "*_log": 1 },
///   "offsets": [ { "x": 0, "y": 0, "z": 0, "w": 0 } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    /// Declared identity; definitions without one are keyed by content hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    // Pattern -> type index
    #[serde(rename = "blockNumbers")]
    pub block_numbers: BTreeMap<String, u32>,

    pub offsets: Vec<OffsetEntry>,
}

/// One expected block. `w` is the type index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetEntry {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: u32,
}

impl TemplateDefinition {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse template definition")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize template definition")
    }

    /// Invert `blockNumbers` and rotate the offsets into `variant`
    /// (`variant * 90` degrees around the Y axis).
    pub fn resolve(&self, variant: u8) -> Result<(BTreeMap<u32, BlockPattern>, Vec<TemplateOffset>)> {
        if variant >= VARIANT_COUNT {
            bail!("Template variant {} out of range 0..{}", variant, VARIANT_COUNT);
        }

        let mut block_codes = BTreeMap::new();
        for (pattern, type_index) in &self.block_numbers {
            let parsed = BlockPattern::parse(pattern)
                .with_context(|| format!("Bad block pattern {:?} in template", pattern))?;
            if let Some(previous) = block_codes.insert(*type_index, parsed) {
                bail!("Type index {} used by both {} and {:?}", type_index, previous, pattern);
            }
        }

        let mut offsets = Vec::with_capacity(self.offsets.len());
        for entry in &self.offsets {
            if !block_codes.contains_key(&entry.w) {
                bail!(
                    "Offset ({}, {}, {}) refers to unknown type index {}",
                    entry.x, entry.y, entry.z, entry.w
                );
            }
            if [entry.x, entry.y, entry.z].iter().any(|v| v.unsigned_abs() >= MAX_OFFSET_EXTENT as u32) {
                bail!(
                    "Offset ({}, {}, {}) is outside the {} block preview extent",
                    entry.x, entry.y, entry.z, MAX_OFFSET_EXTENT
                );
            }
            let (dx, dz) = rotate(entry.x, entry.z, variant);
            offsets.push(TemplateOffset { dx, dy: entry.y, dz, type_index: entry.w });
        }

        Ok((block_codes, offsets))
    }
}

fn rotate(x: i32, z: i32, variant: u8) -> (i32, i32) {
    match variant % VARIANT_COUNT {
        0 => (x, z),
        1 => (-z, x),
        2 => (-x, -z),
        _ => (z, -x),
    }
}
