use std::collections::BTreeMap;

use anyhow::Result;
use dimensions_world::{BlockPattern, BlockPos};

use crate::definition::TemplateDefinition;
use crate::registry::TemplateKey;

/// Expected block at `(dx, dy, dz)` from the structure's anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateOffset {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
    pub type_index: u32,
}

impl TemplateOffset {
    pub fn offset(&self) -> BlockPos {
        BlockPos::new(self.dx, self.dy, self.dz)
    }
}

/// Parsed structure template. Immutable once built; share it through `Arc`.
#[derive(Debug)]
pub struct StructureTemplate {
    key: TemplateKey,
    variant: u8,
    block_codes: BTreeMap<u32, BlockPattern>,
    offsets: Vec<TemplateOffset>,
}

impl StructureTemplate {
    /// Build the unrotated variant, which is all previews use.
    pub fn build(definition: &TemplateDefinition) -> Result<Self> {
        Self::build_variant(definition, 0)
    }

    pub fn build_variant(definition: &TemplateDefinition, variant: u8) -> Result<Self> {
        let key = TemplateKey::for_definition(definition)?;
        let (block_codes, offsets) = definition.resolve(variant)?;
        Ok(Self { key, variant, block_codes, offsets })
    }

    pub fn key(&self) -> &TemplateKey {
        &self.key
    }

    pub fn variant(&self) -> u8 {
        self.variant
    }

    pub fn block_pattern(&self, type_index: u32) -> Option<&BlockPattern> {
        self.block_codes.get(&type_index)
    }

    pub fn block_codes(&self) -> impl Iterator<Item = (u32, &BlockPattern)> {
        self.block_codes.iter().map(|(index, pattern)| (*index, pattern))
    }

    /// Offsets in definition order.
    pub fn offsets(&self) -> &[TemplateOffset] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_keeps_order() {
        let definition = TemplateDefinition::from_json(
            r#"{
                "name": "column",
                "blockNumbers": {"stone": 4, "glass": 2},
                "offsets": [
                    {"x": 0, "y": 2, "z": 0, "w": 2},
                    {"x": 0, "y": 0, "z": 0, "w": 4},
                    {"x": 0, "y": 1, "z": 0, "w": 4}
                ]
            }"#,
        )
        .expect("Should parse");
        let template = StructureTemplate::build(&definition).expect("Should build");

        assert_eq!(template.variant(), 0);
        assert_eq!(template.key(), &TemplateKey::Named("column".to_string()));
        assert_eq!(template.len(), 3);
        let ys: Vec<i32> = template.offsets().iter().map(|o| o.dy).collect();
        assert_eq!(ys, vec![2, 0, 1]);
        assert_eq!(template.block_pattern(2).map(|p| p.to_string()).as_deref(), Some("minecraft:glass"));
        assert!(template.block_pattern(3).is_none());
        assert_eq!(template.block_codes().map(|(i, _)| i).collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_far_offset_never_builds() {
        let definition = TemplateDefinition::from_json(
            r#"{"blockNumbers": {"stone": 0}, "offsets": [{"x": 2147483000, "y": 0, "z": 0, "w": 0}]}"#,
        )
        .expect("Should parse");
        assert!(StructureTemplate::build(&definition).is_err());
    }
}
