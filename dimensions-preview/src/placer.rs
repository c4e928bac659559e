use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use dimensions_benchmark::PreviewMetrics;
use dimensions_template::StructureTemplate;
use dimensions_world::{Block, BlockAccess, BlockPos, BlockRegistry, BlockSink};

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub checked: usize,
    pub mismatched: usize,
    pub written: usize,
    /// Mismatches whose pattern matched no registered block.
    pub unresolved: usize,
}

/// Writes the blocks a live region is missing, relative to a template, into
/// a separate target.
pub struct DiffPlacer {
    metrics: Arc<PreviewMetrics>,
}

impl DiffPlacer {
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(PreviewMetrics::default()))
    }

    pub fn with_metrics(metrics: Arc<PreviewMetrics>) -> Self {
        Self { metrics }
    }

    /// Compare every template offset around `read_anchor` in `world` and, for
    /// each mismatch, write a block matching the expected pattern at the same
    /// offset around `write_anchor` in `target`.
    ///
    /// The written block is the first registry match for the pattern. Each
    /// type index is searched at most once per call, and an empty result is
    /// remembered for the rest of the call. Offsets are visited in template
    /// order and `target` is never read back.
    pub fn reconcile(
        &self,
        template: &StructureTemplate,
        world: &dyn BlockAccess,
        registry: &dyn BlockRegistry,
        read_anchor: BlockPos,
        target: &mut dyn BlockSink,
        write_anchor: BlockPos,
    ) -> ReconcileReport {
        let started = Instant::now();
        let mut report = ReconcileReport::default();
        let mut candidates: HashMap<u32, Vec<Block>> = HashMap::new();

        for entry in template.offsets() {
            report.checked += 1;
            let Some(pattern) = template.block_pattern(entry.type_index) else {
                log::warn!("Template {} has no pattern for type index {}", template.key(), entry.type_index);
                continue;
            };

            let has = world.block_at(read_anchor + entry.offset());
            if pattern.matches(&has.code) {
                continue;
            }
            report.mismatched += 1;

            let want = candidates.entry(entry.type_index).or_insert_with(|| {
                self.metrics.record_registry_search();
                let found = registry.search_blocks(pattern);
                if found.is_empty() {
                    log::warn!("No registered block matches {}, cannot correct it", pattern);
                }
                found
            });

            match want.first() {
                Some(block) => {
                    target.set_block(write_anchor + entry.offset(), block.id);
                    report.written += 1;
                }
                None => report.unresolved += 1,
            }
        }

        self.metrics.record_reconcile(started.elapsed());
        self.metrics.record_blocks(report.checked, report.mismatched, report.written, report.unresolved);
        log::debug!(
            "Reconciled {} at {}: {} checked, {} mismatched, {} written, {} unresolved",
            template.key(),
            read_anchor,
            report.checked,
            report.mismatched,
            report.written,
            report.unresolved
        );
        report
    }
}

impl Default for DiffPlacer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimensions_template::TemplateDefinition;
    use dimensions_world::{BlockCode, BlockId, BlockPattern, BlockTable};
    use std::cell::Cell;

    struct MockWorld {
        registry: BlockTable,
        blocks: HashMap<BlockPos, BlockId>,
    }

    impl MockWorld {
        fn new(registry: BlockTable) -> Self {
            Self { registry, blocks: HashMap::new() }
        }

        fn put(&mut self, pos: BlockPos, code: &str) {
            let code = BlockCode::parse(code).expect("Should parse");
            let id = self.registry.id_of(&code).expect("Should be registered");
            self.blocks.insert(pos, id);
        }
    }

    impl BlockAccess for MockWorld {
        fn block_at(&self, pos: BlockPos) -> Block {
            let id = self.blocks.get(&pos).copied().unwrap_or(BlockId::AIR);
            self.registry.get(id).cloned().unwrap_or_else(Block::air)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<(BlockPos, BlockId)>,
    }

    impl BlockSink for RecordingSink {
        fn set_block(&mut self, pos: BlockPos, block: BlockId) {
            self.writes.push((pos, block));
        }
    }

    struct CountingRegistry<'a> {
        inner: &'a BlockTable,
        searches: Cell<usize>,
    }

    impl BlockRegistry for CountingRegistry<'_> {
        fn search_blocks(&self, pattern: &BlockPattern) -> Vec<Block> {
            self.searches.set(self.searches.get() + 1);
            self.inner.search_blocks(pattern)
        }
    }

    fn registry() -> BlockTable {
        let mut table = BlockTable::new();
        table
            .register_all(["dirt", "stone", "spruce_log", "oak_log", "glass"])
            .expect("Should register");
        table
    }

    fn template(json: &str) -> StructureTemplate {
        StructureTemplate::build(&TemplateDefinition::from_json(json).expect("Should parse"))
            .expect("Should build")
    }

    const WRITE_ANCHOR: BlockPos = BlockPos::new(8192, 8192, 8192);

    #[test]
    fn test_mismatch_writes_first_candidate() {
        let template = template(r#"{"blockNumbers": {"stone": 1}, "offsets": [{"x": 0, "y": 0, "z": 0, "w": 1}]}"#);
        let mut world = MockWorld::new(registry());
        let anchor = BlockPos::new(10, 64, -3);
        world.put(anchor, "dirt");

        let mut sink = RecordingSink::default();
        let report = DiffPlacer::new().reconcile(&template, &world, &world.registry, anchor, &mut sink, WRITE_ANCHOR);

        let stone = world.registry.id_of(&BlockCode::parse("stone").expect("Should parse")).expect("Registered");
        assert_eq!(sink.writes, vec![(WRITE_ANCHOR, stone)]);
        assert_eq!(report, ReconcileReport { checked: 1, mismatched: 1, written: 1, unresolved: 0 });
    }

    #[test]
    fn test_match_writes_nothing() {
        let template = template(r#"{"blockNumbers": {"stone": 1}, "offsets": [{"x": 0, "y": 0, "z": 0, "w": 1}]}"#);
        let mut world = MockWorld::new(registry());
        let anchor = BlockPos::new(0, 0, 0);
        world.put(anchor, "stone");

        let mut sink = RecordingSink::default();
        let report = DiffPlacer::new().reconcile(&template, &world, &world.registry, anchor, &mut sink, WRITE_ANCHOR);

        assert!(sink.writes.is_empty());
        assert_eq!(report.mismatched, 0);
    }

    #[test]
    fn test_wildcard_pattern() {
        let template = template(
            r#"{"blockNumbers": {"*_log": 0}, "offsets": [
                {"x": 0, "y": 0, "z": 0, "w": 0},
                {"x": 0, "y": 1, "z": 0, "w": 0}
            ]}"#,
        );
        let mut world = MockWorld::new(registry());
        let anchor = BlockPos::new(5, 5, 5);
        world.put(anchor, "oak_log");

        let mut sink = RecordingSink::default();
        DiffPlacer::new().reconcile(&template, &world, &world.registry, anchor, &mut sink, WRITE_ANCHOR);

        // Only the empty position is corrected, with the first registered log
        let spruce = world.registry.id_of(&BlockCode::parse("spruce_log").expect("Should parse")).expect("Registered");
        assert_eq!(sink.writes, vec![(WRITE_ANCHOR.offset(0, 1, 0), spruce)]);
    }

    #[test]
    fn test_search_once_per_type_index() {
        let template = template(
            r#"{"blockNumbers": {"stone": 0, "glass": 1}, "offsets": [
                {"x": 0, "y": 0, "z": 0, "w": 0},
                {"x": 1, "y": 0, "z": 0, "w": 1},
                {"x": 2, "y": 0, "z": 0, "w": 0},
                {"x": 3, "y": 0, "z": 0, "w": 0}
            ]}"#,
        );
        let table = registry();
        let world = MockWorld::new(table.clone());
        let counting = CountingRegistry { inner: &table, searches: Cell::new(0) };

        let mut sink = RecordingSink::default();
        let report = DiffPlacer::new().reconcile(&template, &world, &counting, BlockPos::default(), &mut sink, WRITE_ANCHOR);

        assert_eq!(counting.searches.get(), 2);
        assert_eq!(report.written, 4);
        // Writes follow template order
        let xs: Vec<i32> = sink.writes.iter().map(|(pos, _)| pos.x - WRITE_ANCHOR.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_unresolvable_pattern_skipped() {
        let template = template(
            r#"{"blockNumbers": {"diamond_block": 0, "stone": 1}, "offsets": [
                {"x": 0, "y": 0, "z": 0, "w": 0},
                {"x": 0, "y": 1, "z": 0, "w": 1},
                {"x": 0, "y": 2, "z": 0, "w": 0}
            ]}"#,
        );
        let table = registry();
        let world = MockWorld::new(table.clone());
        let counting = CountingRegistry { inner: &table, searches: Cell::new(0) };

        let mut sink = RecordingSink::default();
        let report = DiffPlacer::new().reconcile(&template, &world, &counting, BlockPos::default(), &mut sink, WRITE_ANCHOR);

        // The empty lookup is not retried for the second diamond position
        assert_eq!(counting.searches.get(), 2);
        assert_eq!(report, ReconcileReport { checked: 3, mismatched: 3, written: 1, unresolved: 2 });
        assert_eq!(sink.writes.len(), 1);
        assert_eq!(sink.writes[0].0, WRITE_ANCHOR.offset(0, 1, 0));
    }

    #[test]
    fn test_metrics_recorded() {
        use std::sync::atomic::Ordering;

        let metrics = Arc::new(PreviewMetrics::default());
        let placer = DiffPlacer::with_metrics(Arc::clone(&metrics));
        let template = template(r#"{"blockNumbers": {"stone": 1}, "offsets": [{"x": 0, "y": 0, "z": 0, "w": 1}]}"#);
        let world = MockWorld::new(registry());

        let mut sink = RecordingSink::default();
        placer.reconcile(&template, &world, &world.registry, BlockPos::default(), &mut sink, WRITE_ANCHOR);

        assert_eq!(metrics.total_reconciles.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_blocks_written.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_registry_searches.load(Ordering::Relaxed), 1);
    }
}
