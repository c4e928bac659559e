use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct PreviewMetrics {
    // Slot lifecycle
    pub total_slots_allocated: AtomicUsize,
    pub total_slots_recycled: AtomicUsize,
    pub total_slots_freed: AtomicUsize,
    pub total_slots_restored: AtomicUsize,
    pub total_free_list_saves: AtomicUsize,

    // Reconciliation
    pub total_reconciles: AtomicUsize,
    pub total_reconcile_time_us: AtomicU64,
    pub max_reconcile_time_us: AtomicU64,
    pub total_blocks_checked: AtomicUsize,
    pub total_blocks_mismatched: AtomicUsize,
    pub total_blocks_written: AtomicUsize,
    pub total_blocks_unresolved: AtomicUsize,
    pub total_registry_searches: AtomicUsize,

    // Template cache
    pub total_template_hits: AtomicUsize,
    pub total_template_misses: AtomicUsize,

    // Session
    pub start_time: Option<Instant>,
    pub config_summary: String,
}

impl PreviewMetrics {
    pub fn new(config_summary: String) -> Self {
        Self {
            start_time: Some(Instant::now()),
            config_summary,
            ..Default::default()
        }
    }

    /// `recycled` is true when the id came off the free-list.
    pub fn record_allocation(&self, recycled: bool) {
        if recycled {
            self.total_slots_recycled.fetch_add(1, Ordering::Relaxed);
        } else {
            self.total_slots_allocated.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_free(&self) {
        self.total_slots_freed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_restore(&self) {
        self.total_slots_restored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_free_list_save(&self) {
        self.total_free_list_saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconcile(&self, duration: Duration) {
        self.total_reconciles.fetch_add(1, Ordering::Relaxed);
        let us = duration.as_micros() as u64;
        self.total_reconcile_time_us.fetch_add(us, Ordering::Relaxed);
        self.max_reconcile_time_us.fetch_max(us, Ordering::Relaxed);
    }

    pub fn record_blocks(&self, checked: usize, mismatched: usize, written: usize, unresolved: usize) {
        self.total_blocks_checked.fetch_add(checked, Ordering::Relaxed);
        self.total_blocks_mismatched.fetch_add(mismatched, Ordering::Relaxed);
        self.total_blocks_written.fetch_add(written, Ordering::Relaxed);
        self.total_blocks_unresolved.fetch_add(unresolved, Ordering::Relaxed);
    }

    pub fn record_registry_search(&self) {
        self.total_registry_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_template_hit(&self) {
        self.total_template_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_template_miss(&self) {
        self.total_template_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn generate_report(&self) -> String {
        let uptime = self.start_time.unwrap_or_else(Instant::now).elapsed();

        let allocated = self.total_slots_allocated.load(Ordering::Relaxed);
        let recycled = self.total_slots_recycled.load(Ordering::Relaxed);
        let freed = self.total_slots_freed.load(Ordering::Relaxed);
        let restored = self.total_slots_restored.load(Ordering::Relaxed);
        let saves = self.total_free_list_saves.load(Ordering::Relaxed);
        let reuse_rate = if allocated + recycled > 0 {
            (recycled as f64 / (allocated + recycled) as f64) * 100.0
        } else { 0.0 };

        let reconciles = self.total_reconciles.load(Ordering::Relaxed);
        let reconcile_total = self.total_reconcile_time_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let reconcile_max = self.max_reconcile_time_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let reconcile_avg = if reconciles > 0 { reconcile_total / reconciles as f64 } else { 0.0 };

        let checked = self.total_blocks_checked.load(Ordering::Relaxed);
        let mismatched = self.total_blocks_mismatched.load(Ordering::Relaxed);
        let written = self.total_blocks_written.load(Ordering::Relaxed);
        let unresolved = self.total_blocks_unresolved.load(Ordering::Relaxed);
        let searches = self.total_registry_searches.load(Ordering::Relaxed);

        let hits = self.total_template_hits.load(Ordering::Relaxed);
        let misses = self.total_template_misses.load(Ordering::Relaxed);
        let total_requests = hits + misses;
        let hit_rate = if total_requests > 0 { (hits as f64 / total_requests as f64) * 100.0 } else { 0.0 };

        format!(
            "Dimensions Preview Report\n\
             =========================\n\
             Configuration: {}\n\
             Session Duration: {:.2?}\n\n\
             [Slots]\n\
             Allocated (new): {}\n\
             Recycled: {}\n\
             Freed: {}\n\
             Restored: {}\n\
             Reuse Rate: {:.1}%\n\
             Free-list Saves: {}\n\n\
             [Reconcile]\n\
             Passes: {}\n\
             Avg Time: {:.3} ms/pass\n\
             Max Time: {:.3} ms\n\
             Blocks Checked: {}\n\
             Mismatched: {}\n\
             Written: {}\n\
             Unresolved: {}\n\
             Registry Searches: {}\n\n\
             [Template Cache]\n\
             Hits: {}\n\
             Misses: {}\n\
             Hit Rate: {:.1}%\n",
            self.config_summary,
            uptime,
            allocated, recycled, freed, restored, reuse_rate, saves,
            reconciles, reconcile_avg, reconcile_max,
            checked, mismatched, written, unresolved, searches,
            hits, misses, hit_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_split() {
        let metrics = PreviewMetrics::default();
        metrics.record_allocation(false);
        metrics.record_allocation(true);
        metrics.record_allocation(true);

        assert_eq!(metrics.total_slots_allocated.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_slots_recycled.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_reconcile_max() {
        let metrics = PreviewMetrics::default();
        metrics.record_reconcile(Duration::from_micros(40));
        metrics.record_reconcile(Duration::from_micros(90));
        metrics.record_reconcile(Duration::from_micros(10));

        assert_eq!(metrics.total_reconciles.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.max_reconcile_time_us.load(Ordering::Relaxed), 90);
        assert_eq!(metrics.total_reconcile_time_us.load(Ordering::Relaxed), 140);
    }

    #[test]
    fn test_report_mentions_counters() {
        let metrics = PreviewMetrics::new("unit".to_string());
        metrics.record_template_hit();
        metrics.record_template_miss();
        let report = metrics.generate_report();

        assert!(report.contains("Configuration: unit"));
        assert!(report.contains("Hit Rate: 50.0%"));
    }
}
