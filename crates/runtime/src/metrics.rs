use std::collections::BTreeMap;

/// Metric names recorded by the frame driver.
pub mod names {
    /// Frames stepped while the scene was loaded.
    pub const FRAMES: &str = "frames";
    /// Frames where the lift pass was skipped because the field was at rest.
    pub const LIFT_SKIPPED: &str = "lift.skipped";
    /// Frames where the lift pass ran over the dot array.
    pub const LIFT_PASSES: &str = "lift.passes";
    /// Dot transforms written per lift pass.
    pub const LIFT_DOTS_WRITTEN: &str = "lift.dots_written";
    /// Hotspot markers repositioned.
    pub const SYNC_HOTSPOTS_MOVED: &str = "sync.hotspots_moved";
    /// Connector buffers rewritten in place.
    pub const SYNC_REWRITES: &str = "sync.rewrites";
    /// Connector buffers replaced.
    pub const SYNC_REBUILDS: &str = "sync.rebuilds";
    /// Redraw requests issued to the render side.
    pub const REDRAWS: &str = "redraws";
    /// Dots currently above the settle threshold.
    pub const ACTIVE_DOTS: &str = "lift.active_dots";
}

/// Deterministic metrics aggregation.
///
/// Names are static strings and storage is ordered, so snapshots are stable
/// across runs and can be compared in tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
    histograms: BTreeMap<&'static str, Histogram>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: u64,
    pub max: u64,
}

impl Histogram {
    pub fn record(&mut self, value: u64) {
        self.count += 1;
        self.sum += value;
        self.max = self.max.max(value);
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
    pub histograms: Vec<(&'static str, Histogram)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: &'static str, by: u64) {
        *self.counters.entry(name).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    pub fn record_histogram(&mut self, name: &'static str, value: u64) {
        self.histograms.entry(name).or_default().record(value);
    }

    pub fn histogram(&self, name: &str) -> Option<Histogram> {
        self.histograms.get(name).copied()
    }

    /// Returns a stable, sorted snapshot suitable for logs and CLI reports.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
            histograms: self.histograms.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Histogram, Metrics, names};
    use pretty_assertions::assert_eq;

    #[test]
    fn counters_accumulate() {
        let mut m = Metrics::new();
        m.inc_counter(names::FRAMES, 1);
        m.inc_counter(names::FRAMES, 2);
        assert_eq!(m.counter(names::FRAMES), 3);
        assert_eq!(m.counter("missing"), 0);
    }

    #[test]
    fn gauges_overwrite() {
        let mut m = Metrics::new();
        assert_eq!(m.gauge(names::ACTIVE_DOTS), None);
        m.set_gauge(names::ACTIVE_DOTS, 10);
        m.set_gauge(names::ACTIVE_DOTS, 11);
        assert_eq!(m.gauge(names::ACTIVE_DOTS), Some(11));
    }

    #[test]
    fn histogram_tracks_mean_and_max() {
        let mut h = Histogram::default();
        assert_eq!(h.mean(), 0.0);
        h.record(5);
        h.record(1);
        h.record(6);
        assert_eq!(h.count, 3);
        assert_eq!(h.max, 6);
        assert_eq!(h.mean(), 4.0);
    }

    #[test]
    fn snapshot_is_stably_sorted() {
        let mut m = Metrics::new();
        m.inc_counter(names::SYNC_REWRITES, 1);
        m.inc_counter(names::FRAMES, 1);
        m.record_histogram(names::LIFT_DOTS_WRITTEN, 3);

        let snap = m.snapshot();
        assert_eq!(
            snap.counters,
            vec![(names::FRAMES, 1), (names::SYNC_REWRITES, 1)]
        );
        assert_eq!(snap.histograms.len(), 1);
        assert_eq!(snap.histograms[0].1.sum, 3);
    }
}
