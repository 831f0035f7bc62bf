use stepci_model::TaskOrder;

use crate::metrics::backend::{ImageLookup, MetricsBackend};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_unit_created(&self) {}

    #[inline(always)]
    fn record_transition(&self, _: TaskOrder, _: TaskOrder) {}

    #[inline(always)]
    fn record_image_lookup(&self, _: ImageLookup) {}

    #[inline(always)]
    fn record_build_error(&self, _: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpMetrics>(), 0);
    }

    #[test]
    fn noop_can_be_called_repeatedly() {
        let metrics = NoOpMetrics;
        for _ in 0..1000 {
            metrics.record_unit_created();
            metrics.record_transition(TaskOrder::NotStarted, TaskOrder::Step(1));
            metrics.record_image_lookup(ImageLookup::Hit);
            metrics.record_build_error("lookup");
        }
    }

    #[test]
    fn lookup_labels() {
        assert_eq!(ImageLookup::Hit.as_label(), "hit");
        assert_eq!(ImageLookup::Miss.as_label(), "miss");
    }
}
