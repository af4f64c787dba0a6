//! Simulation metrics.

use std::collections::BTreeMap;

/// Simulation metrics.
#[derive(Debug, Clone, Default)]
pub struct SimulationMetrics {
    /// Total mutations attempted.
    pub total_operations: u64,
    /// Mutations the ledger committed.
    pub committed_operations: u64,
    /// Rejected mutations, by error code.
    pub rejected_by_code: BTreeMap<&'static str, u64>,
    /// Committed mutations whose save failed.
    pub failed_saves: u64,
    /// Quotes served.
    pub quotes: u64,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed mutation.
    pub fn record_committed(&mut self, saved: bool) {
        self.total_operations += 1;
        self.committed_operations += 1;
        if !saved {
            self.failed_saves += 1;
        }
    }

    /// Record a rejected mutation.
    pub fn record_rejected(&mut self, code: &'static str) {
        self.total_operations += 1;
        *self.rejected_by_code.entry(code).or_insert(0) += 1;
    }

    pub fn record_quote(&mut self) {
        self.quotes += 1;
    }

    /// Rejected mutations across all codes.
    pub fn rejected_operations(&self) -> u64 {
        self.rejected_by_code.values().sum()
    }

    /// Get success rate.
    pub fn success_rate(&self) -> f64 {
        if self.total_operations == 0 {
            return 0.0;
        }

        self.committed_operations as f64 / self.total_operations as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let mut metrics = SimulationMetrics::new();

        metrics.record_committed(true);
        metrics.record_committed(false);
        metrics.record_committed(true);
        metrics.record_rejected("INSUFFICIENT_BALANCE");
        metrics.record_quote();

        assert_eq!(metrics.total_operations, 4);
        assert_eq!(metrics.committed_operations, 3);
        assert_eq!(metrics.failed_saves, 1);
        assert_eq!(metrics.rejected_operations(), 1);
        assert_eq!(metrics.quotes, 1);
        assert_eq!(metrics.success_rate(), 0.75);
    }

    #[test]
    fn test_rejections_grouped_by_code() {
        let mut metrics = SimulationMetrics::new();

        metrics.record_rejected("INVALID_AMOUNT");
        metrics.record_rejected("INVALID_AMOUNT");
        metrics.record_rejected("SAME_CURRENCY");

        assert_eq!(metrics.rejected_by_code["INVALID_AMOUNT"], 2);
        assert_eq!(metrics.rejected_by_code["SAME_CURRENCY"], 1);
        assert_eq!(metrics.rejected_operations(), 3);
        assert_eq!(metrics.success_rate(), 0.0);
    }
}
