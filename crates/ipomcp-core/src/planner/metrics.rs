use serde::Serialize;

use crate::tree::ids::NodeId;

/// Per-iteration metrics emitted by the search loop.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IterationMetrics {
    pub iteration: usize,
    /// Deepest node the descent reached.
    pub leaf: NodeId,
    pub path_len: usize,
    pub created_node: bool,
    pub leaf_value: f64,
    pub root_return: f64,
}

/// Aggregate metrics for one `choose_action` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchMetrics {
    pub iterations: usize,
    pub elapsed_ms: u128,
    pub node_count: usize,
    pub root_branches: usize,
    pub max_depth: usize,
    pub return_sum: f64,
    pub average_return: f64,
}

impl SearchMetrics {
    pub(crate) fn record(&mut self, metrics: &IterationMetrics) {
        self.iterations += 1;
        self.max_depth = self.max_depth.max(metrics.path_len);
        self.return_sum += metrics.root_return;
        self.average_return = self.return_sum / self.iterations as f64;
    }
}
