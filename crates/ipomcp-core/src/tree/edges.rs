use crate::tree::{ids::ActionId, observations::ObservationSet, stats::ActionStats};

#[derive(Debug, Clone)]
/// represents “taking a particular action under this configuration.”
/// Holds the action's value estimate and the observations it produced.
pub struct ActionEdge<O> {
    action: ActionId,
    stats: ActionStats,
    observations: ObservationSet<O>,
}

impl<O: PartialEq> ActionEdge<O> {
    pub fn new(action: ActionId) -> Self {
        ActionEdge {
            action,
            stats: ActionStats::new(),
            observations: ObservationSet::new(),
        }
    }

    pub fn action(&self) -> ActionId {
        self.action
    }

    pub fn visits(&self) -> u64 {
        self.stats.visits()
    }

    pub fn q(&self) -> f64 {
        self.stats.q()
    }

    pub fn is_unvisited(&self) -> bool {
        self.stats.is_unvisited()
    }

    pub fn warm_start(&mut self, value: f64) {
        self.stats.warm_start(value);
    }

    /// Function to be used for backpropagation.
    pub fn record(&mut self, value: f64) {
        self.stats.record(value);
    }

    /// UCB1 score given the configuration's visit count.
    pub fn ucb_score(&self, n_config: u64, c: f64) -> f64 {
        if self.stats.is_unvisited() {
            f64::INFINITY
        } else {
            self.stats.q()
                + c * f64::sqrt(f64::ln(n_config.max(1) as f64) / self.stats.visits() as f64)
        }
    }

    pub fn observations(&self) -> &ObservationSet<O> {
        &self.observations
    }

    pub fn observations_mut(&mut self) -> &mut ObservationSet<O> {
        &mut self.observations
    }
}
