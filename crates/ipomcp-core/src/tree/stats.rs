/// Value estimate and visit count of one action under one configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStats {
    visits: u64,
    q: f64,
}

impl ActionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve the amount of visits to this action
    pub fn visits(&self) -> u64 {
        self.visits
    }

    /// Current value estimate.
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Seed the estimate without counting a visit.
    /// The first recorded return replaces the seed entirely.
    pub fn warm_start(&mut self, value: f64) {
        self.q = value;
    }

    /// Function to be used for backpropagation.
    /// Counts the visit and folds the return into the running mean.
    pub fn record(&mut self, value: f64) {
        self.visits += 1;
        self.q += (value - self.q) / self.visits as f64;
    }

    /// Helper function just to check if the action has been visited or not
    pub fn is_unvisited(&self) -> bool {
        self.visits == 0
    }
}
