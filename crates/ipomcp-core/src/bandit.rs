//! Tree policy: UCB1 over the action row of one history element.

use crate::tree::{HistoryElement, ids::ActionId};

/// Chooses which action to descend through at a branch.
pub trait Bandit {
    fn select<O: PartialEq>(&self, branch: &HistoryElement<O>) -> Option<ActionId>;
}

/// `argmax_a Q(a) + c * sqrt(ln N_config / N_a)`.
///
/// Any unvisited action is returned immediately, lowest index first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ucb1 {
    pub c: f64,
}

impl Ucb1 {
    pub fn new(c: f64) -> Self {
        Ucb1 { c }
    }
}

impl Bandit for Ucb1 {
    fn select<O: PartialEq>(&self, branch: &HistoryElement<O>) -> Option<ActionId> {
        let n_config = branch.visits();
        let mut best: Option<(ActionId, f64)> = None;

        for edge in branch.edges() {
            if edge.is_unvisited() {
                return Some(edge.action());
            }
            let score = edge.ucb_score(n_config, self.c);
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((edge.action(), score)),
            }
        }

        best.map(|(action, _)| action)
    }
}
