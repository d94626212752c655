use crate::{
    fac::Fac,
    tree::{edges::ActionEdge, ids::ActionId},
};

/// A neighbor configuration together with how often it was expanded at its node.
#[derive(Debug, Clone)]
pub struct FacNode {
    fac: Fac,
    visits: u64,
}

impl FacNode {
    pub fn fac(&self) -> &Fac {
        &self.fac
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }
}

#[derive(Debug, Clone)]
/// One branch of a node: the configuration it was created for and one
/// action row holding values, visits and observation links.
pub struct HistoryElement<O> {
    fac_node: FacNode,
    edges: Vec<ActionEdge<O>>,
}

impl<O: PartialEq> HistoryElement<O> {
    pub fn new(fac: Fac, num_actions: usize) -> Self {
        HistoryElement {
            fac_node: FacNode { fac, visits: 0 },
            edges: (0..num_actions)
                .map(|a| ActionEdge::new(ActionId::from(a)))
                .collect(),
        }
    }

    pub fn fac_node(&self) -> &FacNode {
        &self.fac_node
    }

    pub fn fac(&self) -> &Fac {
        &self.fac_node.fac
    }

    /// N_config used by the bandit.
    pub fn visits(&self) -> u64 {
        self.fac_node.visits
    }

    pub(crate) fn record_visit(&mut self) {
        self.fac_node.visits += 1;
    }

    /// Single-configuration mode keeps one branch per node and lets the
    /// newest sample replace its configuration. Statistics are kept.
    pub(crate) fn overwrite_fac(&mut self, fac: Fac) {
        self.fac_node.fac = fac;
    }

    pub fn edges(&self) -> &[ActionEdge<O>] {
        &self.edges
    }

    pub fn edge(&self, action: ActionId) -> Option<&ActionEdge<O>> {
        self.edges.get(action.index())
    }

    pub(crate) fn edge_mut(&mut self, action: ActionId) -> Option<&mut ActionEdge<O>> {
        self.edges.get_mut(action.index())
    }

    /// Seed every action's value; `values[a]` goes to action `a`.
    pub(crate) fn warm_start(&mut self, values: &[f64]) {
        for (edge, value) in self.edges.iter_mut().zip(values) {
            edge.warm_start(*value);
        }
    }
}
