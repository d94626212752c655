use crate::tree::ids::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One distinct observation seen under a `(configuration, action)` pair.
/// `child` is unset while the step that produced it lies beyond the horizon.
pub struct ObservationLink<O> {
    observation: O,
    child: Option<NodeId>,
    count: u64,
}

impl<O> ObservationLink<O> {
    fn new(observation: O) -> Self {
        ObservationLink {
            observation,
            child: None,
            count: 1,
        }
    }

    pub fn observation(&self) -> &O {
        &self.observation
    }

    pub fn child(&self) -> Option<NodeId> {
        self.child
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Stores all observations seen for a single action row, in first-seen order.
/// The position of an observation is its dedupe index in child paths.
pub struct ObservationSet<O> {
    links: Vec<ObservationLink<O>>,
}

impl<O: PartialEq> ObservationSet<O> {
    pub fn new() -> Self {
        ObservationSet { links: Vec::new() }
    }

    /// Dedupe index of `observation`, if it was seen before.
    pub fn find(&self, observation: &O) -> Option<usize> {
        self.links
            .iter()
            .position(|link| link.observation == *observation)
    }

    /// Count one occurence of `observation`, adding it if new.
    /// Returns its dedupe index.
    pub fn record(&mut self, observation: O) -> usize {
        match self.find(&observation) {
            Some(idx) => {
                self.links[idx].count += 1;
                idx
            }
            None => {
                self.links.push(ObservationLink::new(observation));
                self.links.len() - 1
            }
        }
    }

    pub fn link(&self, index: usize) -> Option<&ObservationLink<O>> {
        self.links.get(index)
    }

    /// Attach the child node reached through observation `index`.
    pub fn set_child(&mut self, index: usize, child: NodeId) -> bool {
        match self.links.get_mut(index) {
            Some(link) => {
                link.child = Some(child);
                true
            }
            None => false,
        }
    }

    pub fn count_for(&self, observation: &O) -> Option<u64> {
        self.find(observation).map(|idx| self.links[idx].count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObservationLink<O>> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl<O: PartialEq> Default for ObservationSet<O> {
    fn default() -> Self {
        Self::new()
    }
}
