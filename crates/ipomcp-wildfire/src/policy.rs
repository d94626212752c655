use ipomcp_core::{NeighborId, NeighborPolicy, ResourceLevel};

use crate::model::FireState;

pub(crate) const NOOP: &str = "noop";
const FIGHT_PREFIX: &str = "fight_";
const FIGHT_HOTTEST: &str = "fight_hottest";

/// Name of the action that fights `fire`.
pub fn fight_action(fire: usize) -> String {
    format!("{FIGHT_PREFIX}{fire}")
}

/// Fire targeted by a `fight_<fire>` action name.
pub fn fight_target(action: &str) -> Option<usize> {
    action.strip_prefix(FIGHT_PREFIX)?.parse().ok()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Action written in a policy table.
pub enum PolicyAction {
    Noop,
    Fight(usize),
    /// Fight the most intense burning fire the neighbor can reach.
    FightHottest,
}

impl PolicyAction {
    /// Parse a table entry for a scenario with `fires` fires.
    pub fn parse(action: &str, fires: usize) -> Option<Self> {
        match action {
            NOOP => Some(PolicyAction::Noop),
            FIGHT_HOTTEST => Some(PolicyAction::FightHottest),
            other => fight_target(other)
                .filter(|fire| *fire < fires)
                .map(PolicyAction::Fight),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PolicyRule {
    pub suppressant: Option<u8>,
    pub intensities: Option<Vec<u8>>,
    pub action: PolicyAction,
}

impl PolicyRule {
    fn matches(&self, state: &FireState, level: ResourceLevel) -> bool {
        self.suppressant.is_none_or(|s| s == level)
            && self
                .intensities
                .as_ref()
                .is_none_or(|i| i.as_slice() == state.intensities.as_slice())
    }
}

#[derive(Debug, Clone)]
/// Tabular behavior shared by every neighbor of one frame.
///
/// A neighbor with no suppressant left, or whose resolved target is out of
/// reach or already out, does nothing.
pub struct TabularPolicy {
    rules: Vec<PolicyRule>,
    default: PolicyAction,
    /// Reachable fires per neighbor index; empty for neighbors of other frames.
    reach: Vec<Vec<usize>>,
    /// `noop` followed by `fight_<r>` for every fire.
    action_names: Vec<String>,
    /// Absorbing top level per fire, if the fire can burn out.
    burned_out: Vec<Option<u8>>,
}

impl TabularPolicy {
    pub(crate) fn new(
        rules: Vec<PolicyRule>,
        default: PolicyAction,
        reach: Vec<Vec<usize>>,
        burned_out: Vec<Option<u8>>,
    ) -> Self {
        let mut action_names = vec![NOOP.to_string()];
        action_names.extend((0..burned_out.len()).map(fight_action));
        TabularPolicy {
            rules,
            default,
            reach,
            action_names,
            burned_out,
        }
    }

    /// Table entry chosen for `state` at suppressant `level`, before reach checks.
    pub fn lookup(&self, state: &FireState, level: ResourceLevel) -> PolicyAction {
        self.rules
            .iter()
            .find(|rule| rule.matches(state, level))
            .map(|rule| rule.action)
            .unwrap_or(self.default)
    }

    fn burning(&self, state: &FireState, fire: usize) -> bool {
        let intensity = state.intensities.get(fire).copied().unwrap_or(0);
        intensity > 0 && self.burned_out.get(fire).copied().flatten() != Some(intensity)
    }

    /// Fire `neighbor` fights in `state`, if any.
    pub fn target(
        &self,
        state: &FireState,
        neighbor: NeighborId,
        level: ResourceLevel,
    ) -> Option<usize> {
        if level == 0 {
            return None;
        }
        let reach = self.reach.get(neighbor.index())?;
        let fire = match self.lookup(state, level) {
            PolicyAction::Noop => return None,
            PolicyAction::Fight(fire) => fire,
            PolicyAction::FightHottest => *reach
                .iter()
                .filter(|fire| self.burning(state, **fire))
                .max_by_key(|fire| (state.intensities[**fire], std::cmp::Reverse(**fire)))?,
        };
        (reach.contains(&fire) && self.burning(state, fire)).then_some(fire)
    }
}

impl NeighborPolicy<FireState> for TabularPolicy {
    fn action(&self, state: &FireState, neighbor: NeighborId, level: ResourceLevel) -> &str {
        match self.target(state, neighbor, level) {
            Some(fire) => &self.action_names[fire + 1],
            None => &self.action_names[0],
        }
    }
}
