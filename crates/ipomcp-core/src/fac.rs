//! Frame-action configurations.
//!
//! A FAC records how many agents of each frame chose each action. It replaces
//! the enumeration of full joint actions: two joint actions that differ only
//! in which same-frame agent did what map to the same configuration.

use std::{
    hash::{Hash, Hasher},
    ops::Range,
    sync::Arc,
};

use serde::Serialize;

use crate::{descriptor::FrameId, error::FacError};

/// Capacity of one `(frame, action)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CapacityEntry {
    #[serde(serialize_with = "serialize_frame")]
    pub frame: FrameId,
    pub action: String,
    pub max_count: u32,
}

fn serialize_frame<S: serde::Serializer>(frame: &FrameId, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(frame.index() as u64)
}

/// Fixed capacity table shared by every FAC built over it.
///
/// Entries are stored grouped by frame, in frame order, so the entries of one
/// frame occupy a contiguous index range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacLayout {
    populations: Vec<u32>,
    entries: Vec<CapacityEntry>,
    frame_ranges: Vec<Range<usize>>,
}

impl FacLayout {
    /// Build a layout from per-frame populations and capacity entries.
    /// Entries are reordered so that each frame's entries are contiguous.
    pub fn from_parts(populations: Vec<u32>, mut entries: Vec<CapacityEntry>) -> Self {
        entries.sort_by_key(|entry| entry.frame);

        let mut frame_ranges = vec![0..0; populations.len()];
        let mut start = 0;
        for (f, range) in frame_ranges.iter_mut().enumerate() {
            let len = entries[start..]
                .iter()
                .take_while(|entry| entry.frame.index() == f)
                .count();
            *range = start..start + len;
            start += len;
        }

        FacLayout {
            populations,
            entries,
            frame_ranges,
        }
    }

    /// Return the entry index of `(frame, action)`, if the pair is part of the layout.
    pub fn search(&self, frame: FrameId, action: &str) -> Option<usize> {
        let range = self.frame_ranges.get(frame.index())?.clone();
        self.entries[range.clone()]
            .iter()
            .position(|entry| entry.action == action)
            .map(|offset| range.start + offset)
    }

    pub fn entry(&self, index: usize) -> Option<&CapacityEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CapacityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.populations.len()
    }

    /// Number of agents of `frame` a filled configuration must place.
    pub fn population(&self, frame: FrameId) -> u32 {
        self.populations.get(frame.index()).copied().unwrap_or(0)
    }

    /// Index range of the entries belonging to `frame`.
    pub fn entries_for(&self, frame: FrameId) -> Range<usize> {
        self.frame_ranges
            .get(frame.index())
            .cloned()
            .unwrap_or(0..0)
    }

    /// Copy of this layout with one more agent of `frame`, able to take `actions`.
    /// Entry indices are unchanged.
    pub fn with_extra_agent(&self, frame: FrameId, actions: &[String]) -> Self {
        let mut layout = self.clone();
        if let Some(population) = layout.populations.get_mut(frame.index()) {
            *population += 1;
        }
        for action in actions {
            if let Some(idx) = self.search(frame, action) {
                layout.entries[idx].max_count += 1;
            }
        }
        layout
    }
}

/// One concrete configuration over a shared layout.
#[derive(Debug, Clone)]
pub struct Fac {
    layout: Arc<FacLayout>,
    counts: Vec<u32>,
}

impl PartialEq for Fac {
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
            && (Arc::ptr_eq(&self.layout, &other.layout) || self.layout == other.layout)
    }
}

impl Eq for Fac {}

impl Hash for Fac {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.counts.hash(state);
    }
}

impl Fac {
    /// Configuration with every count at zero.
    pub fn empty(layout: Arc<FacLayout>) -> Self {
        let counts = vec![0; layout.len()];
        Fac { layout, counts }
    }

    pub fn layout(&self) -> &Arc<FacLayout> {
        &self.layout
    }

    /// Return the entry index of `(frame, action)`, if any.
    pub fn search(&self, frame: FrameId, action: &str) -> Option<usize> {
        self.layout.search(frame, action)
    }

    /// Set the count of `(frame, action)`, overwriting the previous count.
    /// Returns the entry index written.
    pub fn put(&mut self, frame: FrameId, action: &str, count: u32) -> Result<usize, FacError> {
        let index = self
            .search(frame, action)
            .ok_or_else(|| FacError::UnknownEntry {
                frame: frame.index(),
                action: action.to_string(),
            })?;
        self.put_index(index, count)?;
        Ok(index)
    }

    /// Set the count of the entry at `index`.
    pub fn put_index(&mut self, index: usize, count: u32) -> Result<(), FacError> {
        let entry = self
            .layout
            .entry(index)
            .ok_or(FacError::UnknownIndex { index })?;

        if count > entry.max_count {
            return Err(FacError::CapacityExceeded {
                frame: entry.frame.index(),
                action: entry.action.clone(),
                count,
                max_count: entry.max_count,
            });
        }

        let frame = entry.frame;
        let total = self.frame_total(frame) - self.counts[index] + count;
        let population = self.layout.population(frame);
        if total > population {
            return Err(FacError::PopulationExceeded {
                frame: frame.index(),
                total,
                population,
            });
        }

        self.counts[index] = count;
        Ok(())
    }

    /// Count stored at entry `index` (zero for unknown indices).
    pub fn count(&self, index: usize) -> u32 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    pub fn count_of(&self, frame: FrameId, action: &str) -> Option<u32> {
        self.search(frame, action).map(|idx| self.counts[idx])
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Sum of the counts of every action of `frame`.
    pub fn frame_total(&self, frame: FrameId) -> u32 {
        self.counts[self.layout.entries_for(frame)].iter().sum()
    }

    /// True when every frame's counts add up to its population.
    pub fn is_filled(&self) -> bool {
        (0..self.layout.frame_count()).all(|f| {
            let frame = FrameId::from(f);
            self.frame_total(frame) == self.layout.population(frame)
        })
    }

    /// Error naming the first frame whose counts do not add up to its population.
    pub fn ensure_filled(&self) -> Result<(), FacError> {
        for f in 0..self.layout.frame_count() {
            let frame = FrameId::from(f);
            let total = self.frame_total(frame);
            let population = self.layout.population(frame);
            if total != population {
                return Err(FacError::NotFilled {
                    frame: f,
                    total,
                    population,
                });
            }
        }
        Ok(())
    }

    /// Copy this configuration onto `joint` and add one agent of `frame`
    /// taking `action`.
    ///
    /// `joint` must be this layout extended by
    /// [`FacLayout::with_extra_agent`] so that entry indices line up.
    pub fn merge_action(
        &self,
        joint: &Arc<FacLayout>,
        frame: FrameId,
        action: &str,
    ) -> Result<Fac, FacError> {
        if joint.len() != self.layout.len() {
            return Err(FacError::LayoutMismatch {
                expected: self.layout.len(),
                actual: joint.len(),
            });
        }

        let mut merged = Fac {
            layout: Arc::clone(joint),
            counts: self.counts.clone(),
        };
        let index = merged
            .search(frame, action)
            .ok_or_else(|| FacError::UnknownEntry {
                frame: frame.index(),
                action: action.to_string(),
            })?;
        let count = merged.counts[index] + 1;
        merged.put_index(index, count)?;
        Ok(merged)
    }

    /// Iterate `(entry, count)` pairs in entry order.
    pub fn iter(&self) -> impl Iterator<Item = (&CapacityEntry, u32)> {
        self.layout.entries().iter().zip(self.counts.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn layout() -> Arc<FacLayout> {
        let entries = vec![
            CapacityEntry {
                frame: FrameId::from(0),
                action: "noop".into(),
                max_count: 3,
            },
            CapacityEntry {
                frame: FrameId::from(0),
                action: "fight_0".into(),
                max_count: 2,
            },
            CapacityEntry {
                frame: FrameId::from(1),
                action: "noop".into(),
                max_count: 1,
            },
            CapacityEntry {
                frame: FrameId::from(1),
                action: "fight_0".into(),
                max_count: 1,
            },
        ];
        Arc::new(FacLayout::from_parts(vec![3, 1], entries))
    }

    #[test]
    fn put_then_search_returns_the_insertion_index() {
        let layout = layout();
        let mut fac = Fac::empty(Arc::clone(&layout));

        let mut written = Vec::new();
        for entry in layout.entries() {
            let idx = fac
                .put(entry.frame, &entry.action, 0)
                .expect("zero count always fits");
            written.push((entry.frame, entry.action.clone(), idx));
        }
        fac.put(FrameId::from(0), "noop", 1).unwrap();
        fac.put(FrameId::from(0), "fight_0", 2).unwrap();
        fac.put(FrameId::from(1), "fight_0", 1).unwrap();

        for (frame, action, idx) in written {
            assert_eq!(fac.search(frame, &action), Some(idx));
        }
        assert!(fac.is_filled());
        assert_eq!(fac.search(FrameId::from(1), "fly"), None);
    }

    #[test]
    fn put_rejects_over_capacity_and_over_population() {
        let mut fac = Fac::empty(layout());
        let err = fac.put(FrameId::from(0), "fight_0", 3).unwrap_err();
        assert!(matches!(err, FacError::CapacityExceeded { .. }));

        fac.put(FrameId::from(0), "noop", 3).unwrap();
        let err = fac.put(FrameId::from(0), "fight_0", 1).unwrap_err();
        assert!(matches!(err, FacError::PopulationExceeded { .. }));
    }

    #[test]
    fn unfilled_configuration_is_reported() {
        let mut fac = Fac::empty(layout());
        fac.put(FrameId::from(0), "noop", 3).unwrap();
        let err = fac.ensure_filled().unwrap_err();
        assert_eq!(
            err,
            FacError::NotFilled {
                frame: 1,
                total: 0,
                population: 1
            }
        );
    }

    #[test]
    fn merge_action_adds_the_agent_on_the_joint_layout() {
        let neighbors = layout();
        let joint = Arc::new(neighbors.with_extra_agent(FrameId::from(1), &["fight_0".to_string()]));
        let mut fac = Fac::empty(Arc::clone(&neighbors));
        fac.put(FrameId::from(0), "noop", 3).unwrap();
        fac.put(FrameId::from(1), "fight_0", 1).unwrap();

        let merged = fac
            .merge_action(&joint, FrameId::from(1), "fight_0")
            .expect("joint layout has room for the agent");
        assert_eq!(merged.count_of(FrameId::from(1), "fight_0"), Some(2));
        assert!(merged.is_filled());
        assert_ne!(merged, fac);
    }

    proptest! {
        #[test]
        fn accepted_puts_never_break_capacity_invariants(
            writes in proptest::collection::vec((0usize..4, 0u32..4), 1..32)
        ) {
            let layout = layout();
            let mut fac = Fac::empty(Arc::clone(&layout));
            for (idx, count) in writes {
                let _ = fac.put_index(idx, count);
                for f in 0..layout.frame_count() {
                    let frame = FrameId::from(f);
                    prop_assert!(fac.frame_total(frame) <= layout.population(frame));
                }
                for (entry, count) in fac.iter() {
                    prop_assert!(count <= entry.max_count);
                }
            }
        }
    }
}
