//! The display order of the recent-activity list.
//!
//! While the pointer is away from the list, the order cycles through a fixed set of permutations
//! of the baseline, one step per tick. While the pointer is over the list, the baseline is shown
//! as is and ticks are ignored. This module holds the state only; `crate::feed` drives the ticks.

use serde::{Deserialize, Serialize};

/// Whether the list is being hovered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedState {
    /// Hovered: the baseline order is shown and ticks are ignored.
    Static,
    /// Not hovered: every tick advances to the next permutation.
    #[default]
    Cycling,
}

serde_plain::derive_display_from_serialize!(FeedState);
serde_plain::derive_fromstr_from_deserialize!(FeedState);

/// The permutations a cycling list steps through.
///
/// A list of exactly three entries uses a hand-picked set of four orders. Any other length steps
/// through its `n` right-rotations, starting with the baseline itself. An empty baseline has a
/// single, empty, order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleSequences<K> {
    sequences: Vec<Vec<K>>,
}

impl<K: Clone> ShuffleSequences<K> {
    pub fn new(baseline: &[K]) -> Self {
        let sequences = match baseline {
            [] => vec![Vec::new()],
            [a, b, c] => vec![
                vec![a.clone(), b.clone(), c.clone()],
                vec![c.clone(), a.clone(), b.clone()],
                vec![b.clone(), c.clone(), a.clone()],
                vec![a.clone(), c.clone(), b.clone()],
            ],
            _ => (0..baseline.len())
                .map(|shift| {
                    let mut rotated = baseline.to_vec();
                    rotated.rotate_right(shift);
                    rotated
                })
                .collect(),
        };
        Self { sequences }
    }

    /// Never zero.
    pub(crate) fn len(&self) -> usize {
        self.sequences.len()
    }

    /// The order at `index`, wrapping around.
    pub fn get(&self, index: usize) -> &[K] {
        &self.sequences[index % self.sequences.len()]
    }
}

/// The state of one activity list: its baseline, its permutations and where it is in them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityOrder<K> {
    state: FeedState,
    baseline: Vec<K>,
    sequences: ShuffleSequences<K>,
    index: usize,
}

impl<K: Clone + PartialEq> ActivityOrder<K> {
    /// Starts cycling over `baseline`, which must already be in recent-activity order.
    pub fn new(baseline: Vec<K>) -> Self {
        let sequences = ShuffleSequences::new(&baseline);
        Self {
            state: FeedState::Cycling,
            baseline,
            sequences,
            index: 0,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn baseline(&self) -> &[K] {
        &self.baseline
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The order that should be on screen right now.
    pub fn display_order(&self) -> &[K] {
        match self.state {
            FeedState::Static => &self.baseline,
            FeedState::Cycling => self.sequences.get(self.index),
        }
    }

    /// The pointer entered the list. Cycling stops and the baseline is shown.
    pub fn hover_enter(&mut self) {
        self.state = FeedState::Static;
    }

    /// The pointer left the list. Cycling restarts from the first permutation. Returns `true`
    /// if this changed the state, in which case the caller restarts its timer.
    pub fn hover_leave(&mut self) -> bool {
        let changed = self.state == FeedState::Static;
        self.state = FeedState::Cycling;
        if changed {
            self.index = 0;
        }
        changed
    }

    /// Advances to the next permutation. Does nothing while hovered. Returns `true` if the
    /// display order may have changed.
    pub fn tick(&mut self) -> bool {
        if self.state == FeedState::Static {
            return false;
        }
        self.index = (self.index + 1) % self.sequences.len();
        true
    }

    /// Replaces the baseline, for example after a refresh or a filter change, and restarts from
    /// the first permutation. The hover state is kept.
    pub fn rebuild(&mut self, baseline: Vec<K>) {
        self.sequences = ShuffleSequences::new(&baseline);
        self.baseline = baseline;
        self.index = 0;
    }
}
