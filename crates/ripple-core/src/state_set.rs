//! Bitset of states over a fixed graph

use crate::StateId;
use std::fmt;

const WORD_BITS: usize = 64;

/// A set of [`StateId`]s drawn from one graph
///
/// The universe size is fixed when the set is created; inserting a state
/// outside of it is a programming error and panics. Bits past the universe
/// are always zero, so equality does not depend on how the set was built.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StateSet {
    universe: usize,
    words: Vec<u64>,
}

impl StateSet {
    pub(crate) fn empty(universe: usize) -> Self {
        Self {
            universe,
            words: vec![0; universe.div_ceil(WORD_BITS)],
        }
    }

    pub(crate) fn full(universe: usize) -> Self {
        let mut set = Self {
            universe,
            words: vec![u64::MAX; universe.div_ceil(WORD_BITS)],
        };
        set.clear_tail();
        set
    }

    /// Number of states in the owning graph
    pub fn universe(&self) -> usize {
        self.universe
    }

    /// Add a state, returning true if it was not already present
    pub fn insert(&mut self, id: StateId) -> bool {
        let (word, mask) = self.locate(id);
        let added = self.words[word] & mask == 0;
        self.words[word] |= mask;
        added
    }

    /// Remove a state, returning true if it was present
    pub fn remove(&mut self, id: StateId) -> bool {
        let (word, mask) = self.locate(id);
        let present = self.words[word] & mask != 0;
        self.words[word] &= !mask;
        present
    }

    pub fn contains(&self, id: StateId) -> bool {
        if id.index() >= self.universe {
            return false;
        }
        let (word, mask) = self.locate(id);
        self.words[word] & mask != 0
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// In-place union, returning true if the set grew
    pub fn union_with(&mut self, other: &StateSet) -> bool {
        self.check_universe(other);
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let next = *mine | theirs;
            changed |= next != *mine;
            *mine = next;
        }
        changed
    }

    /// In-place intersection, returning true if the set shrank
    pub fn intersect_with(&mut self, other: &StateSet) -> bool {
        self.check_universe(other);
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let next = *mine & theirs;
            changed |= next != *mine;
            *mine = next;
        }
        changed
    }

    /// In-place difference, returning true if the set shrank
    pub fn difference_with(&mut self, other: &StateSet) -> bool {
        self.check_universe(other);
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let next = *mine & !theirs;
            changed |= next != *mine;
            *mine = next;
        }
        changed
    }

    pub fn union(&self, other: &StateSet) -> StateSet {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    pub fn intersection(&self, other: &StateSet) -> StateSet {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }

    pub fn difference(&self, other: &StateSet) -> StateSet {
        let mut out = self.clone();
        out.difference_with(other);
        out
    }

    /// All states of the universe that are not in this set
    pub fn complement(&self) -> StateSet {
        let mut out = StateSet {
            universe: self.universe,
            words: self.words.iter().map(|w| !w).collect(),
        };
        out.clear_tail();
        out
    }

    pub fn is_subset(&self, other: &StateSet) -> bool {
        self.check_universe(other);
        self.words
            .iter()
            .zip(&other.words)
            .all(|(mine, theirs)| mine & !theirs == 0)
    }

    /// Iterate members in ascending id order
    pub fn iter(&self) -> StateSetIter<'_> {
        StateSetIter {
            words: &self.words,
            word_index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    fn locate(&self, id: StateId) -> (usize, u64) {
        assert!(
            id.index() < self.universe,
            "state {} is outside a set over {} states",
            id,
            self.universe
        );
        (id.index() / WORD_BITS, 1u64 << (id.index() % WORD_BITS))
    }

    fn check_universe(&self, other: &StateSet) {
        assert_eq!(
            self.universe, other.universe,
            "state sets belong to graphs of different sizes"
        );
    }

    fn clear_tail(&mut self) {
        let tail = self.universe % WORD_BITS;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
    }
}

impl fmt::Debug for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a StateSet {
    type Item = StateId;
    type IntoIter = StateSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Extend<StateId> for StateSet {
    fn extend<I: IntoIterator<Item = StateId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

/// Iterator over the members of a [`StateSet`]
pub struct StateSetIter<'a> {
    words: &'a [u64],
    word_index: usize,
    current: u64,
}

impl Iterator for StateSetIter<'_> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(StateId::new(self.word_index * WORD_BITS + bit));
            }
            self.word_index += 1;
            self.current = *self.words.get(self.word_index)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(set: &StateSet) -> Vec<usize> {
        set.iter().map(|id| id.index()).collect()
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set = StateSet::empty(70);
        assert!(set.insert(StateId::new(3)));
        assert!(!set.insert(StateId::new(3)));
        assert!(set.insert(StateId::new(69)));

        assert!(set.contains(StateId::new(3)));
        assert!(set.contains(StateId::new(69)));
        assert!(!set.contains(StateId::new(4)));
        assert!(!set.contains(StateId::new(500)));
        assert_eq!(set.len(), 2);
        assert_eq!(ids(&set), vec![3, 69]);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let mut a = StateSet::empty(10);
        let mut b = StateSet::empty(10);
        for i in [1, 5, 9] {
            a.insert(StateId::new(i));
        }
        for i in [9, 1, 5, 5] {
            b.insert(StateId::new(i));
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_complement_stays_in_universe() {
        let mut set = StateSet::empty(5);
        set.insert(StateId::new(0));
        set.insert(StateId::new(4));

        let complement = set.complement();
        assert_eq!(ids(&complement), vec![1, 2, 3]);
        assert_eq!(complement.complement(), set);
        assert_eq!(StateSet::full(5), set.union(&complement));
        assert!(StateSet::full(0).is_empty());
    }

    #[test]
    fn test_set_algebra() {
        let mut a = StateSet::empty(8);
        let mut b = StateSet::empty(8);
        a.extend([0, 1, 2].map(StateId::new));
        b.extend([2, 3].map(StateId::new));

        assert_eq!(ids(&a.union(&b)), vec![0, 1, 2, 3]);
        assert_eq!(ids(&a.intersection(&b)), vec![2]);
        assert_eq!(ids(&a.difference(&b)), vec![0, 1]);
        assert!(a.intersection(&b).is_subset(&a));
        assert!(!a.is_subset(&b));

        let mut c = a.clone();
        assert!(!c.union_with(&a));
        assert!(c.intersect_with(&b));
        assert!(c.remove(StateId::new(2)));
        assert!(c.is_empty());
    }

    #[test]
    #[should_panic(expected = "outside a set")]
    fn test_insert_outside_universe_panics() {
        let mut set = StateSet::empty(2);
        set.insert(StateId::new(2));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn set_from(universe: usize, members: &[usize]) -> StateSet {
            let mut set = StateSet::empty(universe);
            set.extend(members.iter().map(|&i| StateId::new(i % universe)));
            set
        }

        proptest! {
            #[test]
            fn prop_de_morgan(
                universe in 1usize..150,
                a in prop::collection::vec(0usize..150, 0..40),
                b in prop::collection::vec(0usize..150, 0..40),
            ) {
                let a = set_from(universe, &a);
                let b = set_from(universe, &b);
                prop_assert_eq!(
                    a.union(&b).complement(),
                    a.complement().intersection(&b.complement())
                );
                prop_assert_eq!(a.complement().complement(), a.clone());
                prop_assert_eq!(a.len() + a.complement().len(), universe);
            }
        }
    }
}
