use std::cell::Cell;
use std::fmt;
use std::hash;

/// A compact representation of a state's outgoing transitions that doesn't
/// allocate until there are at least three of them.
///
/// Transition labels are UTF-16 code units, kept in ascending order.
enum Transitions<'a> {
    /// No outgoing transitions.
    None,
    /// Exactly one transition (label, destination).
    One((u16, &'a State<'a>)),
    /// Exactly two transitions (label1, dest1, label2, dest2).
    Two((u16, &'a State<'a>, u16, &'a State<'a>)),
    /// Three or more transitions stored in a vector.
    Many(Vec<(u16, &'a State<'a>)>),
}

impl<'a> Transitions<'a> {
    /// Gets the transition at the specified index.
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    fn get(&self, index: usize) -> Option<(u16, &'a State<'a>)> {
        match self {
            Transitions::None => None,
            Transitions::One(t) => match index {
                0 => Some(*t),
                _ => None,
            },
            Transitions::Two((l1, d1, l2, d2)) => match index {
                0 => Some((*l1, *d1)),
                1 => Some((*l2, *d2)),
                _ => None,
            },
            Transitions::Many(trans) => trans.get(index).copied(),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        match self {
            Transitions::None => 0,
            Transitions::One(_) => 1,
            Transitions::Two(_) => 2,
            Transitions::Many(trans) => trans.len(),
        }
    }
}

/// An iterator over the outgoing transitions of a [`State`].
pub(crate) struct TransitionIter<'s, 'a> {
    transitions: &'s Transitions<'a>,
    index: Option<usize>,
}

impl<'a> Iterator for TransitionIter<'_, 'a> {
    type Item = (u16, &'a State<'a>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index?;
        let next = self.transitions.get(index);
        self.index = if next.is_some() {
            index.checked_add(1)
        } else {
            None
        };
        next
    }

    /// Since we know the exact size, we can do better than the default implementation.
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.index {
            Some(i) => self.transitions.len().saturating_sub(i),
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TransitionIter<'_, '_> {}

/// A state of the automaton under construction.
///
/// States are mutable while they sit on the builder's active path and frozen
/// once they enter the register. The structural hash is cached and recomputed
/// lazily after a mutation, so repeated register probes don't rehash the
/// transition list.
pub struct State<'a> {
    transitions: Transitions<'a>,
    is_final: bool,
    cached_hash: Cell<u64>,
    stale_hash: Cell<bool>,
    #[cfg(debug_assertions)]
    canonical: bool,
}

impl<'a> State<'a> {
    /// Creates a state with no transitions.
    #[cfg(debug_assertions)]
    pub(crate) fn new(is_final: bool) -> Self {
        State {
            transitions: Transitions::None,
            is_final,
            cached_hash: Cell::new(0),
            stale_hash: Cell::new(true),
            canonical: false,
        }
    }

    /// Creates a state with no transitions.
    #[cfg(not(debug_assertions))]
    pub(crate) fn new(is_final: bool) -> Self {
        State {
            transitions: Transitions::None,
            is_final,
            cached_hash: Cell::new(0),
            stale_hash: Cell::new(true),
        }
    }

    /// True if the sequence ending at this state is accepted.
    #[inline]
    pub(crate) fn is_final(&self) -> bool {
        self.is_final
    }

    pub(crate) fn set_final(&mut self, is_final: bool) {
        #[cfg(debug_assertions)]
        debug_assert!(!self.canonical, "registered states are frozen");
        self.is_final = is_final;
        self.stale_hash.set(true);
    }

    /// Appends a transition. Labels must arrive in ascending order; sorted
    /// input guarantees this for states on the active path.
    pub(crate) fn insert(&mut self, label: u16, dest: &'a State<'a>) {
        #[cfg(debug_assertions)]
        debug_assert!(!self.canonical, "registered states are frozen");
        debug_assert!(
            self.transitions().all(|(l, _)| l < label),
            "transition labels must be inserted in ascending order"
        );
        let t = (label, dest);
        match &mut self.transitions {
            Transitions::None => self.transitions = Transitions::One(t),
            Transitions::One((l1, d1)) => {
                self.transitions = Transitions::Two((*l1, *d1, t.0, t.1))
            }
            Transitions::Two((l1, d1, l2, d2)) => {
                self.transitions = Transitions::Many(vec![(*l1, *d1), (*l2, *d2), t])
            }
            Transitions::Many(trans) => trans.push(t),
        }
        self.stale_hash.set(true);
    }

    /// Returns an iterator over the outgoing transitions, in label order.
    #[inline]
    pub(crate) fn transitions(&self) -> TransitionIter<'_, 'a> {
        TransitionIter {
            transitions: &self.transitions,
            index: Some(0),
        }
    }

    /// Returns the number of outgoing transitions.
    #[inline]
    pub(crate) fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// The structural hash: the final flag mixed with an order-independent
    /// sum over transitions of `label_hash ^ identity_hash(destination)`.
    ///
    /// Destinations are hashed by address, not by structure. The register
    /// compares states as shallow structures over already-canonicalized
    /// children, so recursing would be redundant and quadratic. The sum
    /// keeps hashing aligned with equality over the transition set.
    pub(crate) fn structural_hash(&self) -> u64 {
        if !self.stale_hash.get() {
            return self.cached_hash.get();
        }
        let mut h: u64 = if self.is_final { 0x517c_c1b7_2722_0a95 } else { 0 };
        for (label, dest) in self.transitions() {
            h = h.wrapping_add(mix(u64::from(label)) ^ mix(identity(dest)));
        }
        self.cached_hash.set(h);
        self.stale_hash.set(false);
        h
    }

    /// Marks this state as canonical (registered and frozen).
    ///
    /// In debug builds this sets an internal flag used for assertions.
    /// In release builds this is a no-op.
    #[cfg(debug_assertions)]
    pub(crate) fn set_canonical(&mut self) {
        self.canonical = true;
    }

    /// Marks this state as canonical (registered and frozen).
    ///
    /// In debug builds this sets an internal flag used for assertions.
    /// In release builds this is a no-op.
    #[cfg(not(debug_assertions))]
    pub(crate) fn set_canonical(&mut self) {}

    /// Returns true if all destinations are canonical.
    #[cfg(debug_assertions)]
    fn canonical_transitions(&self) -> bool {
        self.transitions().all(|(_, dest)| dest.canonical)
    }

    #[cfg(not(debug_assertions))]
    fn canonical_transitions(&self) -> bool {
        true
    }
}

#[inline]
fn mix(x: u64) -> u64 {
    x.wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

#[inline]
fn identity(state: &State<'_>) -> u64 {
    state as *const State<'_> as usize as u64
}

// Instead of using derive(PartialEq), we compare destinations by address:
// states are canonicalized bottom-up, so two destinations are equivalent
// exactly when they are the same registered instance. This keeps equality
// linear in the out-degree.
impl PartialEq for State<'_> {
    fn eq(&self, rhs: &Self) -> bool {
        debug_assert!(self.canonical_transitions());
        debug_assert!(rhs.canonical_transitions());
        self.is_final == rhs.is_final
            && self.transition_count() == rhs.transition_count()
            && self
                .transitions()
                .zip(rhs.transitions())
                .all(|((l1, d1), (l2, d2))| l1 == l2 && std::ptr::eq(d1, d2))
    }
}

impl Eq for State<'_> {}

// Just as for PartialEq, destinations contribute their addresses, not their
// structure. The cached value is invalidated by insert/set_final and
// recomputed on the first probe afterwards.
impl hash::Hash for State<'_> {
    fn hash<H>(&self, hasher: &mut H)
    where
        H: hash::Hasher,
    {
        debug_assert!(self.canonical_transitions());
        hasher.write_u64(self.structural_hash());
    }
}

impl fmt::Debug for State<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("is_final", &self.is_final)
            .field("transitions", &self.transition_count())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_transitions() {
        let s = State::new(false);
        assert_eq!(s.transitions().next().map(|(l, _)| l), None);
        assert_eq!(s.transition_count(), 0);
    }

    #[test]
    fn one_transition() {
        let d = State::new(false);
        let mut s = State::new(false);
        s.insert(b'a'.into(), &d);
        let labels: Vec<u16> = s.transitions().map(|(l, _)| l).collect();
        assert_eq!(labels, [u16::from(b'a')]);
        assert_eq!(s.transition_count(), 1);
    }

    #[test]
    fn two_transitions() {
        let d1 = State::new(false);
        let d2 = State::new(false);
        let mut s = State::new(false);
        s.insert(b'a'.into(), &d1);
        s.insert(b'b'.into(), &d2);
        let labels: Vec<u16> = s.transitions().map(|(l, _)| l).collect();
        assert_eq!(labels, [u16::from(b'a'), u16::from(b'b')]);
        assert_eq!(s.transition_count(), 2);
    }

    #[test]
    fn many_transitions() {
        let dests: Vec<State> = (0..10).map(|_| State::new(false)).collect();
        let mut s = State::new(false);
        for (i, d) in dests.iter().enumerate() {
            s.insert(i as u16, d);
        }
        let labels: Vec<u16> = s.transitions().map(|(l, _)| l).collect();
        assert_eq!(labels, (0..10).collect::<Vec<u16>>());
        assert_eq!(s.transitions().len(), 10);
    }

    #[test]
    fn equality_is_shallow() {
        let mut d1 = State::new(true);
        d1.set_canonical();
        let mut d2 = State::new(true);
        d2.set_canonical();
        // Same label, same destination instance: equal.
        let mut s1 = State::new(false);
        s1.insert(b'x'.into(), &d1);
        let mut s2 = State::new(false);
        s2.insert(b'x'.into(), &d1);
        assert_eq!(s1, s2);
        // Structurally identical destination, but a distinct instance.
        let mut s3 = State::new(false);
        s3.insert(b'x'.into(), &d2);
        assert_ne!(s1, s3);
    }

    #[test]
    fn finality_breaks_equality() {
        let s1 = State::new(true);
        let s2 = State::new(false);
        assert_ne!(s1, s2);
    }

    #[test]
    fn hash_is_cached_and_invalidated() {
        let mut d = State::new(true);
        d.set_canonical();
        let mut s = State::new(false);
        let empty = s.structural_hash();
        assert_eq!(s.structural_hash(), empty);

        s.set_final(true);
        let with_final = s.structural_hash();
        assert_ne!(empty, with_final);

        s.insert(b'q'.into(), &d);
        assert_ne!(s.structural_hash(), with_final);
        assert_eq!(s.structural_hash(), s.structural_hash());
    }

    #[test]
    fn hash_matches_equal_states() {
        let mut d = State::new(true);
        d.set_canonical();
        let mut s1 = State::new(false);
        s1.insert(b'x'.into(), &d);
        let mut s2 = State::new(false);
        s2.insert(b'x'.into(), &d);
        assert_eq!(s1.structural_hash(), s2.structural_hash());
    }
}
