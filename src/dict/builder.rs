use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hashbrown::HashSet;
use mark_last::MarkLastIterator;
use smallvec::SmallVec;
use typed_arena::Arena;

use super::packed::Dictionary;
use super::perfect::PerfectHashDictionary;
use super::state::State;

/// Trait for types that can be fed to a [`DictionaryBuilder`] as a
/// character sequence.
///
/// Sequences are stored and compared as UTF-16 code units, so characters
/// outside the basic multilingual plane occupy two transitions. Implemented
/// for common string types as well as raw code-unit containers, so
/// [`DictionaryBuilder::add`] and the query methods accept them directly
/// without manual conversion.
pub trait IntoSeq {
    /// Collects this sequence into a code-unit buffer.
    fn collect_seq(self) -> SmallVec<[u16; 32]>;
}

// String types

impl IntoSeq for &str {
    fn collect_seq(self) -> SmallVec<[u16; 32]> {
        self.encode_utf16().collect()
    }
}

impl IntoSeq for &&str {
    fn collect_seq(self) -> SmallVec<[u16; 32]> {
        self.encode_utf16().collect()
    }
}

impl IntoSeq for String {
    fn collect_seq(self) -> SmallVec<[u16; 32]> {
        self.encode_utf16().collect()
    }
}

impl IntoSeq for &String {
    fn collect_seq(self) -> SmallVec<[u16; 32]> {
        self.encode_utf16().collect()
    }
}

// Raw code-unit sequences

impl IntoSeq for &[u16] {
    fn collect_seq(self) -> SmallVec<[u16; 32]> {
        self.iter().copied().collect()
    }
}

impl IntoSeq for Vec<u16> {
    fn collect_seq(self) -> SmallVec<[u16; 32]> {
        self.into_iter().collect()
    }
}

impl IntoSeq for &Vec<u16> {
    fn collect_seq(self) -> SmallVec<[u16; 32]> {
        self.iter().copied().collect()
    }
}

impl<const N: usize> IntoSeq for [u16; N] {
    fn collect_seq(self) -> SmallVec<[u16; 32]> {
        self.into_iter().collect()
    }
}

impl<const N: usize> IntoSeq for &[u16; N] {
    fn collect_seq(self) -> SmallVec<[u16; 32]> {
        self.iter().copied().collect()
    }
}

/// Errors that can occur while feeding sequences to a [`DictionaryBuilder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// A sequence was not strictly greater than the previously added one.
    ///
    /// Carries both sequences (previous, then offending). Equal sequences
    /// fail the strict-greater condition too, so duplicates surface as this
    /// error.
    OutOfOrder {
        /// The sequence added before the offending one.
        previous: String,
        /// The offending sequence.
        current: String,
    },
    /// A sequence was added after the automaton had been finalized by a
    /// build.
    Finalized,
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderError::OutOfOrder { previous, current } => write!(
                f,
                "sequences are not added in lexicographic order: {previous:?} {current:?}"
            ),
            BuilderError::Finalized => {
                write!(f, "cannot add a sequence to a finalized builder")
            }
        }
    }
}

impl Error for BuilderError {}

/// An entry on the active path: the label of the incoming transition and
/// the state it leads to. The root sits at index 0 behind a sentinel label.
struct PathEntry<'a> {
    label: u16,
    state: State<'a>,
}

/// An incremental builder for minimal acyclic automata.
///
/// Sequences must be added in strictly ascending lexicographic order of
/// their UTF-16 code units. The builder keeps the path of the most recently
/// added sequence as an explicit stack of mutable states; everything that
/// falls off that path is canonicalized through a register of
/// already-minimized states, so the automaton is minimal at every step.
///
/// Canonical states are allocated from a caller-provided arena. The packed
/// dictionaries returned by [`build`](DictionaryBuilder::build) and
/// [`build_perfect_hash`](DictionaryBuilder::build_perfect_hash) hold no
/// references into the arena, so the arena can be dropped as soon as the
/// builder is.
///
/// # Examples
///
/// ```
/// use madfa::dict::{Arena, DictionaryBuilder};
///
/// let arena = Arena::new();
/// let mut builder = DictionaryBuilder::new(&arena);
/// builder.add("cat").unwrap();
/// builder.add("cats").unwrap();
/// builder.add("dog").unwrap();
///
/// let dict = builder.build_perfect_hash();
/// assert!(dict.contains("cats"));
/// assert_eq!(dict.number("dog"), Some(3));
/// ```
pub struct DictionaryBuilder<'a> {
    arena: &'a Arena<State<'a>>,
    path: Vec<PathEntry<'a>>,
    register: HashSet<&'a State<'a>>,
    root: Option<&'a State<'a>>,
}

impl<'a> DictionaryBuilder<'a> {
    /// Creates a builder that allocates canonical states from `arena`.
    pub fn new(arena: &'a Arena<State<'a>>) -> Self {
        DictionaryBuilder {
            arena,
            path: vec![PathEntry {
                label: 0,
                state: State::new(false),
            }],
            register: HashSet::default(),
            root: None,
        }
    }

    /// Adds a sequence to the automaton.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::OutOfOrder`] if the sequence is not strictly
    /// greater than the previously added one, and
    /// [`BuilderError::Finalized`] after a build.
    pub fn add(&mut self, seq: impl IntoSeq) -> Result<(), BuilderError> {
        let seq = seq.collect_seq();
        self.add_units(&seq)
    }

    /// Adds all sequences from an iterator, in order.
    pub fn add_all<S: IntoSeq>(
        &mut self,
        seqs: impl IntoIterator<Item = S>,
    ) -> Result<(), BuilderError> {
        for seq in seqs {
            self.add(seq)?;
        }
        Ok(())
    }

    fn add_units(&mut self, seq: &[u16]) -> Result<(), BuilderError> {
        if self.root.is_some() {
            return Err(BuilderError::Finalized);
        }
        if seq.is_empty() {
            // The empty sequence sorts before everything else, so it is
            // only accepted as the very first addition.
            if self.path.len() > 1 || self.path[0].state.is_final() {
                return Err(self.out_of_order(seq));
            }
            self.path[0].state.set_final(true);
            return Ok(());
        }
        let prefix_len = self.shared_prefix(seq)?;
        self.collapse_to(prefix_len);
        self.path.extend(
            seq[prefix_len..]
                .iter()
                .copied()
                .mark_last()
                .map(|(last, label)| PathEntry {
                    label,
                    state: State::new(last),
                }),
        );
        Ok(())
    }

    /// Length of the prefix shared with the previous sequence, whose path
    /// the stack still holds. Input is sorted, so this is also the shared
    /// prefix with the automaton. Order violations surface here: a label
    /// below the stack's, or the input ending while still on the stack,
    /// both mean the sequence does not sort strictly after the previous
    /// one.
    fn shared_prefix(&self, seq: &[u16]) -> Result<usize, BuilderError> {
        let mut len = 0;
        for (i, &label) in seq.iter().enumerate() {
            let Some(entry) = self.path.get(len + 1) else {
                break;
            };
            if label > entry.label {
                break;
            }
            if label < entry.label || i == seq.len() - 1 {
                return Err(self.out_of_order(seq));
            }
            len += 1;
        }
        Ok(len)
    }

    fn out_of_order(&self, seq: &[u16]) -> BuilderError {
        let previous: Vec<u16> = self.path[1..].iter().map(|e| e.label).collect();
        BuilderError::OutOfOrder {
            previous: String::from_utf16_lossy(&previous),
            current: String::from_utf16_lossy(seq),
        }
    }

    /// Pops the active path down to `depth`, canonicalizing each popped
    /// state and attaching it to its parent. Pops run bottom-up, so
    /// destinations are always registered before the states pointing at
    /// them.
    fn collapse_to(&mut self, depth: usize) {
        debug_assert!(self.path.len() > depth);
        while self.path.len() > depth + 1 {
            let entry = self.pop_path();
            let dest = self.canonicalize(entry.state);
            self.path
                .last_mut()
                .expect("active path always has a root entry")
                .state
                .insert(entry.label, dest);
        }
    }

    fn pop_path(&mut self) -> PathEntry<'a> {
        self.path
            .pop()
            .expect("active path always has a root entry")
    }

    /// The register-or-replace step: returns the canonical instance of a
    /// state, inserting the state into the register if no equivalent exists
    /// yet.
    fn canonicalize(&mut self, mut state: State<'a>) -> &'a State<'a> {
        debug_assert!(
            state
                .transitions()
                .all(|(_, dest)| self.register.contains(dest)),
            "states are canonicalized bottom-up"
        );
        if let Some(&canonical) = self.register.get(&state) {
            canonical
        } else {
            state.set_canonical();
            let state: &'a State<'a> = self.arena.alloc(state);
            self.register.insert(state);
            state
        }
    }

    /// Collapses the remaining active path and canonicalizes the root.
    /// Idempotent; the canonical root is remembered across builds.
    fn finalize(&mut self) -> &'a State<'a> {
        if let Some(root) = self.root {
            return root;
        }
        self.collapse_to(0);
        let entry = self.pop_path();
        let root = self.canonicalize(entry.state);
        self.root = Some(root);
        root
    }

    /// Finalizes the automaton and emits it as a packed [`Dictionary`].
    ///
    /// Finalization is irreversible: later [`add`](DictionaryBuilder::add)
    /// calls fail with [`BuilderError::Finalized`]. Building again returns
    /// an equivalent dictionary.
    pub fn build(&mut self) -> Dictionary {
        Dictionary::pack(self.finalize())
    }

    /// Finalizes the automaton and emits a [`PerfectHashDictionary`], which
    /// additionally maps every accepted sequence to its lexicographic rank.
    pub fn build_perfect_hash(&mut self) -> PerfectHashDictionary {
        PerfectHashDictionary::pack(self.finalize())
    }

    /// Finalizes the automaton and renders it in Graphviz dot format.
    pub fn to_dot(&mut self) -> String {
        self.build().to_dot()
    }
}

/// Builds a packed dictionary from an iterator of sequences.
///
/// Sequences **must** be provided in strictly ascending lexicographic
/// order. The arena backing construction is local to this call; the packed
/// result is fully self-contained.
///
/// # Examples
///
/// ```
/// use madfa::dict::build_dictionary;
///
/// let dict = build_dictionary(["bake", "cake", "fake", "lake"]).unwrap();
/// assert!(dict.contains("cake"));
/// assert!(!dict.contains("ake"));
/// ```
pub fn build_dictionary<S: IntoSeq>(
    seqs: impl IntoIterator<Item = S>,
) -> Result<Dictionary, BuilderError> {
    let arena = Arena::new();
    let mut builder = DictionaryBuilder::new(&arena);
    builder.add_all(seqs)?;
    Ok(builder.build())
}

/// Builds a perfect hash dictionary from an iterator of sequences.
///
/// Like [`build_dictionary`], but the result assigns each sequence its
/// lexicographic rank in `[1, N]`.
///
/// # Examples
///
/// ```
/// use madfa::dict::build_perfect_hash_dictionary;
///
/// let dict = build_perfect_hash_dictionary(["cat", "cats", "dog"]).unwrap();
/// assert_eq!(dict.number("cat"), Some(1));
/// assert_eq!(dict.sequence(3).as_deref(), Some("dog"));
/// ```
pub fn build_perfect_hash_dictionary<S: IntoSeq>(
    seqs: impl IntoIterator<Item = S>,
) -> Result<PerfectHashDictionary, BuilderError> {
    let arena = Arena::new();
    let mut builder = DictionaryBuilder::new(&arena);
    builder.add_all(seqs)?;
    Ok(builder.build_perfect_hash())
}

/// Builds a packed dictionary from a sequence file.
///
/// Reads sequences from a text file (one per line) in sorted order. Lines
/// starting with `#` are treated as comments and ignored; empty lines are
/// skipped.
pub fn build_dictionary_from_file(path: impl AsRef<Path>) -> Result<Dictionary, Box<dyn Error>> {
    let arena = Arena::new();
    let mut builder = DictionaryBuilder::new(&arena);
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    // Instead of using BufReader::lines() we call read_line repeatedly,
    // which allows reusing one buffer instead of allocating per line.
    let mut buf = String::with_capacity(80);
    loop {
        match reader.read_line(&mut buf) {
            Ok(0) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        let seq = buf.trim_end();
        if !seq.is_empty() && !is_comment(seq) {
            builder.add(seq)?;
        }
        buf.clear();
    }
    Ok(builder.build())
}

/// Returns true if this line is a comment.
pub(crate) fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}
