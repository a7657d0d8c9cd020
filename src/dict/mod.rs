/// Incremental builder, the register of minimized states, and ingestion
/// helpers.
pub mod builder;
/// The packed automaton and its query surface.
pub mod packed;
/// Perfect hashing: sequence ranks and their inversion.
pub mod perfect;
/// Mutable automaton states used during construction.
pub mod state;
/// Immutable string-to-value maps backed by a perfect hash dictionary.
pub mod value_map;

pub use builder::{
    build_dictionary, build_dictionary_from_file, build_perfect_hash_dictionary,
    BuilderError, DictionaryBuilder, IntoSeq,
};
pub use packed::{Dictionary, Iter};
pub use perfect::PerfectHashDictionary;
pub use state::State;
pub use value_map::{Entries, MapBuilder, OrderedMapBuilder, PerfectHashMap};

/// Re-export of `typed_arena::Arena` for use with [`DictionaryBuilder`].
pub use typed_arena::Arena;

#[cfg(test)]
mod test {
    use super::*;

    const WORDS: [&str; 24] = [
        "ohm", "ohms", "out", "outage", "outages", "outback", "outbid", "outbids",
        "outcome", "outcomes", "outdo", "outdone", "outer", "outing", "outings",
        "outlaw", "outlaws", "outlet", "outlets", "output", "outputs", "outset",
        "overt", "overts",
    ];

    #[test]
    fn membership_is_exact() {
        let dict = build_dictionary(WORDS).unwrap();
        for word in WORDS {
            assert!(dict.contains(word), "{word}");
        }
        for word in ["o", "oh", "ou", "outa", "outbacks", "outcomes2", "zzz", ""] {
            assert!(!dict.contains(word), "{word}");
        }
        assert_eq!(dict.len(), WORDS.len());
    }

    #[test]
    fn iteration_reproduces_the_input() {
        let dict = build_dictionary(WORDS).unwrap();
        assert_eq!(dict.iter().collect::<Vec<_>>(), WORDS);
    }

    #[test]
    fn ranks_are_dense_and_ordered() {
        let dict = build_perfect_hash_dictionary(WORDS).unwrap();
        assert_eq!(dict.len(), WORDS.len());
        for (i, word) in WORDS.iter().enumerate() {
            let rank = dict.number(word).unwrap();
            assert_eq!(rank, i as u32 + 1, "{word}");
            assert_eq!(dict.sequence(rank).as_deref(), Some(*word));
        }
    }

    #[test]
    fn fewer_states_than_the_trie() {
        let dict = build_dictionary(WORDS).unwrap();
        let trie_nodes: usize = 1 + {
            // Count distinct prefixes, the node count of the naive trie.
            let mut prefixes = std::collections::HashSet::new();
            for word in WORDS {
                for end in 1..=word.len() {
                    prefixes.insert(&word[..end]);
                }
            }
            prefixes.len()
        };
        assert!(
            dict.state_count() < trie_nodes,
            "{} states, trie has {trie_nodes}",
            dict.state_count()
        );
    }

    #[test]
    fn builder_and_convenience_agree() {
        let arena = Arena::new();
        let mut builder = DictionaryBuilder::new(&arena);
        builder.add_all(WORDS).unwrap();
        let from_builder = builder.build();
        let from_fn = build_dictionary(WORDS).unwrap();
        assert_eq!(from_builder, from_fn);
    }

    #[test]
    fn packed_dictionaries_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dictionary>();
        assert_send_sync::<PerfectHashDictionary>();
        assert_send_sync::<PerfectHashMap<i64>>();

        let dict = std::sync::Arc::new(build_perfect_hash_dictionary(WORDS).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let dict = std::sync::Arc::clone(&dict);
                std::thread::spawn(move || {
                    WORDS
                        .iter()
                        .map(|w| dict.number(w).unwrap() as usize)
                        .sum::<usize>()
                })
            })
            .collect();
        let expected = WORDS.len() * (WORDS.len() + 1) / 2;
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn builder_to_dot_finalizes() {
        let arena = Arena::new();
        let mut builder = DictionaryBuilder::new(&arena);
        builder.add("hi").unwrap();
        let dot = builder.to_dot();
        assert!(dot.starts_with("digraph G {"));
        assert_eq!(builder.add("ho"), Err(BuilderError::Finalized));
    }
}
