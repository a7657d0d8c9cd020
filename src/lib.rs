//! # madfa
//!
//! Minimal acyclic deterministic finite-state automata as dictionaries,
//! perfect hash functions, and immutable maps.
//!
//! A set of character sequences is stored as a minimal acyclic automaton —
//! essentially a trie with shared suffixes — built incrementally from
//! sorted input with the algorithm of
//! [Daciuk et al. (2000)](https://arxiv.org/abs/cs/0007009v1). The automaton
//! is minimal after every insertion, so construction never needs a separate
//! minimization pass. Queries run against a packed form: flat parallel
//! arrays with binary search over each state's sorted transition labels.
//!
//! ## Features
//!
//! - **Compact**: suffix sharing minimizes states; the packed form stores
//!   only integer arrays
//! - **Perfect hashing**: every sequence maps to its lexicographic rank in
//!   `[1, N]`, and ranks map back to sequences
//! - **Immutable maps**: rank-indexed value arrays turn the automaton into
//!   a string-to-value map
//! - **Thread-safe queries**: packed dictionaries are plain data, freely
//!   shared across threads
//!
//! ## Quick Start
//!
//! The simplest entry points build a dictionary in one call:
//!
//! ```
//! use madfa::dict::build_perfect_hash_dictionary;
//!
//! let dict = build_perfect_hash_dictionary(["cat", "cats", "dog"]).unwrap();
//!
//! assert!(dict.contains("cats"));
//! assert!(!dict.contains("do"));
//! assert_eq!(dict.number("cats"), Some(2));
//! assert_eq!(dict.sequence(3).as_deref(), Some("dog"));
//! ```
//!
//! For streaming input, feed a [`DictionaryBuilder`](dict::DictionaryBuilder)
//! directly; it allocates states from a caller-provided arena:
//!
//! ```
//! use madfa::dict::{Arena, DictionaryBuilder};
//!
//! let arena = Arena::new();
//! let mut builder = DictionaryBuilder::new(&arena);
//! builder.add("bake").unwrap();
//! builder.add("cake").unwrap();
//!
//! let dict = builder.build();
//! assert_eq!(dict.iter().collect::<Vec<_>>(), ["bake", "cake"]);
//! ```
//!
//! ## Value Maps
//!
//! ```
//! use madfa::dict::MapBuilder;
//!
//! let mut builder = MapBuilder::new();
//! builder.put("apple", 10).put("banana", 20).put("cherry", 30);
//! let map = builder.build();
//!
//! assert_eq!(map.get("banana"), Some(&20));
//! assert_eq!(map.get_or("date", -1), -1);
//! ```

#![warn(missing_docs)]

/// Core dictionary machinery: builder, packed automaton, perfect hashing,
/// and value maps.
pub mod dict;
