//! Example: a spell-check lexicon with frequency ranks.
//!
//! Builds a perfect hash dictionary over a small word list, then uses the
//! ranks to index a parallel frequency table, and shows the value-map
//! wrapper doing the same thing in one step.
//!
//! Run with: cargo run --example ranks

use madfa::dict::{build_perfect_hash_dictionary, MapBuilder};

fn main() {
    let words = ["bake", "baked", "baker", "cake", "caked", "fake", "lake"];
    let dict = build_perfect_hash_dictionary(words).unwrap();

    // Membership
    println!("Membership:");
    for word in ["bake", "baker", "bakes", "cake", "lake", "make"] {
        let verdict = if dict.contains(word) { "yes" } else { "no" };
        println!("  {word}: {verdict}");
    }

    // Ranks are dense in [1, N] and follow lexicographic order.
    println!("\nRanks:");
    for word in words {
        println!("  {word}: {}", dict.number(word).unwrap());
    }
    println!("  rank 3 is {:?}", dict.sequence(3).unwrap());

    // A rank-indexed side table...
    let frequencies = [51u32, 12, 40, 65, 9, 71, 33];
    let freq_of = |word: &str| dict.number(word).map(|r| frequencies[(r - 1) as usize]);
    println!("\nFrequencies via ranks:");
    println!("  cake: {:?}", freq_of("cake"));
    println!("  make: {:?}", freq_of("make"));

    // ...or the value map, which bundles both sides.
    let mut builder = MapBuilder::new();
    for (word, freq) in words.iter().zip(frequencies) {
        builder.put(word, freq);
    }
    let map = builder.build();
    println!("\nValue map:");
    for (word, freq) in &map {
        println!("  {word}: {freq}");
    }
}
