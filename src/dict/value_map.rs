use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;
use typed_arena::Arena;

use super::builder::{BuilderError, DictionaryBuilder};
use super::packed::Iter;
use super::perfect::PerfectHashDictionary;

/// An immutable map from strings to values, backed by a perfect hash
/// dictionary.
///
/// The keys live in a [`PerfectHashDictionary`]; a key's rank indexes a
/// parallel value array, so the map costs one automaton walk per lookup and
/// stores each value exactly once. Maps are created through
/// [`MapBuilder`] (keys in any order) or [`OrderedMapBuilder`] (keys in
/// sorted order, cheaper).
///
/// # Examples
///
/// ```
/// use madfa::dict::MapBuilder;
///
/// let mut builder = MapBuilder::new();
/// builder.put("banana", 20);
/// builder.put("apple", 10);
/// builder.put("cherry", 30);
/// let map = builder.build();
///
/// assert_eq!(map.get("banana"), Some(&20));
/// assert_eq!(map.get("date"), None);
/// assert_eq!(map.get_or("date", -1), -1);
/// ```
pub struct PerfectHashMap<V> {
    keys: PerfectHashDictionary,
    values: Vec<V>,
}

impl<V> PerfectHashMap<V> {
    /// Returns the value associated with a key, or `None` if the key is not
    /// in the map.
    pub fn get(&self, key: &str) -> Option<&V> {
        let rank = self.keys.number(key)?;
        Some(&self.values[(rank - 1) as usize])
    }

    /// Returns the value associated with a key, or a default if the key is
    /// not in the map.
    pub fn get_or(&self, key: &str, default: V) -> V
    where
        V: Clone,
    {
        self.get(key).cloned().unwrap_or(default)
    }

    /// True if the key is in the map.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns an iterator over the keys, in sorted order.
    pub fn keys(&self) -> Iter<'_> {
        self.keys.iter()
    }

    /// The values, ordered by their keys.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Returns an iterator over the entries, in key order.
    pub fn iter(&self) -> Entries<'_, V> {
        Entries {
            keys: self.keys.iter(),
            values: self.values.iter(),
        }
    }

    /// Borrows the key dictionary.
    pub fn key_dictionary(&self) -> &PerfectHashDictionary {
        &self.keys
    }
}

impl<V> fmt::Debug for PerfectHashMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerfectHashMap")
            .field("entries", &self.values.len())
            .finish()
    }
}

/// An iterator over the entries of a [`PerfectHashMap`], in key order.
pub struct Entries<'m, V> {
    keys: Iter<'m>,
    values: std::slice::Iter<'m, V>,
}

impl<'m, V> Iterator for Entries<'m, V> {
    type Item = (String, &'m V);

    fn next(&mut self) -> Option<Self::Item> {
        // Keys iterate in rank order, so they pair up with the value slice.
        Some((self.keys.next()?, self.values.next()?))
    }
}

impl<'m, V> IntoIterator for &'m PerfectHashMap<V> {
    type Item = (String, &'m V);
    type IntoIter = Entries<'m, V>;

    fn into_iter(self) -> Entries<'m, V> {
        self.iter()
    }
}

/// A builder for [`PerfectHashMap`] that accepts keys in any order.
///
/// Entries are collected into an ordered map first (keyed by the encoded
/// code units, so the ordering is exactly the dictionary's) and streamed
/// into the automaton builder at [`build`](MapBuilder::build) time. Putting
/// a key twice replaces its value.
pub struct MapBuilder<V> {
    entries: BTreeMap<Vec<u16>, V>,
}

impl<V> MapBuilder<V> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        MapBuilder {
            entries: BTreeMap::new(),
        }
    }

    /// Puts a key/value pair, replacing any value the key already had.
    pub fn put(&mut self, key: &str, value: V) -> &mut Self {
        self.entries.insert(key.encode_utf16().collect(), value);
        self
    }

    /// Puts all pairs from an iterator.
    pub fn put_all<'k>(&mut self, entries: impl IntoIterator<Item = (&'k str, V)>) -> &mut Self {
        for (key, value) in entries {
            self.put(key, value);
        }
        self
    }

    /// Builds the map.
    pub fn build(self) -> PerfectHashMap<V> {
        let arena = Arena::new();
        let mut builder = DictionaryBuilder::new(&arena);
        let mut values = Vec::with_capacity(self.entries.len());
        for (key, value) in self.entries {
            builder
                .add(key)
                .expect("ordered map iterates keys in strictly ascending order");
            values.push(value);
        }
        PerfectHashMap {
            keys: builder.build_perfect_hash(),
            values,
        }
    }
}

impl<V> Default for MapBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A builder for [`PerfectHashMap`] that requires keys in sorted order.
///
/// Skips the intermediate ordered map of [`MapBuilder`]: each
/// [`put`](OrderedMapBuilder::put) validates that the key sorts strictly
/// after the previous one and fails immediately if not.
pub struct OrderedMapBuilder<V> {
    entries: Vec<(SmallVec<[u16; 32]>, V)>,
}

impl<V> OrderedMapBuilder<V> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        OrderedMapBuilder {
            entries: Vec::new(),
        }
    }

    /// Puts a key/value pair.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::OutOfOrder`] if the key does not sort
    /// strictly after the previously put key.
    pub fn put(&mut self, key: &str, value: V) -> Result<(), BuilderError> {
        let key: SmallVec<[u16; 32]> = key.encode_utf16().collect();
        if let Some((previous, _)) = self.entries.last() {
            if key.as_slice() <= previous.as_slice() {
                return Err(BuilderError::OutOfOrder {
                    previous: String::from_utf16_lossy(previous),
                    current: String::from_utf16_lossy(&key),
                });
            }
        }
        self.entries.push((key, value));
        Ok(())
    }

    /// Puts all pairs from an iterator, in order.
    pub fn put_all<'k>(
        &mut self,
        entries: impl IntoIterator<Item = (&'k str, V)>,
    ) -> Result<(), BuilderError> {
        for (key, value) in entries {
            self.put(key, value)?;
        }
        Ok(())
    }

    /// Builds the map.
    pub fn build(self) -> PerfectHashMap<V> {
        let arena = Arena::new();
        let mut builder = DictionaryBuilder::new(&arena);
        let mut values = Vec::with_capacity(self.entries.len());
        for (key, value) in self.entries {
            builder
                .add(key.as_slice())
                .expect("keys were order-checked when they were put");
            values.push(value);
        }
        PerfectHashMap {
            keys: builder.build_perfect_hash(),
            values,
        }
    }
}

impl<V> Default for OrderedMapBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fruit_map() -> PerfectHashMap<i64> {
        let mut builder = MapBuilder::new();
        builder.put("apple", 10).put("banana", 20).put("cherry", 30);
        builder.build()
    }

    #[test]
    fn get_returns_bound_values() {
        let map = fruit_map();
        assert_eq!(map.get("apple"), Some(&10));
        assert_eq!(map.get("banana"), Some(&20));
        assert_eq!(map.get("cherry"), Some(&30));
        assert_eq!(map.get("date"), None);
        assert_eq!(map.get(""), None);
    }

    #[test]
    fn get_or_falls_back_to_default() {
        let map = fruit_map();
        assert_eq!(map.get_or("banana", -1), 20);
        assert_eq!(map.get_or("date", -1), -1);
    }

    #[test]
    fn contains_and_len() {
        let map = fruit_map();
        assert!(map.contains_key("cherry"));
        assert!(!map.contains_key("cherr"));
        assert_eq!(map.len(), 3);
        assert!(!map.is_empty());
    }

    #[test]
    fn unsorted_puts_are_reordered() {
        let mut builder = MapBuilder::new();
        builder.put("cherry", 30).put("apple", 10).put("banana", 20);
        let map = builder.build();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["apple", "banana", "cherry"]);
        assert_eq!(map.values(), [10, 20, 30]);
    }

    #[test]
    fn duplicate_put_replaces_the_value() {
        let mut builder = MapBuilder::new();
        builder.put("apple", 10).put("apple", 11);
        let map = builder.build();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("apple"), Some(&11));
    }

    #[test]
    fn entries_iterate_in_key_order() {
        let map = fruit_map();
        let entries: Vec<(String, i64)> = map.iter().map(|(k, &v)| (k, v)).collect();
        assert_eq!(
            entries,
            [
                ("apple".to_owned(), 10),
                ("banana".to_owned(), 20),
                ("cherry".to_owned(), 30)
            ]
        );
        let via_ref: Vec<String> = (&map).into_iter().map(|(k, _)| k).collect();
        assert_eq!(via_ref, ["apple", "banana", "cherry"]);
    }

    #[test]
    fn ordered_builder_accepts_sorted_keys() {
        let mut builder = OrderedMapBuilder::new();
        builder
            .put_all([("apple", 10), ("banana", 20), ("cherry", 30)])
            .unwrap();
        let map = builder.build();
        assert_eq!(map.get("banana"), Some(&20));
        assert_eq!(map.get_or("date", -1), -1);
    }

    #[test]
    fn ordered_builder_rejects_unsorted_keys_at_put_time() {
        let mut builder = OrderedMapBuilder::new();
        builder.put("banana", 20).unwrap();
        let err = builder.put("apple", 10).unwrap_err();
        assert_eq!(
            err,
            BuilderError::OutOfOrder {
                previous: "banana".to_owned(),
                current: "apple".to_owned(),
            }
        );
    }

    #[test]
    fn ordered_builder_rejects_duplicate_keys() {
        let mut builder = OrderedMapBuilder::new();
        builder.put("apple", 10).unwrap();
        assert!(builder.put("apple", 11).is_err());
    }

    #[test]
    fn empty_map() {
        let map = MapBuilder::<i64>::new().build();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.get("anything"), None);
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn generic_values() {
        let mut builder = MapBuilder::new();
        builder.put("de", "Deutsch").put("en", "English");
        let map = builder.build();
        assert_eq!(map.get("en"), Some(&"English"));
    }
}
