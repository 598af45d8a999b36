//! Request-scoped tallies fed by the tokenizer.
//!
//! Both tables keep keys in first-seen order; the ranking step relies on it to break ties.

use std::hash::Hash;
use std::ops::Range;

use indexmap::{IndexMap, IndexSet};
use log::warn;

/// Something that consumes one document's tokens at a time.
pub trait Accumulator {
    fn observe(&mut self, tokens: &[String]);
}

/// Insertion-ordered counter with an optional ceiling on distinct keys.
///
/// When a new key would exceed the ceiling, the lowest counts are evicted (latest first-seen
/// first among equal counts) so that the table, new key included, holds three quarters of the
/// ceiling. Survivors keep their counts and their order.
#[derive(Debug, Clone)]
pub struct BoundedCounts<K> {
    counts: IndexMap<K, u64>,
    ceiling: Option<usize>,
    evicted: u64,
}

impl<K: Hash + Eq> BoundedCounts<K> {
    pub fn new(ceiling: Option<usize>) -> Self {
        Self {
            counts: IndexMap::new(),
            ceiling: ceiling.filter(|c| *c > 0),
            evicted: 0,
        }
    }

    pub fn increment(&mut self, key: K) {
        if let Some(count) = self.counts.get_mut(&key) {
            *count += 1;
            return;
        }
        if let Some(ceiling) = self.ceiling {
            if self.counts.len() >= ceiling {
                self.evict_tail(ceiling - ceiling / 4);
            }
        }
        self.counts.insert(key, 1);
    }

    pub fn get(&self, key: &K) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of entries dropped so far by the ceiling.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    fn evict_tail(&mut self, target: usize) {
        if self.counts.len() < target {
            return;
        }
        // room for the key about to be inserted
        let excess = self.counts.len() + 1 - target;
        let mut order: Vec<usize> = (0..self.counts.len()).collect();
        let values: Vec<u64> = self.counts.values().copied().collect();
        order.sort_by(|a, b| values[*a].cmp(&values[*b]).then(b.cmp(a)));

        let mut evict = vec![false; values.len()];
        for index in order.into_iter().take(excess) {
            evict[index] = true;
        }
        let mut position = 0;
        self.counts.retain(|_, _| {
            let keep = !evict[position];
            position += 1;
            keep
        });
        self.evicted += excess as u64;
        warn!(
            "Count ceiling reached, evicted {} low-frequency entries ({} kept)",
            excess,
            self.counts.len()
        );
    }
}

impl<K: Hash + Eq> Default for BoundedCounts<K> {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Word -> occurrence count over a whole pass.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: BoundedCounts<String>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ceiling(ceiling: Option<usize>) -> Self {
        Self {
            counts: BoundedCounts::new(ceiling),
        }
    }

    pub fn count(&self, word: &str) -> u64 {
        self.counts.counts.get(word).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(word, count)` in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts
            .iter()
            .map(|(word, count)| (word.as_str(), count))
    }
}

impl Accumulator for FrequencyTable {
    ///Counts every occurrence, duplicates within a document included.
    fn observe(&mut self, tokens: &[String]) {
        for token in tokens {
            if let Some(count) = self.counts.counts.get_mut(token.as_str()) {
                *count += 1;
            } else {
                self.counts.increment(token.to_owned());
            }
        }
    }
}

///Window of neighbor positions around `index`, `radius` on each side, clipped to `len`.
/// The range includes `index` itself; callers skip it.
/// # Example
/// ```
/// use review_text_analytics::accumulator::window;
/// assert_eq!(window(2, 5, 3), 0..5);
/// assert_eq!(window(6, 10, 3), 3..10);
/// ```
pub fn window(index: usize, len: usize, radius: usize) -> Range<usize> {
    index.saturating_sub(radius)..len.min(index.saturating_add(radius).saturating_add(1))
}

/// Directed co-occurrence counts, keyed by the `(word, neighbor)` id pair.
///
/// The ceiling bounds the pair map only. The vocabulary keeps every word seen in the pass,
/// evicted or not, so ids stay stable; it grows at most like a plain word count.
#[derive(Debug, Clone)]
pub struct AssociationTable {
    vocabulary: IndexSet<String>,
    pairs: BoundedCounts<(u32, u32)>,
    radius: usize,
}

impl AssociationTable {
    pub fn new(radius: usize) -> Self {
        Self::with_ceiling(radius, None)
    }

    pub fn with_ceiling(radius: usize, ceiling: Option<usize>) -> Self {
        Self {
            vocabulary: IndexSet::new(),
            pairs: BoundedCounts::new(ceiling),
            radius,
        }
    }

    /// Joint count of `neighbor` seen within the window of `word`.
    pub fn joint_count(&self, word: &str, neighbor: &str) -> u64 {
        match (
            self.vocabulary.get_index_of(word),
            self.vocabulary.get_index_of(neighbor),
        ) {
            (Some(w), Some(n)) => self.pairs.get(&(w as u32, n as u32)).unwrap_or(0),
            _ => 0,
        }
    }

    /// Number of distinct directed pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `(word, neighbor, count)` in first-seen pair order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.pairs.iter().filter_map(|((w, n), count)| {
            let word = self.vocabulary.get_index(*w as usize)?;
            let neighbor = self.vocabulary.get_index(*n as usize)?;
            Some((word.as_str(), neighbor.as_str(), count))
        })
    }

    fn intern(&mut self, word: &str) -> u32 {
        match self.vocabulary.get_index_of(word) {
            Some(id) => id as u32,
            None => self.vocabulary.insert_full(word.to_owned()).0 as u32,
        }
    }
}

impl Accumulator for AssociationTable {
    fn observe(&mut self, tokens: &[String]) {
        let ids: Vec<u32> = tokens.iter().map(|t| self.intern(t)).collect();
        for (index, word) in ids.iter().enumerate() {
            for position in window(index, ids.len(), self.radius) {
                if position == index {
                    continue;
                }
                // a word never pairs with itself, even from another position
                let neighbor = ids[position];
                if neighbor != *word {
                    self.pairs.increment((*word, neighbor));
                }
            }
        }
    }
}
