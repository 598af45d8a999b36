use indexmap::IndexMap;

use crate::accumulator::{AssociationTable, FrequencyTable};

/// `(key, count)` pairs, highest count first.
pub type Ranked = Vec<(String, u64)>;

///Sort `(key, count)` pairs by count, highest first, and keep the first `k`.
///Equal counts keep the order they came in, so callers pass entries in first-seen order.
/// # Example
/// ```
/// use review_text_analytics::ranking::select_top_k;
/// let entries = vec![("one", 1), ("two", 2), ("three", 3), ("deux", 2)];
/// let ranked = select_top_k(entries, 3);
/// assert_eq!(ranked, vec![("three", 3), ("two", 2), ("deux", 2)]);
/// ```
pub fn select_top_k<K>(entries: impl IntoIterator<Item = (K, u64)>, k: usize) -> Vec<(K, u64)> {
    let mut vec_sorted: Vec<(K, u64)> = entries.into_iter().collect();
    // stable
    vec_sorted.sort_by(|a, b| b.1.cmp(&a.1));
    vec_sorted.truncate(k);
    vec_sorted
}

/// Top `k` words of a frequency table.
pub fn top_words(table: &FrequencyTable, k: usize) -> Ranked {
    select_top_k(table.entries(), k)
        .into_iter()
        .map(|(word, count)| (word.to_owned(), count))
        .collect()
}

/// One word with its strongest neighbors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedAssociations {
    pub word: String,
    pub neighbors: Ranked,
}

/// Two-level ranking of an association table.
///
/// Every word keeps its `neighbors_per_word` strongest neighbors. Words are then ordered by how
/// many neighbors they kept (not by any summed count) and cut to `words`.
pub fn rank_associations(
    table: &AssociationTable,
    neighbors_per_word: usize,
    words: usize,
) -> Vec<RankedAssociations> {
    let mut grouped: IndexMap<&str, Vec<(&str, u64)>> = IndexMap::new();
    for (word, neighbor, count) in table.entries() {
        grouped.entry(word).or_default().push((neighbor, count));
    }

    let per_word: Vec<RankedAssociations> = grouped
        .into_iter()
        .map(|(word, neighbors)| RankedAssociations {
            word: word.to_owned(),
            neighbors: select_top_k(neighbors, neighbors_per_word)
                .into_iter()
                .map(|(neighbor, count)| (neighbor.to_owned(), count))
                .collect(),
        })
        .collect();

    select_top_k(
        per_word.into_iter().map(|r| {
            let kept = r.neighbors.len() as u64;
            (r, kept)
        }),
        words,
    )
    .into_iter()
    .map(|(r, _)| r)
    .collect()
}
