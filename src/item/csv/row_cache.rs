use ahash::AHashMap;

use crate::core::resolver::Row;

/// Memo from raw line text to its tokenized row.
///
/// Entries are never evicted: the cache lives as long as the reader that owns
/// it and grows with the number of distinct lines seen.
#[derive(Debug, Default)]
pub struct RowCache {
    rows: AHashMap<String, Row>,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.rows.contains_key(raw)
    }

    pub fn get(&self, raw: &str) -> Option<&Row> {
        self.rows.get(raw)
    }

    pub fn insert(&mut self, raw: String, row: Row) {
        self.rows.insert(raw, row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
