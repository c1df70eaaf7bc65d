//! Keyed snapshots and the partition produced by one poll pass.

use indexmap::IndexMap;

/// Records known as of the previous poll, keyed by resource key.
///
/// Keeps insertion order, which for a snapshot returned by a poll is the
/// backend's listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<R> {
    entries: IndexMap<String, R>,
}

impl<R> Snapshot<R> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert a record, returning the one previously stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, record: R) -> Option<R> {
        self.entries.insert(key.into(), record)
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Take a record out, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<R> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &R> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_values(self) -> Vec<R> {
        self.entries.into_values().collect()
    }
}

impl<R> Default for Snapshot<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, R> FromIterator<(K, R)> for Snapshot<R> {
    fn from_iter<I: IntoIterator<Item = (K, R)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<R> IntoIterator for Snapshot<R> {
    type Item = (String, R);
    type IntoIter = indexmap::map::IntoIter<String, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Outcome of one poll pass for one resource kind.
///
/// `current` is the snapshot to pass into the next poll.
#[derive(Debug, Clone)]
pub struct Partition<R> {
    /// Records whose key disappeared from the backend.
    pub removed: Vec<R>,
    /// Records built during this pass.
    pub new: Vec<R>,
    /// Every record still valid, new ones included.
    pub current: Snapshot<R>,
}

impl<R> Partition<R> {
    /// Partition where every previous record was removed.
    pub fn all_removed(previous: Snapshot<R>) -> Self {
        Self {
            removed: previous.into_values(),
            new: Vec::new(),
            current: Snapshot::new(),
        }
    }

    /// Nothing appeared and nothing disappeared.
    pub fn is_unchanged(&self) -> bool {
        self.removed.is_empty() && self.new.is_empty()
    }

    /// The `(removed, new, current)` triple.
    pub fn into_parts(self) -> (Vec<R>, Vec<R>, Vec<R>) {
        (self.removed, self.new, self.current.into_values())
    }
}
