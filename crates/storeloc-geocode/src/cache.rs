use dashmap::DashMap;
use storeloc_core::ZipCoordinate;

/// Process-local memo of resolved ZIP coordinates.
///
/// Append-only: entries are never evicted or overwritten with different
/// data, so racing inserts of the same ZIP are harmless.
#[derive(Debug, Default)]
pub(crate) struct CoordinateCache {
    entries: DashMap<String, ZipCoordinate>,
}

impl CoordinateCache {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub(crate) fn get(&self, zip: &str) -> Option<ZipCoordinate> {
        self.entries.get(zip).map(|entry| entry.value().clone())
    }

    pub(crate) fn insert(&self, zip: &str, coordinate: ZipCoordinate) {
        self.entries.insert(zip.to_string(), coordinate);
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
