use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use sha2::{Digest, Sha256};

use super::error::LoadError;
use super::loader::{load_csv_bytes, LoadedDataset};
use super::model::DatasetSchema;

/// SHA-256 of the uploaded bytes plus the schema they were parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    pub fn compute(bytes: &[u8], schema: &DatasetSchema) -> Self {
        let mut hasher = Sha256::new();
        for col in schema.category_columns.iter() {
            hasher.update(b"c:");
            hasher.update(col.as_bytes());
            hasher.update([0u8]);
        }
        for col in schema.timestamp_columns.iter() {
            hasher.update(b"t:");
            hasher.update(col.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(bytes);
        ContentKey(hasher.finalize().into())
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<ContentKey, Arc<LoadedDataset>>,
    /// Insertion order, oldest first.
    order: VecDeque<ContentKey>,
}

/// Content-addressed store of parsed uploads.
///
/// Byte-identical input is parsed once; later loads hand back the same
/// `Arc`. Entries are immutable, so the cache can be shared read-mostly
/// between sessions. At most `capacity` contents are kept; the oldest
/// insertion is evicted first.
pub struct DatasetCache {
    capacity: usize,
    inner: RwLock<CacheInner>,
}

impl DatasetCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: RwLock::new(CacheInner::default()),
        }
    }

    /// Return the cached parse of `bytes`, parsing and inserting it on a miss.
    /// Failed loads are not cached.
    pub fn load(
        &self,
        bytes: &[u8],
        schema: &DatasetSchema,
    ) -> Result<Arc<LoadedDataset>, LoadError> {
        let key = ContentKey::compute(bytes, schema);
        if let Some(hit) = self.get(&key) {
            log::info!("Dataset cache hit for {key}");
            return Ok(hit);
        }

        let loaded = Arc::new(load_csv_bytes(bytes, schema)?);

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        // Another session may have parsed the same content meanwhile.
        if let Some(existing) = inner.entries.get(&key) {
            return Ok(Arc::clone(existing));
        }
        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            log::debug!("Evicted cached dataset {oldest}");
        }
        inner.entries.insert(key, Arc::clone(&loaded));
        inner.order.push_back(key);
        log::debug!("Cached dataset {key} ({} entries)", inner.entries.len());

        Ok(loaded)
    }

    pub fn get(&self, key: &ContentKey) -> Option<Arc<LoadedDataset>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &ContentKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(owner: &str) -> Vec<u8> {
        format!("owner,type,created,modified\n{owner},Park,2023-01-01,2023-01-02\n").into_bytes()
    }

    #[test]
    fn identical_bytes_share_one_parse() {
        let cache = DatasetCache::new(4);
        let schema = DatasetSchema::default();
        let a = cache.load(&csv("Alice"), &schema).unwrap();
        let b = cache.load(&csv("Alice"), &schema).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_bytes_are_different_entries() {
        let cache = DatasetCache::new(4);
        let schema = DatasetSchema::default();
        let a = cache.load(&csv("Alice"), &schema).unwrap();
        let b = cache.load(&csv("Bob"), &schema).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let cache = DatasetCache::new(2);
        let schema = DatasetSchema::default();
        for owner in ["A", "B", "C"] {
            cache.load(&csv(owner), &schema).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&ContentKey::compute(&csv("A"), &schema)));
        assert!(cache.contains(&ContentKey::compute(&csv("C"), &schema)));
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let cache = DatasetCache::new(2);
        assert!(cache.load(b"a,b\n1,2\n", &DatasetSchema::default()).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn key_depends_on_schema() {
        let bytes = csv("Alice");
        let other = DatasetSchema {
            category_columns: vec!["owner".into()],
            ..DatasetSchema::default()
        };
        assert_ne!(
            ContentKey::compute(&bytes, &DatasetSchema::default()),
            ContentKey::compute(&bytes, &other)
        );
    }
}
