//! Profile cache: validated profiles keyed by identifier.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

use crate::schema::profile::Profile;
use crate::store::loader::{ProfileError, ProfileSource};

/// Loaded profiles, shared read-only.
///
/// The cache never checks its source for changes. Callers that edit a
/// profile on disk must `evict` it (or `clear` the cache) to see the edit.
#[derive(Debug, Clone, Default)]
pub struct ProfileCache {
    entries: FxHashMap<String, Arc<Profile>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, profile_id: &str) -> Option<Arc<Profile>> {
        self.entries.get(profile_id).cloned()
    }

    pub fn insert(&mut self, profile_id: impl Into<String>, profile: Profile) -> Arc<Profile> {
        let profile = Arc::new(profile);
        self.entries.insert(profile_id.into(), Arc::clone(&profile));
        profile
    }

    /// Return the cached profile, loading it from `source` on a miss.
    ///
    /// Failed loads are not cached; the next call tries again.
    pub fn get_or_load<S>(&mut self, source: &S, profile_id: &str) -> Result<Arc<Profile>, ProfileError>
    where
        S: ProfileSource + ?Sized,
    {
        if let Some(profile) = self.entries.get(profile_id) {
            debug!(profile = profile_id, "profile cache hit");
            return Ok(Arc::clone(profile));
        }
        debug!(profile = profile_id, "profile cache miss");
        let profile = source.load(profile_id)?;
        Ok(self.insert(profile_id, profile))
    }

    /// Drop one entry. Returns whether it was present.
    pub fn evict(&mut self, profile_id: &str) -> bool {
        self.entries.remove(profile_id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::loader::{InMemoryProfiles, ProfileDir};
    use std::fs;

    fn source_with(id: &str, template: &str) -> InMemoryProfiles {
        let mut source = InMemoryProfiles::new();
        source
            .insert_source(id, &format!(r#"{{"templates": ["{}"], "pools": {{}}}}"#, template))
            .unwrap();
        source
    }

    #[test]
    fn miss_then_hit_shares_profile() {
        let source = source_with("a.json", "first");
        let mut cache = ProfileCache::new();
        let first = cache.get_or_load(&source, "a.json").unwrap();
        let second = cache.get_or_load(&source, "a.json").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cached_entry_survives_source_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        fs::write(&path, r#"{"templates": ["old"], "pools": {}}"#).unwrap();
        let source = ProfileDir::new(dir.path());

        let mut cache = ProfileCache::new();
        let before = cache.get_or_load(&source, "p.json").unwrap();
        fs::write(&path, r#"{"templates": ["new"], "pools": {}}"#).unwrap();

        let still = cache.get_or_load(&source, "p.json").unwrap();
        assert_eq!(still.templates()[0].source(), "old");
        assert!(Arc::ptr_eq(&before, &still));

        assert!(cache.evict("p.json"));
        let reloaded = cache.get_or_load(&source, "p.json").unwrap();
        assert_eq!(reloaded.templates()[0].source(), "new");
    }

    #[test]
    fn failed_load_is_not_cached() {
        let source = InMemoryProfiles::new();
        let mut cache = ProfileCache::new();
        assert!(matches!(
            cache.get_or_load(&source, "missing.json"),
            Err(ProfileError::NotFound(_))
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn evict_and_clear() {
        let source = source_with("a.json", "x");
        let mut cache = ProfileCache::new();
        cache.get_or_load(&source, "a.json").unwrap();
        assert!(!cache.evict("other.json"));
        assert!(cache.get("a.json").is_some());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a.json").is_none());
    }

    #[test]
    fn works_through_trait_object() {
        let source = source_with("a.json", "x");
        let dynamic: &dyn ProfileSource = &source;
        let mut cache = ProfileCache::new();
        assert!(cache.get_or_load(dynamic, "a.json").is_ok());
    }
}
