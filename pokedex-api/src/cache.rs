//! # Pokedex cache
//!
//! In-memory working set for one session:
//!
//! - the full index: every Pokémon's name and reference, fetched once
//! - type lists: the index of each requested type, fetched on first use
//! - detail records, keyed by reference, fetched on first use
//!
//! Entries are never evicted or refreshed. Pokémon data doesn't change while
//! an app is running, so a cached entry is always current.
//!
//! Pure view derivation works on a [`CacheSnapshot`], taken with
//! [`PokedexCache::snapshot`], so filtering and sorting never touch a lock.

/*
 # Notes on Locking design:

 - No code ever tries to hold more than one mutex lock, so there is no risk of deadlock.
   (snapshot() takes the three locks one after another, never nested.)

 - Callers check "cache.detail(reference)", then, if None, fetch and insert.
   The lock is not held across the fetch, so two tasks may fetch the same reference.
   The only cost is an extra request: both insert identical data, and each insert
   replaces a whole entry, never part of one.

 - We use non-poisoning parking_lot mutexes. Data preparation (building the Vec or
   the Arc) happens before acquiring the lock, and each locked section performs
   exactly one mutation.

 - No lock is held across an await point.
*/

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::{
    pokemon::{PokemonDetail, PokemonRef},
    warm::WarmReport,
};

/// Normalized cache key for a type name.
pub(crate) fn type_key(type_name: &str) -> String {
    type_name.trim().to_lowercase()
}

/// Pokedex cache for the index, type lists, and details
#[derive(Default)]
pub struct PokedexCache {
    index: Mutex<Arc<Vec<PokemonRef>>>,
    type_lists: Mutex<HashMap<String, Arc<Vec<PokemonRef>>>>,
    details: Mutex<HashMap<String, Arc<PokemonDetail>>>,
    warm_report: Mutex<Option<WarmReport>>,
}

impl PokedexCache {
    /// Returns the full index. Empty until the index has been loaded.
    pub fn index(&self) -> Arc<Vec<PokemonRef>> {
        self.index.lock().clone()
    }

    /// Returns true if the index has been loaded.
    pub fn has_index(&self) -> bool {
        !self.index.lock().is_empty()
    }

    /// Replaces the index.
    pub(crate) fn set_index(&self, index: Vec<PokemonRef>) -> Arc<Vec<PokemonRef>> {
        let index = Arc::new(index);
        *self.index.lock() = Arc::clone(&index);
        index
    }

    /// Returns the cached list for a type.
    pub fn type_list(&self, type_name: &str) -> Option<Arc<Vec<PokemonRef>>> {
        self.type_lists.lock().get(&type_key(type_name)).cloned()
    }

    pub(crate) fn set_type_list(
        &self,
        type_name: &str,
        list: Vec<PokemonRef>,
    ) -> Arc<Vec<PokemonRef>> {
        let list = Arc::new(list);
        self.type_lists
            .lock()
            .insert(type_key(type_name), Arc::clone(&list));
        list
    }

    /// Returns a cached detail by reference.
    pub fn detail(&self, reference: &str) -> Option<Arc<PokemonDetail>> {
        self.details.lock().get(reference).cloned()
    }

    /// Returns true if the detail for reference is cached.
    pub fn has_detail(&self, reference: &str) -> bool {
        self.details.lock().contains_key(reference)
    }

    /// Inserts a detail. A concurrent fetch of the same reference may already have
    /// inserted it; the later insert replaces it with identical data.
    pub(crate) fn set_detail(&self, reference: &str, detail: PokemonDetail) -> Arc<PokemonDetail> {
        let detail = Arc::new(detail);
        let previous = self
            .details
            .lock()
            .insert(reference.to_string(), Arc::clone(&detail));
        if let Some(previous) = previous
            && previous.id != detail.id
        {
            warn!(
                reference,
                previous = previous.id,
                current = detail.id,
                "detail replaced with different id"
            );
        }
        detail
    }

    /// References in `list` whose details are not cached, in list order.
    pub fn missing_details<'a>(&self, list: &'a [PokemonRef]) -> Vec<&'a PokemonRef> {
        let details = self.details.lock();
        list.iter()
            .filter(|pokemon| !details.contains_key(&pokemon.url))
            .collect()
    }

    /// Result of the most recent warming pass, if one has finished.
    pub fn last_warm_report(&self) -> Option<WarmReport> {
        self.warm_report.lock().clone()
    }

    pub(crate) fn set_warm_report(&self, report: WarmReport) {
        *self.warm_report.lock() = Some(report);
    }

    /// Takes a consistent copy for view derivation.
    /// Entries are shared (`Arc`), so this copies pointers, not records.
    pub fn snapshot(&self) -> CacheSnapshot {
        let index = self.index();
        let type_lists = self.type_lists.lock().clone();
        let details = self.details.lock().clone();
        CacheSnapshot {
            index,
            type_lists,
            details,
        }
    }
}

impl PokedexCache {
    /// Returns the number of entries in the index.
    pub fn num_index(&self) -> usize {
        self.index.lock().len()
    }

    /// Returns the number of cached type lists.
    pub fn num_type_lists(&self) -> usize {
        self.type_lists.lock().len()
    }

    /// Returns the number of cached details.
    pub fn num_details(&self) -> usize {
        self.details.lock().len()
    }
}

impl std::fmt::Debug for PokedexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<String> = self.type_lists.lock().keys().cloned().collect();
        types.sort();
        f.debug_struct("PokedexCache")
            .field("index", &format!("count: {}", self.num_index()))
            .field("type_lists", &format!("keys: {}", types.join(",")))
            .field("details", &format!("count: {}", self.num_details()))
            .finish()
    }
}

/// Point-in-time copy of the cache, used by the view derivation functions.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    pub index: Arc<Vec<PokemonRef>>,
    pub type_lists: HashMap<String, Arc<Vec<PokemonRef>>>,
    pub details: HashMap<String, Arc<PokemonDetail>>,
}

impl CacheSnapshot {
    /// Builds a snapshot from plain values. Useful for tests and for callers
    /// that keep their own data.
    pub fn from_parts(
        index: Vec<PokemonRef>,
        type_lists: impl IntoIterator<Item = (String, Vec<PokemonRef>)>,
        details: impl IntoIterator<Item = (String, PokemonDetail)>,
    ) -> Self {
        Self {
            index: Arc::new(index),
            type_lists: type_lists
                .into_iter()
                .map(|(name, list)| (type_key(&name), Arc::new(list)))
                .collect(),
            details: details
                .into_iter()
                .map(|(reference, detail)| (reference, Arc::new(detail)))
                .collect(),
        }
    }

    /// The list a view works on: the type list when a type is selected,
    /// otherwise the full index. None if the selected type isn't cached yet.
    pub fn working_list(&self, selected_type: Option<&str>) -> Option<&[PokemonRef]> {
        match selected_type {
            Some(type_name) => self
                .type_lists
                .get(&type_key(type_name))
                .map(|list| list.as_slice()),
            None => Some(self.index.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ref(id: u32, name: &str) -> PokemonRef {
        PokemonRef::new(name, format!("https://pokeapi.co/api/v2/pokemon/{id}/"))
    }

    fn sample_detail(id: u32, name: &str) -> PokemonDetail {
        PokemonDetail {
            id,
            name: name.to_string(),
            sprite: None,
            types: vec!["normal".into()],
            stats: Vec::new(),
            height: 1,
            weight: 1,
            abilities: Vec::new(),
            held_items: Vec::new(),
            forms: Vec::new(),
        }
    }

    #[test]
    fn test_cache_counts() {
        let cache = PokedexCache::default();
        assert!(!cache.has_index());

        cache.set_index(vec![sample_ref(1, "bulbasaur"), sample_ref(4, "charmander")]);
        cache.set_type_list("Fire ", vec![sample_ref(4, "charmander")]);
        cache.set_detail(
            "https://pokeapi.co/api/v2/pokemon/4/",
            sample_detail(4, "charmander"),
        );

        assert!(cache.has_index());
        assert_eq!(cache.num_index(), 2);
        assert_eq!(cache.num_type_lists(), 1);
        assert_eq!(cache.num_details(), 1);
        assert!(cache.type_list("fire").is_some(), "type keys are normalized");
    }

    #[test]
    fn test_missing_details_keeps_order() {
        let cache = PokedexCache::default();
        let list = vec![sample_ref(1, "a"), sample_ref(2, "b"), sample_ref(3, "c")];
        cache.set_detail(&list[1].url, sample_detail(2, "b"));

        let missing: Vec<u32> = cache
            .missing_details(&list)
            .into_iter()
            .map(PokemonRef::id_or_zero)
            .collect();
        assert_eq!(missing, vec![1, 3]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let cache = PokedexCache::default();
        cache.set_index(vec![sample_ref(1, "bulbasaur")]);
        let snapshot = cache.snapshot();

        cache.set_detail(&sample_ref(1, "bulbasaur").url, sample_detail(1, "bulbasaur"));
        assert!(snapshot.details.is_empty());
        assert_eq!(cache.snapshot().details.len(), 1);
    }

    #[test]
    fn test_working_list() {
        let snapshot = CacheSnapshot::from_parts(
            vec![sample_ref(1, "bulbasaur"), sample_ref(4, "charmander")],
            [("fire".to_string(), vec![sample_ref(4, "charmander")])],
            [],
        );
        assert_eq!(snapshot.working_list(None).map(<[_]>::len), Some(2));
        assert_eq!(snapshot.working_list(Some("FIRE")).map(<[_]>::len), Some(1));
        assert!(snapshot.working_list(Some("water")).is_none());
    }
}
