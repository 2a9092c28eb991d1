use tracing::{debug, info, warn};

use crate::codec::{decode_list, encode_list};
use crate::{
    CoreError, IdGenerator, ImageRef, KeyValueStore, PlanetId, PlanetRecord, Title, PLANETS_KEY,
};

/// What to do when writing the list back to storage fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PersistPolicy {
    /// Log and count the failure; the mutation still reports success.
    #[default]
    BestEffort,
    /// Return the failure to the caller as `CoreError::StorageWrite`.
    Strict,
}

/// Lifecycle of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Loaded,
}

/// How `initialize` arrived at the current list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored yet.
    Empty,
    Loaded { count: usize, skipped: usize },
    /// Stored data was unreadable; started from an empty list.
    Recovered { reason: String },
}

/// Owns the in-memory planet list and mirrors every mutation to storage.
///
/// Mutations take `&mut self`, so a single owner serializes them. The whole
/// list is rewritten under [`PLANETS_KEY`] after each add or delete.
pub struct PlanetListStore<S: KeyValueStore, G: IdGenerator> {
    storage: S,
    ids: G,
    policy: PersistPolicy,
    state: StoreState,
    planets: Vec<PlanetRecord>,
    write_failures: u64,
    /// Memory holds changes that storage does not.
    dirty: bool,
}

impl<S: KeyValueStore, G: IdGenerator> PlanetListStore<S, G> {
    pub fn new(storage: S, ids: G) -> Self {
        Self {
            storage,
            ids,
            policy: PersistPolicy::default(),
            state: StoreState::Uninitialized,
            planets: Vec::new(),
            write_failures: 0,
            dirty: false,
        }
    }

    pub fn with_policy(mut self, policy: PersistPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load the persisted list, falling back to an empty one on any failure.
    pub fn initialize(&mut self) -> LoadOutcome {
        let outcome = match self.storage.get(PLANETS_KEY) {
            Ok(None) => {
                self.planets = Vec::new();
                LoadOutcome::Empty
            }
            Ok(Some(raw)) => match decode_list(&raw) {
                Ok(decoded) => {
                    let count = decoded.records.len();
                    self.planets = decoded.records;
                    LoadOutcome::Loaded {
                        count,
                        skipped: decoded.skipped,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "discarding unreadable planet list");
                    self.planets = Vec::new();
                    LoadOutcome::Recovered { reason: e.to_string() }
                }
            },
            Err(e) => {
                warn!(error = %e, "failed to read planet list, starting empty");
                self.planets = Vec::new();
                LoadOutcome::Recovered { reason: e.to_string() }
            }
        };
        self.state = StoreState::Loaded;
        debug!(?outcome, "planet list initialized");
        outcome
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn planets(&self) -> &[PlanetRecord] {
        &self.planets
    }

    pub fn get(&self, id: &PlanetId) -> Option<&PlanetRecord> {
        self.planets.iter().find(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.planets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planets.is_empty()
    }

    /// Number of storage writes that failed under `BestEffort`.
    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    /// Whether the last write of the list failed, under either policy.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    fn ensure_loaded(&mut self) {
        if self.state == StoreState::Uninitialized {
            self.initialize();
        }
    }

    fn fresh_id(&self) -> Result<PlanetId, CoreError> {
        // Loaded ids may come from a run whose clock was ahead of ours.
        for _ in 0..100 {
            let id = self.ids.next_id();
            if self.get(&id).is_none() {
                return Ok(id);
            }
        }
        Err(CoreError::IdExhausted)
    }

    /// Append a new planet and persist the full list.
    ///
    /// A blank title is rejected before anything is mutated or written.
    pub fn add_planet(
        &mut self,
        title: &str,
        image: Option<ImageRef>,
    ) -> Result<PlanetRecord, CoreError> {
        let title = Title::new(title)?;
        self.ensure_loaded();
        let id = self.fresh_id()?;
        let record = PlanetRecord::new(id, title, image);
        self.planets.push(record.clone());
        info!(id = %record.id, title = %record.title, "planet added");
        self.persist()?;
        Ok(record)
    }

    /// Remove the planet with `id`, if present, and persist the full list.
    ///
    /// Returns whether a record was removed. Unknown ids are not an error.
    pub fn delete_planet(&mut self, id: &PlanetId) -> Result<bool, CoreError> {
        self.ensure_loaded();
        let before = self.planets.len();
        self.planets.retain(|p| &p.id != id);
        let removed = self.planets.len() != before;
        if removed {
            info!(%id, "planet deleted");
        } else {
            debug!(%id, "delete of unknown planet id");
        }
        self.persist()?;
        Ok(removed)
    }

    /// Write the current list regardless of policy and report the outcome.
    pub fn flush(&mut self) -> Result<(), CoreError> {
        self.write_list()
    }

    fn write_list(&mut self) -> Result<(), CoreError> {
        let written = encode_list(&self.planets).and_then(|raw| self.storage.set(PLANETS_KEY, &raw));
        match written {
            Ok(()) => {
                self.dirty = false;
                debug!(count = self.planets.len(), "planet list persisted");
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                Err(e)
            }
        }
    }

    fn persist(&mut self) -> Result<(), CoreError> {
        match self.write_list() {
            Ok(()) => Ok(()),
            Err(e) => match self.policy {
                PersistPolicy::BestEffort => {
                    self.write_failures += 1;
                    warn!(error = %e, "failed to persist planet list");
                    Ok(())
                }
                PersistPolicy::Strict => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_kv::InMemoryKv;
    use crate::codec::decode_list;
    use crate::ids::TimestampIdGenerator;
    use crate::Clock;
    use std::collections::HashSet;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    struct TestClock;
    impl Clock for TestClock {
        fn now(&self) -> SystemTime {
            UNIX_EPOCH + Duration::from_millis(1_000)
        }
    }

    fn store_with(kv: InMemoryKv) -> PlanetListStore<InMemoryKv, TimestampIdGenerator<TestClock>> {
        let mut store = PlanetListStore::new(kv, TimestampIdGenerator::new(TestClock));
        store.initialize();
        store
    }

    fn stored_titles(kv: &InMemoryKv) -> Vec<String> {
        let raw = kv.get(PLANETS_KEY).unwrap().expect("list persisted");
        decode_list(&raw)
            .unwrap()
            .records
            .into_iter()
            .map(|r| r.title.as_str().to_string())
            .collect()
    }

    #[test]
    fn initialize_on_empty_storage() {
        let mut store = PlanetListStore::new(InMemoryKv::new(), TimestampIdGenerator::new(TestClock));
        assert_eq!(store.state(), StoreState::Uninitialized);
        assert_eq!(store.initialize(), LoadOutcome::Empty);
        assert_eq!(store.state(), StoreState::Loaded);
        assert!(store.is_empty());
    }

    #[test]
    fn corrupted_storage_loads_empty() {
        let kv = InMemoryKv::new();
        kv.set(PLANETS_KEY, "{{{ definitely not json").unwrap();
        let mut store = PlanetListStore::new(kv, TimestampIdGenerator::new(TestClock));
        let outcome = store.initialize();
        assert!(matches!(outcome, LoadOutcome::Recovered { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn unreadable_storage_loads_empty() {
        let kv = InMemoryKv::new();
        kv.fail_reads(true);
        let mut store = PlanetListStore::new(kv, TimestampIdGenerator::new(TestClock));
        assert!(matches!(store.initialize(), LoadOutcome::Recovered { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn persisted_list_loads_back_equal() {
        let kv = InMemoryKv::new();
        let mut store = store_with(kv.clone());
        store.add_planet("Mars", None).unwrap();
        store.add_planet("Venus", Some(ImageRef::new("img://x").unwrap())).unwrap();
        store.add_planet("Pluto", None).unwrap();

        let mut reloaded = PlanetListStore::new(kv, TimestampIdGenerator::new(TestClock));
        assert_eq!(reloaded.initialize(), LoadOutcome::Loaded { count: 3, skipped: 0 });
        assert_eq!(reloaded.planets(), store.planets());
    }

    #[test]
    fn blank_titles_never_mutate_or_write() {
        let kv = InMemoryKv::new();
        let mut store = store_with(kv.clone());
        for title in ["", "   ", "\t\n"] {
            let err = store.add_planet(title, Some(ImageRef::new("img://y").unwrap())).unwrap_err();
            assert!(matches!(err, CoreError::EmptyTitle));
        }
        assert!(store.is_empty());
        assert_eq!(kv.writes(), 0);
        assert!(kv.get(PLANETS_KEY).unwrap().is_none());
    }

    #[test]
    fn add_trims_title_and_appends() {
        let mut store = store_with(InMemoryKv::new());
        store.add_planet("Mars", None).unwrap();
        let rec = store.add_planet("  Jupiter  ", None).unwrap();
        assert_eq!(rec.title.as_str(), "Jupiter");
        assert_eq!(store.planets().last(), Some(&rec));
    }

    #[test]
    fn ids_are_pairwise_distinct() {
        let mut store = store_with(InMemoryKv::new());
        for i in 0..25 {
            store.add_planet(&format!("Planet {i}"), None).unwrap();
        }
        let ids: HashSet<_> = store.planets().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), 25);
    }

    #[test]
    fn generated_id_skips_ids_already_loaded() {
        let kv = InMemoryKv::new();
        // TestClock yields 1000, 1001, ... so these collide with the first draws.
        kv.set(
            PLANETS_KEY,
            r#"[{"id":"1000","title":"Old"},{"id":"1001","title":"Older"}]"#,
        )
        .unwrap();
        let mut store = store_with(kv);
        let rec = store.add_planet("New", None).unwrap();
        assert_eq!(rec.id.as_str(), "1002");
    }

    #[test]
    fn delete_twice_equals_delete_once() {
        let kv = InMemoryKv::new();
        let mut store = store_with(kv.clone());
        let mars = store.add_planet("Mars", None).unwrap();
        store.add_planet("Venus", None).unwrap();

        assert!(store.delete_planet(&mars.id).unwrap());
        let once = store.planets().to_vec();
        assert!(!store.delete_planet(&mars.id).unwrap());
        assert_eq!(store.planets(), once.as_slice());
        assert_eq!(stored_titles(&kv), vec!["Venus"]);
    }

    #[test]
    fn delete_preserves_order_of_the_rest() {
        let mut store = store_with(InMemoryKv::new());
        let recs: Vec<_> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|t| store.add_planet(t, None).unwrap())
            .collect();
        store.delete_planet(&recs[2].id).unwrap();
        let expected: Vec<_> = recs
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 2)
            .map(|(_, r)| r.clone())
            .collect();
        assert_eq!(store.planets(), expected.as_slice());
    }

    #[test]
    fn delete_unknown_id_still_rewrites_list() {
        let kv = InMemoryKv::new();
        let mut store = store_with(kv.clone());
        store.add_planet("Mars", None).unwrap();
        let writes = kv.writes();
        let removed = store.delete_planet(&PlanetId::new("nope").unwrap()).unwrap();
        assert!(!removed);
        assert_eq!(store.len(), 1);
        assert_eq!(kv.writes(), writes + 1);
    }

    #[test]
    fn mars_venus_scenario() {
        let kv = InMemoryKv::new();
        let mut store = store_with(kv.clone());

        let mars = store.add_planet("Mars", None).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.planets()[0].title.as_str(), "Mars");
        assert!(store.planets()[0].image.is_none());
        assert_eq!(stored_titles(&kv), vec!["Mars"]);

        store.add_planet("Venus", Some(ImageRef::new("img://x").unwrap())).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.planets()[0].title.as_str(), "Mars");

        store.delete_planet(&mars.id).unwrap();
        assert_eq!(store.len(), 1);
        let venus = &store.planets()[0];
        assert_eq!(venus.title.as_str(), "Venus");
        assert_eq!(venus.image.as_ref().map(|i| i.as_str()), Some("img://x"));

        let raw = kv.get(PLANETS_KEY).unwrap().unwrap();
        assert_eq!(decode_list(&raw).unwrap().records, store.planets());
    }

    #[test]
    fn mutation_before_initialize_loads_first() {
        let kv = InMemoryKv::new();
        kv.set(PLANETS_KEY, r#"[{"id":"1","title":"Existing"}]"#).unwrap();
        let mut store = PlanetListStore::new(kv.clone(), TimestampIdGenerator::new(TestClock));
        store.add_planet("Fresh", None).unwrap();
        assert_eq!(store.state(), StoreState::Loaded);
        assert_eq!(stored_titles(&kv), vec!["Existing", "Fresh"]);
    }

    #[test]
    fn best_effort_write_failure_keeps_memory_state() {
        let kv = InMemoryKv::new();
        let mut store = store_with(kv.clone());
        kv.fail_writes(true);
        let rec = store.add_planet("Mars", None).unwrap();
        assert_eq!(store.planets(), &[rec]);
        assert_eq!(store.write_failures(), 1);
        assert!(store.has_unsaved_changes());
        assert!(kv.get(PLANETS_KEY).unwrap().is_none());

        kv.fail_writes(false);
        store.flush().unwrap();
        assert!(!store.has_unsaved_changes());
        assert_eq!(stored_titles(&kv), vec!["Mars"]);
    }

    #[test]
    fn strict_policy_surfaces_write_failure() {
        let kv = InMemoryKv::new();
        let mut store = PlanetListStore::new(kv.clone(), TimestampIdGenerator::new(TestClock))
            .with_policy(PersistPolicy::Strict);
        store.initialize();
        kv.fail_writes(true);
        let err = store.add_planet("Mars", None).unwrap_err();
        assert!(matches!(err, CoreError::StorageWrite(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.write_failures(), 0);
        assert!(store.has_unsaved_changes());

        kv.fail_writes(false);
        store.delete_planet(&PlanetId::new("none").unwrap()).unwrap();
        assert!(!store.has_unsaved_changes());
        assert_eq!(stored_titles(&kv), vec!["Mars"]);
    }
}
