//! World Store (C7): every world lives behind its own mutex so that two
//! requests touching different worlds never contend, while a single world
//! is only ever mutated by one request at a time. Grounded on the teacher's
//! `DashMap`-backed session registries under `infrastructure/state/`.

use std::sync::Arc;

use dashmap::DashMap;
use taleweave_domain::{WorldId, WorldState};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct WorldStore {
    worlds: DashMap<WorldId, Arc<Mutex<WorldState>>>,
}

impl WorldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, world: WorldState) -> Arc<Mutex<WorldState>> {
        let id = world.id;
        let handle = Arc::new(Mutex::new(world));
        self.worlds.insert(id, handle.clone());
        handle
    }

    pub fn get(&self, id: WorldId) -> Option<Arc<Mutex<WorldState>>> {
        self.worlds.get(&id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: WorldId) -> Option<Arc<Mutex<WorldState>>> {
        self.worlds.remove(&id).map(|(_, handle)| handle)
    }

    pub fn ids(&self) -> Vec<WorldId> {
        self.worlds.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use taleweave_domain::{CharacterSummary, EngineMode, NarrativeThread, Tccn};

    fn sample_world() -> WorldState {
        let tccn = Tccn::new(
            "test teleology",
            "test context",
            vec![CharacterSummary {
                name: "Ren".to_string(),
                description: "a wanderer".to_string(),
            }],
            vec![NarrativeThread::new("find the lost archive")],
        )
        .unwrap();
        WorldState::new("a seed", tccn, HashMap::new(), vec![], vec![], EngineMode::Autonomous)
    }

    #[tokio::test]
    async fn insert_then_get_returns_same_world() {
        let store = WorldStore::new();
        let world = sample_world();
        let id = world.id;
        store.insert(world);
        let handle = store.get(id).unwrap();
        assert_eq!(handle.lock().await.id, id);
    }

    #[test]
    fn remove_drops_the_entry() {
        let store = WorldStore::new();
        let world = sample_world();
        let id = world.id;
        store.insert(world);
        assert!(store.remove(id).is_some());
        assert!(store.get(id).is_none());
    }

    #[test]
    fn ids_lists_every_inserted_world() {
        let store = WorldStore::new();
        store.insert(sample_world());
        store.insert(sample_world());
        assert_eq!(store.len(), 2);
        assert_eq!(store.ids().len(), 2);
    }
}
