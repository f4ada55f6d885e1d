use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use uuid::Uuid;

use crate::actor::Actor;

new_key_type! {
    pub struct ActorKey;
}

// Internal data structure, protected by a lock.
#[derive(Default)]
pub struct ManagerInner {
    pub actors: SlotMap<ActorKey, Arc<Actor>>,
    pub lookup: FxHashMap<Uuid, ActorKey>,
}

/// Registry of finished actors shared with their runtime instances.
///
/// Actors are immutable once registered. The registry is an ordinary value:
/// there is no process wide instance.
#[derive(Default)]
pub struct ActorManager {
    inner: RwLock<ManagerInner>,
}

impl ActorManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// [Write] Registers a finished actor and returns its key.
    pub fn register(&self, actor: Actor) -> ActorKey {
        self.register_shared(Arc::new(actor))
    }

    /// [Write] Registers an already shared actor. An actor whose ID is
    /// already registered keeps its existing key.
    pub fn register_shared(&self, actor: Arc<Actor>) -> ActorKey {
        let mut guard = self.inner.write();
        if let Some(&key) = guard.lookup.get(&actor.id()) {
            return key;
        }
        let id = actor.id();
        let key = guard.actors.insert(actor);
        guard.lookup.insert(id, key);
        log::debug!("Registered actor {id}");
        key
    }

    /// [Write] Removes an actor. Instances holding the `Arc` keep it alive.
    pub fn unregister(&self, key: ActorKey) -> Option<Arc<Actor>> {
        let mut guard = self.inner.write();
        let actor = guard.actors.remove(key)?;
        guard.lookup.remove(&actor.id());
        Some(actor)
    }

    /// [Read]
    pub fn get(&self, key: ActorKey) -> Option<Arc<Actor>> {
        self.inner.read().actors.get(key).cloned()
    }

    pub fn get_by_id(&self, id: &Uuid) -> Option<Arc<Actor>> {
        let guard = self.inner.read();
        let key = guard.lookup.get(id)?;
        guard.actors.get(*key).cloned()
    }

    /// First registered actor with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<Actor>> {
        let guard = self.inner.read();
        guard.actors.values().find(|a| a.name() == name).cloned()
    }

    #[must_use]
    pub fn num_actors(&self) -> usize {
        self.inner.read().actors.len()
    }

    /// [Read - Advanced] Acquires a read-lock guard for batch access.
    pub fn read_lock(&self) -> RwLockReadGuard<'_, ManagerInner> {
        self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let manager = ActorManager::new();
        let key = manager.register(Actor::new("Hero"));
        let hero = manager.get(key).unwrap();

        assert_eq!(manager.register_shared(Arc::clone(&hero)), key);
        assert_eq!(manager.num_actors(), 1);
        assert!(manager.find_by_name("Hero").is_some());
        assert!(manager.get_by_id(&hero.id()).is_some());

        assert!(manager.unregister(key).is_some());
        assert!(manager.get(key).is_none());
        assert!(manager.get_by_id(&hero.id()).is_none());
    }
}
