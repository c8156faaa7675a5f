// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entities and sparse-set component storage.

use std::any::{Any, TypeId};
use std::fmt;

use hashbrown::HashMap;

/// Identifier for an entity (generational).
///
/// A despawned entity's slot is reused with a bumped generation, so stale ids
/// never alias a newer entity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32, u32);

impl EntityId {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index, for logging.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Slot generation, for logging.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.0, self.1)
    }
}

/// Marker bound for component types.
pub trait Component: Any {}

impl<T: Any> Component for T {}

trait AnyStorage {
    fn remove_slot(&mut self, idx: usize);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense values plus a sparse slot-to-dense index.
struct Storage<T> {
    dense: Vec<T>,
    owners: Vec<EntityId>,
    sparse: Vec<Option<usize>>,
}

impl<T> Storage<T> {
    fn new() -> Self {
        Self {
            dense: Vec::new(),
            owners: Vec::new(),
            sparse: Vec::new(),
        }
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        let pos = (*self.sparse.get(id.idx())?)?;
        (self.owners[pos] == id).then_some(pos)
    }

    fn insert(&mut self, id: EntityId, value: T) -> Option<T> {
        if let Some(pos) = self.position(id) {
            return Some(std::mem::replace(&mut self.dense[pos], value));
        }
        if self.sparse.len() <= id.idx() {
            self.sparse.resize(id.idx() + 1, None);
        }
        self.sparse[id.idx()] = Some(self.dense.len());
        self.dense.push(value);
        self.owners.push(id);
        None
    }

    fn remove_slot_value(&mut self, idx: usize) -> Option<T> {
        let pos = self.sparse.get_mut(idx)?.take()?;
        let value = self.dense.swap_remove(pos);
        self.owners.swap_remove(pos);
        if let Some(moved) = self.owners.get(pos) {
            self.sparse[moved.idx()] = Some(pos);
        }
        Some(value)
    }

    fn remove(&mut self, id: EntityId) -> Option<T> {
        self.position(id)?;
        self.remove_slot_value(id.idx())
    }
}

impl<T: 'static> AnyStorage for Storage<T> {
    fn remove_slot(&mut self, idx: usize) {
        self.remove_slot_value(idx);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Slot {
    generation: u32,
    alive: bool,
    name: String,
}

/// Entities and their components.
///
/// Each component type lives in its own sparse set: add, remove, and lookup
/// by `(entity, type)` are O(1), and iterating one type touches only the
/// entities that have it.
pub struct World {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    storages: HashMap<TypeId, Box<dyn AnyStorage>>,
    alive: usize,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities_alive", &self.alive)
            .field("slots_total", &self.slots.len())
            .field("free_list", &self.free_list.len())
            .field("component_types", &self.storages.len())
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            storages: HashMap::new(),
            alive: 0,
        }
    }

    /// Create an entity with no components.
    ///
    /// The name is kept for diagnostics only.
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityId {
        let name = name.into();
        self.alive += 1;
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.saturating_add(1);
            slot.alive = true;
            slot.name = name;
            (idx, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 1,
                alive: true,
                name,
            });
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "EntityId uses 32-bit indices."
        )]
        EntityId::new(idx as u32, generation)
    }

    /// Destroy an entity and drop all of its components. Stale ids are ignored.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_slot(id.idx());
        }
        let slot = &mut self.slots[id.idx()];
        slot.alive = false;
        slot.name.clear();
        self.free_list.push(id.idx());
        self.alive -= 1;
        true
    }

    /// Whether `id` refers to a live entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots
            .get(id.idx())
            .is_some_and(|s| s.alive && s.generation == id.1)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.alive
    }

    /// The name given at spawn time.
    pub fn entity_name(&self, id: EntityId) -> Option<&str> {
        self.is_alive(id)
            .then(|| self.slots[id.idx()].name.as_str())
    }

    fn storage<T: Component>(&self) -> Option<&Storage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref())
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut Storage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut())
    }

    /// Attach a component, returning the one it replaces.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not alive.
    pub fn insert<T: Component>(&mut self, id: EntityId, component: T) -> Option<T> {
        assert!(self.is_alive(id), "insert on dead entity {id}");
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Storage::<T>::new()));
        storage
            .as_any_mut()
            .downcast_mut::<Storage<T>>()
            .and_then(|s| s.insert(id, component))
    }

    /// Detach a component.
    pub fn remove<T: Component>(&mut self, id: EntityId) -> Option<T> {
        self.storage_mut::<T>()?.remove(id)
    }

    /// Borrow a component.
    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        let storage = self.storage::<T>()?;
        storage.position(id).map(|pos| &storage.dense[pos])
    }

    /// Mutably borrow a component.
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        let storage = self.storage_mut::<T>()?;
        let pos = storage.position(id)?;
        Some(&mut storage.dense[pos])
    }

    /// Whether the entity has a component of type `T`.
    pub fn contains<T: Component>(&self, id: EntityId) -> bool {
        self.storage::<T>()
            .is_some_and(|s| s.position(id).is_some())
    }

    /// Snapshot of the entities that have a `T`, in storage order.
    ///
    /// The list is owned, so the caller may mutate the world while walking it.
    pub fn entities_with<T: Component>(&self) -> Vec<EntityId> {
        self.storage::<T>()
            .map(|s| s.owners.clone())
            .unwrap_or_default()
    }

    /// Iterate over every `T` with its owner.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.storage::<T>()
            .into_iter()
            .flat_map(|s| s.owners.iter().copied().zip(s.dense.iter()))
    }

    /// Number of entities that have a `T`.
    pub fn count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, |s| s.dense.len())
    }

    /// The first entity holding a `T`, for components that exist once per world.
    pub fn singleton_entity<T: Component>(&self) -> Option<EntityId> {
        self.storage::<T>()?.owners.first().copied()
    }

    /// The single `T` in the world.
    pub fn singleton<T: Component>(&self) -> Option<&T> {
        self.storage::<T>()?.dense.first()
    }

    /// The single `T` in the world, mutably.
    pub fn singleton_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.storage_mut::<T>()?.dense.first_mut()
    }
}
