//! Generational storage for native objects.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use enginebridge_core::{Callable, ConnectFlags, InstanceBinding, ObjectId, StringName, Variant};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Per-instance native state created by the class's data factory.
pub(crate) type ObjectData = Arc<Mutex<Box<dyn Any + Send>>>;

/// A signal connection owned by the emitting object.
#[derive(Debug, Clone)]
pub(crate) struct Connection {
    pub signal: StringName,
    pub callable: Callable,
    pub flags: ConnectFlags,
}

/// Scene-tree links. Only used by `Node` and its descendants.
#[derive(Debug, Default)]
pub(crate) struct NodeLinks {
    pub name: StringName,
    pub parent: Option<ObjectId>,
    pub children: Vec<ObjectId>,
}

/// Everything the class database knows about one live object.
pub(crate) struct ObjectRecord {
    pub class: StringName,
    pub refcounted: bool,
    /// Native state of each class in the chain that declares any, leaf first.
    pub data: Vec<ObjectData>,
    pub binding: Option<Arc<dyn InstanceBinding>>,
    /// Storage for synthesised property accessors and dynamic properties.
    pub properties: FxHashMap<StringName, Variant>,
    pub connections: Vec<Connection>,
    pub node: NodeLinks,
}

impl ObjectRecord {
    pub fn new(class: StringName, refcounted: bool, data: Vec<ObjectData>) -> Self {
        Self {
            class,
            refcounted,
            data,
            binding: None,
            properties: FxHashMap::default(),
            connections: Vec::new(),
            node: NodeLinks::default(),
        }
    }
}

impl fmt::Debug for ObjectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRecord")
            .field("class", &self.class)
            .field("refcounted", &self.refcounted)
            .field("has_binding", &self.binding.is_some())
            .field("connections", &self.connections.len())
            .finish_non_exhaustive()
    }
}

/// Heap of object records with generational ids.
///
/// A freed slot is reused with an incremented generation, so ids of destroyed
/// objects never resolve to a newer object.
pub(crate) struct ObjectHeap {
    slots: Vec<HeapSlot>,
    free_list: Vec<u32>,
}

struct HeapSlot {
    generation: u32,
    value: Option<ObjectRecord>,
    ref_count: u32,
}

fn encode(index: u32, generation: u32) -> ObjectId {
    // The generation is stored off by one so the id is never zero.
    let raw = ((generation as u64 + 1) << 32) | index as u64;
    ObjectId::from_raw(raw).unwrap_or_else(|| unreachable!("encoded object ids are never zero"))
}

fn decode(id: ObjectId) -> (usize, u32) {
    let raw = id.raw();
    let index = (raw & 0xffff_ffff) as usize;
    let generation = ((raw >> 32) as u32).wrapping_sub(1);
    (index, generation)
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Store a new object. Reference-counted objects start at zero references.
    pub fn allocate(&mut self, record: ObjectRecord) -> ObjectId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(record);
            slot.ref_count = 0;
            encode(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(HeapSlot {
                generation: 0,
                value: Some(record),
                ref_count: 0,
            });
            encode(index, 0)
        }
    }

    fn slot(&self, id: ObjectId) -> Option<&HeapSlot> {
        let (index, generation) = decode(id);
        self.slots
            .get(index)
            .filter(|slot| slot.generation == generation && slot.value.is_some())
    }

    fn slot_mut(&mut self, id: ObjectId) -> Option<&mut HeapSlot> {
        let (index, generation) = decode(id);
        self.slots
            .get_mut(index)
            .filter(|slot| slot.generation == generation && slot.value.is_some())
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectRecord> {
        self.slot(id)?.value.as_ref()
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectRecord> {
        self.slot_mut(id)?.value.as_mut()
    }

    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.slot(id).is_some()
    }

    /// Increment the reference count. Returns the new count.
    pub fn add_ref(&mut self, id: ObjectId) -> Option<u32> {
        let slot = self.slot_mut(id)?;
        slot.ref_count = slot.ref_count.saturating_add(1);
        Some(slot.ref_count)
    }

    /// Decrement the reference count without freeing. Returns the new count.
    pub fn release(&mut self, id: ObjectId) -> Option<u32> {
        let slot = self.slot_mut(id)?;
        slot.ref_count = slot.ref_count.saturating_sub(1);
        Some(slot.ref_count)
    }

    pub fn ref_count(&self, id: ObjectId) -> Option<u32> {
        self.slot(id).map(|slot| slot.ref_count)
    }

    /// Remove the object, returning its record.
    pub fn free(&mut self, id: ObjectId) -> Option<ObjectRecord> {
        let (index, _) = decode(id);
        let slot = self.slot_mut(id)?;
        let record = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        slot.ref_count = 0;
        self.free_list.push(index as u32);
        record
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| encode(index as u32, slot.generation))
            .collect()
    }
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("slot_count", &self.slots.len())
            .field("free_count", &self.free_list.len())
            .finish()
    }
}
