//! Host object instances

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::ClassDescriptor;
use crate::value::Value;

/// Shared handle to a host object
pub type ObjectRef = Arc<Object>;

/// Instance of a host class
///
/// Slots follow the class's layout (inherited fields first). Slot writes are
/// not type checked here; reflective writes go through `FieldRef::set`.
pub struct Object {
    class: Arc<ClassDescriptor>,
    slots: RwLock<Vec<Value>>,
}

impl Object {
    pub(crate) fn new(class: Arc<ClassDescriptor>, slots: Vec<Value>) -> ObjectRef {
        Arc::new(Self {
            class,
            slots: RwLock::new(slots),
        })
    }

    /// Runtime class
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// Read a slot by index
    pub fn slot(&self, index: usize) -> Option<Value> {
        self.slots.read().get(index).cloned()
    }

    /// Write a slot by index; false if out of range
    pub fn set_slot(&self, index: usize, value: Value) -> bool {
        match self.slots.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Read an instance field by name (most derived declaration wins)
    pub fn get(&self, field: &str) -> Option<Value> {
        self.class.instance_slot(field).and_then(|slot| self.slot(slot))
    }

    /// Write an instance field by name; false if there is no such field
    pub fn set(&self, field: &str, value: Value) -> bool {
        match self.class.instance_slot(field) {
            Some(slot) => self.set_slot(slot, value),
            None => false,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class.name())
            .field("slots", &*self.slots.read())
            .finish()
    }
}
