use std::ops::{
    Index,
    IndexMut,
};

/// Stable handle to an item in a Pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(usize);

/// Arena of T's with stable integral handles.
///
/// Handles stay valid until the item is removed, after which the slot may be
/// reused by a later insert.
#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> Default for Pool<T> {
    fn default() -> Pool<T> {
        Pool::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Pool<T> {
        Pool {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Adds an item and returns a stable handle.
    pub fn insert(&mut self, item: T) -> Handle {
        match self.free.pop() {
            Some(i) => {
                self.slots[i] = Some(item);
                Handle(i)
            }
            None => {
                self.slots.push(Some(item));
                Handle(self.slots.len() - 1)
            }
        }
    }

    /// Removes and returns the item with the specified handle.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let item = self.slots.get_mut(handle.0).and_then(|slot| slot.take());
        if item.is_some() {
            self.free.push(handle.0);
        }
        item
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle.0).and_then(|slot| slot.as_mut())
    }

    /// Returns the number of items in the pool.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Causes a panic if the handle is not in use.
impl<T> Index<Handle> for Pool<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &T {
        match self.get(handle) {
            Some(item) => item,
            None => panic!("Handle is not in use."),
        }
    }
}

/// Causes a panic if the handle is not in use.
impl<T> IndexMut<Handle> for Pool<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        match self.get_mut(handle) {
            Some(item) => item,
            None => panic!("Handle is not in use."),
        }
    }
}
