//! Intrusive doubly linked list.
//!
//! Elements carry their own link fields (an `Entry`) and live in storage owned
//! by the caller, usually a `Pool`. The list only tracks the head and tail
//! handles, so elements can be added to or removed from a list in O(1) time
//! without allocating. Every operation takes the node storage as an argument.
//!
//! An element must be a member of at most one list at a time. To iterate over
//! a list:
//!
//! ```
//! # use arpstack::core::storage::{Packet, PacketList, Pool};
//! let mut nodes = Pool::new();
//! let mut list = PacketList::new();
//! let packet = nodes.insert(Packet::from(vec![1, 2, 3]));
//! list.push_back(&mut nodes, packet);
//!
//! for handle in list.iter(&nodes) {
//!     assert_eq!(nodes[handle].view(), &[1, 2, 3]);
//! }
//! ```

use std::marker::PhantomData;
use std::ops::{
    Index,
    IndexMut,
};

use crate::core::storage::Handle;

/// Link fields of a list element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    prev: Option<Handle>,
    next: Option<Handle>,
}

impl Entry {
    /// Returns the element that precedes this one, or None at the head.
    pub fn prev(&self) -> Option<Handle> {
        self.prev
    }

    /// Returns the element that follows this one, or None at the tail.
    pub fn next(&self) -> Option<Handle> {
        self.next
    }
}

/// An element which embeds an Entry.
pub trait Linked {
    fn entry(&self) -> &Entry;

    fn entry_mut(&mut self) -> &mut Entry;
}

/// Doubly linked list over elements stored elsewhere.
#[derive(Debug)]
pub struct List<T> {
    head: Option<Handle>,
    tail: Option<Handle>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Default for List<T> {
    fn default() -> List<T> {
        List::new()
    }
}

impl<T> List<T> {
    /// Creates an empty list.
    pub fn new() -> List<T> {
        List {
            head: None,
            tail: None,
            marker: PhantomData,
        }
    }

    /// Resets the list to the empty state. Elements are left untouched.
    pub fn reset(&mut self) {
        self.head = None;
        self.tail = None;
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the first element or None.
    pub fn front(&self) -> Option<Handle> {
        self.head
    }

    /// Returns the last element or None.
    pub fn back(&self) -> Option<Handle> {
        self.tail
    }
}

impl<T: Linked> List<T> {
    /// Inserts e at the front of the list.
    pub fn push_front<S>(&mut self, nodes: &mut S, e: Handle)
    where
        S: IndexMut<Handle, Output = T>,
    {
        {
            let entry = nodes[e].entry_mut();
            entry.next = self.head;
            entry.prev = None;
        }

        match self.head {
            Some(head) => nodes[head].entry_mut().prev = Some(e),
            None => self.tail = Some(e),
        }

        self.head = Some(e);
    }

    /// Inserts e at the back of the list.
    pub fn push_back<S>(&mut self, nodes: &mut S, e: Handle)
    where
        S: IndexMut<Handle, Output = T>,
    {
        {
            let entry = nodes[e].entry_mut();
            entry.next = None;
            entry.prev = self.tail;
        }

        match self.tail {
            Some(tail) => nodes[tail].entry_mut().next = Some(e),
            None => self.head = Some(e),
        }

        self.tail = Some(e);
    }

    /// Splices all of other onto the back of the list, leaving other empty.
    pub fn push_back_list<S>(&mut self, nodes: &mut S, other: &mut List<T>)
    where
        S: IndexMut<Handle, Output = T>,
    {
        match (self.tail, other.head) {
            (None, _) => {
                self.head = other.head;
                self.tail = other.tail;
            }
            (Some(tail), Some(head)) => {
                nodes[tail].entry_mut().next = Some(head);
                nodes[head].entry_mut().prev = Some(tail);
                self.tail = other.tail;
            }
            (Some(_), None) => {}
        }

        other.reset();
    }

    /// Inserts e after b, which must be in the list.
    pub fn insert_after<S>(&mut self, nodes: &mut S, b: Handle, e: Handle)
    where
        S: IndexMut<Handle, Output = T>,
    {
        let a = nodes[b].entry().next;

        {
            let entry = nodes[e].entry_mut();
            entry.next = a;
            entry.prev = Some(b);
        }
        nodes[b].entry_mut().next = Some(e);

        match a {
            Some(a) => nodes[a].entry_mut().prev = Some(e),
            None => self.tail = Some(e),
        }
    }

    /// Inserts e before a, which must be in the list.
    pub fn insert_before<S>(&mut self, nodes: &mut S, a: Handle, e: Handle)
    where
        S: IndexMut<Handle, Output = T>,
    {
        let b = nodes[a].entry().prev;

        {
            let entry = nodes[e].entry_mut();
            entry.next = Some(a);
            entry.prev = b;
        }
        nodes[a].entry_mut().prev = Some(e);

        match b {
            Some(b) => nodes[b].entry_mut().next = Some(e),
            None => self.head = Some(e),
        }
    }

    /// Removes e, which must be in the list, and clears its link fields.
    pub fn remove<S>(&mut self, nodes: &mut S, e: Handle)
    where
        S: IndexMut<Handle, Output = T>,
    {
        let Entry { prev, next } = *nodes[e].entry();

        match prev {
            Some(prev) => nodes[prev].entry_mut().next = next,
            None => self.head = next,
        }

        match next {
            Some(next) => nodes[next].entry_mut().prev = prev,
            None => self.tail = prev,
        }

        *nodes[e].entry_mut() = Entry::default();
    }

    /// Returns an iterator over the handles in the list, front to back.
    pub fn iter<'a, S>(&self, nodes: &'a S) -> Iter<'a, T, S>
    where
        S: Index<Handle, Output = T>,
    {
        Iter {
            nodes,
            cursor: self.head,
            marker: PhantomData,
        }
    }

    /// Returns the number of elements in the list. This walks the list.
    pub fn len<S>(&self, nodes: &S) -> usize
    where
        S: Index<Handle, Output = T>,
    {
        self.iter(nodes).count()
    }
}

pub struct Iter<'a, T, S: 'a> {
    nodes: &'a S,
    cursor: Option<Handle>,
    marker: PhantomData<fn() -> T>,
}

impl<'a, T, S> Iterator for Iter<'a, T, S>
where
    T: Linked + 'a,
    S: Index<Handle, Output = T>,
{
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        let handle = self.cursor?;
        self.cursor = self.nodes[handle].entry().next;
        Some(handle)
    }
}
