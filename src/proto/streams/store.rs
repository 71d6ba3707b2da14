//! The stream arena and the purely structural half of the dependency
//! forest: insertion, removal, re-parenting, and the traversals that don't
//! need to know anything about scheduling.
//!
//! Streams are linked by handle (`Key`) rather than by pointer, per the
//! arena strategy called out for this kind of cyclic parent/sibling graph:
//! an index into a [`slab::Slab`] is `Copy`, never dangles, and sidesteps
//! the aliasing issues a doubly-linked structure would otherwise cause
//! under Rust's ownership rules.
//!
//! Every operation here preserves three invariants:
//! 1. A node's children form a doubly linked sibling list; the first child
//!    is reachable via the parent's `dep_next`, the rest via `sib_next`.
//! 2. Only the first sibling in a children list has `dep_prev` set (to the
//!    parent); every other sibling has `dep_prev = None`.
//! 3. `num_substreams(n) == 1 + sum(num_substreams(c) for c in children(n))`.

use std::any::Any;

use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use slab::Slab;
use smallvec::SmallVec;

use crate::proto::streams::stream::{Stream, StreamState};
use crate::stream_id::StreamId;

/// A handle into the stream arena. Stable until the stream it names is
/// removed (`free`/`dep_remove` et al never invalidate other streams'
/// keys).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(usize);

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

/// The arena backing a forest of dependency trees, plus a directory from
/// protocol-level [`StreamId`]s to arena handles.
pub struct StreamArena<I> {
    slab: Slab<Stream<I>>,
    ids: IndexMap<StreamId, Key, FnvBuildHasher>,
}

impl<I> std::fmt::Debug for StreamArena<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamArena")
            .field("len", &self.slab.len())
            .finish()
    }
}

impl<I> Default for StreamArena<I> {
    fn default() -> Self {
        StreamArena {
            slab: Slab::new(),
            ids: IndexMap::default(),
        }
    }
}

impl<I> StreamArena<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(
        &mut self,
        stream_id: StreamId,
        flags: u32,
        state: StreamState,
        remote_initial_window_size: i32,
        local_initial_window_size: i32,
        user_data: Option<Box<dyn Any>>,
    ) -> Key {
        let stream = Stream::new(
            stream_id,
            flags,
            state,
            remote_initial_window_size,
            local_initial_window_size,
            user_data,
        );
        let key = Key(self.slab.insert(stream));
        self.ids.insert(stream_id, key);
        key
    }

    /// Removes `key` from the arena, dropping the node's deferred item (if
    /// any) along with it. The attached `data` item and `user_data` are
    /// owned by the caller either way; this is just arena deallocation.
    pub fn free(&mut self, key: Key) -> Stream<I> {
        let stream = self.slab.remove(key.0);
        self.ids.swap_remove(&stream.stream_id());
        stream
    }

    pub fn resolve(&self, stream_id: StreamId) -> Option<Key> {
        self.ids.get(&stream_id).copied()
    }

    pub fn get(&self, key: Key) -> &Stream<I> {
        &self.slab[key.0]
    }

    pub fn get_mut(&mut self, key: Key) -> &mut Stream<I> {
        &mut self.slab[key.0]
    }

    /// The direct children of `key`, left to right. A convenience for
    /// callers and tests; the forest itself never needs more than the
    /// first child plus the sibling chain.
    pub fn children(&self, key: Key) -> SmallVec<[Key; 8]> {
        let mut out = SmallVec::new();
        let mut next = self.get(key).dep_next;
        while let Some(k) = next {
            out.push(k);
            next = self.get(k).sib_next;
        }
        out
    }

    pub(crate) fn first_sib(&self, mut key: Key) -> Key {
        while let Some(prev) = self.get(key).sib_prev {
            key = prev;
        }
        key
    }

    pub(crate) fn last_sib(&self, mut key: Key) -> Key {
        while let Some(next) = self.get(key).sib_next {
            key = next;
        }
        key
    }

    /// Walks to the root of the tree containing `key`: leftmost sibling,
    /// then up through `dep_prev`, repeating until both links are empty.
    pub fn get_dep_root(&self, mut key: Key) -> Key {
        loop {
            if let Some(prev) = self.get(key).sib_prev {
                key = prev;
                continue;
            }
            if let Some(prev) = self.get(key).dep_prev {
                key = prev;
                continue;
            }
            return key;
        }
    }

    /// True iff `target` is reachable from `start` via `sib_next`/`dep_next`.
    /// Used to keep a re-parent operation from introducing a cycle.
    pub fn subtree_find(&self, start: Option<Key>, target: Key) -> bool {
        let Some(key) = start else {
            return false;
        };
        if key == target {
            return true;
        }
        if self.subtree_find(self.get(key).sib_next, target) {
            return true;
        }
        self.subtree_find(self.get(key).dep_next, target)
    }

    /// Adds `delta` to `num_substreams` for `key`, then for each ancestor
    /// found by walking to the first sibling and then up through
    /// `dep_prev`. Returns the root of the tree.
    pub(crate) fn update_dep_length(&mut self, mut key: Key, delta: isize) -> Key {
        loop {
            let node = self.get_mut(key);
            node.num_substreams = (node.num_substreams as isize + delta) as usize;

            let first = self.first_sib(key);
            match self.get(first).dep_prev {
                Some(prev) => key = prev,
                None => return first,
            }
        }
    }

    /// Inserts `stream` as the sole, exclusive child of `parent`: `parent`'s
    /// previous children (if any) become `stream`'s children.
    pub fn dep_insert(&mut self, parent: Key, stream: Key) {
        debug_assert!(self.get(stream).data().is_none());

        if let Some(children) = self.get(parent).dep_next {
            let mut adopted = 0usize;
            let mut sib = Some(children);
            while let Some(k) = sib {
                adopted += self.get(k).num_substreams();
                sib = self.get(k).sib_next;
            }

            self.get_mut(stream).num_substreams += adopted;
            self.get_mut(stream).dep_next = Some(children);
            self.get_mut(children).dep_prev = Some(stream);
        }

        self.get_mut(parent).dep_next = Some(stream);
        {
            let s = self.get_mut(stream);
            s.dep_prev = Some(parent);
            s.sib_prev = None;
            s.sib_next = None;
        }

        self.update_dep_length(parent, 1);
    }

    /// Appends `stream` as a new last sibling of `parent`'s existing
    /// children (or as the sole child, if it has none).
    pub fn dep_add(&mut self, parent: Key, stream: Key) {
        debug_assert!(self.get(stream).data().is_none());

        self.update_dep_length(parent, 1);

        match self.get(parent).dep_next {
            None => {
                self.get_mut(parent).dep_next = Some(stream);
                self.get_mut(stream).dep_prev = Some(parent);
            }
            Some(first_child) => {
                let last = self.last_sib(first_child);
                self.get_mut(last).sib_next = Some(stream);
                self.get_mut(stream).sib_prev = Some(last);
            }
        }
    }

    /// Removes a single node, promoting its children to take its place
    /// among its former siblings (or to become roots of their own, if
    /// `stream` was itself a root). `stream` ends isolated afterward, with
    /// `num_substreams` reset to 1.
    pub fn dep_remove(&mut self, stream: Key) {
        let first = self.first_sib(stream);
        if let Some(grandparent) = self.get(first).dep_prev {
            self.update_dep_length(grandparent, -1);
        }

        let sib_prev = self.get(stream).sib_prev;
        let dep_prev = self.get(stream).dep_prev;
        let own_dep_next = self.get(stream).dep_next;
        let own_sib_next = self.get(stream).sib_next;

        let mut promoted_children = None;

        if let Some(prev) = sib_prev {
            // `stream` is not its parent's first child.
            if let Some(children) = own_dep_next {
                self.get_mut(children).dep_prev = None;
                self.get_mut(prev).sib_next = Some(children);
                self.get_mut(children).sib_prev = Some(prev);
                promoted_children = Some(children);
            } else {
                self.get_mut(prev).sib_next = own_sib_next;
                if let Some(next) = own_sib_next {
                    self.get_mut(next).sib_prev = Some(prev);
                }
            }
        } else if let Some(parent) = dep_prev {
            // `stream` is its parent's first child.
            if let Some(children) = own_dep_next {
                self.get_mut(parent).dep_next = Some(children);
                self.get_mut(children).dep_prev = Some(parent);
                promoted_children = Some(children);
            } else if let Some(next) = own_sib_next {
                self.get_mut(parent).dep_next = Some(next);
                self.get_mut(next).dep_prev = Some(parent);
                self.get_mut(next).sib_prev = None;
            } else {
                self.get_mut(parent).dep_next = None;
            }
        } else {
            // `stream` is a root: each child becomes the root of its own tree.
            let mut sib = own_dep_next;
            while let Some(k) = sib {
                let next = self.get(k).sib_next;
                let node = self.get_mut(k);
                node.dep_prev = None;
                node.sib_prev = None;
                node.sib_next = None;
                sib = next;
            }
        }

        if let (Some(children), Some(next)) = (promoted_children, own_sib_next) {
            let last = self.last_sib(children);
            self.get_mut(last).sib_next = Some(next);
            self.get_mut(next).sib_prev = Some(last);
        }

        let node = self.get_mut(stream);
        node.num_substreams = 1;
        node.dep_prev = None;
        node.dep_next = None;
        node.sib_prev = None;
        node.sib_next = None;
    }

    /// Detaches `stream` together with its entire subtree, leaving it as
    /// the root of an independent tree. Substream counts inside the
    /// subtree are unchanged; only the ancestor chain it left behind is
    /// adjusted.
    pub fn dep_remove_subtree(&mut self, stream: Key) {
        let substreams = self.get(stream).num_substreams() as isize;

        if let Some(prev) = self.get(stream).sib_prev {
            let next = self.get(stream).sib_next;
            self.get_mut(prev).sib_next = next;
            if let Some(n) = next {
                self.get_mut(n).sib_prev = Some(prev);
            }

            let first = self.first_sib(prev);
            if let Some(grandparent) = self.get(first).dep_prev {
                self.update_dep_length(grandparent, -substreams);
            }
        } else if let Some(parent) = self.get(stream).dep_prev {
            let next = self.get(stream).sib_next;
            self.get_mut(parent).dep_next = next;
            if let Some(n) = next {
                self.get_mut(n).dep_prev = Some(parent);
                self.get_mut(n).sib_prev = None;
            }

            self.update_dep_length(parent, -substreams);
        }

        let node = self.get_mut(stream);
        node.sib_prev = None;
        node.sib_next = None;
        node.dep_prev = None;
    }
}
