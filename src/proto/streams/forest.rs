//! [`DependencyForest`], the single public entry point for this crate.
//!
//! Everything in [`store`](super::store) and
//! [`scheduler`](super::scheduler) is deliberately free functions over
//! `&mut StreamArena`/`&mut Groups` rather than methods, so that this type
//! is nothing but a thin façade gluing them together behind the external
//! interface table: one arena, one group table, one generic item type, one
//! generic priority queue.

use std::any::Any;

use crate::error::WindowOverflow;
use crate::proto::streams::group::{GroupKey, Groups, StreamGroup};
use crate::proto::streams::queue::{OutboundItem, PriorityQueue};
use crate::proto::streams::scheduler;
use crate::proto::streams::store::{Key, StreamArena};
use crate::proto::streams::stream::{ShutFlags, Stream, StreamState};
use crate::stream_id::StreamId;

/// An HTTP/2 connection's dependency forest: every live stream, grouped
/// into weighted buckets, linked into zero or more dependency trees, with
/// `Dpri` tags tracking which streams currently have a transmittable DATA
/// frame.
///
/// `I` is the caller's outbound-item handle (see [`OutboundItem`]); this
/// type never constructs one itself, only stores and forwards the handles
/// it's given.
pub struct DependencyForest<I> {
    streams: StreamArena<I>,
    groups: Groups,
}

impl<I> std::fmt::Debug for DependencyForest<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyForest")
            .field("streams", &self.streams)
            .field("groups", &self.groups)
            .finish()
    }
}

impl<I> Default for DependencyForest<I> {
    fn default() -> Self {
        DependencyForest {
            streams: StreamArena::new(),
            groups: Groups::new(),
        }
    }
}

impl<I> DependencyForest<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new, standalone stream. It is not yet part of any tree
    /// or group; place it with [`dep_insert`](Self::dep_insert),
    /// [`dep_add`](Self::dep_add), or [`dep_make_root`](Self::dep_make_root)
    /// before attaching data to it.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &mut self,
        stream_id: StreamId,
        flags: u32,
        state: StreamState,
        remote_initial_window_size: i32,
        local_initial_window_size: i32,
        user_data: Option<Box<dyn Any>>,
    ) -> Key {
        self.streams.init(
            stream_id,
            flags,
            state,
            remote_initial_window_size,
            local_initial_window_size,
            user_data,
        )
    }

    /// Removes `key` from the arena. The caller must have already detached
    /// it from any tree (via [`dep_remove`](Self::dep_remove) or
    /// [`dep_remove_subtree`](Self::dep_remove_subtree)) and from its group,
    /// and must not have a pending `data`/`deferred_data` item it still
    /// cares about; both are dropped with the stream.
    pub fn close(&mut self, key: Key) -> Stream<I> {
        if let Some(group) = self.streams.get(key).stream_group() {
            self.groups.decr(group);
        }
        self.streams.free(key)
    }

    pub fn resolve(&self, stream_id: StreamId) -> Option<Key> {
        self.streams.resolve(stream_id)
    }

    pub fn get(&self, key: Key) -> &Stream<I> {
        self.streams.get(key)
    }

    pub fn get_mut(&mut self, key: Key) -> &mut Stream<I> {
        self.streams.get_mut(key)
    }

    pub fn children(&self, key: Key) -> smallvec::SmallVec<[Key; 8]> {
        self.streams.children(key)
    }

    pub fn dep_root(&self, key: Key) -> Key {
        self.streams.get_dep_root(key)
    }

    /// True iff `target` is reachable from `start` via `dep_next`/`sib_next`.
    /// Callers use this before re-parenting to avoid introducing a cycle
    /// (e.g. making a stream depend on its own descendant).
    pub fn subtree_find(&self, start: Key, target: Key) -> bool {
        self.streams.subtree_find(Some(start), target)
    }

    pub fn shutdown(&mut self, key: Key, flag: ShutFlags) {
        self.streams.get_mut(key).shutdown(flag);
    }

    pub fn update_remote_initial_window_size(
        &mut self,
        key: Key,
        new_initial_window_size: i32,
        old_initial_window_size: i32,
    ) -> Result<(), WindowOverflow> {
        self.streams
            .get_mut(key)
            .update_remote_initial_window_size(new_initial_window_size, old_initial_window_size)
    }

    pub fn update_local_initial_window_size(
        &mut self,
        key: Key,
        new_initial_window_size: i32,
        old_initial_window_size: i32,
    ) -> Result<(), WindowOverflow> {
        self.streams
            .get_mut(key)
            .update_local_initial_window_size(new_initial_window_size, old_initial_window_size)
    }

    pub fn group_init(&mut self, pri_group_id: i32, weight: i32) -> GroupKey {
        self.groups.init(pri_group_id, weight)
    }

    pub fn group_free(&mut self, group: GroupKey) -> StreamGroup {
        self.groups.free(group)
    }

    pub fn group(&self, group: GroupKey) -> &StreamGroup {
        self.groups.get(group)
    }

    /// Re-parents `stream`, without data of its own yet, as the sole
    /// exclusive child of `parent`, adopting `parent`'s existing children
    /// as `stream`'s own. Pure topology: group membership is untouched, so
    /// callers that need `stream` in a particular group call
    /// [`group_add_stream`](Self::group_add_stream) themselves (typically
    /// `parent`'s group, matching the enclosing tree).
    pub fn dep_insert(&mut self, parent: Key, stream: Key) {
        self.streams.dep_insert(parent, stream);
    }

    /// Appends `stream`, without data of its own yet, as a new last
    /// sibling of `parent`'s children. Pure topology, same group-membership
    /// contract as [`dep_insert`](Self::dep_insert).
    pub fn dep_add(&mut self, parent: Key, stream: Key) {
        self.streams.dep_add(parent, stream);
    }

    /// Removes `stream` from its tree, promoting its children to fill the
    /// gap it leaves. Group membership is untouched.
    pub fn dep_remove(&mut self, stream: Key) {
        self.streams.dep_remove(stream);
    }

    /// Detaches `stream` together with its subtree as an independent tree,
    /// leaving groups within the subtree untouched.
    pub fn dep_remove_subtree(&mut self, stream: Key) {
        self.streams.dep_remove_subtree(stream);
    }

    /// Assigns `stream` to `group`, incrementing its membership count.
    /// Does not touch `dpri` or run a top-search; callers doing this for a
    /// stream that already carries attached data should prefer
    /// [`dep_make_root`](Self::dep_make_root) or a `_subtree` op instead,
    /// both of which keep scheduling state consistent.
    pub fn group_add_stream(&mut self, group: GroupKey, stream: Key) {
        debug_assert!(self.streams.get(stream).stream_group().is_none());
        self.streams.get_mut(stream).set_stream_group(Some(group));
        self.groups.incr(group);
    }

    /// Clears `stream`'s group membership, decrementing the old group's
    /// count.
    pub fn group_remove_stream(&mut self, stream: Key) {
        if let Some(group) = self.streams.get_mut(stream).take_stream_group() {
            self.groups.decr(group);
        }
    }

    /// Re-parents `stream` (carrying its whole subtree) beneath
    /// `dep_stream` as its sole exclusive child, reassigning the subtree to
    /// `dep_stream`'s group and re-running the top-search.
    pub fn dep_insert_subtree<Q>(
        &mut self,
        dep_stream: Key,
        stream: Key,
        pq: &mut Q,
    ) -> Result<(), Q::Error>
    where
        I: OutboundItem,
        Q: PriorityQueue<I>,
    {
        scheduler::dep_insert_subtree(&mut self.streams, &mut self.groups, dep_stream, stream, pq)
    }

    /// Appends `stream` (carrying its whole subtree) as a new last sibling
    /// of `dep_stream`'s children, reassigning the subtree to
    /// `dep_stream`'s group and re-running the top-search.
    pub fn dep_add_subtree<Q>(
        &mut self,
        dep_stream: Key,
        stream: Key,
        pq: &mut Q,
    ) -> Result<(), Q::Error>
    where
        I: OutboundItem,
        Q: PriorityQueue<I>,
    {
        scheduler::dep_add_subtree(&mut self.streams, &mut self.groups, dep_stream, stream, pq)
    }

    /// Makes `stream` (already detached, carrying its subtree) the root of
    /// a new standalone tree in `group`, then re-runs the top-search from
    /// it.
    pub fn dep_make_root<Q>(
        &mut self,
        group: GroupKey,
        stream: Key,
        pq: &mut Q,
    ) -> Result<(), Q::Error>
    where
        I: OutboundItem,
        Q: PriorityQueue<I>,
    {
        scheduler::dep_make_root(&mut self.streams, &mut self.groups, group, stream, pq)
    }

    /// Attaches `item` as `stream`'s pending DATA frame, then propagates the
    /// resulting scheduling change.
    pub fn attach_data<Q>(&mut self, stream: Key, item: I, pq: &mut Q) -> Result<(), Q::Error>
    where
        I: OutboundItem,
        Q: PriorityQueue<I>,
    {
        scheduler::attach_data(&mut self.streams, stream, item, pq)
    }

    /// Detaches whatever DATA frame is currently attached to `stream`,
    /// propagating the resulting scheduling change.
    pub fn detach_data<Q>(&mut self, stream: Key, pq: &mut Q) -> Result<(), Q::Error>
    where
        I: OutboundItem,
        Q: PriorityQueue<I>,
    {
        scheduler::detach_data(&mut self.streams, stream, pq)
    }

    /// Moves `stream`'s attached item aside into `deferred_data`, recording
    /// `flags` (the reason for the deferral — typically a blocked flow
    /// window) for later inspection. Does not itself change `Dpri`.
    pub fn defer_data(&mut self, stream: Key, flags: u32) {
        scheduler::defer_data(&mut self.streams, stream, flags)
    }

    /// Reattaches `stream`'s previously deferred item, propagating the
    /// resulting scheduling change exactly as
    /// [`attach_data`](Self::attach_data) would.
    pub fn detach_deferred_data<Q>(&mut self, stream: Key, pq: &mut Q) -> Result<(), Q::Error>
    where
        I: OutboundItem,
        Q: PriorityQueue<I>,
    {
        scheduler::detach_deferred_data(&mut self.streams, stream, pq)
    }
}
