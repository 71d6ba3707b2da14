//! Weighted stream groups.
//!
//! A group is nothing more than a caller-assigned bucket: every stream
//! belongs to exactly one, `weight` is opaque storage the session
//! interprets (this crate performs no weighted fair scheduling of its
//! own), and `num_streams` is kept current by this crate as streams are
//! assigned and removed. Group lifetime is independent of any stream's;
//! deleting a group once its membership reaches zero is the caller's call.

use slab::Slab;

/// A handle into the group arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey(usize);

impl std::fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GroupKey({})", self.0)
    }
}

#[derive(Debug)]
pub struct StreamGroup {
    pri_group_id: i32,
    weight: i32,
    num_streams: usize,
}

impl StreamGroup {
    pub fn pri_group_id(&self) -> i32 {
        self.pri_group_id
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }

    pub fn num_streams(&self) -> usize {
        self.num_streams
    }
}

/// Arena of stream groups, indexed by [`GroupKey`].
#[derive(Default)]
pub struct Groups {
    slab: Slab<StreamGroup>,
}

impl std::fmt::Debug for Groups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Groups").field("len", &self.slab.len()).finish()
    }
}

impl Groups {
    pub fn new() -> Self {
        Groups { slab: Slab::new() }
    }

    pub fn init(&mut self, pri_group_id: i32, weight: i32) -> GroupKey {
        GroupKey(self.slab.insert(StreamGroup {
            pri_group_id,
            weight,
            num_streams: 0,
        }))
    }

    /// Releases the group's storage. The caller must already have removed
    /// every stream referencing it; this crate never checks `num_streams`
    /// before a `free`.
    pub fn free(&mut self, group: GroupKey) -> StreamGroup {
        self.slab.remove(group.0)
    }

    pub fn get(&self, group: GroupKey) -> &StreamGroup {
        &self.slab[group.0]
    }

    pub(crate) fn incr(&mut self, group: GroupKey) {
        self.slab[group.0].num_streams += 1;
    }

    pub(crate) fn decr(&mut self, group: GroupKey) {
        self.slab[group.0].num_streams -= 1;
    }
}
