//! Propagation of the `dpri` scheduling tag across the dependency forest.
//!
//! This is the part of the crate where attaching a DATA frame to one
//! stream, or re-parenting a subtree, can promote or demote the scheduling
//! eligibility of arbitrarily many other streams. The external priority
//! queue observes pushes in exactly the order [`set_top`] discovers
//! eligible nodes: siblings left to right, with every sibling at a level
//! visited before any of their descendants.
//!
//! Every function here is recursive, mirroring the tree it walks. A
//! connection's dependency tree is bounded by how many concurrent streams
//! the session allows (typically capped in the low hundreds), so the
//! default stack comfortably covers the worst case; a port to a
//! small-stack environment should convert these to an explicit stack
//! while preserving the visit order above.

use crate::proto::streams::group::{GroupKey, Groups};
use crate::proto::streams::queue::{OutboundItem, PriorityQueue};
use crate::proto::streams::store::{Key, StreamArena};
use crate::proto::streams::stream::Dpri;

/// Demotes every TOP node reachable from `start` back to REST. A node
/// already at REST means its whole subtree is already REST or better, so
/// descent stops there.
pub(crate) fn set_rest<I>(streams: &mut StreamArena<I>, start: Option<Key>) {
    let Some(key) = start else { return };

    match streams.get(key).dpri() {
        Dpri::Rest => {}
        Dpri::Top => {
            streams.get_mut(key).dpri = Dpri::Rest;
            // A TOP node shadows its descendants, so only siblings need
            // revisiting, not children.
            set_rest(streams, streams.get(key).sib_next);
        }
        Dpri::NoData => {
            set_rest(streams, streams.get(key).sib_next);
            set_rest(streams, streams.get(key).dep_next);
        }
    }
}

fn reassign_group<I>(
    streams: &mut StreamArena<I>,
    groups: &mut Groups,
    key: Key,
    group: GroupKey,
) {
    if let Some(old) = streams.get(key).stream_group() {
        groups.decr(old);
    }
    groups.incr(group);
    streams.get_mut(key).set_stream_group(Some(group));
}

/// Visits every node reachable from `start`, reassigning it to `group` and
/// demoting any TOP node to REST — a group change means the enclosing
/// tree's top-search has to run again.
pub(crate) fn set_rest_stream_group<I>(
    streams: &mut StreamArena<I>,
    groups: &mut Groups,
    start: Option<Key>,
    group: GroupKey,
) {
    let Some(key) = start else { return };

    reassign_group(streams, groups, key, group);

    if streams.get(key).dpri() == Dpri::Top {
        streams.get_mut(key).dpri = Dpri::Rest;
    }

    set_rest_stream_group(streams, groups, streams.get(key).sib_next, group);
    set_rest_stream_group(streams, groups, streams.get(key).dep_next, group);
}

/// DFS for the frontier of REST nodes that may promote to TOP, enqueuing
/// each one's data exactly once (`OutboundItem::is_queued` is checked
/// before every push).
pub(crate) fn set_top<I, Q>(
    streams: &mut StreamArena<I>,
    start: Option<Key>,
    pq: &mut Q,
) -> Result<(), Q::Error>
where
    I: OutboundItem,
    Q: PriorityQueue<I>,
{
    let Some(key) = start else { return Ok(()) };

    match streams.get(key).dpri() {
        Dpri::Top => set_top(streams, streams.get(key).sib_next, pq),
        Dpri::Rest => {
            let item = streams
                .get(key)
                .data()
                .expect("a REST stream always has attached data")
                .clone();

            if !item.is_queued() {
                crate::tracing::trace!(stream = ?key, "promoting to top");
                pq.push(item.clone())?;
                item.mark_queued();
            }

            streams.get_mut(key).dpri = Dpri::Top;
            set_top(streams, streams.get(key).sib_next, pq)
        }
        Dpri::NoData => {
            set_top(streams, streams.get(key).sib_next, pq)?;
            set_top(streams, streams.get(key).dep_next, pq)
        }
    }
}

pub(crate) fn on_attach_data<I, Q>(
    streams: &mut StreamArena<I>,
    key: Key,
    pq: &mut Q,
) -> Result<(), Q::Error>
where
    I: OutboundItem,
    Q: PriorityQueue<I>,
{
    streams.get_mut(key).dpri = Dpri::Rest;
    // `key`'s descendants may have been top-eligible beneath it; they must
    // now yield.
    set_rest(streams, streams.get(key).dep_next);

    let root = streams.get_dep_root(key);
    set_top(streams, Some(root), pq)
}

pub(crate) fn on_detach_data<I, Q>(
    streams: &mut StreamArena<I>,
    key: Key,
    pq: &mut Q,
) -> Result<(), Q::Error>
where
    I: OutboundItem,
    Q: PriorityQueue<I>,
{
    if streams.get(key).dpri() != Dpri::Top {
        streams.get_mut(key).dpri = Dpri::NoData;
        return Ok(());
    }

    streams.get_mut(key).dpri = Dpri::NoData;
    set_top(streams, streams.get(key).dep_next, pq)
}

pub(crate) fn attach_data<I, Q>(
    streams: &mut StreamArena<I>,
    key: Key,
    item: I,
    pq: &mut Q,
) -> Result<(), Q::Error>
where
    I: OutboundItem,
    Q: PriorityQueue<I>,
{
    debug_assert!(streams.get(key).data().is_none());
    debug_assert!(streams.get(key).deferred_data().is_none());

    crate::tracing::trace!(stream = ?key, "attach data");
    streams.get_mut(key).data = Some(item);
    on_attach_data(streams, key, pq)
}

pub(crate) fn detach_data<I, Q>(
    streams: &mut StreamArena<I>,
    key: Key,
    pq: &mut Q,
) -> Result<(), Q::Error>
where
    I: OutboundItem,
    Q: PriorityQueue<I>,
{
    crate::tracing::trace!(stream = ?key, "detach data");
    streams.get_mut(key).data = None;
    on_detach_data(streams, key, pq)
}

/// Moves the attached item into `deferred_data`. Per the source this core
/// is modeled on, this does **not** run `on_detach_data`: the stream can
/// briefly read as TOP with no attached `data`. Callers must pair this
/// with a timely [`detach_deferred_data`], which restores both the item
/// and the invariant in one step.
pub(crate) fn defer_data<I>(streams: &mut StreamArena<I>, key: Key, flags: u32) {
    let stream = streams.get_mut(key);
    debug_assert!(stream.deferred_data().is_none());

    let item = stream.data.take().expect("defer_data requires attached data");
    stream.deferred_data = Some(item);
    stream.set_deferred_flags(flags);
}

pub(crate) fn detach_deferred_data<I, Q>(
    streams: &mut StreamArena<I>,
    key: Key,
    pq: &mut Q,
) -> Result<(), Q::Error>
where
    I: OutboundItem,
    Q: PriorityQueue<I>,
{
    let stream = streams.get_mut(key);
    debug_assert!(stream.data().is_none());

    let item = stream
        .deferred_data
        .take()
        .expect("no deferred data to resume");
    stream.set_deferred_flags(0);

    attach_data(streams, key, item, pq)
}

/// Re-parents `stream` beneath `dep_stream` as its sole, exclusive child,
/// treating `stream` as carrying its entire subtree: every stream in that
/// subtree is reassigned to `dep_stream`'s group before the relink, and
/// the enclosing tree's top-search is re-run afterward.
pub(crate) fn dep_insert_subtree<I, Q>(
    streams: &mut StreamArena<I>,
    groups: &mut Groups,
    dep_stream: Key,
    stream: Key,
    pq: &mut Q,
) -> Result<(), Q::Error>
where
    I: OutboundItem,
    Q: PriorityQueue<I>,
{
    let delta = streams.get(stream).num_substreams();
    let group = streams
        .get(dep_stream)
        .stream_group()
        .expect("dep_stream must already belong to a group");

    set_rest_stream_group(streams, groups, Some(stream), group);

    if let Some(dep_next) = streams.get(dep_stream).dep_next {
        let mut adopted = 0usize;
        let mut sib = Some(dep_next);
        while let Some(k) = sib {
            adopted += streams.get(k).num_substreams();
            sib = streams.get(k).sib_next;
        }
        streams.get_mut(stream).num_substreams += adopted;

        // The adopted chain keeps its existing group (already `group`,
        // since it used to hang directly off `dep_stream`) but may need
        // demoting: it now sits one level deeper, beneath `stream`.
        set_rest(streams, Some(dep_next));

        streams.get_mut(dep_stream).dep_next = Some(stream);
        streams.get_mut(stream).dep_prev = Some(dep_stream);

        match streams.get(stream).dep_next {
            Some(stream_children) => {
                let last = streams.last_sib(stream_children);
                streams.get_mut(last).sib_next = Some(dep_next);
                streams.get_mut(dep_next).sib_prev = Some(last);
                streams.get_mut(dep_next).dep_prev = None;
            }
            None => {
                streams.get_mut(stream).dep_next = Some(dep_next);
                streams.get_mut(dep_next).dep_prev = Some(stream);
            }
        }
    } else {
        streams.get_mut(dep_stream).dep_next = Some(stream);
        streams.get_mut(stream).dep_prev = Some(dep_stream);
    }

    let root = streams.update_dep_length(dep_stream, delta as isize);
    set_top(streams, Some(root), pq)
}

/// Appends `stream`, with its entire subtree, as a new last sibling of
/// `dep_stream`'s existing children.
pub(crate) fn dep_add_subtree<I, Q>(
    streams: &mut StreamArena<I>,
    groups: &mut Groups,
    dep_stream: Key,
    stream: Key,
    pq: &mut Q,
) -> Result<(), Q::Error>
where
    I: OutboundItem,
    Q: PriorityQueue<I>,
{
    let group = streams
        .get(dep_stream)
        .stream_group()
        .expect("dep_stream must already belong to a group");

    set_rest_stream_group(streams, groups, Some(stream), group);

    match streams.get(dep_stream).dep_next {
        Some(first_child) => {
            let last = streams.last_sib(first_child);
            streams.get_mut(last).sib_next = Some(stream);
            streams.get_mut(stream).sib_prev = Some(last);
        }
        None => {
            streams.get_mut(dep_stream).dep_next = Some(stream);
            streams.get_mut(stream).dep_prev = Some(dep_stream);
        }
    }

    let delta = streams.get(stream).num_substreams();
    let root = streams.update_dep_length(dep_stream, delta as isize);
    set_top(streams, Some(root), pq)
}

/// Makes `stream` (with its descendants, already detached from wherever it
/// was) the root of a new standalone tree assigned to `group`, then runs
/// the top-search from it.
pub(crate) fn dep_make_root<I, Q>(
    streams: &mut StreamArena<I>,
    groups: &mut Groups,
    group: GroupKey,
    stream: Key,
    pq: &mut Q,
) -> Result<(), Q::Error>
where
    I: OutboundItem,
    Q: PriorityQueue<I>,
{
    set_rest_stream_group(streams, groups, Some(stream), group);
    set_top(streams, Some(stream), pq)
}
