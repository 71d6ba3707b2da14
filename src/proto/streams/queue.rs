//! The two external collaborators this crate only ever calls out to:
//! outbound items and the priority queue that eventually drains them.
//!
//! Both are implemented by the enclosing session, not by this crate. The
//! forest never owns an outbound item's DATA frame, only a cheap handle to
//! it, since the same item lives simultaneously in a stream's `data` slot
//! and, once promoted to TOP, in the external queue.

/// An opaque handle to a pending DATA frame.
///
/// `queued` is the one bit this crate reads and writes: [`mark_queued`] is
/// called at most once per promotion to TOP, and this crate never clears
/// it — the consumer does that after popping (or discarding) the item.
///
/// Implementations are typically a cheap `Clone` over shared interior
/// mutability (an `Rc<Cell<bool>>`, an arena index plus a side table, and
/// so on), which is why the methods take `&self` rather than `&mut self`.
///
/// [`mark_queued`]: OutboundItem::mark_queued
pub trait OutboundItem: Clone {
    /// True once [`mark_queued`](OutboundItem::mark_queued) has been called
    /// and the consumer hasn't cleared it since.
    fn is_queued(&self) -> bool;

    /// Marks this item as present in the priority queue.
    fn mark_queued(&self);
}

/// A min-heap of outbound items, owned and ordered by the caller.
///
/// This crate uses only [`push`](PriorityQueue::push); popping, the
/// ordering key, and weighted fairness within a stream group are the
/// session's responsibility (see the `weight` field on
/// [`StreamGroup`](crate::proto::streams::group::StreamGroup)).
pub trait PriorityQueue<I> {
    /// The queue's own failure mode (out-of-memory, typically).
    type Error;

    /// Pushes `item`. Called at most once per TOP promotion; the caller
    /// has already checked [`OutboundItem::is_queued`] before this is
    /// invoked.
    fn push(&mut self, item: I) -> Result<(), Self::Error>;
}
