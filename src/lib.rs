#![deny(missing_debug_implementations)]
#![cfg_attr(test, deny(warnings))]

//! The HTTP/2 stream dependency tree and DATA-frame scheduling core
//! described by RFC 7540 §5.3.
//!
//! This crate owns exactly one thing: the forest of streams a connection
//! organizes into parent/child/sibling dependency trees, grouped into
//! weighted [`StreamGroup`]s, plus the `dpri` tag that decides which
//! stream's DATA frame is currently eligible for transmission. Framing,
//! HPACK, settings negotiation, stream-id allocation, and all I/O live in
//! the enclosing session; this crate only consumes two interfaces from
//! it, [`OutboundItem`] and [`PriorityQueue`].
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use h2_priority::{DependencyForest, OutboundItem, PriorityQueue, StreamState};
//!
//! #[derive(Clone)]
//! struct Item(Rc<Cell<bool>>);
//!
//! impl OutboundItem for Item {
//!     fn is_queued(&self) -> bool {
//!         self.0.get()
//!     }
//!
//!     fn mark_queued(&self) {
//!         self.0.set(true);
//!     }
//! }
//!
//! struct Queue(Vec<Item>);
//!
//! impl PriorityQueue<Item> for Queue {
//!     type Error = std::convert::Infallible;
//!
//!     fn push(&mut self, item: Item) -> Result<(), Self::Error> {
//!         self.0.push(item);
//!         Ok(())
//!     }
//! }
//!
//! let mut forest = DependencyForest::<Item>::new();
//! let group = forest.group_init(0, 16);
//!
//! let root = forest.open(1.into(), 0, StreamState::Open, 0xffff, 0xffff, None);
//! forest.group_add_stream(group, root);
//!
//! let mut pq = Queue(Vec::new());
//! forest
//!     .attach_data(root, Item(Rc::new(Cell::new(false))), &mut pq)
//!     .unwrap();
//! assert_eq!(pq.0.len(), 1);
//! ```

mod error;
mod flow;
mod macros;
pub mod proto;
mod stream_id;
mod tracing;

pub use error::WindowOverflow;
pub use flow::MAX_WINDOW_SIZE;
pub use proto::streams::{
    DependencyForest, Dpri, GroupKey, Groups, Key, OutboundItem, PriorityQueue, ShutFlags, Stream,
    StreamArena, StreamGroup, StreamState,
};
pub use stream_id::StreamId;
