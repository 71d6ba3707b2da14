//! The dependency forest: stream storage, stream groups, and the
//! scheduling logic that keeps the "currently transmittable" frontier
//! correct as the tree is mutated.

pub mod forest;
pub mod group;
pub mod queue;
mod scheduler;
pub mod store;
pub mod stream;

pub use forest::DependencyForest;
pub use group::{GroupKey, Groups, StreamGroup};
pub use queue::{OutboundItem, PriorityQueue};
pub use store::{Key, StreamArena};
pub use stream::{Dpri, ShutFlags, Stream, StreamState};
