//! A single node in the dependency forest.

use std::any::Any;
use std::fmt;

use crate::error::WindowOverflow;
use crate::flow;
use crate::macros::bitmask;
use crate::proto::streams::group::GroupKey;
use crate::proto::streams::store::Key;
use crate::stream_id::StreamId;

bitmask! {
    /// Which halves of a stream the caller has shut down. Monotonic: once a
    /// bit is set it is never cleared.
    pub struct ShutFlags: u8 {
        const NONE = 0b00;
        const RD   = 0b01;
        const WR   = 0b10;
        const RDWR = 0b11;
    }
}

/// Coarse stream lifecycle, per RFC 7540 §5.1. This core only ever writes
/// the `Open` transition (via [`Stream::promise_fulfilled`]); every other
/// transition is the session's business and is only stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    ReservedLocal,
    ReservedRemote,
    Open,
    HalfClosedLocal,
    HalfClosedRemote,
    Closed,
}

/// The scheduling tag that drives [`crate::proto::streams::scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dpri {
    /// No attached DATA frame.
    NoData,
    /// Has a DATA frame but a TOP ancestor (or group change) shadows it.
    Rest,
    /// Has a DATA frame and is eligible for transmission; its item is
    /// queued (or about to be).
    Top,
}

/// A node in the HTTP/2 stream dependency forest.
///
/// `I` is the caller's outbound-item handle type (see
/// [`crate::proto::streams::queue::OutboundItem`]); it is never interpreted
/// by this crate beyond its `queued` bit.
pub struct Stream<I> {
    stream_id: StreamId,
    pub flags: u32,
    pub state: StreamState,
    shut_flags: ShutFlags,
    user_data: Option<Box<dyn Any>>,

    pub(crate) data: Option<I>,
    pub(crate) deferred_data: Option<I>,
    deferred_flags: u32,

    remote_window_size: i32,
    local_window_size: i32,
    pub recv_window_size: i32,
    pub recv_reduction: i32,

    pub(crate) dep_prev: Option<Key>,
    pub(crate) dep_next: Option<Key>,
    pub(crate) sib_prev: Option<Key>,
    pub(crate) sib_next: Option<Key>,

    pub(crate) stream_group: Option<GroupKey>,
    pub(crate) dpri: Dpri,
    pub(crate) num_substreams: usize,
}

impl<I> Stream<I> {
    pub(crate) fn new(
        stream_id: StreamId,
        flags: u32,
        state: StreamState,
        remote_initial_window_size: i32,
        local_initial_window_size: i32,
        user_data: Option<Box<dyn Any>>,
    ) -> Self {
        Stream {
            stream_id,
            flags,
            state,
            shut_flags: ShutFlags::NONE,
            user_data,
            data: None,
            deferred_data: None,
            deferred_flags: 0,
            remote_window_size: remote_initial_window_size,
            local_window_size: local_initial_window_size,
            recv_window_size: 0,
            recv_reduction: 0,
            dep_prev: None,
            dep_next: None,
            sib_prev: None,
            sib_next: None,
            stream_group: None,
            dpri: Dpri::NoData,
            num_substreams: 1,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn shut_flags(&self) -> ShutFlags {
        self.shut_flags
    }

    pub fn shutdown(&mut self, flag: ShutFlags) {
        self.shut_flags.insert(flag);
    }

    pub fn promise_fulfilled(&mut self) {
        self.state = StreamState::Open;
    }

    pub fn user_data(&self) -> Option<&dyn Any> {
        self.user_data.as_deref()
    }

    pub fn user_data_mut(&mut self) -> Option<&mut dyn Any> {
        self.user_data.as_deref_mut()
    }

    pub fn data(&self) -> Option<&I> {
        self.data.as_ref()
    }

    pub fn deferred_data(&self) -> Option<&I> {
        self.deferred_data.as_ref()
    }

    pub fn deferred_flags(&self) -> u32 {
        self.deferred_flags
    }

    pub(crate) fn set_deferred_flags(&mut self, flags: u32) {
        self.deferred_flags = flags;
    }

    pub fn num_substreams(&self) -> usize {
        self.num_substreams
    }

    pub fn dpri(&self) -> Dpri {
        self.dpri
    }

    pub fn stream_group(&self) -> Option<GroupKey> {
        self.stream_group
    }

    pub(crate) fn set_stream_group(&mut self, group: Option<GroupKey>) {
        self.stream_group = group;
    }

    pub(crate) fn take_stream_group(&mut self) -> Option<GroupKey> {
        self.stream_group.take()
    }

    pub fn remote_window_size(&self) -> i32 {
        self.remote_window_size
    }

    pub fn local_window_size(&self) -> i32 {
        self.local_window_size
    }

    pub fn update_remote_initial_window_size(
        &mut self,
        new_initial_window_size: i32,
        old_initial_window_size: i32,
    ) -> Result<(), WindowOverflow> {
        flow::adjust(
            &mut self.remote_window_size,
            new_initial_window_size,
            old_initial_window_size,
        )
    }

    pub fn update_local_initial_window_size(
        &mut self,
        new_initial_window_size: i32,
        old_initial_window_size: i32,
    ) -> Result<(), WindowOverflow> {
        flow::adjust(
            &mut self.local_window_size,
            new_initial_window_size,
            old_initial_window_size,
        )
    }
}

impl<I> fmt::Debug for Stream<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("stream_id", &self.stream_id)
            .field("state", &self.state)
            .field("shut_flags", &self.shut_flags)
            .field("dpri", &self.dpri)
            .field("num_substreams", &self.num_substreams)
            .field("has_data", &self.data.is_some())
            .field("has_deferred_data", &self.deferred_data.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_stream() -> Stream<u32> {
        Stream::new(
            StreamId::from(1),
            0,
            StreamState::Idle,
            0xffff,
            0xffff,
            None,
        )
    }

    #[test]
    fn new_stream_is_isolated_with_no_data() {
        let s = new_stream();
        assert_eq!(s.dpri(), Dpri::NoData);
        assert_eq!(s.num_substreams(), 1);
        assert_eq!(s.shut_flags(), ShutFlags::NONE);
        assert!(s.data().is_none());
        assert!(s.deferred_data().is_none());
        assert!(s.stream_group().is_none());
    }

    #[test]
    fn promise_fulfilled_opens_the_stream() {
        let mut s = new_stream();
        s.promise_fulfilled();
        assert_eq!(s.state, StreamState::Open);
    }

    // shut_flags is monotonic under union: RD then WR yields RDWR, and a
    // repeated RD is a no-op.
    #[test]
    fn shutdown_is_monotonic_under_union() {
        let mut s = new_stream();
        s.shutdown(ShutFlags::RD);
        assert_eq!(s.shut_flags(), ShutFlags::RD);
        s.shutdown(ShutFlags::WR);
        assert_eq!(s.shut_flags(), ShutFlags::RDWR);
        s.shutdown(ShutFlags::RD);
        assert_eq!(s.shut_flags(), ShutFlags::RDWR);
    }

    #[test]
    fn window_updates_delegate_to_flow_adjust() {
        let mut s = new_stream();
        s.update_remote_initial_window_size(100, 0).unwrap();
        assert_eq!(s.remote_window_size(), 0xffff + 100);

        s.update_local_initial_window_size(0, 100).unwrap();
        assert_eq!(s.local_window_size(), 0xffff - 100);
    }

    #[test]
    fn remote_window_update_out_of_range_leaves_window_untouched() {
        let mut s = new_stream();
        s.update_remote_initial_window_size(i32::MAX, 0).unwrap_err();
        assert_eq!(s.remote_window_size(), 0xffff);
    }
}
