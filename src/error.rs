use std::fmt;

/// A flow-control window update moved the window outside
/// `[i32::MIN, 2^31 - 1]`.
///
/// Returned by [`crate::proto::streams::stream::Stream::update_remote_initial_window_size`]
/// and its local-window counterpart. Callers are expected to surface this as
/// `FLOW_CONTROL_ERROR` at the session layer; the window is left unchanged.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct WindowOverflow {
    pub(crate) attempted: i64,
}

impl fmt::Debug for WindowOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowOverflow")
            .field("attempted", &self.attempted)
            .finish()
    }
}

impl fmt::Display for WindowOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flow-control window update out of range: attempted {}",
            self.attempted
        )
    }
}

impl std::error::Error for WindowOverflow {}
