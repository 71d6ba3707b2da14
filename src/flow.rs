//! Flow-control window arithmetic, shared by the remote- and local-window
//! `INITIAL_WINDOW_SIZE` update paths.
//!
//! The HTTP/2 connection preface and every subsequent SETTINGS frame that
//! changes `SETTINGS_INITIAL_WINDOW_SIZE` shifts every open stream's window
//! by the same delta, in either direction. This module does only that one
//! bit of arithmetic, in 64-bit precision so an overflow can be detected
//! before the result is truncated back into a `i32`.

use crate::error::WindowOverflow;

/// Upper bound of a flow-control window (RFC 7540 §6.9.1): `2^31 - 1`.
pub const MAX_WINDOW_SIZE: i32 = i32::MAX;

/// Adjusts `*window` by `new_initial - old_initial`.
///
/// Fails, leaving `*window` untouched, if the result would fall outside
/// `[i32::MIN, MAX_WINDOW_SIZE]`.
pub fn adjust(window: &mut i32, new_initial: i32, old_initial: i32) -> Result<(), WindowOverflow> {
    let delta = i64::from(new_initial) - i64::from(old_initial);
    let next = i64::from(*window) + delta;

    if next < i64::from(i32::MIN) || next > i64::from(MAX_WINDOW_SIZE) {
        return Err(WindowOverflow { attempted: next });
    }

    *window = next as i32;
    Ok(())
}
