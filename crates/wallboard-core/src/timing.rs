//! Keepalive and reconciliation timing.
//!
//! The keepalive window is the anchor: pings go out at 90% of it so a
//! healthy terminal always answers before the read deadline, and the URL
//! reconciliation tick runs at half of it.

use std::time::Duration;

/// Deadline for a single wire write.
pub const WRITE_WAIT: Duration = Duration::from_secs(10);

/// Sliding read deadline; any inbound frame resets it.
pub const PONG_WAIT: Duration = Duration::from_secs(60);

/// Liveness probe interval (90% of [`PONG_WAIT`]).
pub const PING_INTERVAL: Duration = Duration::from_secs(PONG_WAIT.as_secs() * 9 / 10);

/// Reconciliation tick interval (half of [`PONG_WAIT`]).
pub const URL_POLL_INTERVAL: Duration = Duration::from_secs(PONG_WAIT.as_secs() / 2);

/// Maximum accepted inbound message size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Capacity of a session's outbound queue before it is treated as dead.
pub const OUTBOUND_QUEUE_SIZE: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_fires_inside_the_keepalive_window() {
        assert!(PING_INTERVAL < PONG_WAIT);
        assert_eq!(PING_INTERVAL, Duration::from_secs(54));
    }

    #[test]
    fn poll_interval_is_half_the_keepalive_window() {
        assert_eq!(URL_POLL_INTERVAL * 2, PONG_WAIT);
    }
}
