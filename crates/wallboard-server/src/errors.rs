//! Session error types.

/// Fatal conditions for one session's write pump.
///
/// Any of these tears down that session only; the broker and every other
/// session are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A wire write exceeded its deadline.
    #[error("write deadline exceeded")]
    WriteTimeout,

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Outbound message could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_timeout_display() {
        assert_eq!(
            SessionError::WriteTimeout.to_string(),
            "write deadline exceeded"
        );
    }
}
