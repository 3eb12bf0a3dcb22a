//! Store error types.

/// Errors surfaced by store operations.
///
/// Resolution never returns these — it degrades to the global catalog and
/// logs. Mutating operations surface them to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying `SQLite` failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool failure.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Alias collides with another client's identifier or alias.
    #[error("alias '{0}' is already taken")]
    AliasTaken(String),

    /// The Default list is reserved and cannot be deleted.
    #[error("the Default list cannot be deleted")]
    ReservedList,

    /// No list with the given name.
    #[error("no such list: {0}")]
    ListNotFound(String),

    /// No URL with the given text.
    #[error("no such url: {0}")]
    UrlNotFound(String),

    /// No client with the given identifier or alias.
    #[error("no such client: {0}")]
    ClientNotFound(String),
}

/// Store result alias.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_taken_display() {
        let err = StoreError::AliasTaken("lobby".to_string());
        assert_eq!(err.to_string(), "alias 'lobby' is already taken");
    }

    #[test]
    fn reserved_list_display() {
        assert_eq!(
            StoreError::ReservedList.to_string(),
            "the Default list cannot be deleted"
        );
    }
}
