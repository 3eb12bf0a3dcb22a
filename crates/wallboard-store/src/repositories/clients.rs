//! Client repository — CRUD for the `clients` table.
//!
//! A client is one display terminal, keyed by its opaque identifier. The
//! identifier and the optional human alias share a single lookup namespace:
//! every lookup matches either column, and alias assignment refuses values
//! already used by any client in either column.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{Result, StoreError};
use crate::schema::DEFAULT_LIST_ID;

/// One row of the `clients` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRow {
    pub id: i64,
    pub identifier: String,
    pub alias: Option<String>,
    pub ip_address: String,
    /// RFC 3339 timestamp of the last inbound traffic from this terminal.
    pub last_ping: String,
    pub list_id: i64,
}

/// Client repository — stateless, every method takes `&Connection`.
pub struct ClientRepo;

impl ClientRepo {
    /// Insert a client, or on identifier conflict refresh its IP address
    /// and last-ping. Returns the row either way.
    pub fn upsert(conn: &Connection, identifier: &str, ip_address: &str) -> Result<ClientRow> {
        let now = Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO clients (identifier, ip_address, last_ping)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(identifier) DO UPDATE
             SET ip_address = excluded.ip_address, last_ping = excluded.last_ping",
            params![identifier, ip_address, now],
        )?;
        Self::find(conn, identifier)?.ok_or_else(|| StoreError::ClientNotFound(identifier.into()))
    }

    /// Look up a client by identifier or alias.
    pub fn find(conn: &Connection, name: &str) -> Result<Option<ClientRow>> {
        let row = conn
            .query_row(
                "SELECT id, identifier, alias, ip_address, last_ping, list_id
                 FROM clients WHERE identifier = ?1 OR alias = ?1",
                params![name],
                |row| {
                    Ok(ClientRow {
                        id: row.get(0)?,
                        identifier: row.get(1)?,
                        alias: row.get(2)?,
                        ip_address: row.get(3)?,
                        last_ping: row.get(4)?,
                        list_id: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Refresh the last-ping timestamp.
    pub fn touch(conn: &Connection, name: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let n = conn.execute(
            "UPDATE clients SET last_ping = ?1 WHERE identifier = ?2 OR alias = ?2",
            params![now, name],
        )?;
        if n == 0 {
            return Err(StoreError::ClientNotFound(name.into()));
        }
        Ok(())
    }

    /// Update the recorded IP address.
    pub fn set_ip(conn: &Connection, name: &str, ip_address: &str) -> Result<()> {
        let n = conn.execute(
            "UPDATE clients SET ip_address = ?1 WHERE identifier = ?2 OR alias = ?2",
            params![ip_address, name],
        )?;
        if n == 0 {
            return Err(StoreError::ClientNotFound(name.into()));
        }
        Ok(())
    }

    /// Assign a human alias.
    ///
    /// The alias must be free across both the identifier and alias columns
    /// of every other client, keeping the lookup namespace unambiguous.
    pub fn set_alias(conn: &Connection, identifier: &str, alias: &str) -> Result<()> {
        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM clients
             WHERE (identifier = ?1 OR alias = ?1) AND identifier != ?2",
            params![alias, identifier],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Err(StoreError::AliasTaken(alias.into()));
        }
        let n = conn.execute(
            "UPDATE clients SET alias = ?1 WHERE identifier = ?2",
            params![alias, identifier],
        )?;
        if n == 0 {
            return Err(StoreError::ClientNotFound(identifier.into()));
        }
        Ok(())
    }

    /// Point the client at a list.
    pub fn assign_list(conn: &Connection, name: &str, list_id: i64) -> Result<()> {
        let n = conn.execute(
            "UPDATE clients SET list_id = ?1 WHERE identifier = ?2 OR alias = ?2",
            params![list_id, name],
        )?;
        if n == 0 {
            return Err(StoreError::ClientNotFound(name.into()));
        }
        Ok(())
    }

    /// Reset the client back to the Default list.
    pub fn reset_list(conn: &Connection, name: &str) -> Result<()> {
        Self::assign_list(conn, name, DEFAULT_LIST_ID)
    }

    /// Delete a client by identifier or alias.
    pub fn delete(conn: &Connection, name: &str) -> Result<()> {
        let n = conn.execute(
            "DELETE FROM clients WHERE identifier = ?1 OR alias = ?1",
            params![name],
        )?;
        if n == 0 {
            return Err(StoreError::ClientNotFound(name.into()));
        }
        Ok(())
    }

    /// All clients in identifier order.
    pub fn list(conn: &Connection) -> Result<Vec<ClientRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, identifier, alias, ip_address, last_ping, list_id
             FROM clients ORDER BY identifier",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ClientRow {
                    id: row.get(0)?,
                    identifier: row.get(1)?,
                    alias: row.get(2)?,
                    ip_address: row.get(3)?,
                    last_ping: row.get(4)?,
                    list_id: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::create_schema;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        create_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn upsert_creates_with_default_list() {
        let conn = setup();
        let row = ClientRepo::upsert(&conn, "tv2", "10.0.0.2").unwrap();
        assert_eq!(row.identifier, "tv2");
        assert_eq!(row.ip_address, "10.0.0.2");
        assert_eq!(row.list_id, DEFAULT_LIST_ID);
        assert!(!row.last_ping.is_empty());
    }

    #[test]
    fn upsert_is_idempotent() {
        let conn = setup();
        let _ = ClientRepo::upsert(&conn, "tv1", "10.0.0.1").unwrap();
        let row = ClientRepo::upsert(&conn, "tv1", "10.0.0.9").unwrap();
        assert_eq!(row.ip_address, "10.0.0.9");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM clients", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn find_by_identifier_or_alias() {
        let conn = setup();
        let _ = ClientRepo::upsert(&conn, "tv1", "10.0.0.1").unwrap();
        ClientRepo::set_alias(&conn, "tv1", "lobby").unwrap();

        let by_id = ClientRepo::find(&conn, "tv1").unwrap().unwrap();
        let by_alias = ClientRepo::find(&conn, "lobby").unwrap().unwrap();
        assert_eq!(by_id, by_alias);
        assert!(ClientRepo::find(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn alias_collision_with_other_identifier_is_refused() {
        let conn = setup();
        let _ = ClientRepo::upsert(&conn, "tv1", "10.0.0.1").unwrap();
        let _ = ClientRepo::upsert(&conn, "tv2", "10.0.0.2").unwrap();

        let err = ClientRepo::set_alias(&conn, "tv1", "tv2").unwrap_err();
        assert!(matches!(err, StoreError::AliasTaken(a) if a == "tv2"));
    }

    #[test]
    fn alias_collision_with_other_alias_is_refused() {
        let conn = setup();
        let _ = ClientRepo::upsert(&conn, "tv1", "10.0.0.1").unwrap();
        let _ = ClientRepo::upsert(&conn, "tv2", "10.0.0.2").unwrap();
        ClientRepo::set_alias(&conn, "tv1", "lobby").unwrap();

        let err = ClientRepo::set_alias(&conn, "tv2", "lobby").unwrap_err();
        assert!(matches!(err, StoreError::AliasTaken(_)));
    }

    #[test]
    fn reassigning_own_alias_is_allowed() {
        let conn = setup();
        let _ = ClientRepo::upsert(&conn, "tv1", "10.0.0.1").unwrap();
        ClientRepo::set_alias(&conn, "tv1", "lobby").unwrap();
        ClientRepo::set_alias(&conn, "tv1", "lobby").unwrap();
    }

    #[test]
    fn touch_updates_only_the_named_client() {
        let conn = setup();
        let a = ClientRepo::upsert(&conn, "tv1", "10.0.0.1").unwrap();
        let b = ClientRepo::upsert(&conn, "tv2", "10.0.0.2").unwrap();

        // Force a visibly older timestamp, then touch one client.
        conn.execute(
            "UPDATE clients SET last_ping = '2020-01-01T00:00:00+00:00'",
            [],
        )
        .unwrap();
        ClientRepo::touch(&conn, "tv1").unwrap();

        let a2 = ClientRepo::find(&conn, "tv1").unwrap().unwrap();
        let b2 = ClientRepo::find(&conn, "tv2").unwrap().unwrap();
        assert_ne!(a2.last_ping, "2020-01-01T00:00:00+00:00");
        assert_eq!(b2.last_ping, "2020-01-01T00:00:00+00:00");
        assert_eq!(a2.identifier, a.identifier);
        assert_eq!(b2.identifier, b.identifier);
    }

    #[test]
    fn touch_unknown_client_errors() {
        let conn = setup();
        assert!(matches!(
            ClientRepo::touch(&conn, "ghost"),
            Err(StoreError::ClientNotFound(_))
        ));
    }

    #[test]
    fn delete_removes_row() {
        let conn = setup();
        let _ = ClientRepo::upsert(&conn, "tv1", "10.0.0.1").unwrap();
        ClientRepo::delete(&conn, "tv1").unwrap();
        assert!(ClientRepo::find(&conn, "tv1").unwrap().is_none());
    }
}
