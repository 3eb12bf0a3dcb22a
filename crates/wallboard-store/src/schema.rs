//! `SQLite` schema and the reserved Default list.

use rusqlite::{Connection, params};

use crate::errors::Result;

/// Well-known id of the reserved Default list.
pub const DEFAULT_LIST_ID: i64 = 0;

/// Name of the reserved Default list. Resolves to the full URL catalog.
pub const DEFAULT_LIST_NAME: &str = "Default";

const SCHEMA: &str = "
CREATE TABLE urls (
    id  INTEGER PRIMARY KEY,
    url TEXT NOT NULL UNIQUE
);

CREATE TABLE lists (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE list_urls (
    list_id INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
    url_id  INTEGER NOT NULL REFERENCES urls(id) ON DELETE CASCADE,
    UNIQUE (list_id, url_id)
);

CREATE TABLE clients (
    id         INTEGER PRIMARY KEY,
    identifier TEXT NOT NULL UNIQUE,
    alias      TEXT UNIQUE,
    ip_address TEXT NOT NULL,
    last_ping  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    list_id    INTEGER NOT NULL DEFAULT 0 REFERENCES lists(id)
);
";

/// Create all tables and seed the Default list row.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    let _ = conn.execute(
        "INSERT INTO lists (id, name) VALUES (?1, ?2)",
        params![DEFAULT_LIST_ID, DEFAULT_LIST_NAME],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_and_seeds_default_list() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();

        let name: String = conn
            .query_row(
                "SELECT name FROM lists WHERE id = ?1",
                params![DEFAULT_LIST_ID],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(name, DEFAULT_LIST_NAME);
    }

    #[test]
    fn schema_is_not_reentrant() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        assert!(create_schema(&conn).is_err());
    }
}
