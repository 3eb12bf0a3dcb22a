//! URL repository — the global URL catalog.
//!
//! Deleting a URL cascades out of every list membership via the
//! `list_urls` foreign keys.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{Result, StoreError};

/// URL repository — stateless, every method takes `&Connection`.
pub struct UrlRepo;

impl UrlRepo {
    /// Add a URL to the catalog. Returns its row id.
    pub fn insert(conn: &Connection, url: &str) -> Result<i64> {
        let _ = conn.execute("INSERT INTO urls (url) VALUES (?1)", params![url])?;
        Ok(conn.last_insert_rowid())
    }

    /// Remove a URL from the catalog (and, by cascade, from every list).
    pub fn delete(conn: &Connection, url: &str) -> Result<()> {
        let n = conn.execute("DELETE FROM urls WHERE url = ?1", params![url])?;
        if n == 0 {
            return Err(StoreError::UrlNotFound(url.into()));
        }
        Ok(())
    }

    /// Row id for a URL, if present.
    pub fn find_id(conn: &Connection, url: &str) -> Result<Option<i64>> {
        let id = conn
            .query_row("SELECT id FROM urls WHERE url = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(id)
    }

    /// The full catalog in storage order.
    pub fn list(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT url FROM urls ORDER BY id")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(urls)
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
    fn insert_and_list_keep_storage_order() {
        let conn = setup();
        let _ = UrlRepo::insert(&conn, "http://a").unwrap();
        let _ = UrlRepo::insert(&conn, "http://b").unwrap();
        assert_eq!(UrlRepo::list(&conn).unwrap(), vec!["http://a", "http://b"]);
    }

    #[test]
    fn duplicate_url_is_refused() {
        let conn = setup();
        let _ = UrlRepo::insert(&conn, "http://a").unwrap();
        assert!(UrlRepo::insert(&conn, "http://a").is_err());
    }

    #[test]
    fn add_then_delete_restores_catalog() {
        let conn = setup();
        let _ = UrlRepo::insert(&conn, "http://a").unwrap();
        let before = UrlRepo::list(&conn).unwrap();

        let _ = UrlRepo::insert(&conn, "http://b").unwrap();
        UrlRepo::delete(&conn, "http://b").unwrap();
        assert_eq!(UrlRepo::list(&conn).unwrap(), before);
    }

    #[test]
    fn delete_unknown_url_errors() {
        let conn = setup();
        assert!(matches!(
            UrlRepo::delete(&conn, "http://ghost"),
            Err(StoreError::UrlNotFound(_))
        ));
    }
}
