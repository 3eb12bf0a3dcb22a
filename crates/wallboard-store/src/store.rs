//! Pooled high-level `Store` API composing the repositories.
//!
//! `Store` is cheap to clone (it wraps an `r2d2` pool) and safe for
//! concurrent use: each client-scoped mutation is a single statement, so
//! sessions never need cross-session transactions. The one multi-statement
//! operation, list deletion, runs in its own transaction.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::errors::Result;
use crate::repositories::{ClientRepo, ClientRow, ListRepo, ListRow, UrlRepo};
use crate::schema;

/// Handle to the resolution store.
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
}

impl Store {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(8).build(manager)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Create the schema and seed the Default list. One-shot, at install.
    pub fn create_schema(&self) -> Result<()> {
        schema::create_schema(&*self.conn()?)
    }

    // ── clients ─────────────────────────────────────────────────────────

    /// Insert-or-refresh a client record at registration time.
    pub fn upsert_client(&self, identifier: &str, ip_address: &str) -> Result<ClientRow> {
        ClientRepo::upsert(&*self.conn()?, identifier, ip_address)
    }

    /// Look up a client by identifier or alias.
    pub fn find_client(&self, name: &str) -> Result<Option<ClientRow>> {
        ClientRepo::find(&*self.conn()?, name)
    }

    /// Refresh a client's last-ping timestamp.
    pub fn touch_client(&self, name: &str) -> Result<()> {
        ClientRepo::touch(&*self.conn()?, name)
    }

    /// Update a client's recorded IP address.
    pub fn set_client_ip(&self, name: &str, ip_address: &str) -> Result<()> {
        ClientRepo::set_ip(&*self.conn()?, name, ip_address)
    }

    /// Give a client a human alias (unique across identifiers and aliases).
    pub fn set_client_alias(&self, identifier: &str, alias: &str) -> Result<()> {
        ClientRepo::set_alias(&*self.conn()?, identifier, alias)
    }

    /// Assign a client to a list by list name.
    pub fn assign_client_to_list(&self, name: &str, list_name: &str) -> Result<()> {
        let conn = self.conn()?;
        let list = ListRepo::find_by_name(&conn, list_name)?
            .ok_or_else(|| crate::errors::StoreError::ListNotFound(list_name.into()))?;
        ClientRepo::assign_list(&conn, name, list.id)
    }

    /// Move a client back to the Default list.
    pub fn unassign_client(&self, name: &str) -> Result<()> {
        ClientRepo::reset_list(&*self.conn()?, name)
    }

    /// Delete a client record.
    pub fn delete_client(&self, name: &str) -> Result<()> {
        ClientRepo::delete(&*self.conn()?, name)
    }

    /// All client records.
    pub fn clients(&self) -> Result<Vec<ClientRow>> {
        ClientRepo::list(&*self.conn()?)
    }

    // ── urls ────────────────────────────────────────────────────────────

    /// Add a URL to the catalog.
    pub fn add_url(&self, url: &str) -> Result<i64> {
        UrlRepo::insert(&*self.conn()?, url)
    }

    /// Remove a URL from the catalog and every list.
    pub fn delete_url(&self, url: &str) -> Result<()> {
        UrlRepo::delete(&*self.conn()?, url)
    }

    /// The full URL catalog in storage order.
    pub fn urls(&self) -> Result<Vec<String>> {
        UrlRepo::list(&*self.conn()?)
    }

    // ── lists ───────────────────────────────────────────────────────────

    /// Create a named list.
    pub fn add_list(&self, name: &str) -> Result<i64> {
        ListRepo::insert(&*self.conn()?, name)
    }

    /// Delete a list: clients fall back to Default, memberships cascade.
    pub fn delete_list(&self, name: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        ListRepo::delete(&tx, name)?;
        tx.commit()?;
        Ok(())
    }

    /// Look up a list by name.
    pub fn find_list(&self, name: &str) -> Result<Option<ListRow>> {
        ListRepo::find_by_name(&*self.conn()?, name)
    }

    /// All lists.
    pub fn lists(&self) -> Result<Vec<ListRow>> {
        ListRepo::list(&*self.conn()?)
    }

    /// Put a URL on a list.
    pub fn assign_url_to_list(&self, list_name: &str, url: &str) -> Result<()> {
        ListRepo::assign_url(&*self.conn()?, list_name, url)
    }

    /// Take a URL off a list.
    pub fn unassign_url_from_list(&self, list_name: &str, url: &str) -> Result<()> {
        ListRepo::unassign_url(&*self.conn()?, list_name, url)
    }

    /// Member URLs of a list by name.
    pub fn list_urls(&self, list_name: &str) -> Result<Vec<String>> {
        ListRepo::urls_for_name(&*self.conn()?, list_name)
    }

    /// Member URLs of a list by id.
    pub(crate) fn list_urls_by_id(&self, list_id: i64) -> Result<Vec<String>> {
        ListRepo::urls_for_id(&*self.conn()?, list_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("wallboard.db")).unwrap();
        store.create_schema().unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_usable_database() {
        let (_dir, store) = make_store();
        assert!(store.urls().unwrap().is_empty());
        assert_eq!(store.lists().unwrap().len(), 1);
    }

    #[test]
    fn store_is_cloneable_and_shares_data() {
        let (_dir, store) = make_store();
        let other = store.clone();
        let _ = store.add_url("http://a").unwrap();
        assert_eq!(other.urls().unwrap(), vec!["http://a"]);
    }

    #[test]
    fn assign_client_by_list_name() {
        let (_dir, store) = make_store();
        let _ = store.upsert_client("tv1", "10.0.0.1").unwrap();
        let id = store.add_list("News").unwrap();

        store.assign_client_to_list("tv1", "News").unwrap();
        assert_eq!(store.find_client("tv1").unwrap().unwrap().list_id, id);

        store.unassign_client("tv1").unwrap();
        assert_eq!(
            store.find_client("tv1").unwrap().unwrap().list_id,
            crate::DEFAULT_LIST_ID
        );
    }

    #[test]
    fn delete_list_is_transactional_end_to_end() {
        let (_dir, store) = make_store();
        let _ = store.add_url("http://b").unwrap();
        let _ = store.add_list("News").unwrap();
        store.assign_url_to_list("News", "http://b").unwrap();
        let _ = store.upsert_client("tv1", "10.0.0.1").unwrap();
        store.assign_client_to_list("tv1", "News").unwrap();

        store.delete_list("News").unwrap();
        assert!(store.find_list("News").unwrap().is_none());
        assert_eq!(
            store.find_client("tv1").unwrap().unwrap().list_id,
            crate::DEFAULT_LIST_ID
        );
    }
}
