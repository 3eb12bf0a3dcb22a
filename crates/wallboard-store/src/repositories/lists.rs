//! List repository — named URL lists and their memberships.
//!
//! The Default list (id 0) is reserved: it is never deleted and carries no
//! explicit memberships — it stands for the full catalog.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{Result, StoreError};
use crate::repositories::urls::UrlRepo;
use crate::schema::{DEFAULT_LIST_ID, DEFAULT_LIST_NAME};

/// One row of the `lists` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: i64,
    pub name: String,
}

/// List repository — stateless, every method takes `&Connection`.
pub struct ListRepo;

impl ListRepo {
    /// Create a list. Returns its row id.
    pub fn insert(conn: &Connection, name: &str) -> Result<i64> {
        let _ = conn.execute("INSERT INTO lists (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    /// Delete a list by name.
    ///
    /// Refuses the Default list. Clients assigned to the list are moved
    /// back to Default first so no client ever dangles; memberships go by
    /// foreign-key cascade. Run inside a transaction.
    pub fn delete(conn: &Connection, name: &str) -> Result<()> {
        if name == DEFAULT_LIST_NAME {
            return Err(StoreError::ReservedList);
        }
        let list =
            Self::find_by_name(conn, name)?.ok_or_else(|| StoreError::ListNotFound(name.into()))?;

        let _ = conn.execute(
            "UPDATE clients SET list_id = ?1 WHERE list_id = ?2",
            params![DEFAULT_LIST_ID, list.id],
        )?;
        let _ = conn.execute("DELETE FROM lists WHERE id = ?1", params![list.id])?;
        Ok(())
    }

    /// Look up a list by name.
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<ListRow>> {
        let row = conn
            .query_row(
                "SELECT id, name FROM lists WHERE name = ?1",
                params![name],
                |row| {
                    Ok(ListRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// All lists, Default first.
    pub fn list(conn: &Connection) -> Result<Vec<ListRow>> {
        let mut stmt = conn.prepare("SELECT id, name FROM lists ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ListRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Put a URL on a list, by list name and URL text.
    pub fn assign_url(conn: &Connection, name: &str, url: &str) -> Result<()> {
        let list =
            Self::find_by_name(conn, name)?.ok_or_else(|| StoreError::ListNotFound(name.into()))?;
        let url_id =
            UrlRepo::find_id(conn, url)?.ok_or_else(|| StoreError::UrlNotFound(url.into()))?;
        let _ = conn.execute(
            "INSERT INTO list_urls (list_id, url_id) VALUES (?1, ?2)",
            params![list.id, url_id],
        )?;
        Ok(())
    }

    /// Take a URL off a list.
    pub fn unassign_url(conn: &Connection, name: &str, url: &str) -> Result<()> {
        let list =
            Self::find_by_name(conn, name)?.ok_or_else(|| StoreError::ListNotFound(name.into()))?;
        let url_id =
            UrlRepo::find_id(conn, url)?.ok_or_else(|| StoreError::UrlNotFound(url.into()))?;
        let _ = conn.execute(
            "DELETE FROM list_urls WHERE list_id = ?1 AND url_id = ?2",
            params![list.id, url_id],
        )?;
        Ok(())
    }

    /// Member URLs of a list by id, in storage order.
    pub fn urls_for_id(conn: &Connection, list_id: i64) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT urls.url FROM urls
             INNER JOIN list_urls ON list_urls.url_id = urls.id
             WHERE list_urls.list_id = ?1
             ORDER BY urls.id",
        )?;
        let urls = stmt
            .query_map(params![list_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(urls)
    }

    /// Member URLs of a list by name.
    pub fn urls_for_name(conn: &Connection, name: &str) -> Result<Vec<String>> {
        let list =
            Self::find_by_name(conn, name)?.ok_or_else(|| StoreError::ListNotFound(name.into()))?;
        Self::urls_for_id(conn, list.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::clients::ClientRepo;
    use crate::schema::create_schema;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        create_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_find_delete() {
        let conn = setup();
        let id = ListRepo::insert(&conn, "News").unwrap();
        let row = ListRepo::find_by_name(&conn, "News").unwrap().unwrap();
        assert_eq!(row.id, id);

        ListRepo::delete(&conn, "News").unwrap();
        assert!(ListRepo::find_by_name(&conn, "News").unwrap().is_none());
    }

    #[test]
    fn default_list_cannot_be_deleted() {
        let conn = setup();
        assert!(matches!(
            ListRepo::delete(&conn, DEFAULT_LIST_NAME),
            Err(StoreError::ReservedList)
        ));
    }

    #[test]
    fn membership_round_trip() {
        let conn = setup();
        let _ = UrlRepo::insert(&conn, "http://a").unwrap();
        let _ = UrlRepo::insert(&conn, "http://b").unwrap();
        let _ = ListRepo::insert(&conn, "News").unwrap();

        ListRepo::assign_url(&conn, "News", "http://b").unwrap();
        assert_eq!(
            ListRepo::urls_for_name(&conn, "News").unwrap(),
            vec!["http://b"]
        );

        ListRepo::unassign_url(&conn, "News", "http://b").unwrap();
        assert!(ListRepo::urls_for_name(&conn, "News").unwrap().is_empty());
    }

    #[test]
    fn deleting_url_cascades_out_of_memberships() {
        let conn = setup();
        let _ = UrlRepo::insert(&conn, "http://b").unwrap();
        let _ = ListRepo::insert(&conn, "News").unwrap();
        ListRepo::assign_url(&conn, "News", "http://b").unwrap();

        UrlRepo::delete(&conn, "http://b").unwrap();
        assert!(ListRepo::urls_for_name(&conn, "News").unwrap().is_empty());
    }

    #[test]
    fn deleting_list_reassigns_clients_to_default() {
        let conn = setup();
        let id = ListRepo::insert(&conn, "News").unwrap();
        let _ = ClientRepo::upsert(&conn, "tv1", "10.0.0.1").unwrap();
        ClientRepo::assign_list(&conn, "tv1", id).unwrap();

        ListRepo::delete(&conn, "News").unwrap();
        let row = ClientRepo::find(&conn, "tv1").unwrap().unwrap();
        assert_eq!(row.list_id, DEFAULT_LIST_ID);
    }

    #[test]
    fn deleting_list_leaves_other_lists_intact() {
        let conn = setup();
        let _ = UrlRepo::insert(&conn, "http://a").unwrap();
        let _ = ListRepo::insert(&conn, "News").unwrap();
        let _ = ListRepo::insert(&conn, "Dash").unwrap();
        ListRepo::assign_url(&conn, "Dash", "http://a").unwrap();

        ListRepo::delete(&conn, "News").unwrap();
        assert_eq!(
            ListRepo::urls_for_name(&conn, "Dash").unwrap(),
            vec!["http://a"]
        );
    }

    #[test]
    fn assign_to_unknown_list_errors() {
        let conn = setup();
        let _ = UrlRepo::insert(&conn, "http://a").unwrap();
        assert!(matches!(
            ListRepo::assign_url(&conn, "Ghost", "http://a"),
            Err(StoreError::ListNotFound(_))
        ));
    }
}
