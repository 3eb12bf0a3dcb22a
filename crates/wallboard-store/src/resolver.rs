//! URL resolution — client identity to effective URL set.
//!
//! Resolution is total: whatever goes wrong, the caller gets a URL set.
//! A personalized-but-broken assignment must never blank a screen, so every
//! failure and every empty personalized set degrades to the full catalog,
//! and the degradation is logged instead of surfaced.

use tracing::{debug, warn};

use crate::errors::Result;
use crate::schema::DEFAULT_LIST_ID;
use crate::store::Store;

impl Store {
    /// Resolve the URL set a terminal should display.
    ///
    /// Unknown or anonymous identifiers, Default assignments, empty
    /// personalized lists, and lookup failures all yield the full catalog.
    /// Only a failing catalog query yields an empty set (and a warning).
    pub fn resolve_urls(&self, identifier: &str) -> Vec<String> {
        match self.try_resolve(identifier) {
            Ok(urls) => urls,
            Err(e) => {
                warn!(client = %identifier, error = %e, "resolution failed, falling back to catalog");
                self.catalog_or_empty(identifier)
            }
        }
    }

    fn try_resolve(&self, identifier: &str) -> Result<Vec<String>> {
        let Some(client) = self.find_client(identifier)? else {
            debug!(client = %identifier, "unknown client, serving full catalog");
            return self.urls();
        };

        if client.list_id == DEFAULT_LIST_ID {
            return self.urls();
        }

        let urls = self.list_urls_by_id(client.list_id)?;
        if urls.is_empty() {
            debug!(client = %identifier, list_id = client.list_id, "assigned list is empty, serving full catalog");
            return self.urls();
        }
        Ok(urls)
    }

    fn catalog_or_empty(&self, identifier: &str) -> Vec<String> {
        match self.urls() {
            Ok(urls) => urls,
            Err(e) => {
                warn!(client = %identifier, error = %e, "catalog query failed, serving empty set");
                Vec::new()
            }
        }
    }
}
