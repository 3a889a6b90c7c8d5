//! Named store management.
//!
//! A store is opened (created on first use), listed, and deleted wholesale.
//! Deleting a store removes its entries through the foreign key cascade.

use super::connection::CacheDb;
use super::entries::{Cache, EntryRow};
use super::hash::request_key;
use crate::Error;
use crate::http::{Request, Response};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Summary of one named store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Open the store called `name`, creating it if absent.
    pub async fn open_cache(&self, name: &str) -> Result<Cache, Error> {
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let created = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let n = conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(n)
            })
            .await
            .map_err(Error::from)?;

        if created > 0 {
            tracing::debug!(store = name, "created cache store");
        }

        Ok(Cache::new(self.clone(), name.to_string()))
    }

    /// Handle to the store called `name` without creating it.
    ///
    /// Lookups on a missing store find nothing; writes fail.
    pub fn cache(&self, name: &str) -> Cache {
        Cache::new(self.clone(), name.to_string())
    }

    /// Whether a store called `name` exists.
    pub async fn has_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| {
                conn.query_row("SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)", params![name], |row| {
                    row.get(0)
                })
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the store called `name` and all of its entries.
    ///
    /// Returns false if no such store existed.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every store, in creation order.
    pub async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Every store with its entry count, in creation order.
    pub async fn store_infos(&self) -> Result<Vec<StoreInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT c.name, c.created_at, COUNT(e.hash)
                     FROM caches c LEFT JOIN entries e ON e.cache_name = c.name
                     GROUP BY c.name
                     ORDER BY c.rowid",
                )?;
                let infos = stmt
                    .query_map([], |row| {
                        Ok(StoreInfo { name: row.get(0)?, created_at: row.get(1)?, entries: row.get::<_, i64>(2)? as u64 })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }

    /// Look `request` up across every store, oldest store first.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let hash = request_key(request, &self.key_headers);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM entries e JOIN caches c ON c.name = e.cache_name
                     WHERE e.hash = ?1 ORDER BY c.rowid LIMIT 1",
                    EntryRow::COLUMNS
                ))?;
                let mut rows = stmt.query_map(params![hash], EntryRow::from_row)?;
                Ok(rows.next().transpose()?)
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }
}
