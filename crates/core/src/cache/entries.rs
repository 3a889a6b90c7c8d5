//! Entry operations on a single named store.
//!
//! Responses are stored verbatim: status, reason phrase, headers in their
//! original order, body bytes, response type and final URL.

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use crate::http::{Request, Response, ResponseType};
use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};
use url::Url;

/// Handle to one named store.
///
/// Holding a handle does not keep the store alive: once the store is
/// deleted, writes through the handle fail with a database error.
#[derive(Debug, Clone)]
pub struct Cache {
    db: CacheDb,
    name: String,
}

/// Identity of a stored entry, as listed by [`Cache::keys`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CachedRequest {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub stored_at: String,
}

/// Raw entry columns, decoded into a [`Response`] outside the DB thread.
#[derive(Debug)]
pub(crate) struct EntryRow {
    status: i64,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    response_type: String,
    response_url: Option<String>,
}

impl EntryRow {
    pub(crate) const COLUMNS: &'static str = "status, status_text, headers_json, body, response_type, response_url";

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            status: row.get(0)?,
            status_text: row.get(1)?,
            headers_json: row.get(2)?,
            body: row.get(3)?,
            response_type: row.get(4)?,
            response_url: row.get(5)?,
        })
    }

    pub(crate) fn into_response(self) -> Result<Response, Error> {
        let status = u16::try_from(self.status).map_err(|_| Error::CorruptEntry(format!("status {}", self.status)))?;
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
        let url = self
            .response_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| Error::CorruptEntry(format!("response url: {e}")))?;

        Ok(Response {
            status,
            status_text: self.status_text,
            headers,
            body: Bytes::from(self.body),
            response_type: self.response_type.parse()?,
            url,
        })
    }
}

/// Entry ready to be written, built on the caller's thread.
struct NewEntry {
    hash: String,
    method: String,
    url: String,
    status: i64,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    response_type: &'static str,
    response_url: Option<String>,
}

impl NewEntry {
    fn build(request: &Request, response: &Response, key_headers: &[String]) -> Result<Self, Error> {
        let mut url = request.url.clone();
        url.set_fragment(None);
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(format!("headers: {e}")))?;

        Ok(Self {
            hash: request_key(request, key_headers),
            method: request.method.as_str().to_string(),
            url: url.to_string(),
            status: i64::from(response.status),
            status_text: response.status_text.clone(),
            headers_json,
            body: response.body.to_vec(),
            response_type: response.response_type.as_str(),
            response_url: response.url.as_ref().map(Url::to_string),
        })
    }

    fn upsert(&self, conn: &rusqlite::Connection, cache_name: &str, stored_at: &str) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO entries (
                cache_name, hash, method, url, status, status_text,
                headers_json, body, response_type, response_url, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(cache_name, hash) DO UPDATE SET
                method = excluded.method,
                url = excluded.url,
                status = excluded.status,
                status_text = excluded.status_text,
                headers_json = excluded.headers_json,
                body = excluded.body,
                response_type = excluded.response_type,
                response_url = excluded.response_url,
                stored_at = excluded.stored_at",
            params![
                cache_name,
                &self.hash,
                &self.method,
                &self.url,
                self.status,
                &self.status_text,
                &self.headers_json,
                &self.body,
                self.response_type,
                &self.response_url,
                stored_at,
            ],
        )
    }
}

impl Cache {
    pub(crate) fn new(db: CacheDb, name: String) -> Self {
        Self { db, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored response for `request`, if any.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let hash = request_key(request, &self.db.key_headers);
        let name = self.name.clone();
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    &format!("SELECT {} FROM entries WHERE cache_name = ?1 AND hash = ?2", EntryRow::COLUMNS),
                    params![name, hash],
                    EntryRow::from_row,
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }

    /// Store `response` under the identity of `request`, replacing any previous entry.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let entry = NewEntry::build(request, response, &self.db.key_headers)?;
        let name = self.name.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                entry.upsert(conn, &name, &stored_at)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store every pair in one transaction: either all entries land or none do.
    ///
    /// Returns the number of entries written.
    pub async fn put_all(&self, pairs: &[(Request, Response)]) -> Result<usize, Error> {
        let entries = pairs
            .iter()
            .map(|(req, resp)| NewEntry::build(req, resp, &self.db.key_headers))
            .collect::<Result<Vec<_>, _>>()?;
        let name = self.name.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                for entry in &entries {
                    entry.upsert(&tx, &name, &stored_at)?;
                }
                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for `request`. Returns false if there was none.
    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let hash = request_key(request, &self.db.key_headers);
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let n = conn.execute("DELETE FROM entries WHERE cache_name = ?1 AND hash = ?2", params![name, hash])?;
                Ok(n > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Identities of every entry, in insertion order.
    pub async fn keys(&self) -> Result<Vec<CachedRequest>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<CachedRequest>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, stored_at FROM entries WHERE cache_name = ?1 ORDER BY rowid",
                )?;
                let keys = stmt
                    .query_map(params![name], |row| {
                        Ok(CachedRequest {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get(2)?,
                            stored_at: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn len(&self) -> Result<u64, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| {
                conn.query_row("SELECT COUNT(*) FROM entries WHERE cache_name = ?1", params![name], |row| {
                    row.get::<_, i64>(0)
                })
            })
            .await
            .map(|n| n as u64)
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}
