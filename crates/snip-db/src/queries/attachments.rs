use std::path::Path;

use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Row};
use tracing::debug;
use uuid::Uuid;

use snip_core::Attachment;

use crate::{Db, DbError};

// size and timestamp live in TEXT columns; all text-to-type conversion
// happens here, at the storage boundary, and nowhere above it.

fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::try_parse(s).map_err(|e| DbError::Decode(format!("uuid {s:?}: {e}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, DbError> {
    DateTime::parse_from_rfc3339(s).map_err(|e| DbError::Decode(format!("timestamp {s:?}: {e}")))
}

fn parse_size(s: &str) -> Result<u64, DbError> {
    s.parse().map_err(|e| DbError::Decode(format!("size {s:?}: {e}")))
}

/// Decode a full row (uuid, snip_uuid, timestamp, name, size, data) into an
/// Attachment. A malformed stored field fails the whole record; no partially
/// trusted value is ever returned.
fn decode_attachment(row: &Row) -> Result<Attachment, DbError> {
    let uuid: String = row.get("uuid")?;
    let snip_uuid: String = row.get("snip_uuid")?;
    let timestamp: String = row.get("timestamp")?;
    let name: String = row.get("name")?;
    let size: String = row.get("size")?;
    let data: Vec<u8> = row.get("data")?;

    Ok(Attachment {
        uuid: parse_uuid(&uuid)?,
        snip_uuid: parse_uuid(&snip_uuid)?,
        timestamp: parse_timestamp(&timestamp)?,
        name,
        size: parse_size(&size)?,
        data,
    })
}

impl Db {
    /// Persist a fully populated attachment. `size` is stored as given, not
    /// recomputed from the payload.
    pub fn insert_attachment(&self, a: &Attachment) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO attachments (uuid, snip_uuid, timestamp, name, size, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    a.uuid.to_string(),
                    a.snip_uuid.to_string(),
                    a.timestamp.to_rfc3339(),
                    a.name,
                    a.size.to_string(),
                    a.data,
                ],
            )?;
            debug!(uuid = %a.uuid, size = a.size, "inserted attachment");
            Ok(())
        })
    }

    /// Read a file from disk and attach it to `snip_uuid`, returning the
    /// stored attachment.
    pub fn add_attachment_from_file(
        &self,
        snip_uuid: Uuid,
        path: &Path,
    ) -> Result<Attachment, DbError> {
        let a = Attachment::from_file(snip_uuid, path)?;
        self.insert_attachment(&a)?;
        Ok(a)
    }

    /// Resolve a partial identifier to the single attachment whose uuid
    /// contains it, payload included.
    ///
    /// Matching is substring, not prefix. Zero matches fail with NotFound;
    /// a second match aborts row iteration and fails with Ambiguous so the
    /// caller can prompt for a longer partial.
    pub fn get_attachment(&self, id_partial: &str) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let pattern = format!("%{id_partial}%");
            let mut stmt = conn.prepare(
                "SELECT uuid, snip_uuid, timestamp, name, size, data
                 FROM attachments WHERE uuid LIKE ?1 LIMIT 2",
            )?;
            let mut rows = stmt.query(params![pattern])?;

            let mut found: Option<Attachment> = None;
            while let Some(row) = rows.next()? {
                if found.is_some() {
                    return Err(DbError::Ambiguous(format!(
                        "partial '{id_partial}' matches multiple attachment uuids"
                    )));
                }
                found = Some(decode_attachment(row)?);
            }
            found.ok_or_else(|| {
                DbError::NotFound(format!("no attachment uuid matches partial '{id_partial}'"))
            })
        })
    }

    /// Resolve a partial identifier to the single matching uuid without
    /// touching the payload column.
    pub fn search_attachment_uuid(&self, id_partial: &str) -> Result<Uuid, DbError> {
        self.with_conn(|conn| {
            let pattern = format!("%{id_partial}%");
            let mut stmt =
                conn.prepare("SELECT uuid FROM attachments WHERE uuid LIKE ?1 LIMIT 2")?;
            let mut rows = stmt.query(params![pattern])?;

            let mut found: Option<String> = None;
            while let Some(row) = rows.next()? {
                if found.is_some() {
                    return Err(DbError::Ambiguous(format!(
                        "partial '{id_partial}' matches multiple attachment uuids"
                    )));
                }
                found = Some(row.get(0)?);
            }
            match found {
                Some(s) => parse_uuid(&s),
                None => Err(DbError::NotFound(format!(
                    "no attachment uuid matches partial '{id_partial}'"
                ))),
            }
        })
    }

    /// Fetch every field except the payload; `data` comes back empty.
    ///
    /// The payload column is never named in the query, so listing and
    /// statistics callers can walk large attachments without loading them.
    /// Cardinality must still be exactly one: a duplicated uuid is surfaced
    /// as Ambiguous rather than picking a row.
    pub fn get_attachment_metadata(&self, id: &Uuid) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT snip_uuid, timestamp, name, size
                 FROM attachments WHERE uuid = ?1 LIMIT 2",
            )?;
            let mut rows = stmt.query(params![id.to_string()])?;

            let mut found: Option<Attachment> = None;
            while let Some(row) = rows.next()? {
                if found.is_some() {
                    return Err(DbError::Ambiguous(format!(
                        "uuid {id} matches multiple attachment rows"
                    )));
                }
                let snip_uuid: String = row.get("snip_uuid")?;
                let timestamp: String = row.get("timestamp")?;
                let name: String = row.get("name")?;
                let size: String = row.get("size")?;
                found = Some(Attachment {
                    uuid: *id,
                    snip_uuid: parse_uuid(&snip_uuid)?,
                    timestamp: parse_timestamp(&timestamp)?,
                    name,
                    size: parse_size(&size)?,
                    data: Vec::new(),
                });
            }
            found.ok_or_else(|| DbError::NotFound(format!("attachment {id}")))
        })
    }

    /// All attachment uuids, for listing and statistics.
    pub fn list_attachment_ids(&self) -> Result<Vec<Uuid>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT uuid FROM attachments")?;
            let mut rows = stmt.query([])?;

            let mut ids = Vec::new();
            while let Some(row) = rows.next()? {
                let s: String = row.get(0)?;
                ids.push(parse_uuid(&s)?);
            }
            Ok(ids)
        })
    }

    /// Remove exactly one attachment, never more, never silently zero.
    ///
    /// Existence and uniqueness are verified before the delete is issued:
    /// zero rows fail with NotFound, more than one with Ambiguous, and in
    /// both cases the store is left untouched.
    pub fn remove_attachment(&self, id: &Uuid) -> Result<(), DbError> {
        self.with_conn(|conn| {
            // LIMIT 2 is enough to tell 0, 1, and >1 apart without a scan.
            let mut stmt =
                conn.prepare("SELECT uuid FROM attachments WHERE uuid = ?1 LIMIT 2")?;
            let mut rows = stmt.query(params![id.to_string()])?;

            let mut matched = 0usize;
            while rows.next()?.is_some() {
                matched += 1;
            }
            match matched {
                0 => return Err(DbError::NotFound(format!("attachment {id}"))),
                1 => {}
                _ => {
                    return Err(DbError::Ambiguous(format!(
                        "uuid {id} matches multiple attachment rows"
                    )))
                }
            }

            conn.execute(
                "DELETE FROM attachments WHERE uuid = ?1",
                params![id.to_string()],
            )?;
            debug!(uuid = %id, "removed attachment");
            Ok(())
        })
    }
}
