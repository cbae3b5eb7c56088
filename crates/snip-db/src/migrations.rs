use rusqlite::Connection;

use crate::DbError;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    // Idempotent CREATE TABLE IF NOT EXISTS batch. Attachment uuids carry no
    // UNIQUE constraint; uniqueness is enforced by the query layer's
    // cardinality checks so that a corrupted store surfaces as an error
    // instead of failing at insert time.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS snips (
            uuid      TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            name      TEXT NOT NULL DEFAULT '',
            data      TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS attachments (
            uuid      TEXT NOT NULL,
            snip_uuid TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            name      TEXT NOT NULL DEFAULT '',
            size      TEXT NOT NULL,
            data      BLOB NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_attachments_uuid ON attachments(uuid);
        CREATE INDEX IF NOT EXISTS idx_attachments_snip ON attachments(snip_uuid);
        ",
    )?;
    Ok(())
}
