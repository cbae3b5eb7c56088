use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AttachmentError;

/// Binary-safe data attached to a snip, addressed by its own uuid.
///
/// `size` is persisted as its own field and is not re-derived from
/// `data.len()` on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub uuid: Uuid,
    pub snip_uuid: Uuid,
    pub timestamp: DateTime<FixedOffset>,
    pub name: String,
    pub data: Vec<u8>,
    pub size: u64,
}

impl Attachment {
    /// New empty attachment with a fresh uuid and the current time.
    ///
    /// `snip_uuid` stays nil until the caller assigns an owner.
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            snip_uuid: Uuid::nil(),
            timestamp: Utc::now().fixed_offset(),
            name: String::new(),
            data: Vec::new(),
            size: 0,
        }
    }

    /// Build an attachment from a file on disk, owned by `snip_uuid`.
    ///
    /// The display name is the path's basename and `size` the byte length
    /// of the file contents.
    pub fn from_file(snip_uuid: Uuid, path: &Path) -> Result<Self, AttachmentError> {
        let name = path
            .file_name()
            .ok_or_else(|| AttachmentError::BadPath(path.display().to_string()))?
            .to_string_lossy()
            .to_string();
        let data = std::fs::read(path)?;
        let size = data.len() as u64;

        let mut a = Attachment::new();
        a.snip_uuid = snip_uuid;
        a.name = name;
        a.data = data;
        a.size = size;
        Ok(a)
    }

    /// Write the payload to `path`, refusing to overwrite an existing file.
    pub fn write_to(&self, path: &Path) -> Result<(), AttachmentError> {
        if path.exists() {
            return Err(AttachmentError::WouldOverwrite(
                path.display().to_string(),
            ));
        }
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

impl Default for Attachment {
    fn default() -> Self {
        Self::new()
    }
}
