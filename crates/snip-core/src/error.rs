use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("refusing to overwrite existing file {0}")]
    WouldOverwrite(String),

    #[error("path has no file name: {0}")]
    BadPath(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
