pub mod attachment;
pub mod error;

pub use attachment::Attachment;
pub use error::AttachmentError;
