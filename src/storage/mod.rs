//! File-system collaborators: upload persistence and static assets.

pub mod assets;
pub mod upload;

pub use assets::StaticAssets;
pub use upload::{StoredImage, UploadError, UploadStore};
