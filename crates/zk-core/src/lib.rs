pub mod error;
pub mod validator;
pub mod request;
pub mod session;
pub mod presenter;
mod asset_format;
mod staged_file;

pub use asset_format::{looks_like_glb, AssetFormat, AssetReference, GLB_MAGIC};
pub use staged_file::StagedFile;
