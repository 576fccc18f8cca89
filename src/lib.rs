pub mod asset;
pub mod error;
pub mod manifest;
pub mod resolve;
pub mod store;
pub mod version;
