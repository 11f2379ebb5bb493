//! Object storage adapter
//!
//! Narrow interfaces over the bucket store holding event exports and delta
//! artifacts, plus the CSV codec used for both.

pub mod csv;
pub mod s3;
pub mod traits;

pub use s3::S3ObjectStore;
pub use traits::{ObjectInfo, ObjectStore};
