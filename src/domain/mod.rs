//! Domain models and types for Courier.
//!
//! This module contains the core domain models, types, and business rules
//! for the delta pipeline.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`Identity`], [`ProductId`], [`CompositeKey`])
//! - **Pipeline records** ([`RawRow`], [`CanonicalRecord`])
//! - **Dispatch payloads** ([`ConsolidatedProfile`], [`ItemSlot`])
//! - **Error types** ([`CourierError`], [`StorageError`], [`IngestError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Courier uses the newtype pattern for identifiers so an identity can never
//! stand in for a product id:
//!
//! ```
//! use courier::domain::{Identity, ProductId, CompositeKey};
//!
//! # fn example() -> Result<(), String> {
//! let identity = Identity::new("user-1001")?;
//! let product_id = ProductId::new("sku-42")?;
//! let key = CompositeKey::new(identity, product_id);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`](crate::domain::Result):
//!
//! ```no_run
//! use courier::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = courier::config::load_config("courier.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod profile;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{CourierError, IngestError, NormalizeError, StorageError};
pub use profile::{ConsolidatedProfile, ItemSlot};
pub use record::{CanonicalRecord, CompositeKey, Identity, ProductId, RawRow};
pub use result::Result;
