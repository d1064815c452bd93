//! Core abstractions for wheelpin.
//!
//! This crate provides the pieces shared by every index backend:
//!
//! - **Traits**: [`PackageIndex`], the seam between the upgrade pipeline and
//!   whatever serves package metadata
//! - **HTTP Cache**: read-through caching with bounded retry on transient failures
//! - **Error Types**: transport-level errors shared across crates

pub mod cache;
pub mod error;
pub mod registry;

// Re-export commonly used types
pub use cache::{CacheOptions, CachedResponse, HttpCache};
pub use error::{CoreError, Result};
pub use registry::PackageIndex;
