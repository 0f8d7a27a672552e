//! # learnhub-storage
//!
//! Primary document store abstraction for the LearnHub server.
//!
//! The session and catalog layers never talk to a database directly; they go
//! through [`DocumentStore`], which exposes the five collection operations the
//! rest of the system relies on:
//!
//! - `find_by_id`
//! - `find`
//! - `create`
//! - `update_by_id`
//! - `delete_by_id`
//!
//! [`MemoryCollection`] is the in-process backend used by the server and by
//! tests.
//!
//! ## Example
//!
//! ```ignore
//! use learnhub_storage::{DocumentStore, MemoryCollection};
//!
//! let courses: MemoryCollection<Course> = MemoryCollection::new();
//! courses.create(course).await?;
//! let all = courses.find_all().await?;
//! ```

mod error;
mod memory;
mod traits;

pub use error::StorageError;
pub use memory::MemoryCollection;
pub use traits::{Document, DocumentStore, Predicate};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared, type-erased collection handle.
pub type DynCollection<D> = std::sync::Arc<dyn DocumentStore<D>>;
