//! # learnhub-catalog
//!
//! Course catalog reads through a shared cache, and the write protocol that
//! keeps the cache honest.
//!
//! ## Cache Layout
//!
//! | Key | Payload | TTL |
//! |-----|---------|-----|
//! | `course:<id>` | [`CachedCourse`] | `cache.resource_ttl` (7 days) |
//! | `allCourses` | [`CachedCourseList`] | none |
//!
//! Cached payloads carry the public view of a course. Protected section
//! content is read from the document store on every request.
//!
//! Payloads are MessagePack inside a versioned envelope. A payload that does
//! not decode is reported as [`CacheError::Decode`], dropped, and re-read from
//! the document store.
//!
//! ## Write Protocol
//!
//! [`CourseService`] commits every write to the document store first and
//! then invalidates both the course key and the aggregate key. That covers
//! create, edit and delete as well as questions, answers, reviews, replies
//! and purchases, which all bump `updated_at` in the listing. Invalidation
//! retries with exponential backoff; keys that still fail are parked in
//! [`PendingInvalidations`] and retried by the background
//! [`ReconciliationSweep`]. Writes that bypass the service are not covered:
//! the aggregate key has no TTL and stays stale until the next invalidation.

mod cache;
mod config;
mod content;
mod course;
mod error;
mod invalidation;
mod keys;
mod schema;
mod service;

#[cfg(test)]
mod test_support;

pub use cache::{CacheStats, CatalogCache};
pub use config::{CacheConfig, ReconciliationConfig};
pub use content::{
    Author, CourseSection, Link, MAX_RATING, Question, Reply, Review, SectionInput, average_rating,
};
pub use course::{Course, CourseInput};
pub use error::{CacheError, CatalogError};
pub use invalidation::{
    InvalidationReport, Invalidator, PendingInvalidations, PendingMark, ReconciliationSweep,
    RetryPolicy, SweepReport,
};
pub use keys::{AGGREGATE_KEY, CacheKey};
pub use schema::{CachePayload, CachedCourse, CachedCourseList};
pub use service::CourseService;

/// Type alias for catalog results.
pub type CatalogResult<T> = Result<T, CatalogError>;
