//! Versioned cache payloads.
//!
//! Every cached value is a MessagePack map
//! `{schema: <name>, version: <n>, payload: <T>}`. The header is decoded
//! first so an entry written by another schema or version is rejected with
//! [`CacheError::Decode`] before the payload is touched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::content::{CourseSection, Review};
use crate::{CacheError, Course};

/// A type that can be stored in the catalog cache.
pub trait CachePayload: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Schema name written into the envelope.
    const SCHEMA: &'static str;
    /// Schema version. Bump it whenever the encoded shape changes.
    const VERSION: u16;
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    schema: String,
    version: u16,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    schema: &'static str,
    version: u16,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    payload: T,
}

/// Encodes `payload` for `key`.
///
/// # Errors
///
/// Returns `CacheError::Encode` if serialization fails.
pub fn encode<T: CachePayload>(key: &str, payload: &T) -> Result<Vec<u8>, CacheError> {
    let envelope = EnvelopeRef {
        schema: T::SCHEMA,
        version: T::VERSION,
        payload,
    };
    rmp_serde::to_vec_named(&envelope).map_err(|e| CacheError::encode(key, e.to_string()))
}

/// Decodes a value stored under `key`.
///
/// # Errors
///
/// Returns `CacheError::Decode` if the bytes are not an envelope, carry
/// another schema or version, or the payload does not match `T`.
pub fn decode<T: CachePayload>(key: &str, bytes: &[u8]) -> Result<T, CacheError> {
    let header: EnvelopeHeader =
        rmp_serde::from_slice(bytes).map_err(|e| CacheError::decode(key, e.to_string()))?;

    if header.schema != T::SCHEMA || header.version != T::VERSION {
        return Err(CacheError::decode(
            key,
            format!(
                "expected {} v{}, found {} v{}",
                T::SCHEMA,
                T::VERSION,
                header.schema,
                header.version
            ),
        ));
    }

    rmp_serde::from_slice::<Envelope<T>>(bytes)
        .map(|envelope| envelope.payload)
        .map_err(|e| CacheError::decode(key, e.to_string()))
}

/// Per-course cache payload. Holds the public view only: sections are
/// stored as their outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCourse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub estimated_price: Option<f64>,
    pub thumbnail: Option<String>,
    pub tags: String,
    pub level: String,
    pub demo_url: String,
    pub benefits: Vec<String>,
    pub prerequisites: Vec<String>,
    pub ratings: f64,
    pub purchased: u32,
    pub reviews: Vec<Review>,
    pub sections: Vec<CourseSection>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl CachePayload for CachedCourse {
    const SCHEMA: &'static str = "course";
    const VERSION: u16 = 2;
}

impl CachedCourse {
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            name: course.name.clone(),
            description: course.description.clone(),
            price: course.price,
            estimated_price: course.estimated_price,
            thumbnail: course.thumbnail.clone(),
            tags: course.tags.clone(),
            level: course.level.clone(),
            demo_url: course.demo_url.clone(),
            benefits: course.benefits.clone(),
            prerequisites: course.prerequisites.clone(),
            ratings: course.ratings,
            purchased: course.purchased,
            reviews: course.reviews.clone(),
            sections: course.content.iter().map(CourseSection::outline).collect(),
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }

    #[must_use]
    pub fn into_course(self) -> Course {
        Course {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            estimated_price: self.estimated_price,
            thumbnail: self.thumbnail,
            tags: self.tags,
            level: self.level,
            demo_url: self.demo_url,
            benefits: self.benefits,
            prerequisites: self.prerequisites,
            ratings: self.ratings,
            purchased: self.purchased,
            reviews: self.reviews,
            content: self.sections,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Aggregate listing payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCourseList {
    pub courses: Vec<CachedCourse>,
}

impl CachePayload for CachedCourseList {
    const SCHEMA: &'static str = "course_list";
    const VERSION: u16 = 2;
}

impl CachedCourseList {
    #[must_use]
    pub fn from_courses(courses: &[Course]) -> Self {
        Self {
            courses: courses.iter().map(CachedCourse::from_course).collect(),
        }
    }

    #[must_use]
    pub fn into_courses(self) -> Vec<Course> {
        self.courses
            .into_iter()
            .map(CachedCourse::into_course)
            .collect()
    }
}
