//! Course content: lecture sections with their Q&A, and reviews.
//!
//! Sections are split in two. The outline (title, description, section
//! name, length) is public and is what the cache stores. Video URLs, links,
//! suggestions and questions are only returned to enrolled users and are
//! read from the document store.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::CatalogError;

/// Highest accepted review rating.
pub const MAX_RATING: u8 = 5;

/// Who wrote a question, answer, review or reply. Copied from the writer's
/// session snapshot at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// An answer to a question, or a reply to a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub author: Author,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Reply {
    pub(crate) fn new(author: Author, body: &str, now: OffsetDateTime) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author,
            body: body.trim().to_string(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub author: Author,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: Author,
    pub rating: u8,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// One lecture of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Chapter the lecture belongs to.
    #[serde(default)]
    pub video_section: String,
    /// Length in minutes.
    #[serde(default)]
    pub video_length: u32,
    #[serde(default)]
    pub video_player: String,
    #[serde(default)]
    pub video_thumbnail: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl CourseSection {
    /// The public part of the section.
    #[must_use]
    pub fn outline(&self) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            video_section: self.video_section.clone(),
            video_length: self.video_length,
            video_player: self.video_player.clone(),
            video_thumbnail: self.video_thumbnail.clone(),
            video_url: None,
            links: Vec::new(),
            suggestion: None,
            questions: Vec::new(),
        }
    }

    pub(crate) fn question_mut(&mut self, id: &str) -> Option<&mut Question> {
        self.questions.iter_mut().find(|q| q.id == id)
    }
}

/// A section as sent on create and edit.
///
/// A section whose `id` matches an existing section keeps that section's
/// questions; any other section starts without questions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionInput {
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_section: String,
    #[serde(default)]
    pub video_length: u32,
    #[serde(default)]
    pub video_player: String,
    pub video_thumbnail: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    pub suggestion: Option<String>,
}

impl SectionInput {
    pub(crate) fn validate(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::invalid_input("section title is required"));
        }
        Ok(())
    }

    pub(crate) fn into_section(self, existing: &[CourseSection]) -> CourseSection {
        let previous = self
            .id
            .as_deref()
            .and_then(|id| existing.iter().find(|s| s.id == id));
        let (id, questions) = match previous {
            Some(section) => (section.id.clone(), section.questions.clone()),
            None => (uuid::Uuid::new_v4().to_string(), Vec::new()),
        };
        CourseSection {
            id,
            title: self.title,
            description: self.description,
            video_section: self.video_section,
            video_length: self.video_length,
            video_player: self.video_player,
            video_thumbnail: self.video_thumbnail,
            video_url: self.video_url,
            links: self.links,
            suggestion: self.suggestion,
            questions,
        }
    }
}

/// Checks the text of a question, answer, review or reply.
pub(crate) fn require_text(text: &str, field: &str) -> Result<(), CatalogError> {
    if text.trim().is_empty() {
        return Err(CatalogError::invalid_input(format!("{field} is required")));
    }
    Ok(())
}

/// Mean rating over `reviews`, 0 without reviews.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    f64::from(total) / reviews.len() as f64
}
