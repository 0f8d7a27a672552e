use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::CatalogError;
use crate::content::{CourseSection, Review, SectionInput};

/// A course as stored in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub demo_url: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub ratings: f64,
    #[serde(default)]
    pub purchased: u32,
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Lecture sections. Only enrolled users see more than the outline.
    #[serde(default)]
    pub content: Vec<CourseSection>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Course {
    /// The course as anyone may see it: sections reduced to their outline.
    #[must_use]
    pub fn public_view(&self) -> Self {
        Self {
            content: self.content.iter().map(CourseSection::outline).collect(),
            ..self.clone()
        }
    }

    pub(crate) fn section_mut(&mut self, id: &str) -> Option<&mut CourseSection> {
        self.content.iter_mut().find(|s| s.id == id)
    }

    pub(crate) fn review_mut(&mut self, id: &str) -> Option<&mut Review> {
        self.reviews.iter_mut().find(|r| r.id == id)
    }
}

impl learnhub_storage::Document for Course {
    const COLLECTION: &'static str = "courses";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Fields accepted on create and edit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    pub estimated_price: Option<f64>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub demo_url: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub content: Vec<SectionInput>,
}

impl CourseInput {
    /// Checks required fields.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInput` for an empty name or description,
    /// a negative price, or a section without a title.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::invalid_input("name is required"));
        }
        if self.description.trim().is_empty() {
            return Err(CatalogError::invalid_input("description is required"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CatalogError::invalid_input("price must be >= 0"));
        }
        self.content.iter().try_for_each(SectionInput::validate)
    }

    /// New course with a fresh id.
    #[must_use]
    pub fn into_course(self, now: OffsetDateTime) -> Course {
        self.build(now, &[])
    }

    /// `existing` with every editable field replaced. Id, ratings, reviews,
    /// purchase count, creation time and the questions of kept sections
    /// stay.
    #[must_use]
    pub fn apply_to(self, existing: &Course, now: OffsetDateTime) -> Course {
        Course {
            id: existing.id.clone(),
            ratings: existing.ratings,
            purchased: existing.purchased,
            reviews: existing.reviews.clone(),
            created_at: existing.created_at,
            updated_at: now,
            ..self.build(now, &existing.content)
        }
    }

    fn build(self, now: OffsetDateTime, existing: &[CourseSection]) -> Course {
        Course {
            id: uuid::Uuid::new_v4().to_string(),
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
            ratings: 0.0,
            purchased: 0,
            reviews: Vec::new(),
            content: self
                .content
                .into_iter()
                .map(|section| section.into_section(existing))
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> CourseInput {
        CourseInput {
            name: name.to_string(),
            description: "Learn things".to_string(),
            price: 10.0,
            ..CourseInput::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(input("Rust").validate().is_ok());
        assert!(input(" ").validate().is_err());

        let negative = CourseInput {
            price: -1.0,
            ..input("Rust")
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_apply_keeps_identity_fields() {
        let created = input("Rust").into_course(OffsetDateTime::UNIX_EPOCH);
        let later = OffsetDateTime::UNIX_EPOCH + time::Duration::days(1);
        let edited = input("Rust 2").apply_to(&created, later);

        assert_eq!(edited.id, created.id);
        assert_eq!(edited.created_at, created.created_at);
        assert_eq!(edited.updated_at, later);
        assert_eq!(edited.name, "Rust 2");
    }

    #[test]
    fn test_section_without_title_is_invalid() {
        let course = CourseInput {
            content: vec![SectionInput::default()],
            ..input("Rust")
        };
        assert!(matches!(
            course.validate(),
            Err(CatalogError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_public_view_keeps_outline_only() {
        let course = CourseInput {
            content: vec![SectionInput {
                title: "Borrowing".into(),
                video_url: Some("https://videos/borrow".into()),
                suggestion: Some("try the exercises".into()),
                ..SectionInput::default()
            }],
            ..input("Rust")
        }
        .into_course(OffsetDateTime::UNIX_EPOCH);

        let public = course.public_view();
        assert_eq!(public.content[0].title, "Borrowing");
        assert!(public.content[0].video_url.is_none());
        assert!(public.content[0].suggestion.is_none());
        assert_eq!(
            course.content[0].video_url.as_deref(),
            Some("https://videos/borrow")
        );
    }
}
