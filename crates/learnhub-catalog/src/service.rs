//! Course reads and writes.

use learnhub_storage::{DocumentStore, DynCollection};
use time::OffsetDateTime;

use crate::content::{self, Author, CourseSection, MAX_RATING, Question, Reply, Review};
use crate::invalidation::{InvalidationReport, Invalidator};
use crate::schema::{CachedCourse, CachedCourseList};
use crate::{CacheKey, CatalogCache, CatalogError, CatalogResult, Course, CourseInput};

/// Course catalog over the document store and the catalog cache.
///
/// Every write goes document store first, then invalidates
/// `course:<id>` and `allCourses`. Writes made to the collection directly
/// skip the invalidation and leave the aggregate entry stale.
#[derive(Clone)]
pub struct CourseService {
    courses: DynCollection<Course>,
    cache: CatalogCache,
    invalidator: Invalidator,
}

impl CourseService {
    #[must_use]
    pub fn new(courses: DynCollection<Course>, cache: CatalogCache, invalidator: Invalidator) -> Self {
        Self {
            courses,
            cache,
            invalidator,
        }
    }

    /// Returns the course collection handle.
    #[must_use]
    pub fn collection(&self) -> &DynCollection<Course> {
        &self.courses
    }

    /// Returns the cache handle.
    #[must_use]
    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Returns the invalidator.
    #[must_use]
    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }

    /// Reads the public view of one course through the cache.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` if the course does not exist, or
    /// `CatalogError::Storage` if the document store fails.
    pub async fn get(&self, id: &str) -> CatalogResult<Course> {
        let cached: CachedCourse = self
            .cache
            .get_or_populate(&CacheKey::course(id), || async {
                let course = self
                    .courses
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| CatalogError::not_found(id))?;
                Ok::<_, CatalogError>(CachedCourse::from_course(&course))
            })
            .await?;
        Ok(cached.into_course())
    }

    /// Reads the public view of every course through the aggregate cache
    /// entry, oldest first.
    ///
    /// # Errors
    ///
    /// `CatalogError::Storage` if the document store fails.
    pub async fn list(&self) -> CatalogResult<Vec<Course>> {
        let cached: CachedCourseList = self
            .cache
            .get_or_populate(&CacheKey::AllCourses, || async {
                let mut courses = self.courses.find_all().await?;
                courses.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
                Ok::<_, CatalogError>(CachedCourseList::from_courses(&courses))
            })
            .await?;
        Ok(cached.into_courses())
    }

    /// Every course in full, newest first. Reads the document store, not the
    /// cache.
    ///
    /// # Errors
    ///
    /// `CatalogError::Storage` if the document store fails.
    pub async fn list_full(&self) -> CatalogResult<Vec<Course>> {
        let mut courses = self.courses.find_all().await?;
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(courses)
    }

    /// Full section content of a course. Reads the document store, not the
    /// cache.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` or `CatalogError::Storage`.
    pub async fn content(&self, id: &str) -> CatalogResult<Vec<CourseSection>> {
        Ok(self.load(id).await?.content)
    }

    /// Creates a course.
    ///
    /// # Errors
    ///
    /// `CatalogError::InvalidInput` or `CatalogError::Storage`.
    pub async fn create(&self, input: CourseInput) -> CatalogResult<Course> {
        input.validate()?;
        let course = self
            .courses
            .create(input.into_course(OffsetDateTime::now_utc()))
            .await?;
        tracing::info!(course_id = %course.id, "Course created");
        self.after_write(&course.id).await;
        Ok(course)
    }

    /// Replaces the editable fields of a course.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound`, `CatalogError::InvalidInput` or
    /// `CatalogError::Storage`.
    pub async fn update(&self, id: &str, input: CourseInput) -> CatalogResult<Course> {
        input.validate()?;
        let existing = self.load(id).await?;
        let course = self
            .courses
            .update_by_id(id, input.apply_to(&existing, OffsetDateTime::now_utc()))
            .await?;
        tracing::info!(course_id = %id, "Course updated");
        self.after_write(id).await;
        Ok(course)
    }

    /// Counts one more purchase of a course.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` or `CatalogError::Storage`.
    pub async fn record_purchase(&self, id: &str) -> CatalogResult<Course> {
        let course = self
            .modify(id, |course, _| {
                course.purchased = course.purchased.saturating_add(1);
                Ok(())
            })
            .await?;
        tracing::debug!(course_id = %id, purchased = course.purchased, "Purchase recorded");
        Ok(course)
    }

    /// Adds a question to a section.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` for the course, `CatalogError::MissingItem`
    /// for the section, `CatalogError::InvalidInput` for an empty question,
    /// or `CatalogError::Storage`.
    pub async fn add_question(
        &self,
        course_id: &str,
        section_id: &str,
        author: Author,
        question: &str,
    ) -> CatalogResult<Course> {
        content::require_text(question, "question")?;
        self.modify(course_id, |course, now| {
            let section = course
                .section_mut(section_id)
                .ok_or_else(|| CatalogError::missing_item("Section", section_id))?;
            section.questions.push(Question {
                id: uuid::Uuid::new_v4().to_string(),
                author,
                body: question.trim().to_string(),
                created_at: now,
                replies: Vec::new(),
            });
            Ok(())
        })
        .await
    }

    /// Answers a question. Returns the course and the answered question, so
    /// the caller can notify the question's author.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` for the course, `CatalogError::MissingItem`
    /// for the section or question, `CatalogError::InvalidInput` for an empty
    /// answer, or `CatalogError::Storage`.
    pub async fn add_answer(
        &self,
        course_id: &str,
        section_id: &str,
        question_id: &str,
        author: Author,
        answer: &str,
    ) -> CatalogResult<(Course, Question)> {
        content::require_text(answer, "answer")?;
        let mut answered = None;
        let course = self
            .modify(course_id, |course, now| {
                let question = course
                    .section_mut(section_id)
                    .ok_or_else(|| CatalogError::missing_item("Section", section_id))?
                    .question_mut(question_id)
                    .ok_or_else(|| CatalogError::missing_item("Question", question_id))?;
                question.replies.push(Reply::new(author, answer, now));
                answered = Some(question.clone());
                Ok(())
            })
            .await?;
        let question = answered.ok_or_else(|| CatalogError::missing_item("Question", question_id))?;
        Ok((course, question))
    }

    /// Adds a review and recomputes the course rating.
    ///
    /// # Errors
    ///
    /// `CatalogError::InvalidInput` for a rating outside 1..=5 or an empty
    /// comment, `CatalogError::NotFound` or `CatalogError::Storage`.
    pub async fn add_review(
        &self,
        course_id: &str,
        author: Author,
        rating: u8,
        comment: &str,
    ) -> CatalogResult<Course> {
        if !(1..=MAX_RATING).contains(&rating) {
            return Err(CatalogError::invalid_input(format!(
                "rating must be between 1 and {MAX_RATING}"
            )));
        }
        content::require_text(comment, "review")?;
        self.modify(course_id, |course, now| {
            course.reviews.push(Review {
                id: uuid::Uuid::new_v4().to_string(),
                author,
                rating,
                comment: comment.trim().to_string(),
                created_at: now,
                replies: Vec::new(),
            });
            course.ratings = content::average_rating(&course.reviews);
            Ok(())
        })
        .await
    }

    /// Replies to a review.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` for the course, `CatalogError::MissingItem`
    /// for the review, `CatalogError::InvalidInput` for an empty reply, or
    /// `CatalogError::Storage`.
    pub async fn add_review_reply(
        &self,
        course_id: &str,
        review_id: &str,
        author: Author,
        reply: &str,
    ) -> CatalogResult<Course> {
        content::require_text(reply, "reply")?;
        self.modify(course_id, |course, now| {
            course
                .review_mut(review_id)
                .ok_or_else(|| CatalogError::missing_item("Review", review_id))?
                .replies
                .push(Reply::new(author, reply, now));
            Ok(())
        })
        .await
    }

    /// Deletes a course.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` or `CatalogError::Storage`.
    pub async fn delete(&self, id: &str) -> CatalogResult<Course> {
        let course = self.courses.delete_by_id(id).await?;
        tracing::info!(course_id = %id, "Course deleted");
        self.after_write(id).await;
        Ok(course)
    }

    async fn load(&self, id: &str) -> CatalogResult<Course> {
        self.courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found(id))
    }

    /// Loads a course, applies `change`, stores it and invalidates.
    ///
    /// Concurrent modifications of one course are last-writer-wins at the
    /// document store.
    async fn modify<F>(&self, id: &str, change: F) -> CatalogResult<Course>
    where
        F: FnOnce(&mut Course, OffsetDateTime) -> CatalogResult<()>,
    {
        let mut course = self.load(id).await?;
        let now = OffsetDateTime::now_utc();
        change(&mut course, now)?;
        course.updated_at = now;
        let course = self.courses.update_by_id(id, course).await?;
        self.after_write(id).await;
        Ok(course)
    }

    async fn after_write(&self, id: &str) -> InvalidationReport {
        let report = self
            .invalidator
            .invalidate_all(&CacheKey::affected_by(id))
            .await;
        if !report.is_complete() {
            tracing::warn!(
                course_id = %id,
                deferred = report.deferred.len(),
                "Write committed with stale cache entries pending reconciliation"
            );
        }
        report
    }
}
