//! Invalidation discipline of the aggregate listing.

use std::sync::Arc;
use std::time::Duration;

use learnhub_catalog::{
    Author, CacheConfig, CacheKey, CatalogCache, Course, CourseInput, CourseService, Invalidator,
    PendingInvalidations,
};
use learnhub_kv::MemoryKv;
use learnhub_storage::{DocumentStore, MemoryCollection};
use time::OffsetDateTime;

fn service() -> CourseService {
    let config = CacheConfig::default();
    let cache = CatalogCache::new(Arc::new(MemoryKv::new()), config.resource_ttl);
    let invalidator = Invalidator::new(
        cache.clone(),
        config.invalidation,
        PendingInvalidations::new(),
    );
    CourseService::new(Arc::new(MemoryCollection::new()), cache, invalidator)
}

fn input(name: &str) -> CourseInput {
    CourseInput {
        name: name.to_string(),
        description: "Course".to_string(),
        price: 10.0,
        ..CourseInput::default()
    }
}

fn names(courses: &[Course]) -> Vec<String> {
    courses.iter().map(|c| c.name.clone()).collect()
}

#[tokio::test]
async fn write_without_invalidation_leaves_aggregate_stale() {
    let service = service();
    service.create(input("c1")).await.unwrap();
    service.create(input("c2")).await.unwrap();
    assert_eq!(names(&service.list().await.unwrap()), vec!["c1", "c2"]);

    // A write that bypasses the service skips the invalidation.
    service
        .collection()
        .create(input("c3").into_course(OffsetDateTime::now_utc()))
        .await
        .unwrap();
    assert_eq!(names(&service.list().await.unwrap()), vec!["c1", "c2"]);

    // The aggregate has no TTL; only an explicit invalidation brings c3 in.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(names(&service.list().await.unwrap()), vec!["c1", "c2"]);

    service
        .cache()
        .invalidate(&CacheKey::AllCourses)
        .await
        .unwrap();
    assert_eq!(
        names(&service.list().await.unwrap()),
        vec!["c1", "c2", "c3"]
    );
}

#[tokio::test]
async fn every_write_path_refreshes_aggregate() {
    let service = service();
    let c1 = service.create(input("c1")).await.unwrap();
    let c2 = service.create(input("c2")).await.unwrap();
    assert_eq!(names(&service.list().await.unwrap()), vec!["c1", "c2"]);

    service.update(&c1.id, input("c1 v2")).await.unwrap();
    assert_eq!(names(&service.list().await.unwrap()), vec!["c1 v2", "c2"]);

    service.delete(&c2.id).await.unwrap();
    assert_eq!(names(&service.list().await.unwrap()), vec!["c1 v2"]);

    service.create(input("c3")).await.unwrap();
    assert_eq!(names(&service.list().await.unwrap()), vec!["c1 v2", "c3"]);
}

#[tokio::test]
async fn single_course_reads_hit_cache_until_edit() {
    let service = service();
    let course = service.create(input("c1")).await.unwrap();

    service.get(&course.id).await.unwrap();
    service.get(&course.id).await.unwrap();
    let stats = service.cache().stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);

    service.update(&course.id, input("c1 edited")).await.unwrap();
    assert_eq!(service.get(&course.id).await.unwrap().name, "c1 edited");
    assert_eq!(service.cache().stats().misses, 2);
}

#[tokio::test]
async fn review_writes_refresh_both_keys() {
    let service = service();
    let course = service.create(input("c1")).await.unwrap();
    let reviewer = Author {
        id: "u1".into(),
        name: "Ada".into(),
        avatar: None,
    };

    // Warm both keys
    assert!(service.get(&course.id).await.unwrap().reviews.is_empty());
    assert!(service.list().await.unwrap()[0].reviews.is_empty());

    let reviewed = service
        .add_review(&course.id, reviewer.clone(), 3, "Fine")
        .await
        .unwrap();
    assert_eq!(service.get(&course.id).await.unwrap().reviews.len(), 1);
    assert_eq!(service.list().await.unwrap()[0].ratings, 3.0);

    service
        .add_review_reply(&course.id, &reviewed.reviews[0].id, reviewer, "Thanks")
        .await
        .unwrap();
    assert_eq!(
        service.list().await.unwrap()[0].reviews[0].replies[0].body,
        "Thanks"
    );
}
