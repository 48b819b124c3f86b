//! Services running over the in-memory adapter.

use std::num::NonZeroU32;
use std::sync::Arc;

use syllabus_core::error::{DomainError, EntityKind, StorageError};
use syllabus_core::models::{CategoryDraft, CourseDraft, EntityId, ReviewDraft, Role, UserDraft};
use syllabus_core::ports::{
    CategoryFilter, CourseFilter, PaginationData, Repositories, ReviewFilter, SortDirection,
    UserFilter,
};
use syllabus_core::services::{CategoryService, CourseService, ReviewService, UserService};
use syllabus_storage::{FailPoint, MemoryRepositories};

struct Catalog {
    repos: Arc<MemoryRepositories>,
    categories: CategoryService<MemoryRepositories>,
    courses: CourseService<MemoryRepositories>,
    reviews: ReviewService<MemoryRepositories>,
    users: UserService<MemoryRepositories>,
}

fn catalog() -> Catalog {
    let repos = Arc::new(MemoryRepositories::new());
    let categories = CategoryService::new(Arc::clone(&repos));
    let courses = CourseService::new(Arc::clone(&repos), categories.clone());
    let users = UserService::new(Arc::clone(&repos));
    let reviews = ReviewService::new(Arc::clone(&repos), users.clone(), courses.clone());
    Catalog {
        repos,
        categories,
        courses,
        reviews,
        users,
    }
}

fn page(offset: u64, limit: u32) -> PaginationData {
    PaginationData::new(offset, NonZeroU32::new(limit).unwrap())
}

fn category(name: &str) -> CategoryDraft {
    CategoryDraft {
        name: Some(name.into()),
    }
}

fn course(name: &str, category_id: EntityId) -> CourseDraft {
    CourseDraft {
        name: Some(name.into()),
        url: Some("http://test.com".into()),
        description: Some("A course".into()),
        category_id: Some(category_id),
    }
}

fn user(name: &str, email: &str) -> UserDraft {
    UserDraft {
        name: Some(name.into()),
        email: Some(email.into()),
        password: Some("123456".into()),
    }
}

fn review(rating: i32, user_id: EntityId, course_id: EntityId) -> ReviewDraft {
    ReviewDraft {
        rating: Some(rating),
        comment: None,
        user_id: Some(user_id),
        course_id: Some(course_id),
    }
}

/// Four courses in two categories, as (category ids, course ids).
async fn seed_courses(c: &Catalog) -> ([EntityId; 2], Vec<EntityId>) {
    let languages = c.categories.add(&category("Languages")).await.unwrap().id;
    let programming = c.categories.add(&category("Programming")).await.unwrap().id;

    let mut ids = Vec::new();
    for (name, category_id) in [
        ("Learn Swift", programming),
        ("Learn Java", programming),
        ("Learn Python", programming),
        ("Spanish for Beginners", languages),
    ] {
        ids.push(c.courses.add(&course(name, category_id)).await.unwrap().id);
    }
    ([languages, programming], ids)
}

fn course_names(rows: &[syllabus_core::models::Course]) -> Vec<&str> {
    rows.iter().map(|course| course.name.as_str()).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn name_filter_counts_all_matches_and_returns_sorted_window() {
    let c = catalog();
    seed_courses(&c).await;

    let filter = CourseFilter {
        name: Some("Learn".into()),
        pagination: Some(page(0, 2).sorted_by("name", SortDirection::Ascending)),
        ..Default::default()
    };
    let result = c.courses.find_by_filter(&filter).await.unwrap();

    assert_eq!(result.total_count, 3);
    assert_eq!(course_names(&result.rows), ["Learn Java", "Learn Python"]);
}

#[tokio::test]
async fn duplicate_category_name_is_a_constraint_violation() {
    let c = catalog();
    c.categories.add(&category("Chess")).await.unwrap();

    let err = c.categories.add(&category("Chess")).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Storage(StorageError::ConstraintViolation(_))
    ));
    assert_eq!(c.categories.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn password_is_hashed_and_checked() {
    let c = catalog();
    let added = c.users.add(&user("Ada", "ada@example.com")).await.unwrap();

    assert_ne!(added.password, "123456");
    assert!(added.password.starts_with("$argon2"));
    assert_eq!(added.roles, [Role::Standard]);

    let found = c
        .users
        .find_by_email_and_password("ada@example.com", "123456")
        .await
        .unwrap();
    assert_eq!(found.id, added.id);

    let err = c
        .users
        .find_by_email_and_password("ada@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(EntityKind::User)));

    let err = c
        .users
        .find_by_email_and_password("nobody@example.com", "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(EntityKind::User)));
}

#[tokio::test]
async fn review_of_missing_course_writes_nothing() {
    let c = catalog();
    let author = c.users.add(&user("Ada", "ada@example.com")).await.unwrap().id;

    let err = c.reviews.add(&review(4, author, 999)).await.unwrap_err();

    assert!(matches!(err, DomainError::NotFound(EntityKind::Course)));
    assert!(c.reviews.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn review_of_missing_user_fails_with_user_kind() {
    let c = catalog();
    let (_, courses) = seed_courses(&c).await;

    let err = c.reviews.add(&review(4, 999, courses[0])).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(EntityKind::User)));
}

async fn seed_reviewed_course(c: &Catalog) -> EntityId {
    let (_, courses) = seed_courses(c).await;
    let author = c.users.add(&user("Ada", "ada@example.com")).await.unwrap().id;
    for rating in [3, 4, 5] {
        c.reviews.add(&review(rating, author, courses[0])).await.unwrap();
    }
    // Un avis sur un autre cours ne doit pas être touché
    c.reviews.add(&review(1, author, courses[1])).await.unwrap();
    courses[0]
}

fn reviews_of(course_id: EntityId) -> ReviewFilter {
    ReviewFilter {
        course_id: Some(course_id),
        ..Default::default()
    }
}

#[tokio::test]
async fn deleting_a_course_removes_its_reviews() {
    let c = catalog();
    let course_id = seed_reviewed_course(&c).await;

    c.courses.delete_by_id(course_id).await.unwrap();

    assert!(!c.repos.courses().id_exists(course_id).await.unwrap());
    let left = c.reviews.find_by_filter(&reviews_of(course_id)).await.unwrap();
    assert_eq!(left.total_count, 0);
    assert_eq!(c.reviews.find_all().await.unwrap().len(), 1);
}

// Test critique: une panne au milieu de la cascade ne laisse aucune trace
#[tokio::test]
async fn failed_cascade_leaves_every_row_intact() {
    for point in [FailPoint::ReviewDelete, FailPoint::CourseDelete] {
        let c = catalog();
        let course_id = seed_reviewed_course(&c).await;

        c.repos.fail_next(point);
        let err = c.courses.delete_by_id(course_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(StorageError::QueryError(_))));

        assert!(c.repos.courses().id_exists(course_id).await.unwrap());
        let left = c.reviews.find_by_filter(&reviews_of(course_id)).await.unwrap();
        assert_eq!(left.total_count, 3, "failure at {point:?}");
    }
}

// =============================================================================
// Paged Query Properties
// =============================================================================

fn course_filters(categories: [EntityId; 2]) -> Vec<CourseFilter> {
    let mut filters = Vec::new();
    for name in [None, Some("Learn"), Some("learn p"), Some("zzz")] {
        for category_id in [None, Some(categories[0]), Some(categories[1])] {
            for pagination in [None, Some(page(0, 2)), Some(page(1, 2)), Some(page(3, 10))] {
                filters.push(CourseFilter {
                    pagination,
                    name: name.map(String::from),
                    category_id,
                });
            }
        }
    }
    filters
}

#[tokio::test]
async fn total_count_bounds_the_page() {
    let c = catalog();
    let (categories, _) = seed_courses(&c).await;

    for filter in course_filters(categories) {
        let result = c.courses.find_by_filter(&filter).await.unwrap();
        assert!(result.total_count >= result.rows.len() as u64);
        if filter.pagination.is_none() {
            assert_eq!(result.total_count, result.rows.len() as u64);
        }
    }
}

#[tokio::test]
async fn window_size_follows_offset_and_limit() {
    let c = catalog();
    let (categories, _) = seed_courses(&c).await;

    for filter in course_filters(categories) {
        let Some(pagination) = filter.pagination.clone() else {
            continue;
        };
        let result = c.courses.find_by_filter(&filter).await.unwrap();
        let expected = if pagination.offset() < result.total_count {
            (pagination.limit() as u64).min(result.total_count - pagination.offset())
        } else {
            0
        };
        assert_eq!(result.rows.len() as u64, expected);
    }
}

#[tokio::test]
async fn extra_predicate_never_widens_the_result() {
    let c = catalog();
    let ([languages, programming], _) = seed_courses(&c).await;

    let broad = CourseFilter {
        name: Some("e".into()),
        ..Default::default()
    };
    let broad_total = c.courses.find_by_filter(&broad).await.unwrap().total_count;

    for category_id in [languages, programming, 999] {
        let narrow = CourseFilter {
            category_id: Some(category_id),
            ..broad.clone()
        };
        let narrow_total = c.courses.find_by_filter(&narrow).await.unwrap().total_count;
        assert!(narrow_total <= broad_total);
    }
}

#[tokio::test]
async fn rows_follow_requested_sort() {
    let c = catalog();
    seed_courses(&c).await;

    for direction in [SortDirection::Ascending, SortDirection::Descending] {
        let filter = CourseFilter {
            pagination: Some(page(0, 10).sorted_by("name", direction)),
            ..Default::default()
        };
        let result = c.courses.find_by_filter(&filter).await.unwrap();
        let names = course_names(&result.rows);

        for pair in names.windows(2) {
            match direction {
                SortDirection::Ascending => assert!(pair[0] <= pair[1]),
                SortDirection::Descending => assert!(pair[0] >= pair[1]),
            }
        }
    }
}

#[tokio::test]
async fn reviews_default_to_best_rating_first() {
    let c = catalog();
    let course_id = seed_reviewed_course(&c).await;

    let result = c.reviews.find_by_filter(&reviews_of(course_id)).await.unwrap();
    let ratings: Vec<_> = result.rows.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, [5, 4, 3]);
}

#[tokio::test]
async fn unknown_sort_field_is_an_invalid_query() {
    let c = catalog();
    let filter = UserFilter {
        pagination: Some(page(0, 10).sorted_by("password", SortDirection::Ascending)),
        ..Default::default()
    };
    let err = c.users.find_by_filter(&filter).await.unwrap_err();
    assert!(matches!(err, DomainError::Storage(StorageError::InvalidQuery(_))));
}

#[tokio::test]
async fn id_exists_tracks_add_and_delete() {
    let c = catalog();
    let id = c.categories.add(&category("Chess")).await.unwrap().id;
    assert!(c.repos.categories().id_exists(id).await.unwrap());

    c.categories.delete_by_id(id).await.unwrap();
    assert!(!c.repos.categories().id_exists(id).await.unwrap());

    let err = c.categories.delete_by_id(id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(EntityKind::Category)));
}

// =============================================================================
// Service Rules
// =============================================================================

#[tokio::test]
async fn validation_runs_before_existence_check() {
    let c = catalog();
    let err = c.categories.update(42, &category("A")).await.unwrap_err();
    assert!(matches!(err, DomainError::FieldInvalid { ref field, .. } if field == "name"));

    let err = c.categories.update(42, &category("Chess")).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(EntityKind::Category)));
}

#[tokio::test]
async fn course_update_resolves_category() {
    let c = catalog();
    let (_, courses) = seed_courses(&c).await;

    let err = c
        .courses
        .update(courses[0], &course("Learn Swift", 999))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(EntityKind::Category)));

    let err = c.courses.update(999, &course("Learn Rust", 1)).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(EntityKind::Course)));
}

#[tokio::test]
async fn course_with_invalid_url_is_rejected() {
    let c = catalog();
    let (categories, _) = seed_courses(&c).await;
    let mut draft = course("Learn Rust", categories[1]);
    draft.url = Some("not a url".into());

    let err = c.courses.add(&draft).await.unwrap_err();
    assert!(matches!(err, DomainError::FieldInvalid { ref field, .. } if field == "url"));
}

#[tokio::test]
async fn user_update_keeps_password_and_roles() {
    let c = catalog();
    let added = c.users.add(&user("Ada", "ada@example.com")).await.unwrap();

    let draft = UserDraft {
        password: None,
        ..user("Ada Lovelace", "ada@example.com")
    };
    c.users.update(added.id, &draft).await.unwrap();

    let updated = c.users.find_by_id(added.id).await.unwrap();
    assert_eq!(updated.name, "Ada Lovelace");
    assert_eq!(updated.password, added.password);
    assert_eq!(updated.roles, added.roles);
    assert_eq!(updated.created_at, added.created_at);
}

#[tokio::test]
async fn update_password_rehashes() {
    let c = catalog();
    let added = c.users.add(&user("Ada", "ada@example.com")).await.unwrap();

    c.users.update_password(added.id, "654321").await.unwrap();

    assert!(c
        .users
        .find_by_email_and_password("ada@example.com", "654321")
        .await
        .is_ok());
    assert!(c
        .users
        .find_by_email_and_password("ada@example.com", "123456")
        .await
        .is_err());

    let err = c.users.update_password(999, "x").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(EntityKind::User)));
}

#[tokio::test]
async fn find_by_email_reports_missing_user() {
    let c = catalog();
    let err = c.users.find_by_email("ghost@example.com").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(EntityKind::User)));
}

#[tokio::test]
async fn review_update_keeps_creation_date() {
    let c = catalog();
    let course_id = seed_reviewed_course(&c).await;
    let first = c.reviews.find_by_filter(&reviews_of(course_id)).await.unwrap().rows[0].clone();

    let mut draft = review(2, first.user.id, course_id);
    draft.comment = Some("Changed my mind".into());
    c.reviews.update(first.id, &draft).await.unwrap();

    let updated = c.reviews.find_by_id(first.id).await.unwrap();
    assert_eq!(updated.rating, 2);
    assert_eq!(updated.comment.as_deref(), Some("Changed my mind"));
    assert_eq!(updated.created_at, first.created_at);
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let c = catalog();
    let ([languages, _], _) = seed_courses(&c).await;

    let err = c.categories.delete_by_id(languages).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Storage(StorageError::ConstraintViolation(_))
    ));
}

#[tokio::test]
async fn reviews_can_be_removed_by_course() {
    let c = catalog();
    let course_id = seed_reviewed_course(&c).await;

    assert_eq!(c.reviews.delete_by_course_id(course_id).await.unwrap(), 3);
    assert_eq!(c.reviews.delete_by_course_id(course_id).await.unwrap(), 0);
    assert!(c.repos.courses().id_exists(course_id).await.unwrap());
}

#[tokio::test]
async fn user_name_filter_is_case_insensitive() {
    let c = catalog();
    c.users.add(&user("Ada", "ada@example.com")).await.unwrap();
    c.users.add(&user("Grace", "grace@example.com")).await.unwrap();

    let filter = UserFilter {
        name: Some("gRA".into()),
        ..Default::default()
    };
    let result = c.users.find_by_filter(&filter).await.unwrap();
    assert_eq!(result.total_count, 1);
    assert_eq!(result.rows[0].name, "Grace");
}

#[tokio::test]
async fn category_filter_matches_substrings() {
    let c = catalog();
    seed_courses(&c).await;

    let filter = CategoryFilter {
        name: Some("gram".into()),
        ..Default::default()
    };
    let result = c.categories.find_by_filter(&filter).await.unwrap();
    assert_eq!(result.total_count, 1);
    assert_eq!(result.rows[0].name, "Programming");
}
