//! Resource routes, one module per entity.

mod category;
mod course;
mod review;
mod user;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;

use syllabus_core::error::EntityKind;
use syllabus_core::models::EntityId;
use syllabus_core::ports::PagedResult;

use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .merge(category::routes())
        .merge(course::routes())
        .merge(review::routes())
        .merge(user::routes())
}

#[derive(Debug, Serialize)]
pub struct Paging {
    #[serde(rename = "totalRecords")]
    pub total_records: u64,
}

/// List response: `{ "paging": { "totalRecords": n }, "entries": [...] }`.
#[derive(Debug, Serialize)]
pub struct PagedBody<T> {
    pub paging: Paging,
    pub entries: Vec<T>,
}

impl<T> From<PagedResult<T>> for PagedBody<T> {
    fn from(page: PagedResult<T>) -> Self {
        Self {
            paging: Paging {
                total_records: page.total_count,
            },
            entries: page.rows,
        }
    }
}

/// Body of a `201 Created`.
#[derive(Debug, Serialize)]
pub struct Created {
    pub id: EntityId,
}

/// Unwrap a JSON body, reporting a rejection against `resource`.
fn body<T>(resource: EntityKind, body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_body(resource, rejection))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use syllabus_core::ports::Repositories;
    use syllabus_storage::MemoryRepositories;

    use crate::server;
    use crate::state::AppState;

    fn app() -> axum::Router {
        let repositories: Arc<dyn Repositories> = Arc::new(MemoryRepositories::new());
        server::router(AppState::new(repositories))
    }

    async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, json)
    }

    async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send(app, Method::POST, uri, Some(body)).await
    }

    async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
        send(app, Method::GET, uri, None).await
    }

    async fn created_id(app: &axum::Router, uri: &str, body: Value) -> i64 {
        let (status, json) = post(app, uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["id"].as_i64().unwrap()
    }

    fn error_id(json: &Value) -> &str {
        json["errorIdentification"].as_str().unwrap_or_default()
    }

    async fn seed_courses(app: &axum::Router) -> i64 {
        let programming = created_id(app, "/categories", json!({ "name": "Programming" })).await;
        for name in ["Learn Swift", "Learn Java", "Learn Python", "Spanish for Beginners"] {
            created_id(
                app,
                "/courses",
                json!({ "name": name, "url": "http://test.com", "categoryId": programming }),
            )
            .await;
        }
        programming
    }

    async fn seed_user(app: &axum::Router) -> i64 {
        created_id(
            app,
            "/users",
            json!({ "name": "Ada", "email": "ada@example.com", "password": "123456" }),
        )
        .await
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(&app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("OK".into()));
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let app = app();
        let id = created_id(&app, "/categories", json!({ "name": "Chess" })).await;

        let (status, body) = get(&app, &format!("/categories/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": id, "name": "Chess" }));

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/categories/{id}"),
            Some(json!({ "name": "Go" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::DELETE, &format!("/categories/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(&app, &format!("/categories/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_id(&body), "category.notfound");
    }

    #[tokio::test]
    async fn test_invalid_field_names_resource_and_field() {
        let (status, body) = post(&app(), "/categories", json!({ "name": "A" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_id(&body), "category.name");
    }

    #[tokio::test]
    async fn test_duplicate_name_is_a_conflict() {
        let app = app();
        created_id(&app, "/categories", json!({ "name": "Chess" })).await;
        let (status, body) = post(&app, "/categories", json!({ "name": "Chess" })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error_id(&body), "category.conflict");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/categories")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_course_list_is_filtered_and_paged() {
        let app = app();
        seed_courses(&app).await;

        let (status, body) = get(&app, "/courses?name=Learn&page=0&per_page=2&sort=%2Bname").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paging"]["totalRecords"], 3);
        let names: Vec<_> = body["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Learn Java", "Learn Python"]);
        assert_eq!(body["entries"][0]["category"]["name"], "Programming");
    }

    #[tokio::test]
    async fn test_course_needs_existing_category() {
        let (status, body) = post(
            &app(),
            "/courses",
            json!({ "name": "Learn Rust", "url": "http://test.com", "categoryId": 42 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_id(&body), "course.category");
        assert_eq!(body["errorDescription"], "Not found");
    }

    #[tokio::test]
    async fn test_bad_list_parameters() {
        let app = app();
        let (status, body) = get(&app, "/categories?per_page=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_id(&body), "category.per_page");

        let (status, body) = get(&app, "/users?sort=-password").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_id(&body), "user.query");

        let (status, body) = get(&app, "/reviews?course_id=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_id(&body), "review.course_id");
    }

    #[tokio::test]
    async fn test_review_needs_existing_course() {
        let app = app();
        let user_id = seed_user(&app).await;

        let (status, body) = post(
            &app,
            "/reviews",
            json!({ "rating": 4, "userId": user_id, "courseId": 99 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_id(&body), "review.course");

        let (_, body) = get(&app, "/reviews").await;
        assert_eq!(body["paging"]["totalRecords"], 0);
    }

    #[tokio::test]
    async fn test_deleting_course_removes_its_reviews() {
        let app = app();
        seed_courses(&app).await;
        let user_id = seed_user(&app).await;
        let (_, courses) = get(&app, "/courses?name=Swift").await;
        let course_id = courses["entries"][0]["id"].as_i64().unwrap();

        for rating in [2, 5] {
            created_id(
                &app,
                "/reviews",
                json!({ "rating": rating, "userId": user_id, "courseId": course_id }),
            )
            .await;
        }
        let uri = format!("/reviews?course_id={course_id}&sort=-rating");
        let (_, body) = get(&app, &uri).await;
        assert_eq!(body["paging"]["totalRecords"], 2);
        assert_eq!(body["entries"][0]["rating"], 5);
        assert_eq!(body["entries"][0]["user"]["name"], "Ada");

        let (status, _) = send(&app, Method::DELETE, &format!("/courses/{course_id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get(&app, &uri).await;
        assert_eq!(body["paging"]["totalRecords"], 0);
    }

    #[tokio::test]
    async fn test_user_password_flow() {
        let app = app();
        let id = seed_user(&app).await;

        let (status, user) = get(&app, &format!("/users/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["roles"], json!(["STANDARD"]));
        // Test critique: le hash ne sort jamais
        assert!(user.get("password").is_none());

        let credentials = json!({ "email": "ada@example.com", "password": "123456" });
        let (status, body) = post(&app, "/users/authenticate", credentials).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/users/{id}/password"),
            Some(json!({ "password": "654321" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let stale = json!({ "email": "ada@example.com", "password": "123456" });
        let (status, body) = post(&app, "/users/authenticate", stale).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_id(&body), "user.notfound");
    }

    #[tokio::test]
    async fn test_password_update_of_missing_user() {
        let (status, body) = send(
            &app(),
            Method::PUT,
            "/users/77/password",
            Some(json!({ "password": "654321" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_id(&body), "user.notfound");
    }
}
