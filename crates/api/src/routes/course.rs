use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use syllabus_core::error::EntityKind;
use syllabus_core::models::{Course, CourseDraft, EntityId};

use super::{Created, PagedBody, body};
use crate::error::{ApiResult, ResourceResult};
use crate::extract::ListParams;
use crate::state::AppState;

const KIND: EntityKind = EntityKind::Course;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(find_by_filter).post(add))
        .route(
            "/courses/{id}",
            get(find_by_id).put(update).delete(delete_by_id),
        )
}

async fn find_by_filter(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedBody<Course>>> {
    let filter = params.course_filter()?;
    debug!(?filter, "Finding courses");

    let page = state.courses.find_by_filter(&filter).await.for_resource(KIND)?;
    Ok(Json(page.into()))
}

async fn find_by_id(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Course>> {
    let course = state.courses.find_by_id(id).await.for_resource(KIND)?;
    Ok(Json(course))
}

/// `categoryId` must name an existing category.
async fn add(
    State(state): State<AppState>,
    payload: Result<Json<CourseDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let draft = body(KIND, payload)?;
    let course = state.courses.add(&draft).await.for_resource(KIND)?;
    Ok((StatusCode::CREATED, Json(Created { id: course.id })))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<CourseDraft>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let draft = body(KIND, payload)?;
    state.courses.update(id, &draft).await.for_resource(KIND)?;
    Ok(StatusCode::OK)
}

/// Also removes every review of the course, in one transaction.
async fn delete_by_id(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    state.courses.delete_by_id(id).await.for_resource(KIND)?;
    Ok(StatusCode::OK)
}
