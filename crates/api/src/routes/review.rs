use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use syllabus_core::error::EntityKind;
use syllabus_core::models::{Review, ReviewDraft, EntityId};

use super::{Created, PagedBody, body};
use crate::error::{ApiResult, ResourceResult};
use crate::extract::ListParams;
use crate::state::AppState;

const KIND: EntityKind = EntityKind::Review;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(find_by_filter).post(add))
        .route(
            "/reviews/{id}",
            get(find_by_id).put(update).delete(delete_by_id),
        )
}

async fn find_by_filter(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedBody<Review>>> {
    let filter = params.review_filter()?;
    debug!(user = ?filter.user_id, course = ?filter.course_id, "Finding reviews");

    let page = state.reviews.find_by_filter(&filter).await.for_resource(KIND)?;
    Ok(Json(page.into()))
}

async fn find_by_id(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Review>> {
    let review = state.reviews.find_by_id(id).await.for_resource(KIND)?;
    Ok(Json(review))
}

/// The author is resolved before the course; the first missing one is reported.
async fn add(
    State(state): State<AppState>,
    payload: Result<Json<ReviewDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let draft = body(KIND, payload)?;
    let review = state.reviews.add(&draft).await.for_resource(KIND)?;
    Ok((StatusCode::CREATED, Json(Created { id: review.id })))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<ReviewDraft>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let draft = body(KIND, payload)?;
    state.reviews.update(id, &draft).await.for_resource(KIND)?;
    Ok(StatusCode::OK)
}

async fn delete_by_id(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    state.reviews.delete_by_id(id).await.for_resource(KIND)?;
    Ok(StatusCode::OK)
}
