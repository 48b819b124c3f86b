use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use syllabus_core::error::EntityKind;
use syllabus_core::models::{Category, CategoryDraft, EntityId};

use super::{Created, PagedBody, body};
use crate::error::{ApiResult, ResourceResult};
use crate::extract::ListParams;
use crate::state::AppState;

const KIND: EntityKind = EntityKind::Category;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(find_by_filter).post(add))
        .route(
            "/categories/{id}",
            get(find_by_id).put(update).delete(delete_by_id),
        )
}

async fn find_by_filter(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedBody<Category>>> {
    let filter = params.category_filter()?;
    debug!(?filter, "Finding categories");

    let page = state.categories.find_by_filter(&filter).await.for_resource(KIND)?;
    Ok(Json(page.into()))
}

async fn find_by_id(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Category>> {
    let category = state.categories.find_by_id(id).await.for_resource(KIND)?;
    Ok(Json(category))
}

async fn add(
    State(state): State<AppState>,
    payload: Result<Json<CategoryDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let draft = body(KIND, payload)?;
    let category = state.categories.add(&draft).await.for_resource(KIND)?;
    Ok((StatusCode::CREATED, Json(Created { id: category.id })))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<CategoryDraft>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let draft = body(KIND, payload)?;
    state.categories.update(id, &draft).await.for_resource(KIND)?;
    Ok(StatusCode::OK)
}

async fn delete_by_id(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    state.categories.delete_by_id(id).await.for_resource(KIND)?;
    Ok(StatusCode::OK)
}
