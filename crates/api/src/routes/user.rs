use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use syllabus_core::error::EntityKind;
use syllabus_core::models::{EntityId, User, UserDraft};

use super::{Created, PagedBody, body};
use crate::error::{ApiError, ApiResult, ResourceResult};
use crate::extract::ListParams;
use crate::state::AppState;

const KIND: EntityKind = EntityKind::User;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(find_by_filter).post(add))
        .route("/users/authenticate", post(authenticate))
        .route(
            "/users/{id}",
            get(find_by_id).put(update).delete(delete_by_id),
        )
        .route("/users/{id}/password", put(update_password))
}

#[derive(Debug, Deserialize)]
struct PasswordChange {
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

fn present(value: Option<String>, field: &str) -> ApiResult<String> {
    value.ok_or_else(|| ApiError::bad_request(KIND, field, "may not be null"))
}

async fn find_by_filter(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedBody<User>>> {
    let filter = params.user_filter()?;
    debug!(?filter, "Finding users");

    let page = state.users.find_by_filter(&filter).await.for_resource(KIND)?;
    Ok(Json(page.into()))
}

async fn find_by_id(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<User>> {
    let user = state.users.find_by_id(id).await.for_resource(KIND)?;
    Ok(Json(user))
}

async fn add(
    State(state): State<AppState>,
    payload: Result<Json<UserDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let draft = body(KIND, payload)?;
    let user = state.users.add(&draft).await.for_resource(KIND)?;
    Ok((StatusCode::CREATED, Json(Created { id: user.id })))
}

/// Name and email only; a password in the body is ignored.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<UserDraft>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let draft = body(KIND, payload)?;
    state.users.update(id, &draft).await.for_resource(KIND)?;
    Ok(StatusCode::OK)
}

async fn update_password(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<PasswordChange>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let password = present(body(KIND, payload)?.password, "password")?;
    state
        .users
        .update_password(id, &password)
        .await
        .for_resource(KIND)?;
    Ok(StatusCode::OK)
}

/// The user matching email and password. Unknown email and wrong password
/// both answer 404.
async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let credentials = body(KIND, payload)?;
    let email = present(credentials.email, "email")?;
    let password = present(credentials.password, "password")?;

    let user = state
        .users
        .find_by_email_and_password(&email, &password)
        .await
        .for_resource(KIND)?;
    Ok(Json(user))
}

async fn delete_by_id(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> ApiResult<StatusCode> {
    state.users.delete_by_id(id).await.for_resource(KIND)?;
    Ok(StatusCode::OK)
}
