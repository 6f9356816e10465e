use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::content::ContentListItem;
use crate::models::library::{CreateLibraryRequest, LibraryResponse, ReassignLibraryRequest};
use crate::services::LibraryIndex;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Libraries",
    operation_id = "createLibrary",
    summary = "Create a library",
    request_body = CreateLibraryRequest,
    responses(
        (status = 201, description = "Library created", body = LibraryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_library(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateLibraryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let library = LibraryIndex::new(&state.db, auth_user.scope())
        .create_library(&payload)
        .await?;
    Ok((StatusCode::CREATED, Json(library)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Libraries",
    operation_id = "listLibraries",
    summary = "List your libraries",
    description = "Ordered by content count, most populated first; ties by creation order.",
    responses(
        (status = 200, description = "Libraries", body = Vec<LibraryResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_libraries(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LibraryResponse>>, AppError> {
    let libraries = LibraryIndex::new(&state.db, auth_user.scope())
        .list_libraries()
        .await?;
    Ok(Json(libraries))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Libraries",
    operation_id = "deleteLibrary",
    summary = "Delete a library",
    description = "Contents in the library are kept and no longer belong to any library.",
    params(("id" = i32, Path, description = "Library ID")),
    responses(
        (status = 204, description = "Library deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Library not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_library(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    LibraryIndex::new(&state.db, auth_user.scope())
        .delete_library(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/library",
    tag = "Contents",
    operation_id = "reassignLibrary",
    summary = "Move a content to another library",
    description = "`library_id: null` takes the content out of its library.",
    params(("id" = i32, Path, description = "Content ID")),
    request_body = ReassignLibraryRequest,
    responses(
        (status = 200, description = "Content moved", body = ContentListItem),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content or library not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Library holds another content type (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn reassign_library(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReassignLibraryRequest>,
) -> Result<Json<ContentListItem>, AppError> {
    let content = LibraryIndex::new(&state.db, auth_user.scope())
        .reassign_library(id, payload.library_id)
        .await?;
    Ok(Json(content))
}
