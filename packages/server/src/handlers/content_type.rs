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
use crate::models::content_type::{
    ContentTypeResponse, CreateContentTypeRequest, FeatureResponse, FeatureSpec,
};
use crate::services::SchemaRegistry;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Content Types",
    operation_id = "createContentType",
    summary = "Create a content type",
    description = "Creates the type, its permitted attachment types and its feature schema \
        (at most 20 features) in one transaction.",
    request_body = CreateContentTypeRequest,
    responses(
        (status = 201, description = "Content type created", body = ContentTypeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_content_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateContentTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = SchemaRegistry::new(&state.db, auth_user.scope())
        .create_content_type(&payload)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Content Types",
    operation_id = "listContentTypes",
    summary = "List your content types",
    responses(
        (status = 200, description = "Content types in creation order", body = Vec<ContentTypeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_content_types(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ContentTypeResponse>>, AppError> {
    let types = SchemaRegistry::new(&state.db, auth_user.scope())
        .list_content_types()
        .await?;
    Ok(Json(types))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Content Types",
    operation_id = "getContentType",
    summary = "Get a content type with its schema",
    params(("id" = i32, Path, description = "Content type ID")),
    responses(
        (status = 200, description = "Content type", body = ContentTypeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content type not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_content_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ContentTypeResponse>, AppError> {
    let ct = SchemaRegistry::new(&state.db, auth_user.scope())
        .get_content_type(id)
        .await?;
    Ok(Json(ct))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Content Types",
    operation_id = "deleteContentType",
    summary = "Delete a content type",
    description = "Refused while any content or library uses the type.",
    params(("id" = i32, Path, description = "Content type ID")),
    responses(
        (status = 204, description = "Content type deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content type not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Still in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_content_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    SchemaRegistry::new(&state.db, auth_user.scope())
        .delete_content_type(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/features",
    tag = "Content Types",
    operation_id = "addFeature",
    summary = "Add a feature to a content type",
    description = "A type holds at most 20 features. A required feature can only be added \
        while no content of the type exists.",
    params(("id" = i32, Path, description = "Content type ID")),
    request_body = FeatureSpec,
    responses(
        (status = 201, description = "Feature added", body = FeatureResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content type not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Required feature on a type in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn add_feature(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<FeatureSpec>,
) -> Result<impl IntoResponse, AppError> {
    let feature = SchemaRegistry::new(&state.db, auth_user.scope())
        .add_feature(id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(feature)))
}

#[utoipa::path(
    delete,
    path = "/{id}/features/{feature_id}",
    tag = "Content Types",
    operation_id = "removeFeature",
    summary = "Remove a feature from a content type",
    description = "Every stored value of the feature is removed with it.",
    params(
        ("id" = i32, Path, description = "Content type ID"),
        ("feature_id" = i32, Path, description = "Feature ID"),
    ),
    responses(
        (status = 204, description = "Feature removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content type or feature not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn remove_feature(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, feature_id)): Path<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    SchemaRegistry::new(&state.db, auth_user.scope())
        .remove_feature(id, feature_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
