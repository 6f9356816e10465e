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
use crate::models::attachment_type::{AttachmentTypeResponse, CreateAttachmentTypeRequest};
use crate::services::SchemaRegistry;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Attachment Types",
    operation_id = "createAttachmentType",
    summary = "Create an attachment type",
    request_body = CreateAttachmentTypeRequest,
    responses(
        (status = 201, description = "Attachment type created", body = AttachmentTypeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_attachment_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAttachmentTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let model = SchemaRegistry::new(&state.db, auth_user.scope())
        .create_attachment_type(&payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(AttachmentTypeResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Attachment Types",
    operation_id = "listAttachmentTypes",
    summary = "List your attachment types",
    responses(
        (status = 200, description = "Attachment types, oldest first", body = Vec<AttachmentTypeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_attachment_types(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttachmentTypeResponse>>, AppError> {
    let types = SchemaRegistry::new(&state.db, auth_user.scope())
        .list_attachment_types()
        .await?;
    Ok(Json(types.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Attachment Types",
    operation_id = "deleteAttachmentType",
    summary = "Delete an attachment type",
    description = "Also removes the type from every content type that permitted it. \
        Refused while any attachment still has this type.",
    params(("id" = i32, Path, description = "Attachment type ID")),
    responses(
        (status = 204, description = "Attachment type deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Attachment type not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Still in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_attachment_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    SchemaRegistry::new(&state.db, auth_user.scope())
        .delete_attachment_type(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
