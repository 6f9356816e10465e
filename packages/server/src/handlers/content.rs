use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::extract::multipart::Field;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sea_orm::DatabaseConnection;
use tracing::instrument;

use super::files::build_blob_response;
use crate::error::{AppError, ErrorBody, ValidationErrors};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::content::{
    AttachmentResponse, ContentListItem, ContentListQuery, ContentResponse,
    FeatureValueResponse, NewContent, SetFeaturesRequest, UploadedFile,
};
use crate::services::ContentCatalog;
use crate::state::AppState;
use crate::utils::scope::StoredFile;

/// Body limit for upload routes: the blob limit plus room for form fields.
pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = max_upload_size.saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

fn catalog<'a>(
    state: &'a AppState,
    auth_user: &'a AuthUser,
) -> ContentCatalog<'a, DatabaseConnection> {
    ContentCatalog::new(
        &state.db,
        &*state.blob_store,
        auth_user.scope(),
        &auth_user.username,
    )
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Contents",
    operation_id = "createContent",
    summary = "Upload a content",
    description = "Multipart form. `content_type_id` and `file` are required; `library_id` is \
        optional. Each `feature.<feature_id>` text field supplies one feature value and each \
        `attachment.<attachment_type_id>` file field one attachment. The content, its feature \
        values and its attachments are created together or not at all. The file is stored at \
        `user_<username>/<filename>`; an occupied path is a conflict and is never overwritten.",
    request_body(content_type = "multipart/form-data", description = "Content file, feature values and attachments"),
    responses(
        (status = 201, description = "Content created", body = ContentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Path taken, attachment type not permitted or library type mismatch (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_content(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = ValidationErrors::new();
    let mut content_type_id = None;
    let mut library_id = None;
    let mut file = None;
    let mut features = Vec::new();
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid("body", format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "content_type_id" => match parse_id(&read_text(field, &name).await?) {
                Some(id) => content_type_id = Some(id),
                None => errors.add(&name, "Must be an integer id"),
            },
            "library_id" => {
                let text = read_text(field, &name).await?;
                if !text.trim().is_empty() {
                    match parse_id(&text) {
                        Some(id) => library_id = Some(id),
                        None => errors.add(&name, "Must be an integer id"),
                    }
                }
            }
            "file" => file = Some(read_file(field, &name).await?),
            _ => {
                if let Some(rest) = name.strip_prefix("feature.") {
                    match parse_id(rest) {
                        Some(id) => features.push((id, read_text(field, &name).await?)),
                        None => errors.add(&name, "Unknown feature field"),
                    }
                } else if let Some(rest) = name.strip_prefix("attachment.") {
                    match parse_id(rest) {
                        Some(id) => attachments.push((id, read_file(field, &name).await?)),
                        None => errors.add(&name, "Unknown attachment field"),
                    }
                }
                // Anything else is ignored.
            }
        }
    }

    if content_type_id.is_none() && !errors.contains("content_type_id") {
        errors.add("content_type_id", "Content type is required");
    }
    if file.is_none() {
        errors.add("file", "A file is required");
    }
    errors.into_result()?;

    let (Some(content_type_id), Some(file)) = (content_type_id, file) else {
        return Err(AppError::Internal("upload fields vanished".into()));
    };
    let new = NewContent {
        content_type_id,
        library_id,
        file,
        features,
        attachments,
    };

    let created = catalog(&state, &auth_user).create_content(new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Contents",
    operation_id = "listContents",
    summary = "List your contents",
    params(ContentListQuery),
    responses(
        (status = 200, description = "Contents, oldest first", body = Vec<ContentListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_contents(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ContentListQuery>,
) -> Result<Json<Vec<ContentListItem>>, AppError> {
    let contents = catalog(&state, &auth_user).list_contents(&query).await?;
    Ok(Json(contents))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Contents",
    operation_id = "getContent",
    summary = "Get a content with its feature values and attachments",
    params(("id" = i32, Path, description = "Content ID")),
    responses(
        (status = 200, description = "Content", body = ContentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_content(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ContentResponse>, AppError> {
    Ok(Json(catalog(&state, &auth_user).get_content(id).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Contents",
    operation_id = "deleteContent",
    summary = "Delete a content",
    description = "Removes the content with all of its feature values and attachments, \
        then their stored files.",
    params(("id" = i32, Path, description = "Content ID")),
    responses(
        (status = 204, description = "Content deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_content(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    catalog(&state, &auth_user).delete_content(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/features",
    tag = "Contents",
    operation_id = "setFeatures",
    summary = "Replace the feature values of a content",
    description = "The new set must satisfy the content type's schema on its own; values not \
        listed are removed.",
    params(("id" = i32, Path, description = "Content ID")),
    request_body = SetFeaturesRequest,
    responses(
        (status = 200, description = "Stored values", body = Vec<FeatureValueResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn set_features(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SetFeaturesRequest>,
) -> Result<Json<Vec<FeatureValueResponse>>, AppError> {
    let values: Vec<(i32, String)> = payload
        .features
        .into_iter()
        .map(|f| (f.feature_id, f.value))
        .collect();
    let stored = catalog(&state, &auth_user)
        .attach_features(id, &values)
        .await?;
    Ok(Json(stored))
}

#[utoipa::path(
    get,
    path = "/{id}/file",
    tag = "Contents",
    operation_id = "downloadContent",
    summary = "Download the content file",
    params(("id" = i32, Path, description = "Content ID")),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers), fields(user_id = auth_user.user_id))]
pub async fn download_content(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let content = auth_user.scope().content(&state.db, id).await?;
    build_blob_response(&StoredFile::from(content), &headers, &*state.blob_store).await
}

#[utoipa::path(
    post,
    path = "/{id}/attachments",
    tag = "Contents",
    operation_id = "addAttachment",
    summary = "Attach a file to a content",
    description = "Multipart form with `attachment_type_id` (text) and `file`. The attachment \
        type must be permitted by the content's type. The file is stored next to the content \
        file as `<content path without extension>_<filename>`.",
    params(("id" = i32, Path, description = "Content ID")),
    request_body(content_type = "multipart/form-data", description = "Attachment type and file"),
    responses(
        (status = 201, description = "Attachment created", body = AttachmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Content not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Type not permitted or path taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn add_attachment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = ValidationErrors::new();
    let mut attachment_type_id = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid("body", format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "attachment_type_id" => match parse_id(&read_text(field, &name).await?) {
                Some(id) => attachment_type_id = Some(id),
                None => errors.add(&name, "Must be an integer id"),
            },
            "file" => file = Some(read_file(field, &name).await?),
            _ => {}
        }
    }

    if attachment_type_id.is_none() && !errors.contains("attachment_type_id") {
        errors.add("attachment_type_id", "Attachment type is required");
    }
    if file.is_none() {
        errors.add("file", "A file is required");
    }
    errors.into_result()?;
    let (Some(attachment_type_id), Some(file)) = (attachment_type_id, file) else {
        return Err(AppError::Internal("upload fields vanished".into()));
    };

    let attachment = catalog(&state, &auth_user)
        .attach_attachment(id, attachment_type_id, file)
        .await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

#[utoipa::path(
    get,
    path = "/{id}/attachments/{attachment_id}/file",
    tag = "Contents",
    operation_id = "downloadAttachment",
    summary = "Download an attachment file",
    params(
        ("id" = i32, Path, description = "Content ID"),
        ("attachment_id" = i32, Path, description = "Attachment ID"),
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Attachment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers), fields(user_id = auth_user.user_id))]
pub async fn download_attachment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, attachment_id)): Path<(i32, i32)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let attachment = auth_user
        .scope()
        .attachment(&state.db, id, attachment_id)
        .await?;
    build_blob_response(&StoredFile::from(attachment), &headers, &*state.blob_store).await
}

#[utoipa::path(
    delete,
    path = "/{id}/attachments/{attachment_id}",
    tag = "Contents",
    operation_id = "deleteAttachment",
    summary = "Remove an attachment",
    params(
        ("id" = i32, Path, description = "Content ID"),
        ("attachment_id" = i32, Path, description = "Attachment ID"),
    ),
    responses(
        (status = 204, description = "Attachment removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Attachment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_attachment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, attachment_id)): Path<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    catalog(&state, &auth_user)
        .delete_attachment(id, attachment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::invalid(name, format!("Failed to read field: {e}")))
}

async fn read_file(field: Field<'_>, name: &str) -> Result<UploadedFile, AppError> {
    let filename = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::invalid(name, "File field must have a filename"))?;
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::invalid(name, format!("Failed to read file: {e}")))?;
    Ok(UploadedFile { filename, data })
}
