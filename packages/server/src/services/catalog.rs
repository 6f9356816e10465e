use std::collections::{HashMap, HashSet};

use chrono::Utc;
use common::storage::BlobStore;
use sea_orm::*;

use crate::entity::{
    attachment, content, content_feature, content_type_attachment_type, content_type_feature,
};
use crate::error::{AppError, ValidationErrors};
use crate::models::content::{
    AttachmentResponse, ContentListItem, ContentListQuery, ContentResponse, FeatureDef,
    FeatureValueResponse, NewContent, UploadedFile, validate_feature_values,
};
use crate::utils::filename::{
    derive_attachment_path, derive_content_path, stored_name_fits, validate_flat_filename,
};
use crate::utils::scope::OwnerScope;

/// Contents of one owner with their feature values and attachments.
///
/// Blobs are written before the row transaction commits. If anything fails
/// after the first write, the blobs written so far are removed again, so a
/// committed row always points at a stored blob.
pub struct ContentCatalog<'a, C> {
    conn: &'a C,
    blobs: &'a dyn BlobStore,
    scope: OwnerScope,
    username: &'a str,
}

impl<'a, C: ConnectionTrait + TransactionTrait> ContentCatalog<'a, C> {
    pub fn new(conn: &'a C, blobs: &'a dyn BlobStore, scope: OwnerScope, username: &'a str) -> Self {
        Self {
            conn,
            blobs,
            scope,
            username,
        }
    }

    /// Create a content with its feature values and attachments, all or nothing.
    pub async fn create_content(&self, new: NewContent) -> Result<ContentResponse, AppError> {
        let mut errors = ValidationErrors::new();
        let filename = check_upload(&mut errors, "file", &new.file);
        let mut attachment_names = Vec::with_capacity(new.attachments.len());
        for (type_id, file) in &new.attachments {
            let field = format!("attachment.{type_id}");
            attachment_names.push(check_upload(&mut errors, &field, file));
        }
        errors.into_result()?;

        let txn = self.conn.begin().await?;
        let ct = self
            .scope
            .content_type_for_update(&txn, new.content_type_id)
            .await
            .map_err(|e| e.in_field("content_type_id"))?;

        if let Some(library_id) = new.library_id {
            let library = self
                .scope
                .library(&txn, library_id)
                .await
                .map_err(|e| e.in_field("library_id"))?;
            if library.content_type_id != ct.id {
                return Err(AppError::Conflict(format!(
                    "Library '{}' only holds content of another type",
                    library.name
                )));
            }
        }

        let defs = feature_defs(&txn, ct.id).await?;
        let values = validate_feature_values(&defs, &new.features).map_err(AppError::Validation)?;

        let permitted = permitted_attachment_types(&txn, ct.id).await?;
        for (type_id, _) in &new.attachments {
            let at = self
                .scope
                .attachment_type(&txn, *type_id)
                .await
                .map_err(|e| e.in_field(format!("attachment.{type_id}")))?;
            if !permitted.contains(&at.id) {
                return Err(not_permitted(&at.name, &ct.name));
            }
        }

        let path = derive_content_path(self.username, &filename);
        let mut paths = HashSet::from([path.clone()]);
        let mut attachment_paths = Vec::with_capacity(attachment_names.len());
        let mut errors = ValidationErrors::new();
        for ((type_id, _), name) in new.attachments.iter().zip(&attachment_names) {
            let attachment_path = derive_attachment_path(&path, name);
            if !stored_name_fits(&attachment_path) {
                errors.add(format!("attachment.{type_id}"), STORED_NAME_TOO_LONG);
            }
            if !paths.insert(attachment_path.clone()) {
                return Err(AppError::Conflict(format!(
                    "Two files in this upload would be stored at '{attachment_path}'"
                )));
            }
            attachment_paths.push(attachment_path);
        }
        errors.into_result()?;
        for p in &paths {
            ensure_path_free(&txn, p).await?;
        }

        let mut written: Vec<String> = Vec::new();
        let result: Result<ContentResponse, AppError> = async {
            let stored = self.blobs.put(&path, &new.file.data).await?;
            written.push(path.clone());

            let content = content::ActiveModel {
                creator_id: Set(self.scope.user_id()),
                content_type_id: Set(ct.id),
                library_id: Set(new.library_id),
                filename: Set(filename.clone()),
                path: Set(path.clone()),
                mime_type: Set(guess_mime(&filename)),
                size: Set(stored.size as i64),
                checksum: Set(stored.checksum.to_hex()),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(path_conflict)?;

            let features = insert_feature_values(&txn, content.id, &defs, values).await?;

            let mut attachments = Vec::with_capacity(new.attachments.len());
            for (((type_id, file), name), attachment_path) in new
                .attachments
                .iter()
                .zip(&attachment_names)
                .zip(&attachment_paths)
            {
                let stored = self.blobs.put(attachment_path, &file.data).await?;
                written.push(attachment_path.clone());

                let model = attachment::ActiveModel {
                    content_id: Set(content.id),
                    attachment_type_id: Set(*type_id),
                    filename: Set(name.clone()),
                    path: Set(attachment_path.clone()),
                    mime_type: Set(guess_mime(name)),
                    size: Set(stored.size as i64),
                    checksum: Set(stored.checksum.to_hex()),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(path_conflict)?;
                attachments.push(model.into());
            }

            txn.commit().await?;

            Ok(ContentResponse {
                content: content.into(),
                features,
                attachments,
            })
        }
        .await;

        match result {
            Ok(response) => {
                tracing::info!(content_id = response.content.id, path = %path, "Created content");
                Ok(response)
            }
            Err(e) => {
                self.discard_blobs(&written).await;
                Err(e)
            }
        }
    }

    /// Replace every feature value of a content.
    pub async fn attach_features(
        &self,
        content_id: i32,
        values: &[(i32, String)],
    ) -> Result<Vec<FeatureValueResponse>, AppError> {
        let txn = self.conn.begin().await?;
        let content = self.scope.content_for_update(&txn, content_id).await?;

        let defs = feature_defs(&txn, content.content_type_id).await?;
        let values = validate_feature_values(&defs, values).map_err(AppError::Validation)?;

        content_feature::Entity::delete_many()
            .filter(content_feature::Column::ContentId.eq(content.id))
            .exec(&txn)
            .await?;
        let features = insert_feature_values(&txn, content.id, &defs, values).await?;
        txn.commit().await?;

        Ok(features)
    }

    /// Attach a file of a permitted attachment type to an existing content.
    pub async fn attach_attachment(
        &self,
        content_id: i32,
        attachment_type_id: i32,
        file: UploadedFile,
    ) -> Result<AttachmentResponse, AppError> {
        let mut errors = ValidationErrors::new();
        let name = check_upload(&mut errors, "file", &file);
        errors.into_result()?;

        let txn = self.conn.begin().await?;
        let content = self.scope.content_for_update(&txn, content_id).await?;
        let at = self
            .scope
            .attachment_type(&txn, attachment_type_id)
            .await
            .map_err(|e| e.in_field("attachment_type_id"))?;

        let permitted = permitted_attachment_types(&txn, content.content_type_id).await?;
        if !permitted.contains(&at.id) {
            let ct = self.scope.content_type(&txn, content.content_type_id).await?;
            return Err(not_permitted(&at.name, &ct.name));
        }

        let path = derive_attachment_path(&content.path, &name);
        if !stored_name_fits(&path) {
            return Err(AppError::invalid("file", STORED_NAME_TOO_LONG));
        }
        ensure_path_free(&txn, &path).await?;

        let stored = self.blobs.put(&path, &file.data).await?;
        let result: Result<attachment::Model, AppError> = async {
            let model = attachment::ActiveModel {
                content_id: Set(content.id),
                attachment_type_id: Set(at.id),
                filename: Set(name.clone()),
                path: Set(path.clone()),
                mime_type: Set(guess_mime(&name)),
                size: Set(stored.size as i64),
                checksum: Set(stored.checksum.to_hex()),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(path_conflict)?;
            txn.commit().await?;
            Ok(model)
        }
        .await;

        match result {
            Ok(model) => Ok(model.into()),
            Err(e) => {
                self.discard_blobs(std::slice::from_ref(&path)).await;
                Err(e)
            }
        }
    }

    /// Delete a content with all of its feature values and attachments.
    pub async fn delete_content(&self, content_id: i32) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;
        let content = self.scope.content_for_update(&txn, content_id).await?;

        let attachments = attachment::Entity::find()
            .filter(attachment::Column::ContentId.eq(content.id))
            .all(&txn)
            .await?;

        content_feature::Entity::delete_many()
            .filter(content_feature::Column::ContentId.eq(content.id))
            .exec(&txn)
            .await?;
        attachment::Entity::delete_many()
            .filter(attachment::Column::ContentId.eq(content.id))
            .exec(&txn)
            .await?;
        content::Entity::delete_by_id(content.id).exec(&txn).await?;
        txn.commit().await?;

        let mut paths: Vec<String> = attachments.into_iter().map(|a| a.path).collect();
        paths.push(content.path);
        self.discard_blobs(&paths).await;
        Ok(())
    }

    pub async fn delete_attachment(&self, content_id: i32, attachment_id: i32) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;
        let content = self.scope.content_for_update(&txn, content_id).await?;
        let attachment = attachment::Entity::find_by_id(attachment_id)
            .filter(attachment::Column::ContentId.eq(content.id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Attachment not found".into()))?;

        attachment::Entity::delete_by_id(attachment.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        self.discard_blobs(std::slice::from_ref(&attachment.path))
            .await;
        Ok(())
    }

    pub async fn get_content(&self, content_id: i32) -> Result<ContentResponse, AppError> {
        let content = self.scope.content(self.conn, content_id).await?;

        let defs: HashMap<i32, FeatureDef> = feature_defs(self.conn, content.content_type_id)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();
        let features = content_feature::Entity::find()
            .filter(content_feature::Column::ContentId.eq(content.id))
            .order_by_asc(content_feature::Column::FeatureId)
            .all(self.conn)
            .await?
            .into_iter()
            .filter_map(|v| {
                defs.get(&v.feature_id)
                    .map(|d| feature_value_response(d, v.value))
            })
            .collect();

        let attachments = attachment::Entity::find()
            .filter(attachment::Column::ContentId.eq(content.id))
            .order_by_asc(attachment::Column::Id)
            .all(self.conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(ContentResponse {
            content: content.into(),
            features,
            attachments,
        })
    }

    /// The owner's contents, oldest first.
    pub async fn list_contents(
        &self,
        query: &ContentListQuery,
    ) -> Result<Vec<ContentListItem>, AppError> {
        let mut select = content::Entity::find()
            .filter(content::Column::CreatorId.eq(self.scope.user_id()));
        if let Some(content_type_id) = query.content_type_id {
            select = select.filter(content::Column::ContentTypeId.eq(content_type_id));
        }
        if let Some(library_id) = query.library_id {
            select = select.filter(content::Column::LibraryId.eq(library_id));
        }

        Ok(select
            .order_by_asc(content::Column::Id)
            .all(self.conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn discard_blobs(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.blobs.delete(path).await {
                tracing::warn!(path = %path, error = %e, "Failed to remove blob");
            }
        }
    }
}

const STORED_NAME_TOO_LONG: &str =
    "Attachment name combined with the content name must be at most 255 bytes";

/// Validate an uploaded file's name and size, returning the trimmed name.
fn check_upload(errors: &mut ValidationErrors, field: &str, file: &UploadedFile) -> String {
    let name = match validate_flat_filename(&file.filename) {
        Ok(name) => name.to_string(),
        Err(e) => {
            errors.add(field, e.message());
            String::new()
        }
    };
    if file.data.is_empty() {
        errors.add(field, "File must not be empty");
    }
    name
}

async fn feature_defs<C: ConnectionTrait>(
    db: &C,
    content_type_id: i32,
) -> Result<Vec<FeatureDef>, DbErr> {
    Ok(content_type_feature::Entity::find()
        .filter(content_type_feature::Column::ContentTypeId.eq(content_type_id))
        .order_by_asc(content_type_feature::Column::Id)
        .all(db)
        .await?
        .iter()
        .map(FeatureDef::from)
        .collect())
}

async fn permitted_attachment_types<C: ConnectionTrait>(
    db: &C,
    content_type_id: i32,
) -> Result<HashSet<i32>, DbErr> {
    Ok(content_type_attachment_type::Entity::find()
        .filter(content_type_attachment_type::Column::ContentTypeId.eq(content_type_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.attachment_type_id)
        .collect())
}

async fn insert_feature_values<C: ConnectionTrait>(
    db: &C,
    content_id: i32,
    defs: &[FeatureDef],
    values: Vec<(i32, String)>,
) -> Result<Vec<FeatureValueResponse>, AppError> {
    let mut out = Vec::with_capacity(values.len());
    for (feature_id, value) in values {
        let def = defs
            .iter()
            .find(|d| d.id == feature_id)
            .ok_or_else(|| AppError::Internal(format!("feature {feature_id} not in schema")))?;
        content_feature::ActiveModel {
            content_id: Set(content_id),
            feature_id: Set(feature_id),
            value: Set(value.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        out.push(feature_value_response(def, value));
    }
    Ok(out)
}

fn feature_value_response(def: &FeatureDef, value: String) -> FeatureValueResponse {
    FeatureValueResponse {
        feature_id: def.id,
        name: def.name.clone(),
        kind: def.kind,
        value,
    }
}

/// `Conflict` if a content or attachment row already uses `path`.
async fn ensure_path_free<C: ConnectionTrait>(db: &C, path: &str) -> Result<(), AppError> {
    let contents = content::Entity::find()
        .filter(content::Column::Path.eq(path))
        .count(db)
        .await?;
    let attachments = attachment::Entity::find()
        .filter(attachment::Column::Path.eq(path))
        .count(db)
        .await?;
    if contents + attachments > 0 {
        return Err(AppError::Conflict(format!(
            "A file already exists at '{path}'"
        )));
    }
    Ok(())
}

fn path_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A file with this name already exists".into())
        }
        _ => AppError::from(e),
    }
}

fn not_permitted(attachment_type: &str, content_type: &str) -> AppError {
    AppError::Conflict(format!(
        "Attachment type '{attachment_type}' is not permitted for content type '{content_type}'"
    ))
}

fn guess_mime(filename: &str) -> Option<String> {
    mime_guess::from_path(filename).first().map(|m| m.to_string())
}
