use std::collections::HashMap;

use chrono::Utc;
use sea_orm::*;

use crate::entity::{
    attachment, attachment_type, content, content_feature, content_type,
    content_type_attachment_type, content_type_feature, library,
};
use crate::error::{AppError, ValidationErrors};
use crate::models::attachment_type::{AttachmentTypeResponse, MAX_ATTACHMENT_TYPE_NAME};
use crate::models::content_type::{
    ContentTypeResponse, CreateContentTypeRequest, FeatureResponse, FeatureSpec,
    MAX_CONTENT_TYPE_NAME, check_feature_specs,
};
use crate::models::shared::{check_name, validate_name, validate_unique_ids};
use crate::utils::scope::OwnerScope;

/// Attachment types, content types and their feature schemas of one owner.
///
/// The only writer of the schema tables.
pub struct SchemaRegistry<'a, C> {
    conn: &'a C,
    scope: OwnerScope,
}

impl<'a, C: ConnectionTrait + TransactionTrait> SchemaRegistry<'a, C> {
    pub fn new(conn: &'a C, scope: OwnerScope) -> Self {
        Self { conn, scope }
    }

    pub async fn create_attachment_type(
        &self,
        name: &str,
    ) -> Result<attachment_type::Model, AppError> {
        let name = validate_name("name", name, MAX_ATTACHMENT_TYPE_NAME)?;
        let model = attachment_type::ActiveModel {
            user_id: Set(self.scope.user_id()),
            name: Set(name),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;
        Ok(model)
    }

    pub async fn list_attachment_types(&self) -> Result<Vec<attachment_type::Model>, AppError> {
        Ok(attachment_type::Entity::find()
            .filter(attachment_type::Column::UserId.eq(self.scope.user_id()))
            .order_by_asc(attachment_type::Column::Id)
            .all(self.conn)
            .await?)
    }

    /// Fails with `Conflict` while any attachment still uses the type.
    /// Otherwise the type also leaves every permitted set it was in.
    pub async fn delete_attachment_type(&self, id: i32) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;
        let at = self.scope.attachment_type(&txn, id).await?;

        let in_use = attachment::Entity::find()
            .filter(attachment::Column::AttachmentTypeId.eq(at.id))
            .count(&txn)
            .await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Attachment type is used by {in_use} attachment(s)"
            )));
        }

        content_type_attachment_type::Entity::delete_many()
            .filter(content_type_attachment_type::Column::AttachmentTypeId.eq(at.id))
            .exec(&txn)
            .await?;
        attachment_type::Entity::delete_by_id(at.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Create a content type with its permitted attachment types and feature
    /// schema in one transaction.
    pub async fn create_content_type(
        &self,
        req: &CreateContentTypeRequest,
    ) -> Result<ContentTypeResponse, AppError> {
        let mut errors = ValidationErrors::new();
        let name = check_name(&mut errors, "name", &req.name, MAX_CONTENT_TYPE_NAME);
        let features = check_feature_specs(&mut errors, "features", &req.features, &[]);
        if let Err(AppError::Validation(e)) =
            validate_unique_ids(&req.attachment_type_ids, "attachment_type_ids")
        {
            errors.merge(e);
        }
        errors.into_result()?;

        let txn = self.conn.begin().await?;
        let attachment_types = self
            .scope
            .attachment_types(&txn, &req.attachment_type_ids)
            .await
            .map_err(|e| e.in_field("attachment_type_ids"))?;

        let ct = content_type::ActiveModel {
            user_id: Set(self.scope.user_id()),
            name: Set(name),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for at in &attachment_types {
            content_type_attachment_type::ActiveModel {
                content_type_id: Set(ct.id),
                attachment_type_id: Set(at.id),
            }
            .insert(&txn)
            .await?;
        }

        let mut feature_models = Vec::with_capacity(features.len());
        for f in features {
            let model = content_type_feature::ActiveModel {
                content_type_id: Set(ct.id),
                name: Set(f.name),
                kind: Set(f.kind),
                required: Set(f.required),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            feature_models.push(model);
        }

        txn.commit().await?;
        tracing::info!(content_type_id = ct.id, "Created content type");

        Ok(ContentTypeResponse {
            id: ct.id,
            name: ct.name,
            attachment_types: attachment_types.into_iter().map(Into::into).collect(),
            features: feature_models.into_iter().map(Into::into).collect(),
            created_at: ct.created_at,
        })
    }

    pub async fn get_content_type(&self, id: i32) -> Result<ContentTypeResponse, AppError> {
        let ct = self.scope.content_type(self.conn, id).await?;
        let mut all = self.describe(vec![ct]).await?;
        all.pop()
            .ok_or_else(|| AppError::Internal("content type vanished".into()))
    }

    /// All content types of the owner, in creation order.
    pub async fn list_content_types(&self) -> Result<Vec<ContentTypeResponse>, AppError> {
        let types = content_type::Entity::find()
            .filter(content_type::Column::UserId.eq(self.scope.user_id()))
            .order_by_asc(content_type::Column::Id)
            .all(self.conn)
            .await?;
        self.describe(types).await
    }

    /// Fails with `Conflict` while content or a library still uses the type.
    /// Otherwise its feature schema and permitted set go with it.
    pub async fn delete_content_type(&self, id: i32) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;
        let ct = self.scope.content_type_for_update(&txn, id).await?;

        let contents = content::Entity::find()
            .filter(content::Column::ContentTypeId.eq(ct.id))
            .count(&txn)
            .await?;
        let libraries = library::Entity::find()
            .filter(library::Column::ContentTypeId.eq(ct.id))
            .count(&txn)
            .await?;
        if contents > 0 || libraries > 0 {
            return Err(AppError::Conflict(format!(
                "Content type is used by {contents} content(s) and {libraries} library(ies)"
            )));
        }

        content_type_feature::Entity::delete_many()
            .filter(content_type_feature::Column::ContentTypeId.eq(ct.id))
            .exec(&txn)
            .await?;
        content_type_attachment_type::Entity::delete_many()
            .filter(content_type_attachment_type::Column::ContentTypeId.eq(ct.id))
            .exec(&txn)
            .await?;
        content_type::Entity::delete_by_id(ct.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Append one feature definition, keeping the per-type cap.
    ///
    /// A required feature can only be added while the type has no content,
    /// since existing content would lack a value for it.
    pub async fn add_feature(
        &self,
        content_type_id: i32,
        spec: &FeatureSpec,
    ) -> Result<FeatureResponse, AppError> {
        let txn = self.conn.begin().await?;
        let ct = self
            .scope
            .content_type_for_update(&txn, content_type_id)
            .await?;

        let existing: Vec<String> = content_type_feature::Entity::find()
            .filter(content_type_feature::Column::ContentTypeId.eq(ct.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|f| f.name)
            .collect();

        let mut errors = ValidationErrors::new();
        let mut valid = check_feature_specs(
            &mut errors,
            "features",
            std::slice::from_ref(spec),
            &existing,
        );
        errors.into_result()?;
        let feature = valid
            .pop()
            .ok_or_else(|| AppError::Internal("validated feature missing".into()))?;

        if feature.required {
            let contents = content::Entity::find()
                .filter(content::Column::ContentTypeId.eq(ct.id))
                .count(&txn)
                .await?;
            if contents > 0 {
                return Err(AppError::Conflict(
                    "Content of this type already exists; new features must be optional".into(),
                ));
            }
        }

        let model = content_type_feature::ActiveModel {
            content_type_id: Set(ct.id),
            name: Set(feature.name),
            kind: Set(feature.kind),
            required: Set(feature.required),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        Ok(model.into())
    }

    /// Remove a feature definition together with every value stored for it.
    pub async fn remove_feature(&self, content_type_id: i32, feature_id: i32) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;
        let ct = self
            .scope
            .content_type_for_update(&txn, content_type_id)
            .await?;

        let feature = content_type_feature::Entity::find_by_id(feature_id)
            .filter(content_type_feature::Column::ContentTypeId.eq(ct.id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Feature not found".into()))?;

        let removed = content_feature::Entity::delete_many()
            .filter(content_feature::Column::FeatureId.eq(feature.id))
            .exec(&txn)
            .await?;
        content_type_feature::Entity::delete_by_id(feature.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::debug!(
            feature_id = feature.id,
            values_removed = removed.rows_affected,
            "Removed feature"
        );
        Ok(())
    }

    /// Load features and permitted attachment types for a batch of types.
    async fn describe(
        &self,
        types: Vec<content_type::Model>,
    ) -> Result<Vec<ContentTypeResponse>, AppError> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = types.iter().map(|t| t.id).collect();

        let mut features: HashMap<i32, Vec<content_type_feature::Model>> = HashMap::new();
        for f in content_type_feature::Entity::find()
            .filter(content_type_feature::Column::ContentTypeId.is_in(ids.clone()))
            .order_by_asc(content_type_feature::Column::Id)
            .all(self.conn)
            .await?
        {
            features.entry(f.content_type_id).or_default().push(f);
        }

        let links = content_type_attachment_type::Entity::find()
            .filter(content_type_attachment_type::Column::ContentTypeId.is_in(ids))
            .all(self.conn)
            .await?;
        let at_ids: Vec<i32> = links.iter().map(|l| l.attachment_type_id).collect();
        let at_by_id: HashMap<i32, attachment_type::Model> = if at_ids.is_empty() {
            HashMap::new()
        } else {
            attachment_type::Entity::find()
                .filter(attachment_type::Column::Id.is_in(at_ids))
                .all(self.conn)
                .await?
                .into_iter()
                .map(|at| (at.id, at))
                .collect()
        };
        let mut permitted: HashMap<i32, Vec<attachment_type::Model>> = HashMap::new();
        for link in &links {
            if let Some(at) = at_by_id.get(&link.attachment_type_id) {
                permitted
                    .entry(link.content_type_id)
                    .or_default()
                    .push(at.clone());
            }
        }

        Ok(types
            .into_iter()
            .map(|ct| {
                let mut ats = permitted.remove(&ct.id).unwrap_or_default();
                ats.sort_by_key(|at| at.id);
                ContentTypeResponse {
                    id: ct.id,
                    name: ct.name,
                    attachment_types: ats.into_iter().map(Into::into).collect(),
                    features: features
                        .remove(&ct.id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(Into::into)
                        .collect(),
                    created_at: ct.created_at,
                }
            })
            .collect())
    }
}
