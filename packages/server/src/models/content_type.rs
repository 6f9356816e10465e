use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::FeatureKind;
use serde::{Deserialize, Serialize};

use super::attachment_type::AttachmentTypeResponse;
use super::shared::check_name;
use crate::entity::content_type_feature;
use crate::error::ValidationErrors;

pub const MAX_CONTENT_TYPE_NAME: usize = 40;
pub const MAX_FEATURE_NAME: usize = 50;
/// Feature definitions one content type may carry.
pub const MAX_FEATURES_PER_TYPE: usize = 20;

/// A feature definition as submitted by the client.
#[derive(Deserialize, Clone, utoipa::ToSchema)]
pub struct FeatureSpec {
    /// 1-50 characters, unique (case-insensitive) within the content type.
    #[schema(example = "Duration")]
    pub name: String,
    /// One of `Number`, `String`, `Boolean` (case-insensitive).
    #[schema(example = "Number")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateContentTypeRequest {
    /// 1-40 characters.
    #[schema(example = "Video")]
    pub name: String,
    /// Attachment types that content of this type may carry. All must be yours.
    #[serde(default)]
    #[schema(example = json!([1]))]
    pub attachment_type_ids: Vec<i32>,
    /// At most 20.
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
}

/// A feature definition that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFeature {
    pub name: String,
    pub kind: FeatureKind,
    pub required: bool,
}

/// Validate a batch of feature definitions about to be added to a type that
/// already has `existing` features. Errors are keyed `{field}.{index}.name` /
/// `{field}.{index}.kind`, or `{field}` for the count cap.
pub fn check_feature_specs(
    errors: &mut ValidationErrors,
    field: &str,
    specs: &[FeatureSpec],
    existing: &[String],
) -> Vec<ValidFeature> {
    if existing.len() + specs.len() > MAX_FEATURES_PER_TYPE {
        errors.add(
            field,
            format!("A content type can have at most {MAX_FEATURES_PER_TYPE} features"),
        );
    }

    let mut seen: HashSet<String> = existing.iter().map(|n| n.to_lowercase()).collect();
    let mut valid = Vec::with_capacity(specs.len());

    for (i, spec) in specs.iter().enumerate() {
        let name_field = format!("{field}.{i}.name");
        let name = check_name(errors, &name_field, &spec.name, MAX_FEATURE_NAME);
        if !name.is_empty() && !seen.insert(name.to_lowercase()) {
            errors.add(&name_field, format!("Duplicate feature name '{name}'"));
        }

        match spec.kind.parse::<FeatureKind>() {
            Ok(kind) => valid.push(ValidFeature {
                name,
                kind,
                required: spec.required,
            }),
            Err(e) => errors.add(format!("{field}.{i}.kind"), e.to_string()),
        }
    }
    valid
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FeatureResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Duration")]
    pub name: String,
    pub kind: FeatureKind,
    pub required: bool,
}

impl From<content_type_feature::Model> for FeatureResponse {
    fn from(m: content_type_feature::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            kind: m.kind,
            required: m.required,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContentTypeResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Video")]
    pub name: String,
    /// Attachment types permitted on content of this type.
    pub attachment_types: Vec<AttachmentTypeResponse>,
    /// Feature schema, in definition order.
    pub features: Vec<FeatureResponse>,
    pub created_at: DateTime<Utc>,
}
