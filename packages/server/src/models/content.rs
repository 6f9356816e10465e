use std::collections::{BTreeMap, HashSet};

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use common::FeatureKind;
use serde::{Deserialize, Serialize};

use crate::entity::{attachment, content, content_type_feature};
use crate::error::ValidationErrors;

/// A file received in a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

/// Everything needed to create one content, as parsed from the upload form.
#[derive(Debug)]
pub struct NewContent {
    pub content_type_id: i32,
    pub library_id: Option<i32>,
    pub file: UploadedFile,
    /// `(feature id, raw value)` pairs, in form order.
    pub features: Vec<(i32, String)>,
    /// `(attachment type id, file)` pairs, in form order.
    pub attachments: Vec<(i32, UploadedFile)>,
}

/// The parts of a feature definition that value validation needs.
#[derive(Debug, Clone)]
pub struct FeatureDef {
    pub id: i32,
    pub name: String,
    pub kind: FeatureKind,
    pub required: bool,
}

impl From<&content_type_feature::Model> for FeatureDef {
    fn from(m: &content_type_feature::Model) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            kind: m.kind,
            required: m.required,
        }
    }
}

/// Check raw values against a content type's feature schema.
///
/// Returns the `(feature id, normalised value)` pairs to store. Blank values
/// count as absent. Errors are keyed `feature.<id>`.
pub fn validate_feature_values(
    defs: &[FeatureDef],
    values: &[(i32, String)],
) -> Result<Vec<(i32, String)>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut supplied: BTreeMap<i32, &str> = BTreeMap::new();
    let mut seen = HashSet::new();

    for (feature_id, raw) in values {
        let field = format!("feature.{feature_id}");
        if !seen.insert(*feature_id) {
            errors.add(field, "Value supplied more than once");
            continue;
        }
        if !defs.iter().any(|d| d.id == *feature_id) {
            errors.add(field, "Unknown feature for this content type");
            continue;
        }
        if !raw.trim().is_empty() {
            supplied.insert(*feature_id, raw.as_str());
        }
    }

    let mut normalised = Vec::new();
    for def in defs {
        let field = format!("feature.{}", def.id);
        match supplied.get(&def.id) {
            Some(raw) => match def.kind.parse_value(raw) {
                Ok(value) => normalised.push((def.id, value)),
                Err(e) => errors.add(field, format!("{}: {e}", def.name)),
            },
            None if def.required => errors.add(field, format!("{} is required", def.name)),
            None => {}
        }
    }

    if errors.is_empty() {
        Ok(normalised)
    } else {
        Err(errors)
    }
}

#[derive(Deserialize, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContentListQuery {
    /// Only contents of this type.
    pub content_type_id: Option<i32>,
    /// Only contents placed in this library.
    pub library_id: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct FeatureValueInput {
    #[schema(example = 3)]
    pub feature_id: i32,
    #[schema(example = "42")]
    pub value: String,
}

/// Replaces every feature value of a content.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetFeaturesRequest {
    pub features: Vec<FeatureValueInput>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FeatureValueResponse {
    #[schema(example = 3)]
    pub feature_id: i32,
    #[schema(example = "Duration")]
    pub name: String,
    pub kind: FeatureKind,
    /// Normalised text, e.g. `42` or `true`.
    #[schema(example = "42")]
    pub value: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AttachmentResponse {
    #[schema(example = 5)]
    pub id: i32,
    #[schema(example = 1)]
    pub attachment_type_id: i32,
    #[schema(example = "subs.srt")]
    pub filename: String,
    #[schema(example = "user_alice/movie_subs.srt")]
    pub path: String,
    pub mime_type: Option<String>,
    pub size: i64,
    /// SHA-256, hex encoded.
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

impl From<attachment::Model> for AttachmentResponse {
    fn from(m: attachment::Model) -> Self {
        Self {
            id: m.id,
            attachment_type_id: m.attachment_type_id,
            filename: m.filename,
            path: m.path,
            mime_type: m.mime_type,
            size: m.size,
            checksum: m.checksum,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContentListItem {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = 1)]
    pub content_type_id: i32,
    pub library_id: Option<i32>,
    #[schema(example = "movie.mp4")]
    pub filename: String,
    #[schema(example = "user_alice/movie.mp4")]
    pub path: String,
    pub mime_type: Option<String>,
    pub size: i64,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

impl From<content::Model> for ContentListItem {
    fn from(m: content::Model) -> Self {
        Self {
            id: m.id,
            content_type_id: m.content_type_id,
            library_id: m.library_id,
            filename: m.filename,
            path: m.path,
            mime_type: m.mime_type,
            size: m.size,
            checksum: m.checksum,
            created_at: m.created_at,
        }
    }
}

/// A content with its feature values and attachments.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ContentResponse {
    #[serde(flatten)]
    pub content: ContentListItem,
    pub features: Vec<FeatureValueResponse>,
    pub attachments: Vec<AttachmentResponse>,
}
