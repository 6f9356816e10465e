use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::attachment_type;

pub const MAX_ATTACHMENT_TYPE_NAME: usize = 32;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAttachmentTypeRequest {
    /// 1-32 characters.
    #[schema(example = "Subtitle")]
    pub name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AttachmentTypeResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Subtitle")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<attachment_type::Model> for AttachmentTypeResponse {
    fn from(m: attachment_type::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            created_at: m.created_at,
        }
    }
}
