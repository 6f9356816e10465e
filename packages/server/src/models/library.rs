use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::library;

pub const MAX_LIBRARY_NAME: usize = 50;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateLibraryRequest {
    /// 1-50 characters.
    #[schema(example = "Holiday videos")]
    pub name: String,
    /// Every content placed in the library must have this type.
    #[schema(example = 1)]
    pub content_type_id: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LibraryResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Holiday videos")]
    pub name: String,
    #[schema(example = 1)]
    pub content_type_id: i32,
    /// Number of contents currently placed in the library.
    #[schema(example = 12)]
    pub content_count: u64,
    pub created_at: DateTime<Utc>,
}

impl LibraryResponse {
    pub fn new(m: library::Model, content_count: u64) -> Self {
        Self {
            id: m.id,
            name: m.name,
            content_type_id: m.content_type_id,
            content_count,
            created_at: m.created_at,
        }
    }
}

/// Move a content into another library, or out of any library with `null`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReassignLibraryRequest {
    #[schema(example = 2)]
    pub library_id: Option<i32>,
}
