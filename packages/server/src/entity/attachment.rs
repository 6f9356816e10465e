use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub content_id: i32,
    #[sea_orm(belongs_to, from = "content_id", to = "id")]
    pub content: HasOne<super::content::Entity>,

    pub attachment_type_id: i32,
    #[sea_orm(belongs_to, from = "attachment_type_id", to = "id")]
    pub attachment_type: HasOne<super::attachment_type::Entity>,

    /// Original upload filename.
    pub filename: String,

    /// Blob path, `<content path without extension>_<filename>`.
    #[sea_orm(unique)]
    pub path: String,

    pub mime_type: Option<String>,

    pub size: i64,

    pub checksum: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
