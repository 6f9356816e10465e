use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Reassigned to the sentinel user when the creator's account is removed.
    pub creator_id: i32,
    #[sea_orm(belongs_to, from = "creator_id", to = "id")]
    pub creator: HasOne<super::user::Entity>,

    pub content_type_id: i32,
    #[sea_orm(belongs_to, from = "content_type_id", to = "id")]
    pub content_type: HasOne<super::content_type::Entity>,

    /// NULL when the content is not placed in any library.
    pub library_id: Option<i32>,
    #[sea_orm(belongs_to, from = "library_id", to = "id")]
    pub library: HasOne<super::library::Entity>,

    /// Original upload filename.
    pub filename: String,

    /// Blob path, `user_<username>/<filename>`.
    #[sea_orm(unique)]
    pub path: String,

    /// MIME content type guessed from the filename.
    pub mime_type: Option<String>,

    pub size: i64,

    /// SHA-256 of the stored bytes, hex encoded.
    pub checksum: String,

    #[sea_orm(has_many)]
    pub features: HasMany<super::content_feature::Entity>,

    #[sea_orm(has_many)]
    pub attachments: HasMany<super::attachment::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
