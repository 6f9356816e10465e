use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachment_type")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// e.g. "Subtitle". At most 32 characters.
    pub name: String,

    #[sea_orm(has_many, via = "content_type_attachment_type")]
    pub content_types: HasMany<super::content_type::Entity>,

    #[sea_orm(has_many)]
    pub attachments: HasMany<super::attachment::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
