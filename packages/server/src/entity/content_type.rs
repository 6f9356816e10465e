use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_type")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// e.g. "Video". At most 40 characters.
    pub name: String,

    /// Attachment kinds that content of this type may carry.
    #[sea_orm(has_many, via = "content_type_attachment_type")]
    pub attachment_types: HasMany<super::attachment_type::Entity>,

    #[sea_orm(has_many)]
    pub features: HasMany<super::content_type_feature::Entity>,

    #[sea_orm(has_many)]
    pub contents: HasMany<super::content::Entity>,

    #[sea_orm(has_many)]
    pub libraries: HasMany<super::library::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
