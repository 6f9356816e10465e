use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_type_attachment_type")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub content_type_id: i32,
    #[sea_orm(primary_key)]
    pub attachment_type_id: i32,
    #[sea_orm(belongs_to, from = "content_type_id", to = "id")]
    pub content_type: HasOne<super::content_type::Entity>,
    #[sea_orm(belongs_to, from = "attachment_type_id", to = "id")]
    pub attachment_type: HasOne<super::attachment_type::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
