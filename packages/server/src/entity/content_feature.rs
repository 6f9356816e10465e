use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The value of one feature on one content, stored as normalised text.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_feature")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub content_id: i32,
    #[sea_orm(belongs_to, from = "content_id", to = "id")]
    pub content: HasOne<super::content::Entity>,

    pub feature_id: i32,
    #[sea_orm(belongs_to, from = "feature_id", to = "id")]
    pub feature: HasOne<super::content_type_feature::Entity>,

    pub value: String,
}

impl ActiveModelBehavior for ActiveModel {}
