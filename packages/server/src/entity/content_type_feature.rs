use common::FeatureKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One schema field of a content type.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_type_feature")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub content_type_id: i32,
    #[sea_orm(belongs_to, from = "content_type_id", to = "id")]
    pub content_type: HasOne<super::content_type::Entity>,

    pub name: String,
    pub kind: FeatureKind,
    pub required: bool,

    #[sea_orm(has_many)]
    pub values: HasMany<super::content_feature::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
