use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Username of the placeholder account that inherits the rows of removed users.
pub const SENTINEL_USERNAME: &str = "deleted";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,

    #[sea_orm(has_many)]
    pub contents: HasMany<super::content::Entity>,

    #[sea_orm(has_many)]
    pub content_types: HasMany<super::content_type::Entity>,

    #[sea_orm(has_many)]
    pub attachment_types: HasMany<super::attachment_type::Entity>,

    #[sea_orm(has_many)]
    pub libraries: HasMany<super::library::Entity>,

    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn is_sentinel(&self) -> bool {
        self.username == SENTINEL_USERNAME
    }
}

impl ActiveModelBehavior for ActiveModel {}
