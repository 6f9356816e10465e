use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{attachment, content, content_feature, user};

/// Provision the sentinel account that inherits rows of removed users.
///
/// Idempotent and safe to race: the unique username column decides the
/// winner and every other insert is a no-op. The account has no usable
/// password, so nobody can log in as it.
pub async fn ensure_sentinel_user(db: &DatabaseConnection) -> Result<user::Model, DbErr> {
    let model = user::ActiveModel {
        username: Set(user::SENTINEL_USERNAME.to_string()),
        password: Set("!".to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = user::Entity::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(n) if n > 0 => info!("Provisioned sentinel user '{}'", user::SENTINEL_USERNAME),
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }

    find_sentinel_user(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("sentinel user".into()))
}

pub async fn find_sentinel_user<C: ConnectionTrait>(db: &C) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Username.eq(user::SENTINEL_USERNAME))
        .one(db)
        .await
}

/// Ensure the foreign-key lookup indexes exist.
///
/// Schema sync only creates unique indexes, so plain ones are created here.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes = [
        Index::create()
            .if_not_exists()
            .name("idx_content_creator")
            .table(content::Entity)
            .col(content::Column::CreatorId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_content_library")
            .table(content::Entity)
            .col(content::Column::LibraryId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_content_feature_content")
            .table(content_feature::Entity)
            .col(content_feature::Column::ContentId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_attachment_content")
            .table(attachment::Entity)
            .col(attachment::Column::ContentId)
            .to_owned(),
    ];

    for index in &indexes {
        let stmt = index_sql(db.get_database_backend(), index);
        match db.execute_unprepared(&stmt).await {
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to create index: {}", e),
        }
    }
    info!("Ensured {} lookup indexes", indexes.len());

    Ok(())
}

fn index_sql(backend: DbBackend, index: &IndexCreateStatement) -> String {
    match backend {
        DbBackend::Sqlite => index.to_string(SqliteQueryBuilder),
        _ => index.to_string(PostgresQueryBuilder),
    }
}
