use sea_orm::sea_query::LockType;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use crate::entity::{attachment, attachment_type, content, content_type, library};
use crate::error::AppError;

/// Row lookups restricted to one owner.
///
/// Every finder returns `NotFound` both for missing ids and for rows owned by
/// someone else, so callers cannot learn which foreign ids exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerScope {
    user_id: i32,
}

impl OwnerScope {
    pub fn new(user_id: i32) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub async fn attachment_type<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i32,
    ) -> Result<attachment_type::Model, AppError> {
        attachment_type::Entity::find_by_id(id)
            .filter(attachment_type::Column::UserId.eq(self.user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Attachment type not found".into()))
    }

    /// Resolve every id in `ids` or fail on the first one that is not ours.
    pub async fn attachment_types<C: ConnectionTrait>(
        &self,
        db: &C,
        ids: &[i32],
    ) -> Result<Vec<attachment_type::Model>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = attachment_type::Entity::find()
            .filter(attachment_type::Column::Id.is_in(ids.iter().copied()))
            .filter(attachment_type::Column::UserId.eq(self.user_id))
            .all(db)
            .await?;

        ids.iter()
            .map(|id| {
                found
                    .iter()
                    .find(|at| at.id == *id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("Attachment type {id} not found")))
            })
            .collect()
    }

    pub async fn content_type<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i32,
    ) -> Result<content_type::Model, AppError> {
        content_type::Entity::find_by_id(id)
            .filter(content_type::Column::UserId.eq(self.user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Content type not found".into()))
    }

    /// Like [`Self::content_type`], holding a row lock until the transaction ends.
    pub async fn content_type_for_update<C: ConnectionTrait>(
        &self,
        txn: &C,
        id: i32,
    ) -> Result<content_type::Model, AppError> {
        content_type::Entity::find_by_id(id)
            .filter(content_type::Column::UserId.eq(self.user_id))
            .lock(LockType::Update)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Content type not found".into()))
    }

    pub async fn library<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i32,
    ) -> Result<library::Model, AppError> {
        library::Entity::find_by_id(id)
            .filter(library::Column::UserId.eq(self.user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Library not found".into()))
    }

    pub async fn content<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i32,
    ) -> Result<content::Model, AppError> {
        content::Entity::find_by_id(id)
            .filter(content::Column::CreatorId.eq(self.user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".into()))
    }

    /// Content row locked for the rest of the transaction.
    pub async fn content_for_update<C: ConnectionTrait>(
        &self,
        txn: &C,
        id: i32,
    ) -> Result<content::Model, AppError> {
        content::Entity::find_by_id(id)
            .filter(content::Column::CreatorId.eq(self.user_id))
            .lock(LockType::Update)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".into()))
    }

    /// An attachment of one of our contents.
    pub async fn attachment<C: ConnectionTrait>(
        &self,
        db: &C,
        content_id: i32,
        attachment_id: i32,
    ) -> Result<attachment::Model, AppError> {
        let content = self.content(db, content_id).await?;
        attachment::Entity::find_by_id(attachment_id)
            .filter(attachment::Column::ContentId.eq(content.id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Attachment not found".into()))
    }

    /// Content or attachment stored at `path`.
    pub async fn stored_file<C: ConnectionTrait>(
        &self,
        db: &C,
        path: &str,
    ) -> Result<StoredFile, AppError> {
        let content = content::Entity::find()
            .filter(content::Column::Path.eq(path))
            .filter(content::Column::CreatorId.eq(self.user_id))
            .one(db)
            .await?;
        if let Some(c) = content {
            return Ok(c.into());
        }

        let not_found = || AppError::NotFound("File not found".into());
        let attachment = attachment::Entity::find()
            .filter(attachment::Column::Path.eq(path))
            .one(db)
            .await?
            .ok_or_else(not_found)?;
        // Attachments inherit ownership from their content.
        self.content(db, attachment.content_id)
            .await
            .map_err(|_| not_found())?;

        Ok(attachment.into())
    }
}

/// Metadata needed to serve a stored blob.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: String,
    pub filename: String,
    pub mime_type: Option<String>,
    pub size: i64,
    pub checksum: String,
}

impl From<content::Model> for StoredFile {
    fn from(c: content::Model) -> Self {
        Self {
            path: c.path,
            filename: c.filename,
            mime_type: c.mime_type,
            size: c.size,
            checksum: c.checksum,
        }
    }
}

impl From<attachment::Model> for StoredFile {
    fn from(a: attachment::Model) -> Self {
        Self {
            path: a.path,
            filename: a.filename,
            mime_type: a.mime_type,
            size: a.size,
            checksum: a.checksum,
        }
    }
}
