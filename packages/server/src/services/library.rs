use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::entity::{content, library};
use crate::error::AppError;
use crate::models::content::ContentListItem;
use crate::models::library::{CreateLibraryRequest, LibraryResponse, MAX_LIBRARY_NAME};
use crate::models::shared::validate_name;
use crate::utils::scope::OwnerScope;

/// Libraries of one owner and the placement of contents in them.
pub struct LibraryIndex<'a, C> {
    conn: &'a C,
    scope: OwnerScope,
}

impl<'a, C: ConnectionTrait + TransactionTrait> LibraryIndex<'a, C> {
    pub fn new(conn: &'a C, scope: OwnerScope) -> Self {
        Self { conn, scope }
    }

    pub async fn create_library(
        &self,
        req: &CreateLibraryRequest,
    ) -> Result<LibraryResponse, AppError> {
        let name = validate_name("name", &req.name, MAX_LIBRARY_NAME)?;
        let ct = self
            .scope
            .content_type(self.conn, req.content_type_id)
            .await
            .map_err(|e| e.in_field("content_type_id"))?;

        let model = library::ActiveModel {
            user_id: Set(self.scope.user_id()),
            name: Set(name),
            content_type_id: Set(ct.id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        Ok(LibraryResponse::new(model, 0))
    }

    /// Libraries with their content counts, most populated first.
    pub async fn list_libraries(&self) -> Result<Vec<LibraryResponse>, AppError> {
        let libraries = library::Entity::find()
            .filter(library::Column::UserId.eq(self.scope.user_id()))
            .all(self.conn)
            .await?;
        if libraries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = libraries.iter().map(|l| l.id).collect();
        let placed: Vec<Option<i32>> = content::Entity::find()
            .filter(content::Column::LibraryId.is_in(ids))
            .select_only()
            .column(content::Column::LibraryId)
            .into_tuple()
            .all(self.conn)
            .await?;

        let mut counts: HashMap<i32, u64> = HashMap::new();
        for library_id in placed.into_iter().flatten() {
            *counts.entry(library_id).or_default() += 1;
        }

        let mut out: Vec<LibraryResponse> = libraries
            .into_iter()
            .map(|l| {
                let count = counts.get(&l.id).copied().unwrap_or(0);
                LibraryResponse::new(l, count)
            })
            .collect();
        sort_by_popularity(&mut out);
        Ok(out)
    }

    /// Delete a library; its contents stay, outside of any library.
    pub async fn delete_library(&self, id: i32) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;
        let library = self.scope.library(&txn, id).await?;

        content::Entity::update_many()
            .col_expr(content::Column::LibraryId, Expr::value(Option::<i32>::None))
            .filter(content::Column::LibraryId.eq(library.id))
            .exec(&txn)
            .await?;
        library::Entity::delete_by_id(library.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Move a content into `library_id`, or out of its library with `None`.
    ///
    /// The library must be ours (`NotFound` otherwise) and hold the content's
    /// type (`Conflict` otherwise).
    pub async fn reassign_library(
        &self,
        content_id: i32,
        library_id: Option<i32>,
    ) -> Result<ContentListItem, AppError> {
        let txn = self.conn.begin().await?;
        let content = self.scope.content_for_update(&txn, content_id).await?;

        if let Some(library_id) = library_id {
            let library = self.scope.library(&txn, library_id).await?;
            if library.content_type_id != content.content_type_id {
                return Err(AppError::Conflict(format!(
                    "Library '{}' only holds content of another type",
                    library.name
                )));
            }
        }

        let mut active: content::ActiveModel = content.into();
        active.library_id = Set(library_id);
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(updated.into())
    }
}

/// Descending content count, ties by ascending id.
fn sort_by_popularity(libraries: &mut [LibraryResponse]) {
    libraries.sort_by(|a, b| {
        b.content_count
            .cmp(&a.content_count)
            .then_with(|| a.id.cmp(&b.id))
    });
}
