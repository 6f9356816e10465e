use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::entity::{attachment_type, content, content_type, library, user};
use crate::error::AppError;
use crate::seed::find_sentinel_user;

pub struct AccountService<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> AccountService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Remove an account. Everything it owned is handed to the sentinel user
    /// in the same transaction; no content is deleted.
    pub async fn delete_account(&self, user_id: i32) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;
        let sentinel = find_sentinel_user(&txn)
            .await?
            .ok_or_else(|| AppError::Internal("sentinel user is not provisioned".into()))?;
        if sentinel.id == user_id {
            return Err(AppError::Conflict("The sentinel account cannot be removed".into()));
        }

        let user = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let contents = content::Entity::update_many()
            .col_expr(content::Column::CreatorId, Expr::value(sentinel.id))
            .filter(content::Column::CreatorId.eq(user.id))
            .exec(&txn)
            .await?;
        content_type::Entity::update_many()
            .col_expr(content_type::Column::UserId, Expr::value(sentinel.id))
            .filter(content_type::Column::UserId.eq(user.id))
            .exec(&txn)
            .await?;
        attachment_type::Entity::update_many()
            .col_expr(attachment_type::Column::UserId, Expr::value(sentinel.id))
            .filter(attachment_type::Column::UserId.eq(user.id))
            .exec(&txn)
            .await?;
        library::Entity::update_many()
            .col_expr(library::Column::UserId, Expr::value(sentinel.id))
            .filter(library::Column::UserId.eq(user.id))
            .exec(&txn)
            .await?;

        user::Entity::delete_by_id(user.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            user_id = user.id,
            contents_reassigned = contents.rows_affected,
            "Deleted account"
        );
        Ok(())
    }
}
