use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, Unchanged,
};
use tracing::debug;

use crate::domain::{DomainError, DomainResult, PasswordReset, PasswordResetRepositoryInterface};
use crate::infrastructure::database::entities::{password_reset, user};

pub struct PasswordResetRepository {
    db: DatabaseConnection,
}

impl PasswordResetRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(model: password_reset::Model) -> PasswordReset {
    PasswordReset {
        id: model.id,
        email: model.email,
        code: model.code,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}

#[async_trait]
impl PasswordResetRepositoryInterface for PasswordResetRepository {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<PasswordReset>> {
        let model = password_reset::Entity::find()
            .filter(password_reset::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(model.map(model_to_domain))
    }

    async fn find_by_code_and_email(
        &self,
        code: &str,
        email: &str,
    ) -> DomainResult<Option<PasswordReset>> {
        let model = password_reset::Entity::find()
            .filter(password_reset::Column::Code.eq(code))
            .filter(password_reset::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(model.map(model_to_domain))
    }

    async fn upsert_for_email(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> DomainResult<PasswordReset> {
        let model = match self.find_by_email(email).await? {
            Some(existing) => {
                password_reset::ActiveModel {
                    id: Unchanged(existing.id),
                    code: Set(code.to_string()),
                    expires_at: Set(expires_at),
                    ..Default::default()
                }
                .update(&self.db)
                .await?
            }
            None => {
                password_reset::ActiveModel {
                    id: Set(uuid::Uuid::new_v4().to_string()),
                    email: Set(email.to_string()),
                    code: Set(code.to_string()),
                    expires_at: Set(expires_at),
                    created_at: Set(Utc::now()),
                }
                .insert(&self.db)
                .await?
            }
        };

        Ok(model_to_domain(model))
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        password_reset::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn redeem(
        &self,
        reset: &PasswordReset,
        user_id: &str,
        password_hash: &str,
    ) -> DomainResult<bool> {
        let txn = self.db.begin().await?;

        // Claim the code first: only one redemption can delete the row.
        let claimed = password_reset::Entity::delete_many()
            .filter(password_reset::Column::Id.eq(reset.id.as_str()))
            .filter(password_reset::Column::Code.eq(reset.code.as_str()))
            .exec(&txn)
            .await?;

        if claimed.rows_affected != 1 {
            txn.rollback().await?;
            debug!(email = %reset.email, "Reset code already consumed");
            return Ok(false);
        }

        let updated = user::Entity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;

        if updated.rows_affected != 1 {
            txn.rollback().await?;
            return Err(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: user_id.to_string(),
            });
        }

        txn.commit().await?;
        Ok(true)
    }
}
