use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PasswordReset;
use crate::domain::DomainResult;

#[async_trait]
pub trait PasswordResetRepositoryInterface: Send + Sync {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<PasswordReset>>;

    /// Look up a code together with the address it was issued for.
    async fn find_by_code_and_email(
        &self,
        code: &str,
        email: &str,
    ) -> DomainResult<Option<PasswordReset>>;

    /// Store `code` for `email`, replacing the code and expiry of an
    /// existing row or inserting a new one.
    async fn upsert_for_email(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> DomainResult<PasswordReset>;

    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// Consume `reset` and store `password_hash` for `user_id` as one unit.
    ///
    /// Returns `Ok(false)` without touching the password when the row is no
    /// longer there with that code, i.e. it was redeemed or replaced
    /// concurrently.
    async fn redeem(
        &self,
        reset: &PasswordReset,
        user_id: &str,
        password_hash: &str,
    ) -> DomainResult<bool>;
}
