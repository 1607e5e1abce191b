use chrono::{DateTime, Utc};

/// An issued reset code
#[derive(Clone, Debug)]
pub struct PasswordReset {
    pub id: String,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    /// A code is expired strictly after its expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
