//! Caller identity.

use crate::error::CheckoutError;
use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// Who is checking out. Passed explicitly into every engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Option<UserId>,
    pub authenticated: bool,
}

impl Session {
    /// A signed-in user.
    pub fn user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            authenticated: true,
        }
    }

    /// No user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The signed-in user, or `NotAuthenticated`.
    pub fn require_user(&self) -> Result<&UserId, CheckoutError> {
        match &self.user_id {
            Some(user) if self.authenticated => Ok(user),
            _ => Err(CheckoutError::NotAuthenticated),
        }
    }
}
