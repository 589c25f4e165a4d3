//! User profile data used to decorate query responses.

use super::UserId;
use serde::{Deserialize, Serialize};

/// Public profile of a user, owned by the durable user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// User identity.
    pub id: UserId,
    /// Display name.
    pub nickname: String,
    /// Optional contact handle shown to counterparties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl UserInfo {
    /// Creates a profile without contact details.
    #[must_use]
    pub fn new(id: UserId, nickname: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            contact: None,
        }
    }

    /// Sets the contact handle.
    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }
}
