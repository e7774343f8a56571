//! User types for chat platforms

use serde::{Deserialize, Serialize};

/// A user as seen by the bot's per-session directory.
///
/// `handle` is the platform login/username; `name` is the platform display
/// name and falls back to `handle` on platforms without a separate display
/// name concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque platform user id
    pub id: String,
    /// Login/username
    pub handle: String,
    /// Display name
    pub name: String,
}

impl User {
    /// Create a new user
    pub fn new(
        id: impl Into<String>,
        handle: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        User {
            id: id.into(),
            handle: handle.into(),
            name: name.into(),
        }
    }

    /// Create a user whose display name is just the handle
    pub fn from_handle(id: impl Into<String>, handle: impl Into<String>) -> Self {
        let handle = handle.into();
        User {
            id: id.into(),
            name: handle.clone(),
            handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("U123", "alice", "Alice Smith");
        assert_eq!(user.id, "U123");
        assert_eq!(user.handle, "alice");
        assert_eq!(user.name, "Alice Smith");
    }

    #[test]
    fn test_from_handle_falls_back_to_handle() {
        let user = User::from_handle("1099", "dolores");
        assert_eq!(user.handle, "dolores");
        assert_eq!(user.name, "dolores");
    }
}
