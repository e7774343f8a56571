//! Team/workspace types
//!
//! Different platforms call this concept by different names: Slack says
//! workspace, Discord says guild. An adapter snapshots the first one its
//! credential belongs to.

use serde::{Deserialize, Serialize};

/// The workspace/guild an adapter is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier for this team
    pub id: String,
    /// Team name
    pub name: String,
}

impl Team {
    /// Create a new team
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Team {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_creation() {
        let team = Team::new("T123", "Westworld");
        assert_eq!(team.id, "T123");
        assert_eq!(team.name, "Westworld");
    }
}
