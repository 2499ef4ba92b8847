pub mod middleware;
pub mod rate_limit;
pub mod tokens;

use serde::{Deserialize, Serialize};

pub use tokens::ActorDirectory;

/// Role that may act on any step and manage any workflow.
pub const ADMIN_ROLE: &str = "admin";

/// The authenticated caller of an API request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: String,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Actor {
            name: name.into(),
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}
