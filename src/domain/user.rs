use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

/// The authenticated caller, as handed over by the token service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn customer(id: u64) -> Self {
        Self {
            id: UserId(id),
            email: String::new(),
            role: Role::Customer,
        }
    }

    pub fn admin(id: u64) -> Self {
        Self {
            role: Role::Admin,
            ..Self::customer(id)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
