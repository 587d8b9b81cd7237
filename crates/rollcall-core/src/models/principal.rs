//! Authenticated identity context.
//!
//! The issuer and validator take a [`Principal`] explicitly at
//! construction instead of reading a signed-in user from ambient
//! global state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
}

/// The identity on whose behalf a protocol operation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub display_name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: Uuid, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
        }
    }
}
