use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Roles allowed to decide bookings and edit the specialist catalog.
pub const ADMIN_ROLES: [&str; 3] = ["admin", "sysadmin", "moderator"];

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .map(|role| ADMIN_ROLES.contains(&role))
            .unwrap_or(false)
    }
}
