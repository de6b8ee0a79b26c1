//! Authenticated user claims and permissions

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Permissions granted to a user by the external auth provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// See every copy currently on loan
    ViewAllLoans,
    /// Change the due date of a loan
    RenewLoans,
    /// Create, update and delete catalog records
    ManageCatalog,
    /// Any permission this server does not use
    #[serde(other)]
    Unknown,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewAllLoans => "view_all_loans",
            Permission::RenewLoans => "renew_loans",
            Permission::ManageCatalog => "manage_catalog",
            Permission::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Claims valid for `hours` from now
    pub fn new(sub: &str, user_id: i32, permissions: Vec<Permission>, hours: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: sub.to_string(),
            user_id,
            permissions,
            exp: now + hours * 3600,
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        permission != Permission::Unknown && self.permissions.contains(&permission)
    }

    // Authorization checks
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Missing permission: {}",
                permission
            )))
        }
    }
}
