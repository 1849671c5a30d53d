//! Operator identity carried by tokens from the external auth provider

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Operator,
    Admin,
}

impl Role {
    /// Unknown or missing roles never grant more than `Operator`
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s.map(str::to_lowercase).as_deref() {
            Some("admin") => Role::Admin,
            _ => Role::Operator,
        }
    }
}

/// Raw JWT claims as signed by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorClaims {
    /// Operator id
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl OperatorClaims {
    /// Sign claims (used by tests and local tooling; production tokens come
    /// from the provider)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Verify and decode a token
    pub fn from_token(
        token: &str,
        secret: &str,
        audience: Option<&str>,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let mut validation = Validation::default();
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }
}

/// Authenticated operator for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

impl From<OperatorClaims> for Operator {
    fn from(c: OperatorClaims) -> Self {
        Self {
            id: c.sub,
            email: c.email,
            role: Role::parse_lenient(c.role.as_deref()),
        }
    }
}

impl Operator {
    /// Configuration screens (equipment, events, sectors, catalog, roster edits)
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator role required".to_string(),
            ))
        }
    }
}
