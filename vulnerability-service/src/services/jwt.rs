use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::models::{IdentityContext, RoleBinding, UserType};

/// Claims carried by access tokens issued by the platform's auth service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Absent means a standard user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub roles: Vec<RoleBinding>,
    /// Expiration time (Unix timestamp). Tokens without it are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl UserClaims {
    pub fn into_identity(self) -> IdentityContext {
        IdentityContext::new(self.id, self.user_type.unwrap_or_default(), &self.roles)
    }
}

/// Verifies HS256 access tokens and turns them into an [`IdentityContext`].
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &Secret<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Validate the raw `Authorization` header value. Both a bare token and
    /// `Bearer <token>` are accepted.
    pub fn verify(&self, authorization: &str) -> Result<IdentityContext, AppError> {
        let token = authorization
            .strip_prefix("Bearer ")
            .unwrap_or(authorization)
            .trim();

        if token.is_empty() {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Missing access token"
            )));
        }

        let token_data = decode::<UserClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(token_data.claims.into_identity())
    }
}
