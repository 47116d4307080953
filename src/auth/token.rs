//! Token issuance and validation. Tokens are stateless, HS256-signed over
//! a shared secret, and carry a `scope` claim separating access from
//! refresh tokens. The only revocation path is rotating the refresh token
//! stored on the user row; an access token stays valid until it expires.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::ApiError;

pub const SCOPE_ACCESS: &str = "access_token";
pub const SCOPE_REFRESH: &str = "refresh_token";

const CREDENTIALS_ERROR: &str = "Could not validate credentials";
const SCOPE_ERROR: &str = "Invalid scope for token";
const EMAIL_TOKEN_ERROR: &str = "Invalid token for email verification";

/// Signed claims. `sub` is the user email; email-verification tokens
/// carry no scope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    fn issue(&self, subject: &str, ttl_secs: i64, scope: Option<&str>) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + ttl_secs,
            scope: scope.map(str::to_string),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        // Expiry is a hard boundary; no clock-skew allowance.
        validation.leeway = 0;
        Ok(decode::<Claims>(token, &self.decoding_key, &validation)?.claims)
    }

    /// Signed token with scope `access_token`. `ttl_secs` overrides the
    /// configured lifetime when given.
    pub fn issue_access_token(
        &self,
        subject: &str,
        ttl_secs: Option<i64>,
    ) -> Result<String, ApiError> {
        self.issue(
            subject,
            ttl_secs.unwrap_or(self.access_ttl_secs),
            Some(SCOPE_ACCESS),
        )
    }

    /// Signed token with scope `refresh_token`.
    pub fn issue_refresh_token(
        &self,
        subject: &str,
        ttl_secs: Option<i64>,
    ) -> Result<String, ApiError> {
        self.issue(
            subject,
            ttl_secs.unwrap_or(self.refresh_ttl_secs),
            Some(SCOPE_REFRESH),
        )
    }

    /// Scope-less token for out-of-band email confirmation; fixed one-day
    /// lifetime.
    pub fn issue_email_token(&self, subject: &str) -> Result<String, ApiError> {
        self.issue(subject, 24 * 60 * 60, None)
    }

    /// Verify signature, expiry and scope; return the subject email.
    pub fn validate_access_token(&self, token: &str) -> Result<String, ApiError> {
        let claims = self
            .decode_claims(token)
            .map_err(|_| ApiError::Unauthorized(CREDENTIALS_ERROR.to_string()))?;
        if claims.scope.as_deref() != Some(SCOPE_ACCESS) {
            return Err(ApiError::Unauthorized(CREDENTIALS_ERROR.to_string()));
        }
        if claims.sub.is_empty() {
            return Err(ApiError::Unauthorized(CREDENTIALS_ERROR.to_string()));
        }
        Ok(claims.sub)
    }

    /// Same as access validation but for scope `refresh_token`; a wrong
    /// scope fails with a distinct message.
    pub fn validate_refresh_token(&self, token: &str) -> Result<String, ApiError> {
        let claims = self
            .decode_claims(token)
            .map_err(|_| ApiError::Unauthorized(CREDENTIALS_ERROR.to_string()))?;
        if claims.scope.as_deref() != Some(SCOPE_REFRESH) {
            return Err(ApiError::Unauthorized(SCOPE_ERROR.to_string()));
        }
        Ok(claims.sub)
    }

    /// Decode a verification token without a scope check. Malformed or
    /// tampered tokens fail with 422, per the email-confirmation contract.
    pub fn resolve_email_from_token(&self, token: &str) -> Result<String, ApiError> {
        let claims = self
            .decode_claims(token)
            .map_err(|_| ApiError::UnprocessableEntity(EMAIL_TOKEN_ERROR.to_string()))?;
        Ok(claims.sub)
    }
}
