use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::PortalError,
    models::{Account, Role},
    repository::AccountStoreState,
};

/// Fixed validity window for session tokens. Expiry is evaluated on each
/// verification; tokens are never pre-emptively revoked.
pub const TOKEN_VALIDITY_HOURS: i64 = 24;

/// Claims
///
/// The payload of a session token. Signed with the server secret and validated
/// on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account id.
    pub sub: Uuid,
    /// Normalized (lowercase) email of the account at issuance time.
    pub email: String,
    /// Role at issuance time. The extractor re-reads the account, so a role
    /// change takes effect on the next request, not the next login.
    pub role: Role,
    /// Expiration time (seconds since epoch).
    pub exp: usize,
    /// Issued-at time (seconds since epoch).
    pub iat: usize,
}

/// TokenIssuer
///
/// Mints and validates the signed session credential (HS256 JWT). Owned by the
/// AuthService; the `AuthUser` extractor performs its own decode from the
/// shared secret in `AppConfig`.
pub struct TokenIssuer {
    secret: String,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Mints a token for the account with the fixed 24-hour window.
    pub fn issue(&self, account: &Account) -> Result<String, PortalError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id,
            email: account.email.clone(),
            role: account.role,
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(TOKEN_VALIDITY_HOURS)).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| PortalError::Internal(format!("token signing failed: {e}")))
    }

    /// Decodes and validates a token, including its expiry.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the account id and its
/// *current* role, fetched from the store rather than trusted from the token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// AuthUser extractor
///
/// Usable as a handler argument on any authenticated route. The flow:
/// 1. Local development bypass via the `x-user-id` header, guarded by
///    `Env::Local` and still verified against the account store.
/// 2. Bearer token extraction and JWT decoding (expiry enforced).
/// 3. Account re-read: a token for a deleted or deactivated account is
///    rejected even though its signature is still valid.
///
/// Rejects with 401 on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AccountStoreState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let accounts = AccountStoreState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local development bypass. Guarded by the Env check so it can never
        // activate in production.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(account_id) = Uuid::parse_str(id_str) {
                        if let Ok(Some(account)) = accounts.find_by_id(account_id).await {
                            if account.is_active() {
                                return Ok(AuthUser {
                                    id: account.id,
                                    role: account.role,
                                });
                            }
                        }
                    }
                }
            }
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let issuer = TokenIssuer::new(&config.jwt_secret);
        let claims = match issuer.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                return match e.kind() {
                    // The common failure for a valid-but-old token.
                    ErrorKind::ExpiredSignature => Err(StatusCode::UNAUTHORIZED),
                    // Bad signature, malformed token, etc.
                    _ => Err(StatusCode::UNAUTHORIZED),
                };
            }
        };

        // Final verification against the store: existence and current role.
        let account = accounts
            .find_by_id(claims.sub)
            .await
            .map_err(|_| StatusCode::UNAUTHORIZED)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        if !account.is_active() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        Ok(AuthUser {
            id: account.id,
            role: account.role,
        })
    }
}
