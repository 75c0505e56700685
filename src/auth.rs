//! Admin authentication
//!
//! A single configured admin account; login mints a 24-hour HS256 token and
//! the admin routes verify it from the `Authorization: Bearer` header.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;

const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// The configured admin identity and signing secret
#[derive(Clone)]
pub struct AdminAuth {
    username: String,
    password: String,
    secret: String,
}

impl AdminAuth {
    pub fn new(username: String, password: String, secret: String) -> Self {
        Self {
            username,
            password,
            secret,
        }
    }

    /// Check credentials and mint a bearer token
    pub fn login(&self, req: &LoginRequest) -> Result<LoginResponse, AppError> {
        if req.username != self.username || req.password != self.password {
            return Err(AppError::Unauthorized("invalid credentials".into()));
        }

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: self.username.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token signing: {}", e)))?;

        info!("admin login for {}", self.username);
        Ok(LoginResponse { token })
    }

    /// Verify a bearer token extracted from the Authorization header
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("invalid or expired token".into()))?;
        Ok(data.claims)
    }

    /// Pull the token out of an `Authorization` header value and verify it
    pub fn verify_header(&self, header: Option<&str>) -> Result<Claims, AppError> {
        let header = header.ok_or_else(|| AppError::Unauthorized("missing token".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("missing token".into()))?;
        self.verify(token)
    }
}
