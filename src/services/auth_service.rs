//! Authentication service - registration, login and token verification.
//!
//! Password hashing lives in the domain `Password` value object.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{is_valid_email, normalize_email, Password, Session, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::{NewAccount, UnitOfWork};

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Caller identity carried by the token
    pub fn session(&self) -> Session {
        Session::new(self.sub, self.email.clone(), UserRole::from(self.role.as_str()))
    }
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Self sign-up with a password
    async fn register(&self, email: String, password: String, name: String) -> AppResult<User>;

    /// Create an administrator account
    async fn create_admin(&self, email: String, password: String, name: String) -> AppResult<User>;

    /// Login and return JWT token
    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }

    async fn create_account(
        &self,
        email: String,
        password: String,
        name: String,
        role: UserRole,
    ) -> AppResult<User> {
        let email = normalize_email(&email);
        if !is_valid_email(&email) {
            return Err(AppError::validation("Invalid email address"));
        }
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }

        let password_hash = Password::new(&password)?.into_string();
        let account = NewAccount {
            role,
            ..NewAccount::user(email, name, Some(password_hash))
        };

        let user = self.uow.users().create(account).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, email: String, password: String, name: String) -> AppResult<User> {
        self.create_account(email, password, name, UserRole::User)
            .await
    }

    async fn create_admin(&self, email: String, password: String, name: String) -> AppResult<User> {
        self.create_account(email, password, name, UserRole::Admin)
            .await
    }

    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.users().find_by_email(&normalize_email(&email)).await?;

        // Verify against a dummy hash when there is nothing to compare, so the
        // response time does not reveal which emails exist or are activated.
        let dummy_hash = "$argon2id$v=19$m=19456,t=2,p=1$ZHVtbXlzYWx0MTIzNDU2$ZHVtbXloYXNoMTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMg";
        let stored = user
            .as_ref()
            .and_then(|u| u.password_hash.clone())
            .unwrap_or_else(|| dummy_hash.to_string());
        let password_valid = Password::from_hash(stored).verify(&password);

        match user {
            Some(user) if user.has_password() && password_valid => {
                generate_token(&user, &self.config)
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}
