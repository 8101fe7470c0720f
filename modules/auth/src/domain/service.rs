use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    normalize_email, AuthSession, Credentials, ExternalProfile, NewUser, User,
};
use crate::domain::error::DomainError;
use crate::domain::password;
use crate::domain::repo::{StoredUser, UsersRepository};
use crate::domain::token::JwtService;

/// Domain service for accounts and access tokens.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    jwt: JwtService,
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>, jwt: JwtService) -> Self {
        Self { repo, jwt }
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn signup(&self, new_user: NewUser) -> Result<AuthSession, DomainError> {
        info!("Registering new user");
        let email = normalize_email(&new_user.email);
        let first_name = new_user.first_name.trim().to_string();
        let last_name = new_user.last_name.trim().to_string();
        if first_name.is_empty() {
            return Err(DomainError::validation("firstName", "First name is required"));
        }
        if last_name.is_empty() {
            return Err(DomainError::validation("lastName", "Last name is required"));
        }

        if self.find_stored(&email).await?.is_some() {
            return Err(DomainError::user_already_exists(email));
        }

        let user = self
            .create_user(email, first_name, last_name, new_user.password)
            .await?;
        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "User registered");
        Ok(AuthSession { user, token })
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: Credentials) -> Result<AuthSession, DomainError> {
        let email = normalize_email(&credentials.email);
        let Some(stored) = self.find_stored(&email).await? else {
            debug!("Unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        let matches = password::verify_password_blocking(credentials.password, stored.password_hash)
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?;
        if !matches {
            debug!("Password mismatch");
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.issue_token(&stored.user)?;
        info!(user_id = %stored.user.id, "User logged in");
        Ok(AuthSession {
            user: stored.user,
            token,
        })
    }

    /// Resolve the user a bearer token was issued to.
    #[instrument(skip_all)]
    pub async fn current_user(&self, token: &str) -> Result<User, DomainError> {
        let user_id = self.jwt.verify(token).map_err(|e| {
            debug!(error = %e, "Token rejected");
            DomainError::invalid_token(e.to_string())
        })?;
        self.get_user(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id.to_string()))
    }

    /// Link an external identity to a local account by email, creating the
    /// account on first sign-in.
    #[instrument(skip(self, profile))]
    pub async fn resolve_oauth_user(&self, profile: ExternalProfile) -> Result<User, DomainError> {
        let email = profile
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or(DomainError::MissingEmail)?;

        if let Some(stored) = self.find_stored(&email).await? {
            info!(user_id = %stored.user.id, "Existing user signed in through provider");
            return Ok(stored.user);
        }

        info!("Creating user for provider sign-in");
        match self
            .create_user(
                email.clone(),
                profile.first_name(),
                profile.last_name(),
                password::oauth_placeholder_password(),
            )
            .await
        {
            Ok(user) => Ok(user),
            // A parallel callback for the same email created it first.
            Err(DomainError::UserAlreadyExists { .. }) => {
                warn!("User appeared concurrently, reusing it");
                self.find_stored(&email)
                    .await?
                    .map(|s| s.user)
                    .ok_or_else(|| DomainError::user_not_found(email))
            }
            Err(e) => Err(e),
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, DomainError> {
        self.jwt.issue(user.id).map_err(|e| DomainError::internal(e.to_string()))
    }

    async fn find_stored(&self, email: &str) -> Result<Option<StoredUser>, DomainError> {
        self.repo
            .find_by_email(email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    async fn create_user(
        &self,
        email: String,
        first_name: String,
        last_name: String,
        plain_password: String,
    ) -> Result<User, DomainError> {
        let password_hash = password::hash_password_blocking(plain_password)
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let user = User {
            id: Uuid::new_v4(),
            email,
            first_name,
            last_name,
            created_at: Utc::now(),
        };

        if let Err(e) = self
            .repo
            .insert_user(StoredUser {
                user: user.clone(),
                password_hash,
            })
            .await
        {
            if db::errors::is_unique_violation(&e) {
                return Err(DomainError::user_already_exists(user.email));
            }
            return Err(DomainError::database(e.to_string()));
        }
        Ok(user)
    }
}
