//! Accounts: registration, login and password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{debug, info};

use crate::domain::User;
use crate::store::{SqliteStore, StoreError};

/// Problems with a registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("username is required")]
    MissingUsername,

    #[error("password is required")]
    MissingPassword,

    #[error("password confirmation is required")]
    MissingConfirmation,

    #[error("password and confirmation do not match")]
    PasswordMismatch,

    #[error("username is already taken")]
    UsernameTaken,
}

impl ValidationError {
    /// Short code used in the `/register?error=` redirect.
    pub fn code(self) -> &'static str {
        match self {
            ValidationError::MissingUsername => "username",
            ValidationError::MissingPassword => "password",
            ValidationError::MissingConfirmation => "confirmation",
            ValidationError::PasswordMismatch => "mismatch",
            ValidationError::UsernameTaken => "taken",
        }
    }
}

/// Login and hashing failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Username or password was not supplied
    #[error("username and password are required")]
    MissingCredentials,

    /// Unknown user or wrong password
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The password could not be hashed
    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Registration failure.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<StoreError> for RegisterError {
    fn from(e: StoreError) -> Self {
        RegisterError::Auth(AuthError::Store(e))
    }
}

/// A registration form that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
}

impl NewAccount {
    /// Check the submitted fields, in form order.
    ///
    /// Blank fields count as missing. The username is trimmed; passwords are
    /// kept exactly as typed.
    pub fn validate(
        username: Option<&str>,
        password: Option<&str>,
        confirmation: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let username = username
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ValidationError::MissingUsername)?;
        let password = present(password).ok_or(ValidationError::MissingPassword)?;
        let confirmation = present(confirmation).ok_or(ValidationError::MissingConfirmation)?;

        if password != confirmation {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Hash a password with Argon2id into PHC string format.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a password against a stored hash.
///
/// A stored value that is not a PHC hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// [`hash_password`] on the blocking thread pool.
async fn hash_off_runtime(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// [`verify_password`] on the blocking thread pool.
async fn verify_off_runtime(password: &str, hash: &str) -> Result<bool, AuthError> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Create an account.
pub async fn register(store: &SqliteStore, account: &NewAccount) -> Result<User, RegisterError> {
    if store.user_by_name(&account.username).await?.is_some() {
        return Err(ValidationError::UsernameTaken.into());
    }

    let hash = hash_off_runtime(&account.password).await?;

    // The lookup above can race another registration; the unique
    // constraint catches that case.
    let user = store
        .create_user(&account.username, &hash)
        .await?
        .ok_or(ValidationError::UsernameTaken)?;

    info!(user_id = user.id, username = %user.username, "registered user");
    Ok(user)
}

/// Check a username and password.
pub async fn login(
    store: &SqliteStore,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<User, AuthError> {
    let (Some(username), Some(password)) = (present(username), present(password)) else {
        return Err(AuthError::MissingCredentials);
    };

    let Some(user) = store.user_by_name(username).await? else {
        debug!(username, "login for unknown user");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_off_runtime(password, &user.password).await? {
        debug!(user_id = user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}
