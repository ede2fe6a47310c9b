//! User service: registration, authentication and self-service profile.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::ValidateEmail;

use crate::text::{check_length, is_all_digits, is_blank_or_symbols, limits};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for self-registration.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Only sent by the web form.
    #[serde(default)]
    pub password_confirm: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Input for editing one's own profile.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Reject names that are blank, symbol-only or digit-only.
///
/// All fields are checked for the first rule before any is checked for the
/// second, so the reported error is stable.
pub(crate) fn validate_names(fields: &[(&str, &str)]) -> AppResult<()> {
    for (label, value) in fields {
        if is_blank_or_symbols(value) {
            return Err(AppError::Validation(format!(
                "{label} cannot be empty, spaces-only, or symbols-only"
            )));
        }
    }

    for (label, value) in fields {
        if is_all_digits(value) {
            return Err(AppError::Validation(format!(
                "{label} cannot be numbers only"
            )));
        }
    }

    for (label, value) in fields {
        check_length(label, value, limits::USER_NAME)?;
    }

    Ok(())
}

pub(crate) fn validate_email(email: &str) -> AppResult<()> {
    check_length("Email", email, limits::EMAIL)?;
    if email.validate_email() {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Please enter a valid email address".to_string(),
        ))
    }
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new, active, non-staff user.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        let username = input.username.trim();
        let email = input.email.trim();
        let first_name = input.first_name.trim();
        let last_name = input.last_name.trim();

        validate_names(&[
            ("Username", username),
            ("First name", first_name),
            ("Last name", last_name),
        ])?;
        validate_email(email)?;

        if let Some(confirm) = &input.password_confirm {
            if *confirm != input.password {
                return Err(AppError::Validation("Passwords do not match.".to_string()));
            }
        }

        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        if self.user_repo.username_exists(username, None).await? {
            return Err(AppError::Duplicate("Username already exists".to_string()));
        }
        if self.user_repo.email_exists(email, None).await? {
            return Err(AppError::Duplicate("Email already exists".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            is_active: Set(true),
            is_staff: Set(false),
            is_superuser: Set(false),
            date_joined: Set(chrono::Utc::now().into()),
            last_login: Set(None),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Check a username and password.
    ///
    /// A blocked account is reported before the password is looked at.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::AccountBlocked);
        }

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        self.user_repo.touch_last_login(&user.id).await?;
        info!(user_id = %user.id, "User signed in");

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Resolve a session's user, ignoring deleted and blocked accounts.
    pub async fn find_active(&self, id: &str) -> AppResult<Option<user::Model>> {
        Ok(self
            .user_repo
            .find_by_id(id)
            .await?
            .filter(|user| user.is_active))
    }

    /// Edit one's own names and email.
    pub async fn update_profile(
        &self,
        user: &user::Model,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        let first_name = input
            .first_name
            .as_deref()
            .map_or(user.first_name.as_str(), str::trim);
        let last_name = input
            .last_name
            .as_deref()
            .map_or(user.last_name.as_str(), str::trim);
        let email = input.email.as_deref().map_or(user.email.as_str(), str::trim);

        validate_names(&[("First name", first_name), ("Last name", last_name)])?;
        validate_email(email)?;

        if self.user_repo.email_exists(email, Some(&user.id)).await? {
            return Err(AppError::Duplicate("Email already exists".to_string()));
        }

        let mut active: user::ActiveModel = user.clone().into();
        active.first_name = Set(first_name.to_string());
        active.last_name = Set(last_name.to_string());
        active.email = Set(email.to_string());
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }
}

/// Hash a password using Argon2.
pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
