pub mod auth;
pub mod password;
pub mod repo;

use crate::error::{DcError, DcResult};
use crate::timestamp::Timestamptz;
use crate::validation::{self, FieldErrors, Validation};
use crate::UserId;

use entrait::entrait_export as entrait;
use sha2::{Digest, Sha256};

/// A user as shown to its owner right after registering.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RegisteredUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub date: Timestamptz,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct LoginSuccess {
    pub success: bool,
    pub token: String,
}

#[derive(serde::Serialize, serde::Deserialize, Default)]
#[serde(default)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Default)]
#[serde(default)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn validate_register_input(input: &RegisterInput) -> Validation {
    let mut errors = FieldErrors::new();
    let name = input.name.as_deref().unwrap_or_default();
    let email = input.email.as_deref().unwrap_or_default();
    let password = input.password.as_deref().unwrap_or_default();
    let password2 = input.password2.as_deref().unwrap_or_default();

    if validation::is_empty(Some(name)) {
        errors.insert("name", "Name field is required".into());
    } else if !validation::is_length(name.trim(), 2, 30) {
        errors.insert("name", "Name must be between 2 and 30 characters".into());
    }

    if validation::is_empty(Some(email)) {
        errors.insert("email", "Email field is required".into());
    } else if !validation::is_email(email) {
        errors.insert("email", "Email is invalid".into());
    }

    if password.is_empty() {
        errors.insert("password", "Password field is required".into());
    } else if !validation::is_length(password, 6, 30) {
        errors.insert("password", "Password must be at least 6 characters".into());
    }

    if password2.is_empty() {
        errors.insert("password2", "Confirm password field is required".into());
    } else if password != password2 {
        errors.insert("password2", "Passwords must match".into());
    }

    Validation::from_errors(errors)
}

pub fn validate_login_input(input: &LoginInput) -> Validation {
    let mut errors = FieldErrors::new();
    let email = input.email.as_deref().unwrap_or_default();

    if validation::is_empty(Some(email)) {
        errors.insert("email", "Email field is required".into());
    } else if !validation::is_email(email) {
        errors.insert("email", "Email is invalid".into());
    }

    if input.password.as_deref().unwrap_or_default().is_empty() {
        errors.insert("password", "Password field is required".into());
    }

    Validation::from_errors(errors)
}

/// Gravatar URL for an email, 200px, rated PG, "mystery person" fallback.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=200&r=pg&d=mm",
        hex::encode(digest)
    )
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[entrait(pub Register, mock_api=RegisterMock)]
async fn register(
    deps: &(impl password::HashPassword + repo::UserRepo),
    input: RegisterInput,
) -> DcResult<RegisteredUser> {
    validate_register_input(&input).into_result()?;

    let name = input.name.unwrap_or_default();
    let email = normalize_email(&input.email.unwrap_or_default());
    let password_hash = deps
        .hash_password(input.password.unwrap_or_default().into())
        .await?;

    let user = deps
        .insert_user(repo::NewUserRecord {
            name: name.trim(),
            email: &email,
            avatar: &gravatar_url(&email),
            password_hash,
        })
        .await?;

    Ok(RegisteredUser {
        id: user.user_id,
        name: user.name,
        email: user.email,
        avatar: user.avatar,
        date: user.date,
    })
}

#[entrait(pub Login, mock_api=LoginMock)]
async fn login(
    deps: &(impl repo::UserRepo + password::VerifyPassword + auth::SignUserId),
    input: LoginInput,
) -> DcResult<LoginSuccess> {
    validate_login_input(&input).into_result()?;

    let email = normalize_email(&input.email.unwrap_or_default());
    let (user, credentials) = deps
        .find_user_credentials_by_email(&email)
        .await?
        .ok_or(DcError::EmailDoesNotExist)?;

    deps.verify_password(
        input.password.unwrap_or_default().into(),
        credentials.password_hash,
    )
    .await?;

    let token = auth::Token::from_token(&deps.sign_user_id(user.user_id)?);

    Ok(LoginSuccess {
        success: true,
        token: token.bearer(),
    })
}

#[entrait(pub FetchCurrent, mock_api=FetchCurrentMock)]
async fn fetch_current(deps: &impl repo::UserRepo, user_id: UserId) -> DcResult<CurrentUser> {
    let (user, _) = deps
        .find_user_credentials_by_id(user_id)
        .await?
        .ok_or(DcError::CurrentUserDoesNotExist)?;

    Ok(CurrentUser {
        id: user.user_id,
        name: user.name,
        email: user.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestApp;

    use assert_matches::*;
    use entrait::Impl;

    fn new_user(email: &str) -> RegisterInput {
        RegisterInput {
            name: Some("Jane Dev".to_string()),
            email: Some(email.to_string()),
            password: Some("password".to_string()),
            password2: Some("password".to_string()),
        }
    }

    #[test]
    fn register_input_reports_every_bad_field() {
        let validation = validate_register_input(&RegisterInput {
            name: Some("J".to_string()),
            email: Some("nope".to_string()),
            password: Some("12345".to_string()),
            password2: Some("54321".to_string()),
        });

        assert!(!validation.is_valid);
        assert_eq!(
            Some("Name must be between 2 and 30 characters"),
            validation.errors.get("name").map(String::as_str)
        );
        assert_eq!(
            Some("Email is invalid"),
            validation.errors.get("email").map(String::as_str)
        );
        assert!(validation.errors.contains_key("password"));
        assert_eq!(
            Some("Passwords must match"),
            validation.errors.get("password2").map(String::as_str)
        );
    }

    #[test]
    fn gravatar_is_keyed_by_normalized_email() {
        assert_eq!(
            gravatar_url("dev@example.com"),
            gravatar_url("  Dev@Example.com ")
        );
        assert!(gravatar_url("dev@example.com").starts_with("https://www.gravatar.com/avatar/"));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let deps = Impl::new(TestApp::default());

        let user = register(&deps, new_user("Jane@Example.com")).await.unwrap();
        assert_eq!("jane@example.com", user.email);
        assert_eq!(gravatar_url("jane@example.com"), user.avatar);

        let success = login(
            &deps,
            LoginInput {
                email: Some("jane@example.com".to_string()),
                password: Some("password".to_string()),
            },
        )
        .await
        .unwrap();

        assert!(success.success);
        let token = success.token.strip_prefix("Bearer ").unwrap();
        assert_eq!(
            user.id,
            auth::authenticate::authenticate(&deps, auth::Token::from_token(token)).unwrap()
        );
        assert_eq!(
            "Jane Dev",
            fetch_current(&deps, user.id).await.unwrap().name
        );
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let deps = Impl::new(TestApp::default());
        register(&deps, new_user("jane@example.com")).await.unwrap();

        assert_matches!(
            register(&deps, new_user("jane@example.com")).await,
            Err(DcError::EmailTaken)
        );
    }

    #[tokio::test]
    async fn test_login_failures() {
        let deps = Impl::new(TestApp::default());
        register(&deps, new_user("jane@example.com")).await.unwrap();

        assert_matches!(
            login(
                &deps,
                LoginInput {
                    email: Some("nobody@example.com".to_string()),
                    password: Some("password".to_string()),
                },
            )
            .await,
            Err(DcError::EmailDoesNotExist)
        );

        assert_matches!(
            login(
                &deps,
                LoginInput {
                    email: Some("jane@example.com".to_string()),
                    password: Some("wrong password".to_string()),
                },
            )
            .await,
            Err(DcError::IncorrectPassword)
        );

        assert_matches!(
            login(&deps, LoginInput::default()).await,
            Err(DcError::Validation(errors)) if errors.len() == 2
        );
    }
}
