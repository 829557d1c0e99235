use crate::validation::FieldErrors;

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::StatusCode;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;

pub type DcResult<T, E = DcError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum DcError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("invalid input")]
    Validation(FieldErrors),

    #[error("user does not exist")]
    CurrentUserDoesNotExist,

    #[error("User not found")]
    EmailDoesNotExist,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Password incorrect")]
    IncorrectPassword,

    #[error("That handle already exists")]
    HandleTaken,

    #[error("There is no profile for this user")]
    ProfileNotFound,

    #[error("There are no profiles")]
    NoProfiles,

    #[error("Experience entry not found")]
    ExperienceNotFound,

    #[error("Education entry not found")]
    EducationNotFound,

    #[error("an error occurred with the database")]
    Sqlx(#[from] sqlx::Error),

    #[error("an internal server error occurred")]
    Anyhow(#[from] anyhow::Error),
}

impl DcError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::CurrentUserDoesNotExist => StatusCode::NOT_FOUND,
            Self::EmailDoesNotExist => StatusCode::NOT_FOUND,
            Self::EmailTaken => StatusCode::BAD_REQUEST,
            Self::IncorrectPassword => StatusCode::BAD_REQUEST,
            Self::HandleTaken => StatusCode::BAD_REQUEST,
            Self::ProfileNotFound => StatusCode::NOT_FOUND,
            Self::NoProfiles => StatusCode::NOT_FOUND,
            Self::ExperienceNotFound => StatusCode::NOT_FOUND,
            Self::EducationNotFound => StatusCode::NOT_FOUND,
            Self::Sqlx(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The key under which single-field errors are reported in the JSON body.
    fn field(&self) -> Option<&'static str> {
        match self {
            Self::EmailDoesNotExist | Self::EmailTaken => Some("email"),
            Self::IncorrectPassword => Some("password"),
            Self::HandleTaken => Some("handle"),
            Self::ProfileNotFound | Self::NoProfiles => Some("nonprofile"),
            Self::ExperienceNotFound => Some("experience"),
            Self::EducationNotFound => Some("education"),
            _ => None,
        }
    }
}

impl IntoResponse for DcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::Unauthorized => (
                status,
                [(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))]
                    .into_iter()
                    .collect::<HeaderMap>(),
                self.to_string(),
            )
                .into_response(),
            Self::Validation(errors) => (status, Json(errors)).into_response(),
            Self::CurrentUserDoesNotExist => (status, ()).into_response(),
            Self::Sqlx(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (status, self.to_string()).into_response()
            }
            Self::Anyhow(ref e) => {
                tracing::error!("Generic error: {:?}", e);
                (status, self.to_string()).into_response()
            }
            _ => match self.field() {
                Some(field) => {
                    let mut errors = FieldErrors::new();
                    errors.insert(field, self.to_string());
                    (status, Json(errors)).into_response()
                }
                None => (status, ()).into_response(),
            },
        }
    }
}
