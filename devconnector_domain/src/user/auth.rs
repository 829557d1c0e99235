use crate::error::{DcError, DcResult};
use crate::{GetConfig, System, UserId};

use anyhow::anyhow;
use axum_extra::TypedHeader;
use entrait::entrait_export as entrait;
use headers::authorization::Bearer;
use headers::Authorization;
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use uuid::Uuid;

const DEFAULT_SESSION_LENGTH: time::Duration = time::Duration::hours(1);

#[derive(serde::Serialize, serde::Deserialize)]
struct AuthUserClaims {
    user_id: Uuid,
    /// Standard JWT `exp` claim.
    exp: i64,
}

#[entrait(pub SignUserId, mock_api=SignUserIdMock)]
fn sign_user_id(deps: &(impl System + GetConfig), user_id: UserId) -> DcResult<String> {
    AuthUserClaims {
        user_id: user_id.0,
        exp: (deps.get_current_time() + DEFAULT_SESSION_LENGTH).unix_timestamp(),
    }
    .sign_with_key(deps.get_jwt_signing_key())
    .map_err(|e| anyhow!("failed to sign token: {e}").into())
}

#[entrait(pub Authenticate, mock_api=AuthenticateMock)]
pub mod authenticate {
    use super::*;

    pub fn authenticate(deps: &(impl System + GetConfig), token: Token) -> DcResult<UserId> {
        let jwt = jwt::Token::<jwt::Header, AuthUserClaims, _>::parse_unverified(token.token())
            .map_err(|_| DcError::Unauthorized)?;

        let hmac = deps.get_jwt_signing_key();

        let jwt = jwt
            .verify_with_key(hmac)
            .map_err(|_| DcError::Unauthorized)?;
        let (_header, claims) = jwt.into();

        if claims.exp < deps.get_current_time().unix_timestamp() {
            return Err(DcError::Unauthorized);
        }

        Ok(UserId(claims.user_id))
    }
}

///
/// A bearer token taken from the `Authorization` header, without the scheme.
///
#[derive(Debug)]
pub struct Token(String);

impl Token {
    pub fn from_token(token: &str) -> Self {
        Self(token.to_string())
    }

    pub fn token(&self) -> &str {
        self.0.as_str()
    }

    /// The value clients put in their `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for Token
where
    S: Send + Sync,
{
    type Rejection = DcError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| DcError::Unauthorized)?;

        Ok(Token::from_token(bearer.token()))
    }
}
