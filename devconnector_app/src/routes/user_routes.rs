use super::MessageBody;

use devconnector_domain::error::DcResult;
use devconnector_domain::user::{self, auth::Authenticate, auth::Token};

use axum::extract::Extension;
use axum::routing::{get, post};
use axum::Json;

pub struct UserRoutes<D>(std::marker::PhantomData<D>);

impl<D> UserRoutes<D>
where
    D: user::Register
        + user::Login
        + user::FetchCurrent
        + Authenticate
        + Sized
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub fn router() -> axum::Router {
        axum::Router::new()
            .route("/test", get(Self::test))
            .route("/register", post(Self::register))
            .route("/login", post(Self::login))
            .route("/current", get(Self::current))
    }

    async fn test() -> Json<MessageBody> {
        Json(MessageBody {
            msg: "Users Works".to_string(),
        })
    }

    async fn register(
        Extension(deps): Extension<D>,
        Json(body): Json<user::RegisterInput>,
    ) -> DcResult<Json<user::RegisteredUser>> {
        Ok(Json(deps.register(body).await?))
    }

    async fn login(
        Extension(deps): Extension<D>,
        Json(body): Json<user::LoginInput>,
    ) -> DcResult<Json<user::LoginSuccess>> {
        Ok(Json(deps.login(body).await?))
    }

    async fn current(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> DcResult<Json<user::CurrentUser>> {
        let user_id = deps.authenticate(token)?;
        Ok(Json(deps.fetch_current(user_id).await?))
    }
}
