use super::MessageBody;

use devconnector_domain::error::DcResult;
use devconnector_domain::profile::{self, api::ProfileApi, Profile};
use devconnector_domain::user::auth::{Authenticate, Token};

use axum::extract::{Extension, Path};
use axum::routing::{delete, get, post};
use axum::Json;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct SuccessBody {
    success: bool,
}

pub struct ProfileRoutes<D>(std::marker::PhantomData<D>);

impl<D> ProfileRoutes<D>
where
    D: ProfileApi + Authenticate + Sized + Clone + Send + Sync + 'static,
{
    pub fn router() -> axum::Router {
        axum::Router::new()
            .route(
                "/",
                get(Self::current_profile)
                    .post(Self::save_profile)
                    .delete(Self::delete_profile),
            )
            .route("/test", get(Self::test))
            .route("/all", get(Self::all_profiles))
            .route("/handle/:handle", get(Self::profile_by_handle))
            .route("/user/:user_id", get(Self::profile_by_user_id))
            .route("/experience", post(Self::add_experience))
            .route("/experience/:exp_id", delete(Self::delete_experience))
            .route("/education", post(Self::add_education))
            .route("/education/:edu_id", delete(Self::delete_education))
    }

    async fn test() -> Json<MessageBody> {
        Json(MessageBody {
            msg: "Profile Works".to_string(),
        })
    }

    async fn current_profile(Extension(deps): Extension<D>, token: Token) -> DcResult<Json<Profile>> {
        let user_id = deps.authenticate(token)?;
        Ok(Json(deps.fetch_current(user_id).await?))
    }

    async fn all_profiles(Extension(deps): Extension<D>) -> DcResult<Json<Vec<Profile>>> {
        Ok(Json(deps.list_all().await?))
    }

    async fn profile_by_handle(
        Extension(deps): Extension<D>,
        Path(handle): Path<String>,
    ) -> DcResult<Json<Profile>> {
        Ok(Json(deps.fetch_by_handle(&handle).await?))
    }

    async fn profile_by_user_id(
        Extension(deps): Extension<D>,
        Path(user_id): Path<String>,
    ) -> DcResult<Json<Profile>> {
        Ok(Json(deps.fetch_by_user_id(&user_id).await?))
    }

    async fn save_profile(
        Extension(deps): Extension<D>,
        token: Token,
        Json(body): Json<profile::ProfileInput>,
    ) -> DcResult<Json<Profile>> {
        let user_id = deps.authenticate(token)?;
        Ok(Json(deps.save(user_id, body).await?))
    }

    async fn add_experience(
        Extension(deps): Extension<D>,
        token: Token,
        Json(body): Json<profile::ExperienceInput>,
    ) -> DcResult<Json<Profile>> {
        let user_id = deps.authenticate(token)?;
        Ok(Json(deps.add_experience(user_id, body).await?))
    }

    async fn add_education(
        Extension(deps): Extension<D>,
        token: Token,
        Json(body): Json<profile::EducationInput>,
    ) -> DcResult<Json<Profile>> {
        let user_id = deps.authenticate(token)?;
        Ok(Json(deps.add_education(user_id, body).await?))
    }

    async fn delete_experience(
        Extension(deps): Extension<D>,
        token: Token,
        Path(exp_id): Path<String>,
    ) -> DcResult<Json<Profile>> {
        let user_id = deps.authenticate(token)?;
        Ok(Json(deps.delete_experience(user_id, &exp_id).await?))
    }

    async fn delete_education(
        Extension(deps): Extension<D>,
        token: Token,
        Path(edu_id): Path<String>,
    ) -> DcResult<Json<Profile>> {
        let user_id = deps.authenticate(token)?;
        Ok(Json(deps.delete_education(user_id, &edu_id).await?))
    }

    async fn delete_profile(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> DcResult<Json<SuccessBody>> {
        let user_id = deps.authenticate(token)?;
        deps.delete(user_id).await?;
        Ok(Json(SuccessBody { success: true }))
    }
}
