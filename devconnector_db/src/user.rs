use crate::OnConstraint;
use crate::GetDb;

use devconnector_domain::error::{DcError, DcResult};
use devconnector_domain::timestamp::Timestamptz;
use devconnector_domain::user::repo::*;
use devconnector_domain::UserId;

use entrait::*;
use time::OffsetDateTime;
use uuid::Uuid;

pub struct PgUserRepo;

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    email: String,
    avatar: String,
    password_hash: String,
    created_at: OffsetDateTime,
}

impl UserRow {
    fn into_user_credentials(self) -> (User, Credentials) {
        (
            User {
                user_id: UserId(self.user_id),
                name: self.name,
                email: self.email,
                avatar: self.avatar,
                date: Timestamptz(self.created_at),
            },
            Credentials {
                password_hash: self.password_hash.into(),
            },
        )
    }
}

#[entrait]
impl devconnector_domain::user::repo::UserRepoImpl for PgUserRepo {
    pub async fn insert_user(deps: &impl GetDb, new_user: NewUserRecord<'_>) -> DcResult<User> {
        let (user_id, created_at): (Uuid, OffsetDateTime) = sqlx::query_as(
            // language=PostgreSQL
            r#"
            INSERT INTO app.user (name, email, avatar, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, created_at
            "#,
        )
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.avatar)
        .bind(new_user.password_hash.0.as_str())
        .fetch_one(&deps.get_db().pg_pool)
        .await
        .on_constraint("user_email_key", DcError::EmailTaken)?;

        Ok(User {
            user_id: UserId(user_id),
            name: new_user.name.to_string(),
            email: new_user.email.to_string(),
            avatar: new_user.avatar.to_string(),
            date: Timestamptz(created_at),
        })
    }

    pub async fn find_user_credentials_by_id(
        deps: &impl GetDb,
        UserId(user_id): UserId,
    ) -> DcResult<Option<(User, Credentials)>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"SELECT user_id, name, email, avatar, password_hash, created_at FROM app.user WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&deps.get_db().pg_pool)
        .await?;

        Ok(row.map(UserRow::into_user_credentials))
    }

    pub async fn find_user_credentials_by_email(
        deps: &impl GetDb,
        email: &str,
    ) -> DcResult<Option<(User, Credentials)>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"SELECT user_id, name, email, avatar, password_hash, created_at FROM app.user WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&deps.get_db().pg_pool)
        .await?;

        Ok(row.map(UserRow::into_user_credentials))
    }

    pub async fn delete_user(deps: &impl GetDb, UserId(user_id): UserId) -> DcResult<()> {
        // The profile and its entries go with it.
        sqlx::query("DELETE FROM app.user WHERE user_id = $1")
            .bind(user_id)
            .execute(&deps.get_db().pg_pool)
            .await?;

        Ok(())
    }
}
