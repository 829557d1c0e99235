use crate::OnConstraint;
use crate::GetDb;

use devconnector_domain::error::{DcError, DcResult};
use devconnector_domain::profile::repo::*;
use devconnector_domain::profile::{Education, Experience, Profile, ProfileOwner, Social};
use devconnector_domain::timestamp::Timestamptz;
use devconnector_domain::UserId;

use entrait::*;
use itertools::Itertools;
use std::collections::HashMap;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub struct PgProfileRepo;

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    name: String,
    avatar: String,
    handle: String,
    company: Option<String>,
    website: Option<String>,
    location: Option<String>,
    status: String,
    bio: Option<String>,
    githubusername: Option<String>,
    skills: Vec<String>,
    youtube: Option<String>,
    twitter: Option<String>,
    facebook: Option<String>,
    linkedin: Option<String>,
    instagram: Option<String>,
    created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct ExperienceRow {
    user_id: Uuid,
    experience_id: Uuid,
    title: String,
    company: String,
    location: Option<String>,
    from_date: Date,
    to_date: Option<Date>,
    is_current: bool,
    description: Option<String>,
}

#[derive(sqlx::FromRow)]
struct EducationRow {
    user_id: Uuid,
    education_id: Uuid,
    school: String,
    degree: String,
    fieldofstudy: String,
    from_date: Date,
    to_date: Option<Date>,
    is_current: bool,
    description: Option<String>,
}

impl From<ExperienceRow> for Experience {
    fn from(row: ExperienceRow) -> Self {
        Self {
            id: row.experience_id,
            title: row.title,
            company: row.company,
            location: row.location,
            from: row.from_date,
            to: row.to_date,
            current: row.is_current,
            description: row.description,
        }
    }
}

impl From<EducationRow> for Education {
    fn from(row: EducationRow) -> Self {
        Self {
            id: row.education_id,
            school: row.school,
            degree: row.degree,
            fieldofstudy: row.fieldofstudy,
            from: row.from_date,
            to: row.to_date,
            current: row.is_current,
            description: row.description,
        }
    }
}

/// Selects profiles joined with their owners, optionally narrowed to one user or one handle.
async fn select_profiles(
    deps: &impl GetDb,
    user_id: Option<Uuid>,
    handle: Option<&str>,
) -> DcResult<Vec<Profile>> {
    let pg_pool = &deps.get_db().pg_pool;

    let rows: Vec<ProfileRow> = sqlx::query_as(
        // language=PostgreSQL
        r#"
        SELECT
            profile.user_id,
            u.name,
            u.avatar,
            handle,
            company,
            website,
            location,
            status,
            bio,
            githubusername,
            skills,
            youtube,
            twitter,
            facebook,
            linkedin,
            instagram,
            profile.created_at
        FROM app.profile
        INNER JOIN app.user u USING (user_id)
        WHERE (
            $1::uuid IS NULL OR profile.user_id = $1
        ) AND (
            $2::text IS NULL OR handle = $2
        )
        ORDER BY profile.created_at, profile.user_id
        "#,
    )
    .bind(user_id)
    .bind(handle)
    .fetch_all(pg_pool)
    .await?;

    if rows.is_empty() {
        return Ok(vec![]);
    }

    let user_ids: Vec<Uuid> = rows.iter().map(|row| row.user_id).collect();

    let experience_rows: Vec<ExperienceRow> = sqlx::query_as(
        r#"
        SELECT user_id, experience_id, title, company, location, from_date, to_date, is_current, description
        FROM app.experience
        WHERE user_id = ANY($1)
        ORDER BY seq DESC
        "#,
    )
    .bind(user_ids.as_slice())
    .fetch_all(pg_pool)
    .await?;

    let education_rows: Vec<EducationRow> = sqlx::query_as(
        r#"
        SELECT user_id, education_id, school, degree, fieldofstudy, from_date, to_date, is_current, description
        FROM app.education
        WHERE user_id = ANY($1)
        ORDER BY seq DESC
        "#,
    )
    .bind(user_ids.as_slice())
    .fetch_all(pg_pool)
    .await?;

    let mut experience: HashMap<Uuid, Vec<Experience>> = experience_rows
        .into_iter()
        .map(|row| (row.user_id, Experience::from(row)))
        .into_group_map();
    let mut education: HashMap<Uuid, Vec<Education>> = education_rows
        .into_iter()
        .map(|row| (row.user_id, Education::from(row)))
        .into_group_map();

    Ok(rows
        .into_iter()
        .map(|row| Profile {
            user: ProfileOwner {
                id: UserId(row.user_id),
                name: row.name,
                avatar: row.avatar,
            },
            handle: row.handle,
            company: row.company,
            website: row.website,
            location: row.location,
            status: row.status,
            skills: row.skills,
            bio: row.bio,
            githubusername: row.githubusername,
            social: Social {
                youtube: row.youtube,
                twitter: row.twitter,
                facebook: row.facebook,
                linkedin: row.linkedin,
                instagram: row.instagram,
            },
            experience: experience.remove(&row.user_id).unwrap_or_default(),
            education: education.remove(&row.user_id).unwrap_or_default(),
            date: Timestamptz(row.created_at),
        })
        .collect())
}

#[entrait]
impl devconnector_domain::profile::repo::ProfileRepoImpl for PgProfileRepo {
    pub async fn find_profile(
        deps: &impl GetDb,
        key: ProfileKey<'_>,
    ) -> DcResult<Option<Profile>> {
        let profiles = match key {
            ProfileKey::User(UserId(user_id)) => select_profiles(deps, Some(user_id), None).await?,
            ProfileKey::Handle(handle) => select_profiles(deps, None, Some(handle)).await?,
        };

        Ok(profiles.into_iter().next())
    }

    pub async fn list_profiles(deps: &impl GetDb) -> DcResult<Vec<Profile>> {
        select_profiles(deps, None, None).await
    }

    pub async fn update_profile(
        deps: &impl GetDb,
        UserId(user_id): UserId,
        changes: &ProfileChanges<'_>,
    ) -> DcResult<bool> {
        let result = sqlx::query(
            // language=PostgreSQL
            r#"
            UPDATE app.profile SET
                handle = COALESCE($2, handle),
                company = COALESCE($3, company),
                website = COALESCE($4, website),
                location = COALESCE($5, location),
                status = COALESCE($6, status),
                bio = COALESCE($7, bio),
                githubusername = COALESCE($8, githubusername),
                skills = COALESCE($9, skills),
                youtube = COALESCE($10, youtube),
                twitter = COALESCE($11, twitter),
                facebook = COALESCE($12, facebook),
                linkedin = COALESCE($13, linkedin),
                instagram = COALESCE($14, instagram)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(changes.handle)
        .bind(changes.company)
        .bind(changes.website)
        .bind(changes.location)
        .bind(changes.status)
        .bind(changes.bio)
        .bind(changes.githubusername)
        .bind(changes.skills.as_deref())
        .bind(changes.youtube)
        .bind(changes.twitter)
        .bind(changes.facebook)
        .bind(changes.linkedin)
        .bind(changes.instagram)
        .execute(&deps.get_db().pg_pool)
        .await
        .on_constraint("profile_handle_key", DcError::HandleTaken)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_profile(
        deps: &impl GetDb,
        UserId(user_id): UserId,
        changes: &ProfileChanges<'_>,
    ) -> DcResult<bool> {
        let inserted: Option<Uuid> = sqlx::query_scalar(
            // language=PostgreSQL
            r#"
            INSERT INTO app.profile (
                user_id, handle, company, website, location, status, bio,
                githubusername, skills, youtube, twitter, facebook, linkedin, instagram
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, '{}'::text[]), $10, $11, $12, $13, $14)
            -- the user already has a profile
            ON CONFLICT (user_id) DO NOTHING
            RETURNING user_id
            "#,
        )
        .bind(user_id)
        .bind(changes.handle)
        .bind(changes.company)
        .bind(changes.website)
        .bind(changes.location)
        .bind(changes.status)
        .bind(changes.bio)
        .bind(changes.githubusername)
        .bind(changes.skills.as_deref())
        .bind(changes.youtube)
        .bind(changes.twitter)
        .bind(changes.facebook)
        .bind(changes.linkedin)
        .bind(changes.instagram)
        .fetch_optional(&deps.get_db().pg_pool)
        .await
        .on_constraint("profile_handle_key", DcError::HandleTaken)
        .on_constraint("profile_user_id_fkey", DcError::CurrentUserDoesNotExist)?;

        Ok(inserted.is_some())
    }

    pub async fn delete_profile(deps: &impl GetDb, UserId(user_id): UserId) -> DcResult<()> {
        sqlx::query("DELETE FROM app.profile WHERE user_id = $1")
            .bind(user_id)
            .execute(&deps.get_db().pg_pool)
            .await?;

        Ok(())
    }

    pub async fn insert_experience(
        deps: &impl GetDb,
        UserId(user_id): UserId,
        experience: NewExperience<'_>,
    ) -> DcResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app.experience (user_id, title, company, location, from_date, to_date, is_current, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user_id)
        .bind(experience.title)
        .bind(experience.company)
        .bind(experience.location)
        .bind(experience.from)
        .bind(experience.to)
        .bind(experience.current)
        .bind(experience.description)
        .execute(&deps.get_db().pg_pool)
        .await
        .on_constraint("experience_user_id_fkey", DcError::ProfileNotFound)?;

        Ok(())
    }

    pub async fn delete_experience(
        deps: &impl GetDb,
        UserId(user_id): UserId,
        experience_id: Uuid,
    ) -> DcResult<bool> {
        let result =
            sqlx::query("DELETE FROM app.experience WHERE experience_id = $1 AND user_id = $2")
                .bind(experience_id)
                .bind(user_id)
                .execute(&deps.get_db().pg_pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_education(
        deps: &impl GetDb,
        UserId(user_id): UserId,
        education: NewEducation<'_>,
    ) -> DcResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app.education (user_id, school, degree, fieldofstudy, from_date, to_date, is_current, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user_id)
        .bind(education.school)
        .bind(education.degree)
        .bind(education.fieldofstudy)
        .bind(education.from)
        .bind(education.to)
        .bind(education.current)
        .bind(education.description)
        .execute(&deps.get_db().pg_pool)
        .await
        .on_constraint("education_user_id_fkey", DcError::ProfileNotFound)?;

        Ok(())
    }

    pub async fn delete_education(
        deps: &impl GetDb,
        UserId(user_id): UserId,
        education_id: Uuid,
    ) -> DcResult<bool> {
        let result =
            sqlx::query("DELETE FROM app.education WHERE education_id = $1 AND user_id = $2")
                .bind(education_id)
                .bind(user_id)
                .execute(&deps.get_db().pg_pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
