pub mod repo;

use crate::error::{DcError, DcResult};
use crate::timestamp::{iso_date, Timestamptz};
use crate::user::repo::UserRepo;
use crate::validation::{self, FieldErrors, Validation};
use crate::UserId;
use repo::{NewEducation, NewExperience, ProfileChanges, ProfileKey, ProfileRepo};

use anyhow::anyhow;
use entrait::entrait_export as entrait;
use time::Date;
use uuid::Uuid;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub user: ProfileOwner,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: String,
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    #[serde(default)]
    pub social: Social,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub date: Timestamptz,
}

/// The owning user, expanded to the fields a profile page shows.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProfileOwner {
    pub id: UserId,
    pub name: String,
    pub avatar: String,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct Social {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(with = "iso_date")]
    pub from: Date,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<Date>,
    pub current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Education {
    pub id: Uuid,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    #[serde(with = "iso_date")]
    pub from: Date,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<Date>,
    pub current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body of `POST /api/profile`. Skills come in as one comma separated string.
#[derive(serde::Serialize, serde::Deserialize, Clone, Default, Debug)]
#[serde(default)]
pub struct ProfileInput {
    pub handle: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub githubusername: Option<String>,
    pub skills: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Default, Debug)]
#[serde(default)]
pub struct ExperienceInput {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Default, Debug)]
#[serde(default)]
pub struct EducationInput {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub fieldofstudy: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

pub fn validate_profile_input(input: &ProfileInput) -> Validation {
    let mut errors = FieldErrors::new();

    match validation::present(input.handle.as_deref()) {
        None => {
            errors.insert("handle", "Profile handle is required".into());
        }
        Some(handle) if !validation::is_length(handle, 2, 40) => {
            errors.insert("handle", "Handle needs to be between 2 and 40 characters".into());
        }
        Some(_) => {}
    }

    if validation::is_empty(input.status.as_deref()) {
        errors.insert("status", "Status field is required".into());
    }

    if validation::is_empty(input.skills.as_deref()) {
        errors.insert("skills", "Skills field is required".into());
    }

    let urls = [
        ("website", &input.website),
        ("youtube", &input.youtube),
        ("twitter", &input.twitter),
        ("facebook", &input.facebook),
        ("linkedin", &input.linkedin),
        ("instagram", &input.instagram),
    ];
    for (field, value) in urls {
        if let Some(url) = validation::present(value.as_deref()) {
            if !validation::is_url(url) {
                errors.insert(field, "Not a valid URL".into());
            }
        }
    }

    Validation::from_errors(errors)
}

pub fn validate_experience_input(input: &ExperienceInput) -> Validation {
    let mut errors = FieldErrors::new();

    if validation::is_empty(input.title.as_deref()) {
        errors.insert("title", "Job title field is required".into());
    }
    if validation::is_empty(input.company.as_deref()) {
        errors.insert("company", "Company field is required".into());
    }
    check_dates(&mut errors, input.from.as_deref(), input.to.as_deref());

    Validation::from_errors(errors)
}

pub fn validate_education_input(input: &EducationInput) -> Validation {
    let mut errors = FieldErrors::new();

    if validation::is_empty(input.school.as_deref()) {
        errors.insert("school", "School field is required".into());
    }
    if validation::is_empty(input.degree.as_deref()) {
        errors.insert("degree", "Degree field is required".into());
    }
    if validation::is_empty(input.fieldofstudy.as_deref()) {
        errors.insert("fieldofstudy", "Field of study field is required".into());
    }
    check_dates(&mut errors, input.from.as_deref(), input.to.as_deref());

    Validation::from_errors(errors)
}

fn check_dates(errors: &mut FieldErrors, from: Option<&str>, to: Option<&str>) {
    match validation::present(from) {
        None => {
            errors.insert("from", "From date field is required".into());
        }
        Some(from) if validation::parse_date(from).is_none() => {
            errors.insert("from", "From date is not a valid date".into());
        }
        Some(_) => {}
    }

    if let Some(to) = validation::present(to) {
        if validation::parse_date(to).is_none() {
            errors.insert("to", "To date is not a valid date".into());
        }
    }
}

/// `"node, react,css"` -> `["node", "react", "css"]`
pub fn split_skills(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(String::from)
        .collect()
}

fn profile_changes(input: &ProfileInput) -> ProfileChanges<'_> {
    fn field(value: &Option<String>) -> Option<&str> {
        validation::present(value.as_deref())
    }

    ProfileChanges {
        handle: field(&input.handle),
        company: field(&input.company),
        website: field(&input.website),
        location: field(&input.location),
        bio: field(&input.bio),
        status: field(&input.status),
        githubusername: field(&input.githubusername),
        skills: field(&input.skills).map(split_skills),
        youtube: field(&input.youtube),
        twitter: field(&input.twitter),
        facebook: field(&input.facebook),
        linkedin: field(&input.linkedin),
        instagram: field(&input.instagram),
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> DcResult<&'a str> {
    validation::present(value).ok_or_else(|| anyhow!("{field} missing after validation").into())
}

fn required_date(value: Option<&str>, field: &str) -> DcResult<Date> {
    optional_date(value)?.ok_or_else(|| anyhow!("{field} missing after validation").into())
}

fn optional_date(value: Option<&str>) -> DcResult<Option<Date>> {
    match validation::present(value) {
        Some(value) => validation::parse_date(value)
            .map(Some)
            .ok_or_else(|| anyhow!("invalid date after validation: {value}").into()),
        None => Ok(None),
    }
}

#[entrait(pub ProfileApi, mock_api=ProfileApiMock)]
pub mod api {
    use super::*;

    pub async fn fetch_current(deps: &impl ProfileRepo, user_id: UserId) -> DcResult<Profile> {
        deps.find_profile(ProfileKey::User(user_id))
            .await?
            .ok_or(DcError::ProfileNotFound)
    }

    pub async fn list_all(deps: &impl ProfileRepo) -> DcResult<Vec<Profile>> {
        let profiles = deps.list_profiles().await?;
        if profiles.is_empty() {
            return Err(DcError::NoProfiles);
        }
        Ok(profiles)
    }

    pub async fn fetch_by_handle(deps: &impl ProfileRepo, handle: &str) -> DcResult<Profile> {
        deps.find_profile(ProfileKey::Handle(handle))
            .await?
            .ok_or(DcError::ProfileNotFound)
    }

    pub async fn fetch_by_user_id(deps: &impl ProfileRepo, user_id: &str) -> DcResult<Profile> {
        let user_id = Uuid::parse_str(user_id).map_err(|_| DcError::ProfileNotFound)?;
        deps.find_profile(ProfileKey::User(UserId(user_id)))
            .await?
            .ok_or(DcError::ProfileNotFound)
    }

    pub async fn save(
        deps: &impl ProfileRepo,
        user_id: UserId,
        input: ProfileInput,
    ) -> DcResult<Profile> {
        validate_profile_input(&input).into_result()?;
        let changes = profile_changes(&input);

        if !deps.update_profile(user_id, &changes).await?
            && !deps.insert_profile(user_id, &changes).await?
        {
            // Created by a concurrent request after our update found nothing.
            deps.update_profile(user_id, &changes).await?;
        }

        fetch_current(deps, user_id).await
    }

    pub async fn add_experience(
        deps: &impl ProfileRepo,
        user_id: UserId,
        input: ExperienceInput,
    ) -> DcResult<Profile> {
        validate_experience_input(&input).into_result()?;

        deps.insert_experience(
            user_id,
            NewExperience {
                title: required(input.title.as_deref(), "title")?,
                company: required(input.company.as_deref(), "company")?,
                location: validation::present(input.location.as_deref()),
                from: required_date(input.from.as_deref(), "from")?,
                to: optional_date(input.to.as_deref())?,
                current: input.current,
                description: validation::present(input.description.as_deref()),
            },
        )
        .await?;

        fetch_current(deps, user_id).await
    }

    pub async fn add_education(
        deps: &impl ProfileRepo,
        user_id: UserId,
        input: EducationInput,
    ) -> DcResult<Profile> {
        validate_education_input(&input).into_result()?;

        deps.insert_education(
            user_id,
            NewEducation {
                school: required(input.school.as_deref(), "school")?,
                degree: required(input.degree.as_deref(), "degree")?,
                fieldofstudy: required(input.fieldofstudy.as_deref(), "fieldofstudy")?,
                from: required_date(input.from.as_deref(), "from")?,
                to: optional_date(input.to.as_deref())?,
                current: input.current,
                description: validation::present(input.description.as_deref()),
            },
        )
        .await?;

        fetch_current(deps, user_id).await
    }

    pub async fn delete_experience(
        deps: &impl ProfileRepo,
        user_id: UserId,
        experience_id: &str,
    ) -> DcResult<Profile> {
        fetch_current(deps, user_id).await?;

        let experience_id =
            Uuid::parse_str(experience_id).map_err(|_| DcError::ExperienceNotFound)?;
        if !deps.delete_experience(user_id, experience_id).await? {
            return Err(DcError::ExperienceNotFound);
        }

        fetch_current(deps, user_id).await
    }

    pub async fn delete_education(
        deps: &impl ProfileRepo,
        user_id: UserId,
        education_id: &str,
    ) -> DcResult<Profile> {
        fetch_current(deps, user_id).await?;

        let education_id =
            Uuid::parse_str(education_id).map_err(|_| DcError::EducationNotFound)?;
        if !deps.delete_education(user_id, education_id).await? {
            return Err(DcError::EducationNotFound);
        }

        fetch_current(deps, user_id).await
    }

    /// Removes the profile and then its owner. Either may already be gone.
    pub async fn delete(deps: &(impl ProfileRepo + UserRepo), user_id: UserId) -> DcResult<()> {
        deps.delete_profile(user_id).await?;
        deps.delete_user(user_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestApp;

    use assert_matches::*;
    use entrait::Impl;

    fn profile_input(handle: &str) -> ProfileInput {
        ProfileInput {
            handle: Some(handle.to_string()),
            status: Some("Developer".to_string()),
            skills: Some("node,react,css".to_string()),
            ..ProfileInput::default()
        }
    }

    fn experience_input(title: &str) -> ExperienceInput {
        ExperienceInput {
            title: Some(title.to_string()),
            company: Some("Acme".to_string()),
            from: Some("2019-05-01".to_string()),
            ..ExperienceInput::default()
        }
    }

    fn education_input(school: &str) -> EducationInput {
        EducationInput {
            school: Some(school.to_string()),
            degree: Some("BSc".to_string()),
            fieldofstudy: Some("Computer Science".to_string()),
            from: Some("2010-09-01".to_string()),
            to: Some("2013-06-30".to_string()),
            ..EducationInput::default()
        }
    }

    fn app_with_users(names: &[&str]) -> (Impl<TestApp>, Vec<UserId>) {
        let app = TestApp::default();
        let user_ids = names.iter().map(|name| app.add_user(name)).collect();
        (Impl::new(app), user_ids)
    }

    #[test]
    fn skills_are_split_on_commas_in_order() {
        assert_eq!(vec!["node", "react", "css"], split_skills("node,react,css"));
        assert_eq!(vec!["node", "react"], split_skills(" node , react,, "));
    }

    #[test]
    fn profile_input_requires_handle_status_and_skills() {
        let validation = validate_profile_input(&ProfileInput::default());

        assert!(!validation.is_valid);
        assert_eq!(
            vec!["handle", "skills", "status"],
            validation.errors.keys().copied().collect::<Vec<_>>()
        );
    }

    #[test]
    fn profile_input_rejects_bad_handle_and_urls() {
        let validation = validate_profile_input(&ProfileInput {
            handle: Some("x".to_string()),
            website: Some("not a url".to_string()),
            twitter: Some("twitter.com/dev".to_string()),
            youtube: Some("nope".to_string()),
            ..profile_input("ignored")
        });

        assert_eq!(
            Some("Handle needs to be between 2 and 40 characters"),
            validation.errors.get("handle").map(String::as_str)
        );
        assert_eq!(
            Some("Not a valid URL"),
            validation.errors.get("website").map(String::as_str)
        );
        assert_eq!(
            Some("Not a valid URL"),
            validation.errors.get("youtube").map(String::as_str)
        );
        assert!(!validation.errors.contains_key("twitter"));
    }

    #[test]
    fn entry_inputs_require_their_fields() {
        let experience = validate_experience_input(&ExperienceInput::default());
        assert_eq!(
            vec!["company", "from", "title"],
            experience.errors.keys().copied().collect::<Vec<_>>()
        );

        let education = validate_education_input(&EducationInput {
            from: Some("last year".to_string()),
            ..education_input("MIT")
        });
        assert_eq!(
            Some("From date is not a valid date"),
            education.errors.get("from").map(String::as_str)
        );
    }

    #[tokio::test]
    async fn create_then_fetch_by_handle_returns_the_same_document() {
        let (deps, users) = app_with_users(&["Jane"]);

        let created = api::save(&deps, users[0], profile_input("jane")).await.unwrap();
        let fetched = api::fetch_by_handle(&deps, "jane").await.unwrap();

        assert_eq!(created, fetched);
        assert_eq!("Jane", fetched.user.name);
        assert_eq!(vec!["node", "react", "css"], fetched.skills);
    }

    #[tokio::test]
    async fn second_user_cannot_take_an_existing_handle() {
        let (deps, users) = app_with_users(&["Jane", "John"]);
        api::save(&deps, users[0], profile_input("dev")).await.unwrap();

        assert_matches!(
            api::save(&deps, users[1], profile_input("dev")).await,
            Err(DcError::HandleTaken)
        );
        assert_matches!(
            api::fetch_current(&deps, users[1]).await,
            Err(DcError::ProfileNotFound)
        );
    }

    #[tokio::test]
    async fn saving_twice_updates_the_existing_profile() {
        let (deps, users) = app_with_users(&["Jane"]);
        api::save(
            &deps,
            users[0],
            ProfileInput {
                company: Some("Acme".to_string()),
                ..profile_input("jane")
            },
        )
        .await
        .unwrap();

        let updated = api::save(
            &deps,
            users[0],
            ProfileInput {
                bio: Some("Hello".to_string()),
                skills: Some("rust".to_string()),
                ..profile_input("jane")
            },
        )
        .await
        .unwrap();

        assert_eq!(1, api::list_all(&deps).await.unwrap().len());
        assert_eq!(Some("Acme"), updated.company.as_deref());
        assert_eq!(Some("Hello"), updated.bio.as_deref());
        assert_eq!(vec!["rust"], updated.skills);
    }

    #[tokio::test]
    async fn invalid_input_is_not_stored() {
        let (deps, users) = app_with_users(&["Jane"]);

        assert_matches!(
            api::save(&deps, users[0], ProfileInput::default()).await,
            Err(DcError::Validation(_))
        );
        assert_matches!(api::list_all(&deps).await, Err(DcError::NoProfiles));
    }

    #[tokio::test]
    async fn fetch_by_user_id_handles_unknown_and_malformed_ids() {
        let (deps, users) = app_with_users(&["Jane"]);
        api::save(&deps, users[0], profile_input("jane")).await.unwrap();

        let found = api::fetch_by_user_id(&deps, &users[0].0.to_string())
            .await
            .unwrap();
        assert_eq!("jane", found.handle);

        assert_matches!(
            api::fetch_by_user_id(&deps, &Uuid::new_v4().to_string()).await,
            Err(DcError::ProfileNotFound)
        );
        assert_matches!(
            api::fetch_by_user_id(&deps, "not-a-uuid").await,
            Err(DcError::ProfileNotFound)
        );
    }

    #[tokio::test]
    async fn experience_entries_are_newest_first() {
        let (deps, users) = app_with_users(&["Jane"]);
        api::save(&deps, users[0], profile_input("jane")).await.unwrap();

        api::add_experience(&deps, users[0], experience_input("E1"))
            .await
            .unwrap();
        let profile = api::add_experience(&deps, users[0], experience_input("E2"))
            .await
            .unwrap();

        let titles: Vec<_> = profile.experience.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(vec!["E2", "E1"], titles);
    }

    #[tokio::test]
    async fn deleting_an_experience_keeps_the_others_in_order() {
        let (deps, users) = app_with_users(&["Jane"]);
        api::save(&deps, users[0], profile_input("jane")).await.unwrap();
        for title in ["E1", "E2", "E3"] {
            api::add_experience(&deps, users[0], experience_input(title))
                .await
                .unwrap();
        }
        let profile = api::fetch_current(&deps, users[0]).await.unwrap();
        let middle = profile.experience[1].id;

        let profile = api::delete_experience(&deps, users[0], &middle.to_string())
            .await
            .unwrap();

        let titles: Vec<_> = profile.experience.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(vec!["E3", "E1"], titles);
    }

    #[tokio::test]
    async fn deleting_a_missing_experience_leaves_the_sequence_alone() {
        let (deps, users) = app_with_users(&["Jane"]);
        api::save(&deps, users[0], profile_input("jane")).await.unwrap();
        api::add_experience(&deps, users[0], experience_input("E1"))
            .await
            .unwrap();
        let before = api::add_experience(&deps, users[0], experience_input("E2"))
            .await
            .unwrap();

        assert_matches!(
            api::delete_experience(&deps, users[0], &Uuid::new_v4().to_string()).await,
            Err(DcError::ExperienceNotFound)
        );
        assert_matches!(
            api::delete_experience(&deps, users[0], "garbage").await,
            Err(DcError::ExperienceNotFound)
        );

        let after = api::fetch_current(&deps, users[0]).await.unwrap();
        assert_eq!(before.experience, after.experience);
    }

    #[tokio::test]
    async fn entries_need_an_existing_profile() {
        let (deps, users) = app_with_users(&["Jane"]);

        assert_matches!(
            api::add_experience(&deps, users[0], experience_input("E1")).await,
            Err(DcError::ProfileNotFound)
        );
        assert_matches!(
            api::add_education(&deps, users[0], education_input("MIT")).await,
            Err(DcError::ProfileNotFound)
        );
        assert_matches!(
            api::delete_education(&deps, users[0], &Uuid::new_v4().to_string()).await,
            Err(DcError::ProfileNotFound)
        );
    }

    #[tokio::test]
    async fn education_entries_can_be_added_and_removed() {
        let (deps, users) = app_with_users(&["Jane"]);
        api::save(&deps, users[0], profile_input("jane")).await.unwrap();

        api::add_education(&deps, users[0], education_input("MIT"))
            .await
            .unwrap();
        let profile = api::add_education(&deps, users[0], education_input("ETH"))
            .await
            .unwrap();
        let schools: Vec<_> = profile.education.iter().map(|e| e.school.as_str()).collect();
        assert_eq!(vec!["ETH", "MIT"], schools);
        assert_eq!(
            Some(Date::from_calendar_date(2013, time::Month::June, 30).unwrap()),
            profile.education[0].to
        );

        let mit = profile.education[1].id;
        let profile = api::delete_education(&deps, users[0], &mit.to_string())
            .await
            .unwrap();
        assert_eq!(1, profile.education.len());
        assert_eq!("ETH", profile.education[0].school);

        assert_matches!(
            api::delete_education(&deps, users[0], &mit.to_string()).await,
            Err(DcError::EducationNotFound)
        );
    }

    #[tokio::test]
    async fn deleting_a_profile_removes_its_user() {
        let (deps, users) = app_with_users(&["Jane", "John"]);
        api::save(&deps, users[0], profile_input("jane")).await.unwrap();
        api::save(&deps, users[1], profile_input("john")).await.unwrap();

        api::delete(&deps, users[0]).await.unwrap();

        assert_matches!(
            api::fetch_by_user_id(&deps, &users[0].0.to_string()).await,
            Err(DcError::ProfileNotFound)
        );
        assert!(deps.find_user_credentials_by_id(users[0]).await.unwrap().is_none());
        assert_eq!(1, api::list_all(&deps).await.unwrap().len());

        // Nothing left to delete is still a success.
        api::delete(&deps, users[0]).await.unwrap();
    }
}
