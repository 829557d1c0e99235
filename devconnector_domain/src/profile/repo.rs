use entrait::entrait_export as entrait;
use time::Date;
use uuid::Uuid;

use crate::error::DcResult;
use crate::profile::Profile;
use crate::UserId;

#[derive(Clone, Copy, Debug)]
pub enum ProfileKey<'a> {
    User(UserId),
    Handle(&'a str),
}

/// Partial profile document: `None` leaves the stored value untouched.
#[derive(Clone, Default, Debug)]
pub struct ProfileChanges<'a> {
    pub handle: Option<&'a str>,
    pub company: Option<&'a str>,
    pub website: Option<&'a str>,
    pub location: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub status: Option<&'a str>,
    pub githubusername: Option<&'a str>,
    pub skills: Option<Vec<String>>,
    pub youtube: Option<&'a str>,
    pub twitter: Option<&'a str>,
    pub facebook: Option<&'a str>,
    pub linkedin: Option<&'a str>,
    pub instagram: Option<&'a str>,
}

#[derive(Debug)]
pub struct NewExperience<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub location: Option<&'a str>,
    pub from: Date,
    pub to: Option<Date>,
    pub current: bool,
    pub description: Option<&'a str>,
}

#[derive(Debug)]
pub struct NewEducation<'a> {
    pub school: &'a str,
    pub degree: &'a str,
    pub fieldofstudy: &'a str,
    pub from: Date,
    pub to: Option<Date>,
    pub current: bool,
    pub description: Option<&'a str>,
}

#[entrait(ProfileRepoImpl, delegate_by = DelegateProfileRepo)]
pub trait ProfileRepo {
    async fn find_profile(&self, key: ProfileKey<'_>) -> DcResult<Option<Profile>>;

    async fn list_profiles(&self) -> DcResult<Vec<Profile>>;

    /// Returns `false` when the user has no profile to update.
    /// A handle owned by another profile fails with `HandleTaken`.
    async fn update_profile(
        &self,
        user_id: UserId,
        changes: &ProfileChanges<'_>,
    ) -> DcResult<bool>;

    /// Returns `false` when the user already has a profile.
    /// A handle owned by another profile fails with `HandleTaken`.
    async fn insert_profile(
        &self,
        user_id: UserId,
        changes: &ProfileChanges<'_>,
    ) -> DcResult<bool>;

    async fn delete_profile(&self, user_id: UserId) -> DcResult<()>;

    /// Fails with `ProfileNotFound` when the user has no profile.
    async fn insert_experience(
        &self,
        user_id: UserId,
        experience: NewExperience<'_>,
    ) -> DcResult<()>;

    /// Returns `false` when the user's profile has no such entry.
    async fn delete_experience(&self, user_id: UserId, experience_id: Uuid) -> DcResult<bool>;

    /// Fails with `ProfileNotFound` when the user has no profile.
    async fn insert_education(&self, user_id: UserId, education: NewEducation<'_>)
        -> DcResult<()>;

    /// Returns `false` when the user's profile has no such entry.
    async fn delete_education(&self, user_id: UserId, education_id: Uuid) -> DcResult<bool>;
}
