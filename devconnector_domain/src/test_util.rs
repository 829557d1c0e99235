//! In-memory application used by unit tests, here and in the app crate.
//!
//! Enforces the same uniqueness and ownership rules as the Postgres schema.

use crate::error::{DcError, DcResult};
use crate::profile::repo::{
    NewEducation, NewExperience, ProfileChanges, ProfileKey, ProfileRepoImpl,
};
use crate::profile::{Education, Experience, Profile, ProfileOwner, Social};
use crate::timestamp::Timestamptz;
use crate::user::password::PasswordHash;
use crate::user::repo::{Credentials, NewUserRecord, User, UserRepoImpl};
use crate::{profile, user, GetConfig, System, UserId};

use entrait::entrait_export as entrait;
use hmac::Mac;
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone)]
pub struct TestApp {
    store: Arc<Mutex<MemoryStore>>,
    jwt_signing_key: hmac::Hmac<sha2::Sha384>,
    current_time: OffsetDateTime,
}

impl Default for TestApp {
    fn default() -> Self {
        Self {
            store: Default::default(),
            jwt_signing_key: signing_key("foobar"),
            current_time: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

fn signing_key(key: &str) -> hmac::Hmac<sha2::Sha384> {
    hmac::Hmac::<sha2::Sha384>::new_from_slice(key.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"))
}

impl TestApp {
    pub fn with_current_time(self, current_time: OffsetDateTime) -> Self {
        Self {
            current_time,
            ..self
        }
    }

    pub fn with_jwt_signing_key(self, key: &str) -> Self {
        Self {
            jwt_signing_key: signing_key(key),
            ..self
        }
    }

    /// Registers `name` as `<name>@example.com` without going through password hashing.
    pub fn add_user(&self, name: &str) -> UserId {
        let email = format!("{}@example.com", name.to_lowercase());
        let user = User {
            user_id: UserId(Uuid::new_v4()),
            name: name.to_string(),
            avatar: user::gravatar_url(&email),
            email,
            date: Timestamptz(self.current_time),
        };
        let user_id = user.user_id;
        lock(&self.store).users.push((
            user,
            Credentials {
                password_hash: PasswordHash("not a hash".to_string()),
            },
        ));
        user_id
    }
}

impl System for TestApp {
    fn get_current_time(&self) -> OffsetDateTime {
        self.current_time
    }
}

impl GetConfig for TestApp {
    fn get_jwt_signing_key(&self) -> &hmac::Hmac<sha2::Sha384> {
        &self.jwt_signing_key
    }
}

impl GetMemoryStore for TestApp {
    fn get_memory_store(&self) -> &Mutex<MemoryStore> {
        &self.store
    }
}

impl user::repo::DelegateUserRepo<Self> for TestApp {
    type Target = MemoryRepo;
}

impl profile::repo::DelegateProfileRepo<Self> for TestApp {
    type Target = MemoryRepo;
}

#[entrait]
pub trait GetMemoryStore {
    fn get_memory_store(&self) -> &Mutex<MemoryStore>;
}

#[derive(Default, Debug)]
pub struct MemoryStore {
    users: Vec<(User, Credentials)>,
    profiles: Vec<StoredProfile>,
}

#[derive(Debug)]
struct StoredProfile {
    user_id: UserId,
    handle: String,
    company: Option<String>,
    website: Option<String>,
    location: Option<String>,
    status: String,
    skills: Vec<String>,
    bio: Option<String>,
    githubusername: Option<String>,
    social: Social,
    experience: Vec<Experience>,
    education: Vec<Education>,
    date: Timestamptz,
}

impl StoredProfile {
    fn apply(&mut self, changes: &ProfileChanges<'_>) {
        fn set(target: &mut Option<String>, value: Option<&str>) {
            if let Some(value) = value {
                *target = Some(value.to_string());
            }
        }

        if let Some(handle) = changes.handle {
            self.handle = handle.to_string();
        }
        if let Some(status) = changes.status {
            self.status = status.to_string();
        }
        if let Some(skills) = &changes.skills {
            self.skills = skills.clone();
        }
        set(&mut self.company, changes.company);
        set(&mut self.website, changes.website);
        set(&mut self.location, changes.location);
        set(&mut self.bio, changes.bio);
        set(&mut self.githubusername, changes.githubusername);
        set(&mut self.social.youtube, changes.youtube);
        set(&mut self.social.twitter, changes.twitter);
        set(&mut self.social.facebook, changes.facebook);
        set(&mut self.social.linkedin, changes.linkedin);
        set(&mut self.social.instagram, changes.instagram);
    }
}

impl MemoryStore {
    fn user(&self, user_id: UserId) -> Option<&User> {
        self.users
            .iter()
            .map(|(user, _)| user)
            .find(|user| user.user_id == user_id)
    }

    fn profile_mut(&mut self, user_id: UserId) -> Option<&mut StoredProfile> {
        self.profiles.iter_mut().find(|p| p.user_id == user_id)
    }

    fn check_handle(&self, user_id: UserId, handle: Option<&str>) -> DcResult<()> {
        match handle {
            Some(handle)
                if self
                    .profiles
                    .iter()
                    .any(|p| p.handle == handle && p.user_id != user_id) =>
            {
                Err(DcError::HandleTaken)
            }
            _ => Ok(()),
        }
    }

    fn to_profile(&self, stored: &StoredProfile) -> Option<Profile> {
        let user = self.user(stored.user_id)?;
        Some(Profile {
            user: ProfileOwner {
                id: user.user_id,
                name: user.name.clone(),
                avatar: user.avatar.clone(),
            },
            handle: stored.handle.clone(),
            company: stored.company.clone(),
            website: stored.website.clone(),
            location: stored.location.clone(),
            status: stored.status.clone(),
            skills: stored.skills.clone(),
            bio: stored.bio.clone(),
            githubusername: stored.githubusername.clone(),
            social: stored.social.clone(),
            experience: stored.experience.clone(),
            education: stored.education.clone(),
            date: stored.date,
        })
    }
}

fn lock(store: &Mutex<MemoryStore>) -> MutexGuard<'_, MemoryStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct MemoryRepo;

#[entrait]
impl UserRepoImpl for MemoryRepo {
    pub async fn insert_user(
        deps: &(impl GetMemoryStore + System),
        new_user: NewUserRecord<'_>,
    ) -> DcResult<User> {
        let mut store = lock(deps.get_memory_store());
        if store.users.iter().any(|(u, _)| u.email == new_user.email) {
            return Err(DcError::EmailTaken);
        }

        let user = User {
            user_id: UserId(Uuid::new_v4()),
            name: new_user.name.to_string(),
            email: new_user.email.to_string(),
            avatar: new_user.avatar.to_string(),
            date: Timestamptz(deps.get_current_time()),
        };
        store.users.push((
            user.clone(),
            Credentials {
                password_hash: new_user.password_hash,
            },
        ));

        Ok(user)
    }

    pub async fn find_user_credentials_by_id(
        deps: &impl GetMemoryStore,
        user_id: UserId,
    ) -> DcResult<Option<(User, Credentials)>> {
        Ok(lock(deps.get_memory_store())
            .users
            .iter()
            .find(|(user, _)| user.user_id == user_id)
            .cloned())
    }

    pub async fn find_user_credentials_by_email(
        deps: &impl GetMemoryStore,
        email: &str,
    ) -> DcResult<Option<(User, Credentials)>> {
        Ok(lock(deps.get_memory_store())
            .users
            .iter()
            .find(|(user, _)| user.email == email)
            .cloned())
    }

    pub async fn delete_user(deps: &impl GetMemoryStore, user_id: UserId) -> DcResult<()> {
        let mut store = lock(deps.get_memory_store());
        store.users.retain(|(user, _)| user.user_id != user_id);
        store.profiles.retain(|p| p.user_id != user_id);
        Ok(())
    }
}

#[entrait]
impl ProfileRepoImpl for MemoryRepo {
    pub async fn find_profile(
        deps: &impl GetMemoryStore,
        key: ProfileKey<'_>,
    ) -> DcResult<Option<Profile>> {
        let store = lock(deps.get_memory_store());
        Ok(store
            .profiles
            .iter()
            .find(|p| match key {
                ProfileKey::User(user_id) => p.user_id == user_id,
                ProfileKey::Handle(handle) => p.handle == handle,
            })
            .and_then(|p| store.to_profile(p)))
    }

    pub async fn list_profiles(deps: &impl GetMemoryStore) -> DcResult<Vec<Profile>> {
        let store = lock(deps.get_memory_store());
        Ok(store
            .profiles
            .iter()
            .filter_map(|p| store.to_profile(p))
            .collect())
    }

    pub async fn update_profile(
        deps: &impl GetMemoryStore,
        user_id: UserId,
        changes: &ProfileChanges<'_>,
    ) -> DcResult<bool> {
        let mut store = lock(deps.get_memory_store());
        store.check_handle(user_id, changes.handle)?;

        match store.profile_mut(user_id) {
            Some(profile) => {
                profile.apply(changes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn insert_profile(
        deps: &(impl GetMemoryStore + System),
        user_id: UserId,
        changes: &ProfileChanges<'_>,
    ) -> DcResult<bool> {
        let mut store = lock(deps.get_memory_store());
        if store.profile_mut(user_id).is_some() {
            return Ok(false);
        }
        if store.user(user_id).is_none() {
            return Err(DcError::CurrentUserDoesNotExist);
        }
        store.check_handle(user_id, changes.handle)?;

        let mut profile = StoredProfile {
            user_id,
            handle: String::new(),
            company: None,
            website: None,
            location: None,
            status: String::new(),
            skills: vec![],
            bio: None,
            githubusername: None,
            social: Social::default(),
            experience: vec![],
            education: vec![],
            date: Timestamptz(deps.get_current_time()),
        };
        profile.apply(changes);
        store.profiles.push(profile);

        Ok(true)
    }

    pub async fn delete_profile(deps: &impl GetMemoryStore, user_id: UserId) -> DcResult<()> {
        lock(deps.get_memory_store())
            .profiles
            .retain(|p| p.user_id != user_id);
        Ok(())
    }

    pub async fn insert_experience(
        deps: &impl GetMemoryStore,
        user_id: UserId,
        experience: NewExperience<'_>,
    ) -> DcResult<()> {
        let mut store = lock(deps.get_memory_store());
        let profile = store.profile_mut(user_id).ok_or(DcError::ProfileNotFound)?;

        profile.experience.insert(
            0,
            Experience {
                id: Uuid::new_v4(),
                title: experience.title.to_string(),
                company: experience.company.to_string(),
                location: experience.location.map(str::to_string),
                from: experience.from,
                to: experience.to,
                current: experience.current,
                description: experience.description.map(str::to_string),
            },
        );
        Ok(())
    }

    pub async fn delete_experience(
        deps: &impl GetMemoryStore,
        user_id: UserId,
        experience_id: Uuid,
    ) -> DcResult<bool> {
        let mut store = lock(deps.get_memory_store());
        let Some(profile) = store.profile_mut(user_id) else {
            return Ok(false);
        };

        let before = profile.experience.len();
        profile.experience.retain(|e| e.id != experience_id);
        Ok(profile.experience.len() != before)
    }

    pub async fn insert_education(
        deps: &impl GetMemoryStore,
        user_id: UserId,
        education: NewEducation<'_>,
    ) -> DcResult<()> {
        let mut store = lock(deps.get_memory_store());
        let profile = store.profile_mut(user_id).ok_or(DcError::ProfileNotFound)?;

        profile.education.insert(
            0,
            Education {
                id: Uuid::new_v4(),
                school: education.school.to_string(),
                degree: education.degree.to_string(),
                fieldofstudy: education.fieldofstudy.to_string(),
                from: education.from,
                to: education.to,
                current: education.current,
                description: education.description.map(str::to_string),
            },
        );
        Ok(())
    }

    pub async fn delete_education(
        deps: &impl GetMemoryStore,
        user_id: UserId,
        education_id: Uuid,
    ) -> DcResult<bool> {
        let mut store = lock(deps.get_memory_store());
        let Some(profile) = store.profile_mut(user_id) else {
            return Ok(false);
        };

        let before = profile.education.len();
        profile.education.retain(|e| e.id != education_id);
        Ok(profile.education.len() != before)
    }
}
