use entrait::entrait_export as entrait;

use crate::error::DcResult;
use crate::timestamp::Timestamptz;
use crate::user::password::PasswordHash;
use crate::UserId;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub date: Timestamptz,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credentials {
    pub password_hash: PasswordHash,
}

#[derive(Debug)]
pub struct NewUserRecord<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub avatar: &'a str,
    pub password_hash: PasswordHash,
}

#[entrait(UserRepoImpl, delegate_by = DelegateUserRepo)]
pub trait UserRepo {
    /// Fails with `EmailTaken` when the email is registered already.
    async fn insert_user(&self, new_user: NewUserRecord<'_>) -> DcResult<User>;

    async fn find_user_credentials_by_id(
        &self,
        user_id: UserId,
    ) -> DcResult<Option<(User, Credentials)>>;

    async fn find_user_credentials_by_email(
        &self,
        email: &str,
    ) -> DcResult<Option<(User, Credentials)>>;

    /// Deleting a user that does not exist is not an error.
    async fn delete_user(&self, user_id: UserId) -> DcResult<()>;
}
