use devconnector_domain::error::DcError;

use anyhow::Context;
use entrait::*;
use sqlx::PgPool;

pub mod profile;
pub mod user;

pub use profile::PgProfileRepo;
pub use user::PgUserRepo;

#[derive(Clone, Debug)]
pub struct Db {
    pub pg_pool: PgPool,
}

impl Db {
    pub async fn init(url: &str) -> anyhow::Result<Self> {
        let pg_pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(50)
            .connect(url)
            .await
            .context("could not connect to database_url")?;

        sqlx::migrate!("../migrations").run(&pg_pool).await?;

        tracing::info!("database migrated");

        Ok(Db { pg_pool })
    }
}

#[entrait]
pub trait GetDb {
    fn get_db(&self) -> &Db;
}

impl GetDb for Db {
    fn get_db(&self) -> &Db {
        self
    }
}

/// Replaces a violation of the named constraint with a domain error.
trait OnConstraint<T> {
    fn on_constraint(self, constraint: &str, error: DcError) -> Result<T, DcError>;
}

impl<T, E> OnConstraint<T> for Result<T, E>
where
    E: Into<DcError>,
{
    fn on_constraint(self, constraint: &str, error: DcError) -> Result<T, DcError> {
        self.map_err(|e| {
            let e = e.into();
            if violated_constraint(&e) == Some(constraint) {
                error
            } else {
                e
            }
        })
    }
}

fn violated_constraint(error: &DcError) -> Option<&str> {
    match error {
        DcError::Sqlx(sqlx::Error::Database(db_error)) => db_error.constraint(),
        _ => None,
    }
}

#[cfg(test)]
impl devconnector_domain::user::repo::DelegateUserRepo<Self> for Db {
    type Target = PgUserRepo;
}

#[cfg(test)]
impl devconnector_domain::profile::repo::DelegateProfileRepo<Self> for Db {
    type Target = PgProfileRepo;
}

/// Each test thread gets its own freshly migrated database on the server
/// named by `DATABASE_URL`.
#[cfg(test)]
async fn create_test_db() -> entrait::Impl<Db> {
    use sqlx::Connection;

    let test_name = std::thread::current()
        .name()
        .unwrap_or("unnamed")
        .to_string();
    let db_name = scratch_db_name(&test_name);

    let mut url = server_url();
    let mut admin = sqlx::PgConnection::connect(url.as_str())
        .await
        .expect("DATABASE_URL server should accept connections");

    for statement in [
        format!(r#"DROP DATABASE IF EXISTS "{db_name}""#),
        format!(r#"CREATE DATABASE "{db_name}""#),
    ] {
        sqlx::query(&statement)
            .execute(&mut admin)
            .await
            .unwrap_or_else(|e| panic!("{statement}: {e}"));
    }
    url.set_path(&db_name);

    let db = Db::init(url.as_str())
        .await
        .expect("scratch database should migrate");

    entrait::Impl::new(db)
}

/// Postgres identifiers are capped at 63 bytes, so the test name is hashed.
#[cfg(test)]
fn scratch_db_name(test_name: &str) -> String {
    use sha2::Digest;

    let digest = sha2::Sha256::digest(test_name.as_bytes());
    format!("devconnector_test_{}", &hex::encode(digest)[..20])
}

#[cfg(test)]
fn server_url() -> url::Url {
    dotenv::dotenv().ok();

    let mut url: url::Url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set")
        .parse()
        .expect("DATABASE_URL should be a url");
    url.set_path("");
    url
}
