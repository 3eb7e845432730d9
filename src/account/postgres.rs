//! Postgres-backed account store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;

use super::models::{NewUser, Permission, Player, User};
use super::repo::{CreateOutcome, UserRepo};

#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded schema migrations.
    ///
    /// # Errors
    /// Returns an error if a migration fails to apply.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .context("failed to run database migrations")
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        uid: row.get("uid"),
        email: row.get("email"),
        nickname: row.get("nickname"),
        password: row.get("password"),
        score: row.get("score"),
        permission: Permission::from_i16(row.get("permission")),
        verified: row.get("verified"),
        ip: row.get("ip"),
        register_at: row.get("register_at"),
    }
}

fn player_from_row(row: &PgRow) -> Player {
    Player {
        pid: row.get("pid"),
        uid: row.get("uid"),
        name: row.get("name"),
        tid_skin: row.get("tid_skin"),
        tid_cape: row.get("tid_cape"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn query_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_uid(&self, uid: i64) -> Result<Option<User>> {
        let query = "SELECT * FROM users WHERE uid = $1";
        let row = sqlx::query(query)
            .bind(uid)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup user by uid")?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        // Accounts without a bound email keep an empty string; never match those.
        let query = "SELECT * FROM users WHERE email = $1 AND email <> ''";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup user by email")?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_player(&self, name: &str) -> Result<Option<Player>> {
        let query = "SELECT * FROM players WHERE name = $1";
        let row = sqlx::query(query)
            .bind(name)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup player by name")?;
        Ok(row.as_ref().map(player_from_row))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<CreateOutcome<User>> {
        let query = r"
            INSERT INTO users (email, nickname, password, score, permission, verified, ip)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
        ";
        let row = sqlx::query(query)
            .bind(&new_user.email)
            .bind(&new_user.nickname)
            .bind(&new_user.password)
            .bind(new_user.score)
            .bind(new_user.permission.as_i16())
            .bind(new_user.verified)
            .bind(&new_user.ip)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match row {
            Ok(row) => Ok(CreateOutcome::Created(user_from_row(&row))),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn create_player(&self, uid: i64, name: &str) -> Result<CreateOutcome<Player>> {
        let query = r"
            INSERT INTO players (uid, name)
            VALUES ($1, $2)
            RETURNING *
        ";
        let row = sqlx::query(query)
            .bind(uid)
            .bind(name)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match row {
            Ok(row) => Ok(CreateOutcome::Created(player_from_row(&row))),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert player"),
        }
    }

    async fn registrations_from(&self, ip: &str) -> Result<i64> {
        let query = "SELECT COUNT(*) AS total FROM users WHERE ip = $1";
        let row = sqlx::query(query)
            .bind(ip)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to count registrations by address")?;
        Ok(row.get("total"))
    }

    async fn update_password(&self, uid: i64, password_hash: &str) -> Result<()> {
        let query = "UPDATE users SET password = $2 WHERE uid = $1";
        sqlx::query(query)
            .bind(uid)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update password hash")?;
        Ok(())
    }

    async fn set_verified(&self, uid: i64, verified: bool) -> Result<()> {
        let query = "UPDATE users SET verified = $2 WHERE uid = $1";
        sqlx::query(query)
            .bind(uid)
            .bind(verified)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update verified flag")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::is_unique_violation;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
