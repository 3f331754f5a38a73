//! User repository for async PostgreSQL operations.
//!
//! Provides lookup and save for the users table using diesel_async.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::pg::Pg;
use diesel::query_builder::{QueryFragment, QueryId};
use diesel::sql_types::BigInt;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use jiff_diesel::ToDiesel;

use super::UserRepository;
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{NewUser, User, UserId};
use crate::schema::users;

/// Row shape of the users table.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UserRow {
    id: i64,
    name: String,
    email: Option<String>,
    created_at: jiff_diesel::Timestamp,
    updated_at: jiff_diesel::Timestamp,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at.to_jiff(),
            updated_at: row.updated_at.to_jiff(),
        }
    }
}

/// Insert shape used when the database assigns the id.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
struct NewUserRow<'a> {
    name: &'a str,
    email: Option<&'a str>,
}

/// Insert shape used when the caller pins the id.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
struct PinnedUserRow<'a> {
    id: i64,
    name: &'a str,
    email: Option<&'a str>,
    updated_at: jiff_diesel::Timestamp,
}

/// User repository holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: AsyncDbPool,
}

impl PgUserRepository {
    /// Creates a new PgUserRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, user: &NewUser) -> AppResult<User> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users::table)
            .values(&NewUserRow {
                name: &user.name,
                email: user.email.as_deref(),
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(User::from)
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "insert user"))
    }

    async fn upsert(&self, id: UserId, user: &NewUser) -> AppResult<User> {
        let mut conn = self.pool.get().await?;

        let row = conn
            .transaction(|conn| {
                async move {
                    // Plain inserts wait here before drawing from the sequence.
                    diesel::sql_query(LOCK_USERS_FOR_PINNED_SAVE)
                        .execute(conn)
                        .await?;

                    let row = diesel::insert_into(users::table)
                        .values(&PinnedUserRow {
                            id,
                            name: &user.name,
                            email: user.email.as_deref(),
                            updated_at: jiff::Timestamp::now().to_diesel(),
                        })
                        .on_conflict(users::id)
                        .do_update()
                        .set((
                            users::name.eq(excluded(users::name)),
                            users::email.eq(excluded(users::email)),
                            users::updated_at.eq(excluded(users::updated_at)),
                        ))
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await?;

                    advance_sequence_past(id).execute(conn).await?;
                    Ok::<UserRow, diesel::result::Error>(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "upsert user"))?;

        Ok(User::from(row))
    }
}

const LOCK_USERS_FOR_PINNED_SAVE: &str = "LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE";

/// Moves `users_id_seq` up to `id` when it is behind. Never moves it back.
fn advance_sequence_past(id: UserId) -> impl QueryFragment<Pg> + QueryId + Send + 'static {
    diesel::sql_query(
        "SELECT setval('users_id_seq', $1) FROM users_id_seq WHERE $1 >= last_value",
    )
    .bind::<BigInt, _>(id)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::id.eq(user_id))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(User::from))
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find user"))
    }

    async fn save(&self, user: NewUser) -> AppResult<User> {
        let saved = match user.id {
            Some(id) => self.upsert(id, &user).await?,
            None => self.insert(&user).await?,
        };
        tracing::debug!(user_id = saved.id, "User saved");
        Ok(saved)
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }
}
