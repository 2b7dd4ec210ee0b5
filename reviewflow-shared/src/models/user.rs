/// User model and database operations
///
/// Users are identified by an external string id and belong to at most one
/// team. They are never deleted; activity is toggled instead.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     user_id TEXT PRIMARY KEY,
///     username TEXT NOT NULL,
///     team_id BIGINT REFERENCES teams(id),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use reviewflow_shared::models::user::{User, UserFilter};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let active = User::list(&pool, &UserFilter::new().team(1).active(true)).await?;
/// println!("{} active members", active.len());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// A user that can author and review pull requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// External identifier (e.g. "u1")
    pub user_id: String,

    /// Display name
    pub username: String,

    /// Team the user belongs to, if any
    pub team_id: Option<i64>,

    /// Inactive users are never picked as reviewers
    pub is_active: bool,
}

/// Input for inserting or overwriting a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub user_id: String,
    pub username: String,
    pub team_id: Option<i64>,
    pub is_active: bool,
}

impl From<NewUser> for User {
    fn from(data: NewUser) -> Self {
        Self {
            user_id: data.user_id,
            username: data.username,
            team_id: data.team_id,
            is_active: data.is_active,
        }
    }
}

/// Optional filters for listing users
///
/// Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub team_id: Option<i64>,
    pub is_active: Option<bool>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn team(mut self, team_id: i64) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Checks the team and activity constraints
    pub fn matches(&self, user: &User) -> bool {
        if let Some(team_id) = self.team_id {
            if user.team_id != Some(team_id) {
                return false;
            }
        }
        if let Some(is_active) = self.is_active {
            if user.is_active != is_active {
                return false;
            }
        }
        true
    }
}

impl User {
    /// Finds a user by external ID
    ///
    /// # Returns
    ///
    /// The user if found, None otherwise
    pub async fn find_by_id(pool: &PgPool, user_id: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, team_id, is_active
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists users matching the filter, ordered by user ID
    pub async fn list(pool: &PgPool, filter: &UserFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT user_id, username, team_id, is_active FROM users WHERE TRUE",
        );

        if let Some(team_id) = filter.team_id {
            builder.push(" AND team_id = ").push_bind(team_id);
        }
        if let Some(is_active) = filter.is_active {
            builder.push(" AND is_active = ").push_bind(is_active);
        }

        builder.push(" ORDER BY user_id");

        builder.build_query_as::<User>().fetch_all(pool).await
    }

    /// Inserts a user or overwrites name, team and activity of an existing one
    ///
    /// Runs on a pool or inside an open transaction.
    pub async fn upsert<'e, E>(executor: E, data: NewUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, username, team_id, is_active)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                team_id = EXCLUDED.team_id,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            RETURNING user_id, username, team_id, is_active
            "#,
        )
        .bind(data.user_id)
        .bind(data.username)
        .bind(data.team_id)
        .bind(data.is_active)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Sets the activity flag
    ///
    /// # Returns
    ///
    /// The updated user if found, None if the user doesn't exist
    pub async fn set_active(
        pool: &PgPool,
        user_id: &str,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, username, team_id, is_active
            "#,
        )
        .bind(user_id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
    }

    /// Deactivates every active member of a team in one statement
    ///
    /// # Returns
    ///
    /// IDs of the users whose flag actually flipped
    pub async fn deactivate_active_in_team(
        pool: &PgPool,
        team_id: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            UPDATE users
            SET is_active = FALSE, updated_at = NOW()
            WHERE team_id = $1 AND is_active = TRUE
            RETURNING user_id
            "#,
        )
        .bind(team_id)
        .fetch_all(pool)
        .await
    }
}
