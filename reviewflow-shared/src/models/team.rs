/// Team model and database operations
///
/// A team is only a name and an identity. Members point at their team via
/// `users.team_id`; the team row does not hold a member list.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id BIGSERIAL PRIMARY KEY,
///     name TEXT NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::user::{NewUser, User};

/// A team of users that review each other's pull requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Numeric identity
    pub id: i64,

    /// Globally unique team name
    pub name: String,

    /// When the team was created
    pub created_at: DateTime<Utc>,
}

/// Member entry when creating a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl TeamMember {
    /// Upsert input placing this member in `team_id`
    pub fn into_new_user(self, team_id: i64) -> NewUser {
        NewUser {
            user_id: self.user_id,
            username: self.username,
            team_id: Some(team_id),
            is_active: self.is_active,
        }
    }
}

impl Team {
    /// Creates a team and upserts its members in one transaction
    ///
    /// Existing users are moved into the new team. Nothing is written if
    /// any statement fails.
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the name is taken
    pub async fn create_with_members(
        pool: &PgPool,
        name: &str,
        members: Vec<TeamMember>,
    ) -> Result<(Self, Vec<User>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        let mut stored = Vec::with_capacity(members.len());
        for member in members {
            stored.push(User::upsert(&mut *tx, member.into_new_user(team.id)).await?);
        }

        tx.commit().await?;
        Ok((team, stored))
    }

    /// Finds a team by its unique name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, created_at
            FROM teams
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Finds a team by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, created_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_into_new_user() {
        let member = TeamMember {
            user_id: "u1".to_string(),
            username: "Alice".to_string(),
            is_active: false,
        };

        let user = member.into_new_user(7);
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.username, "Alice");
        assert_eq!(user.team_id, Some(7));
        assert!(!user.is_active);
    }
}
