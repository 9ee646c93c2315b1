//! UserRepository - accounts, profiles and roles

use super::{Create, Delete, Read, ReadMany};
use crate::dtos::{CreateUserDTO, UpdateProfileDTO};
use crate::entities::{User, UserRole};
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

pub struct UserRepository {
    connection_pool: SqlitePool,
}

impl UserRepository {
    pub fn new(connection_pool: SqlitePool) -> UserRepository {
        Self { connection_pool }
    }

    /// Usernames are unique
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.connection_pool)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Users whose username starts with `prefix`, at most 10
    #[instrument(skip(self))]
    pub async fn search_by_username_prefix(&self, prefix: &str) -> Result<Vec<User>, Error> {
        let escaped = prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username LIKE ? ESCAPE '\\' ORDER BY username LIMIT 10",
        )
        .bind(format!("{}%", escaped))
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Only `team_role`, `bio` and `avatar` are writable from the profile page
    #[instrument(skip(self, data))]
    pub async fn update_profile(&self, id: i64, data: &UpdateProfileDTO) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET team_role = COALESCE(?, team_role),
                bio = COALESCE(?, bio),
                avatar = COALESCE(?, avatar)
            WHERE user_id = ?
            RETURNING *
            "#,
        )
        .bind(&data.team_role)
        .bind(&data.bio)
        .bind(&data.avatar)
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), Error> {
        sqlx::query("UPDATE users SET password = ? WHERE user_id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }

    pub async fn update_role(&self, id: i64, role: UserRole) -> Result<User, Error> {
        sqlx::query_as::<_, User>("UPDATE users SET role = ? WHERE user_id = ? RETURNING *")
            .bind(role)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await?
            .ok_or(Error::RowNotFound)
    }

    pub async fn touch_last_login(&self, id: i64) -> Result<(), Error> {
        sqlx::query("UPDATE users SET last_login = ? WHERE user_id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    /// `data.password` must already be hashed
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password)
        .bind(UserRole::User)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<User, i64> for UserRepository {
    async fn read(&self, id: &i64) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl ReadMany<User, i64> for UserRepository {
    async fn read_many(&self, ids: &[i64]) -> Result<Vec<User>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM users WHERE user_id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY username");
        builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Delete<i64> for UserRepository {
    /// Soft delete: the row stays so authored content keeps its author id,
    /// but the account is anonymised and can no longer log in.
    async fn delete(&self, user_id: &i64) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = 'deleted-user-' || user_id,
                email = 'deleted-' || user_id || '@invalid',
                password = '',
                team_role = NULL,
                bio = NULL,
                avatar = NULL
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .execute(&self.connection_pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn prefix_search_matches_start_only(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);
        let found = repo.search_by_username_prefix("al").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "alice");

        assert!(repo.search_by_username_prefix("lice").await?.is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn soft_delete_anonymises_account(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);
        assert!(repo.delete(&2).await?);

        let user = repo.read(&2).await?.expect("row is kept");
        assert_eq!(user.username, "deleted-user-2");
        assert_eq!(user.email, "deleted-2@invalid");
        assert!(user.password.is_empty());
        assert!(!user.verify_password(""));
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn read_many_skips_unknown_ids(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = UserRepository::new(pool);
        let users = repo.read_many(&[3, 1, 99]).await?;
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "charlie"]);
        Ok(())
    }
}
