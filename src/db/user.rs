use super::DBClient;
use crate::models::User;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, phone, role, avatar, password, created_at, updated_at";

/// User database operations trait
pub trait UserExt {
    /// Get single user by ID or email.
    /// Returns Option - Some(user) if found, None if not found
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Create new user with a hashed password; role defaults to 'user'
    async fn save_user(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        password: &str,
    ) -> Result<User, sqlx::Error>;

    /// Replace the mutable profile fields of a user
    async fn update_user(
        &self,
        user_id: Uuid,
        email: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<User, sqlx::Error>;

    /// Delete user by ID; cascades to their advertisements and reviews
    async fn delete_user(&self, user_id: Uuid) -> Result<(), sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
            user = sqlx::query_as::<_, User>(&query)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
            user = sqlx::query_as::<_, User>(&query)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn save_user(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        password: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (email, first_name, last_name, phone, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(first_name)
            .bind(last_name)
            .bind(phone)
            .bind(password)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        email: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE users
            SET email = $1, first_name = $2, last_name = $3, phone = $4, avatar = $5, updated_at = Now()
            WHERE id = $6
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(first_name)
            .bind(last_name)
            .bind(phone)
            .bind(avatar)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
