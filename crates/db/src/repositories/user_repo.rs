//! Repository for the `users` table.

use lectern_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "id, email, display_name, role, created_at, updated_at";

/// Lookup and creation of platform users.
pub struct UserRepo;

impl UserRepo {
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, display_name, role) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
