use crate::db::models::{Account, from_db_timestamp, from_db_uuid, to_db_timestamp};
use crate::db::sqlite::SqlitePool;
use crate::error::VaultError;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// Identity store: one row per registered account.
#[derive(Clone)]
pub struct AccountStorage {
    pool: SqlitePool,
}

impl AccountStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new account. A taken username surfaces as `Conflict`,
    /// including when two registrations race past the existence check.
    pub async fn insert(&self, account: &Account) -> Result<(), VaultError> {
        sqlx::query(
            r#"INSERT INTO accounts (id, username, password_hash, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(account.id.to_string())
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(to_db_timestamp(&account.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e
                && db.is_unique_violation()
            {
                return VaultError::Conflict("Username already exists".to_string());
            }
            VaultError::DatabaseError(e)
        })?;
        Ok(())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, VaultError> {
        let row = sqlx::query(
            r#"SELECT id, username, password_hash, created_at
               FROM accounts WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_model).transpose()
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, VaultError> {
        let row = sqlx::query(
            r#"SELECT id, username, password_hash, created_at
               FROM accounts WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_model).transpose()
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, VaultError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0 > 0)
    }

    fn row_to_model(row: SqliteRow) -> Result<Account, VaultError> {
        let id: String = row.try_get("id")?;
        let username: String = row.try_get("username")?;
        let password_hash: String = row.try_get("password_hash")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Account {
            id: from_db_uuid(&id)?,
            username,
            password_hash,
            created_at: from_db_timestamp(&created_at)?,
        })
    }
}
