use crate::db::models::{
    PasswordChanges, PasswordRecord, from_db_timestamp, from_db_uuid, to_db_timestamp,
};
use crate::db::sqlite::SqlitePool;
use crate::error::VaultError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "id, owner_id, website, username, secret, created_at, updated_at";

/// Credential store. Every read and write is keyed on `(owner_id, id)`;
/// there is deliberately no unscoped lookup.
#[derive(Clone)]
pub struct PasswordStorage {
    pool: SqlitePool,
}

impl PasswordStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, rec: &PasswordRecord) -> Result<(), VaultError> {
        sqlx::query(
            r#"INSERT INTO passwords (
                id, owner_id, website, username, secret, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(rec.id.to_string())
        .bind(rec.owner_id.to_string())
        .bind(&rec.website)
        .bind(&rec.username)
        .bind(&rec.secret)
        .bind(to_db_timestamp(&rec.created_at))
        .bind(to_db_timestamp(&rec.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e
                && db.is_foreign_key_violation()
            {
                return VaultError::Unauthorized("account no longer exists");
            }
            VaultError::DatabaseError(e)
        })?;
        Ok(())
    }

    pub async fn find_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PasswordRecord>, VaultError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM passwords WHERE id = ? AND owner_id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_model).transpose()
    }

    /// Newest first. `search` is a case-insensitive substring match over
    /// `website` and `username`. SQLite's `LIKE` only folds ASCII, so the
    /// match runs here on the owner's rows with Unicode lowercasing.
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<PasswordRecord>, VaultError> {
        let sql = format!(
            r#"SELECT {SELECT_COLUMNS} FROM passwords
               WHERE owner_id = ?
               ORDER BY created_at DESC, rowid DESC"#
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        let records = rows
            .into_iter()
            .map(Self::row_to_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match search {
            Some(term) => {
                let needle = term.to_lowercase();
                records
                    .into_iter()
                    .filter(|rec| matches_search(rec, &needle))
                    .collect()
            }
            None => records,
        })
    }

    /// Apply `changes` in a single statement. `None` when no record with
    /// this id belongs to `owner_id`.
    pub async fn update_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &PasswordChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<PasswordRecord>, VaultError> {
        let sql = format!(
            r#"UPDATE passwords SET
                website = COALESCE(?, website),
                username = COALESCE(?, username),
                secret = COALESCE(?, secret),
                updated_at = ?
              WHERE id = ? AND owner_id = ?
              RETURNING {SELECT_COLUMNS}"#
        );
        let row = sqlx::query(&sql)
            .bind(changes.website.as_deref())
            .bind(changes.username.as_deref())
            .bind(changes.secret.as_deref())
            .bind(to_db_timestamp(&updated_at))
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_model).transpose()
    }

    /// Returns whether a row owned by `owner_id` was removed.
    pub async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<bool, VaultError> {
        let res = sqlx::query("DELETE FROM passwords WHERE id = ? AND owner_id = ?")
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    fn row_to_model(row: SqliteRow) -> Result<PasswordRecord, VaultError> {
        let id: String = row.try_get("id")?;
        let owner_id: String = row.try_get("owner_id")?;
        let website: String = row.try_get("website")?;
        let username: String = row.try_get("username")?;
        let secret: String = row.try_get("secret")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(PasswordRecord {
            id: from_db_uuid(&id)?,
            owner_id: from_db_uuid(&owner_id)?,
            website,
            username,
            secret,
            created_at: from_db_timestamp(&created_at)?,
            updated_at: from_db_timestamp(&updated_at)?,
        })
    }
}

fn matches_search(rec: &PasswordRecord, needle: &str) -> bool {
    rec.website.to_lowercase().contains(needle) || rec.username.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::accounts::AccountStorage;
    use crate::db::models::{Account, NewPassword, now};
    use crate::db::sqlite::memory_pool;
    use chrono::Duration;

    async fn setup() -> (PasswordStorage, Uuid, Uuid) {
        let pool = memory_pool().await;
        let accounts = AccountStorage::new(pool.clone());
        let mut ids = Vec::new();
        for name in ["alice", "bob"] {
            let acc = Account {
                id: Uuid::new_v4(),
                username: name.to_string(),
                password_hash: "x".to_string(),
                created_at: now(),
            };
            accounts.insert(&acc).await.unwrap();
            ids.push(acc.id);
        }
        (PasswordStorage::new(pool), ids[0], ids[1])
    }

    fn entry(owner: Uuid, website: &str) -> PasswordRecord {
        PasswordRecord::new(
            owner,
            NewPassword {
                website: website.to_string(),
                username: "login".to_string(),
                secret: "pw".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn list_is_owner_scoped_and_newest_first() {
        let (store, alice, bob) = setup().await;
        let mut older = entry(alice, "old.example");
        older.created_at -= Duration::minutes(5);
        store.insert(&older).await.unwrap();
        let newer = entry(alice, "new.example");
        store.insert(&newer).await.unwrap();
        store.insert(&entry(bob, "bob.example")).await.unwrap();

        let listed = store.list_by_owner(alice, None).await.unwrap();
        assert_eq!(listed, vec![newer, older]);
        assert_eq!(store.list_by_owner(bob, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_filters_case_insensitively_and_treats_wildcards_literally() {
        let (store, alice, _) = setup().await;
        store.insert(&entry(alice, "GitHub.com")).await.unwrap();
        store.insert(&entry(alice, "example.org")).await.unwrap();
        store.insert(&entry(alice, "100%_sure.net")).await.unwrap();

        let hits = store.list_by_owner(alice, Some("github")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].website, "GitHub.com");

        let hits = store.list_by_owner(alice, Some("%_")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].website, "100%_sure.net");
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let (store, alice, _) = setup().await;
        store.insert(&entry(alice, "Ämter.de")).await.unwrap();
        let mut by_login = entry(alice, "example.org");
        by_login.username = "ÉLODIE".to_string();
        store.insert(&by_login).await.unwrap();

        let hits = store.list_by_owner(alice, Some("ämter")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].website, "Ämter.de");

        let hits = store.list_by_owner(alice, Some("élodie")).await.unwrap();
        assert_eq!(hits, vec![by_login]);
    }

    #[tokio::test]
    async fn foreign_owner_cannot_read_update_or_delete() {
        let (store, alice, bob) = setup().await;
        let rec = entry(bob, "bob.example");
        store.insert(&rec).await.unwrap();

        assert!(store.find_owned(alice, rec.id).await.unwrap().is_none());
        let changes = PasswordChanges {
            secret: Some("stolen".to_string()),
            ..PasswordChanges::default()
        };
        assert!(store.update_owned(alice, rec.id, &changes, now()).await.unwrap().is_none());
        assert!(!store.delete_owned(alice, rec.id).await.unwrap());

        assert_eq!(store.find_owned(bob, rec.id).await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let (store, alice, _) = setup().await;
        let rec = entry(alice, "example.com");
        store.insert(&rec).await.unwrap();

        let later = rec.updated_at + Duration::seconds(3);
        let changes = PasswordChanges {
            secret: Some("rotated".to_string()),
            ..PasswordChanges::default()
        };
        let updated = store
            .update_owned(alice, rec.id, &changes, later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.secret, "rotated");
        assert_eq!(updated.website, rec.website);
        assert_eq!(updated.created_at, rec.created_at);
        assert_eq!(updated.updated_at, later);
    }

    #[tokio::test]
    async fn delete_twice_reports_missing() {
        let (store, alice, _) = setup().await;
        let rec = entry(alice, "example.com");
        store.insert(&rec).await.unwrap();
        assert!(store.delete_owned(alice, rec.id).await.unwrap());
        assert!(!store.delete_owned(alice, rec.id).await.unwrap());
    }

    #[tokio::test]
    async fn insert_for_unknown_owner_is_rejected() {
        let (store, _, _) = setup().await;
        let err = store.insert(&entry(Uuid::new_v4(), "x")).await.unwrap_err();
        assert!(matches!(err, VaultError::Unauthorized(_)));
    }
}
