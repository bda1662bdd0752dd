use crate::db::models::{NewPassword, PasswordChanges, PasswordRecord, now};
use crate::db::passwords::PasswordStorage;
use crate::error::VaultError;
use tracing::{debug, info};
use uuid::Uuid;

/// Owner-scoped CRUD over the credential store. The owner always comes from
/// the authenticated identity, never from the request body.
#[derive(Clone)]
pub struct VaultOps {
    storage: PasswordStorage,
}

impl VaultOps {
    pub fn new(storage: PasswordStorage) -> Self {
        Self { storage }
    }

    pub async fn list(
        &self,
        owner: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<PasswordRecord>, VaultError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let entries = self.storage.list_by_owner(owner, search).await?;
        debug!(account_id = %owner, count = entries.len(), "listed password entries");
        Ok(entries)
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<PasswordRecord, VaultError> {
        self.storage
            .find_owned(owner, id)
            .await?
            .ok_or(VaultError::NotFound)
    }

    pub async fn create(
        &self,
        owner: Uuid,
        fields: NewPassword,
    ) -> Result<PasswordRecord, VaultError> {
        let fields = NewPassword {
            website: required("website", fields.website)?,
            username: required("username", fields.username)?,
            secret: required("secret", fields.secret)?,
        };
        let record = PasswordRecord::new(owner, fields);
        self.storage.insert(&record).await?;
        info!(account_id = %owner, entry_id = %record.id, "password entry created");
        Ok(record)
    }

    /// Missing and foreign records both yield `NotFound`.
    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: PasswordChanges,
    ) -> Result<PasswordRecord, VaultError> {
        let changes = PasswordChanges {
            website: changes.website.map(|v| required("website", v)).transpose()?,
            username: changes.username.map(|v| required("username", v)).transpose()?,
            secret: changes.secret.map(|v| required("secret", v)).transpose()?,
        };
        let updated = self
            .storage
            .update_owned(owner, id, &changes, now())
            .await?
            .ok_or(VaultError::NotFound)?;
        info!(account_id = %owner, entry_id = %id, "password entry updated");
        Ok(updated)
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), VaultError> {
        if !self.storage.delete_owned(owner, id).await? {
            return Err(VaultError::NotFound);
        }
        info!(account_id = %owner, entry_id = %id, "password entry deleted");
        Ok(())
    }
}

fn required(field: &str, value: String) -> Result<String, VaultError> {
    if value.trim().is_empty() {
        return Err(VaultError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::accounts::AccountStorage;
    use crate::db::models::Account;
    use crate::db::sqlite::memory_pool;

    async fn setup() -> (VaultOps, Uuid, Uuid) {
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
        (VaultOps::new(PasswordStorage::new(pool)), ids[0], ids[1])
    }

    fn fields(website: &str, username: &str, secret: &str) -> NewPassword {
        NewPassword {
            website: website.to_string(),
            username: username.to_string(),
            secret: secret.to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let (ops, alice, _) = setup().await;
        let created = ops
            .create(alice, fields("example.com", "alice_e", "s3cr3t"))
            .await
            .unwrap();
        assert_eq!(created.owner_id, alice);

        let listed = ops.list(alice, None).await.unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn create_rejects_empty_fields() {
        let (ops, alice, _) = setup().await;
        for f in [
            fields("", "u", "s"),
            fields("w", " ", "s"),
            fields("w", "u", ""),
        ] {
            let err = ops.create(alice, f).await.unwrap_err();
            assert!(matches!(err, VaultError::InvalidInput(_)));
        }
        assert!(ops.list(alice, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_owner_gets_not_found_everywhere() {
        let (ops, alice, bob) = setup().await;
        let bobs = ops.create(bob, fields("bob.example", "b", "pw")).await.unwrap();

        assert!(ops.list(alice, None).await.unwrap().is_empty());
        assert!(matches!(ops.get(alice, bobs.id).await, Err(VaultError::NotFound)));
        let changes = PasswordChanges {
            website: Some("hijacked".to_string()),
            ..PasswordChanges::default()
        };
        assert!(matches!(
            ops.update(alice, bobs.id, changes).await,
            Err(VaultError::NotFound)
        ));
        assert!(matches!(ops.delete(alice, bobs.id).await, Err(VaultError::NotFound)));

        assert_eq!(ops.get(bob, bobs.id).await.unwrap(), bobs);
    }

    #[tokio::test]
    async fn update_rejects_blank_replacement() {
        let (ops, alice, _) = setup().await;
        let rec = ops.create(alice, fields("w", "u", "s")).await.unwrap();
        let changes = PasswordChanges {
            secret: Some("   ".to_string()),
            ..PasswordChanges::default()
        };
        let err = ops.update(alice, rec.id, changes).await.unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let (ops, alice, _) = setup().await;
        let rec = ops.create(alice, fields("w", "u", "s")).await.unwrap();
        let changes = PasswordChanges {
            username: Some("renamed".to_string()),
            ..PasswordChanges::default()
        };
        let updated = ops.update(alice, rec.id, changes).await.unwrap();
        assert_eq!(updated.username, "renamed");
        assert!(updated.updated_at >= rec.updated_at);
        assert_eq!(updated.created_at, rec.created_at);
    }

    #[tokio::test]
    async fn delete_is_not_found_the_second_time() {
        let (ops, alice, _) = setup().await;
        let rec = ops.create(alice, fields("w", "u", "s")).await.unwrap();
        ops.delete(alice, rec.id).await.unwrap();
        assert!(matches!(ops.delete(alice, rec.id).await, Err(VaultError::NotFound)));
        assert!(ops.list(alice, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_search_lists_everything() {
        let (ops, alice, _) = setup().await;
        ops.create(alice, fields("a.com", "u", "s")).await.unwrap();
        ops.create(alice, fields("b.com", "u", "s")).await.unwrap();
        assert_eq!(ops.list(alice, Some("  ")).await.unwrap().len(), 2);
        assert_eq!(ops.list(alice, Some("b.c")).await.unwrap().len(), 1);
    }
}
