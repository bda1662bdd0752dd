pub mod vault_client;
