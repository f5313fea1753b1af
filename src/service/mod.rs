pub mod cipher;
pub mod controller;
pub mod credential_checker;
pub mod memory_store;
pub mod usage;
pub mod vault_actor;
