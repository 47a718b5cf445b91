pub mod cache;
pub mod file;
pub mod memory;
pub mod remote;

pub use cache::ContactCache;

use crate::prelude::{AppError, Contact, NewContact};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Durable string key-value entries. Implementations are shared between
/// threads, so writes go through `&self`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// The service of record for contacts.
pub trait ContactDirectory: Send + Sync {
    fn list(&self, owner_email: Option<&str>) -> Result<Vec<Contact>, AppError>;

    fn create(&self, contact: &NewContact) -> Result<Contact, AppError>;

    fn delete(&self, id: &str) -> Result<(), AppError>;

    /// Server-side transfer where the directory resolves the contact name.
    fn transfer(&self, request: &DirectoryTransfer) -> Result<TransferOutcome, AppError>;
}

/// Body of `POST /contacts/transfer`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryTransfer {
    pub contact_name: String,
    pub network: String,
    pub from_address: String,
    pub token_address: String,
    pub amount: f64,
    pub decimals: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TransferOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn create_file_parent(path: &str) -> Result<(), AppError> {
    let path = Path::new(path);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
