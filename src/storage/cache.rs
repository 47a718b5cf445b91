use super::*;

use serde_json::Value;
use std::sync::Arc;

pub const CONTACTS_KEY: &str = "wallet_contacts";

/// The persisted contact array, stored under one fixed key.
#[derive(Clone)]
pub struct ContactCache {
    store: Arc<dyn KeyValueStore>,
}

impl ContactCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn load(&self) -> Result<Vec<Contact>, AppError> {
        let Some(data) = self.store.get(CONTACTS_KEY)? else {
            return Ok(Vec::new());
        };

        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(&data)?;

        if value.is_array() {
            Ok(serde_json::from_value(value)?)
        } else if let Value::Object(entries) = value {
            // Older caches kept contacts keyed by id
            let mut contacts = Vec::with_capacity(entries.len());
            for (_, entry) in entries {
                contacts.push(serde_json::from_value::<Contact>(entry)?);
            }
            contacts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(contacts)
        } else {
            Err(AppError::Validation(
                "Invalid cached contacts: expected array or object".to_string(),
            ))
        }
    }

    pub fn save(&self, contacts: &[Contact]) -> Result<(), AppError> {
        let data = serde_json::to_string(contacts)?;
        self.store.set(CONTACTS_KEY, &data)
    }
}
