use super::*;

use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::sync::Mutex;

/// Key-value entries kept as one JSON object on disk.
pub struct JsonFileStore {
    pub path: String,
    // Serializes read-modify-write cycles within the process.
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: &str) -> Result<Self, AppError> {
        create_file_parent(path)?;

        Ok(Self {
            path: path.to_string(),
            guard: Mutex::new(()),
        })
    }

    fn read_entries(&self) -> Result<Map<String, Value>, AppError> {
        if !fs::exists(Path::new(&self.path))? {
            return Ok(Map::new());
        }

        let mut file = OpenOptions::new().read(true).open(&self.path)?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;

        // serde_json will give an error if data is empty
        if data.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&data)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(AppError::Validation(
                "Invalid cache file: expected a JSON object".to_string(),
            )),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let _guard = self.guard.lock()?;
        let entries = self.read_entries()?;

        Ok(entries.get(key).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            // Entries written by hand may hold raw JSON instead of a string
            other => Some(other.to_string()),
        }))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let _guard = self.guard.lock()?;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), Value::String(value.to_string()));

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;

        let data = serde_json::to_string_pretty(&entries)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }
}
