use super::*;
pub use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix marking a record the directory has not confirmed yet.
pub const PROVISIONAL_PREFIX: &str = "temp_";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(alias = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    pub wallet_address: String,

    #[serde(
        default = "default_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,

    // Only ever set locally; the directory never sends it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub provisional: bool,
}

/// Body of `POST /contacts`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub wallet_address: String,
    pub added_by: Option<String>,
}

pub enum ValidationReq {
    __,
}

impl ValidationReq {
    pub fn name_req() -> String {
        "Name must not be empty".to_string()
    }

    pub fn address_req() -> String {
        "Wallet address must start with 0x followed by 40 to 65 hexadecimal characters"
            .to_string()
    }

    pub fn email_req() -> String {
        "Email can be empty, or must be a valid email. Must not exceed 254 characters".to_string()
    }
}

impl NewContact {
    /// Trims every field and drops an empty email.
    pub fn new(name: &str, email: Option<&str>, wallet_address: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            wallet_address: wallet_address.trim().to_string(),
            added_by: None,
        }
    }

    pub fn validate_name(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn validate_address(&self) -> Result<bool, AppError> {
        // 0x prefix, then 40 (EVM) up to 65 (Starknet felt) hex digits
        let re = Regex::new(r"^0x[0-9a-fA-F]{40,65}$")?;
        Ok(re.is_match(&self.wallet_address))
    }

    pub fn validate_email(&self) -> Result<bool, AppError> {
        let Some(email) = &self.email else {
            return Ok(true);
        };
        let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?;
        Ok(re.is_match(email) && email.len() <= 254)
    }

    /// Runs every client-side check. The address format check only applies
    /// when `check_address` is set; an empty address is always rejected.
    pub fn validate(&self, check_address: bool) -> Result<(), AppError> {
        if !self.validate_name() {
            return Err(AppError::Validation(ValidationReq::name_req()));
        }

        if self.wallet_address.is_empty() {
            return Err(AppError::Validation("Wallet address is required".to_string()));
        }

        if check_address && !self.validate_address()? {
            return Err(AppError::Validation(ValidationReq::address_req()));
        }

        if !self.validate_email()? {
            return Err(AppError::Validation(ValidationReq::email_req()));
        }
        Ok(())
    }

    /// Local stand-in used while the directory is unreachable.
    pub fn into_provisional(self) -> Contact {
        Contact {
            id: format!("{}{}", PROVISIONAL_PREFIX, Uuid::new_v4()),
            name: self.name,
            email: self.email,
            wallet_address: self.wallet_address,
            created_at: Utc::now(),
            added_by: self.added_by,
            provisional: true,
        }
    }
}

impl Contact {
    pub fn is_provisional(&self) -> bool {
        self.provisional || self.id.starts_with(PROVISIONAL_PREFIX)
    }

    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.name.to_lowercase().contains(needle_lowercase)
            || self
                .email
                .as_ref()
                .is_some_and(|e| e.to_lowercase().contains(needle_lowercase))
    }

    pub fn to_new_contact(&self) -> NewContact {
        NewContact {
            name: self.name.clone(),
            email: self.email.clone(),
            wallet_address: self.wallet_address.clone(),
            added_by: self.added_by.clone(),
        }
    }
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        None => Ok(Utc::now()),
    }
}
