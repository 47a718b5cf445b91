use crate::errors::AppError;
use dotenv::dotenv;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::env;
use std::time::Duration;

pub fn get_env_value_by_key(key: &str) -> Result<String, AppError> {
    dotenv().ok();

    env::var(key).map_err(|_| AppError::NotFound(format!("{} in env", key)))
}

pub fn build_http_client(timeout: Duration) -> Result<Client, AppError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Turns a response into its JSON body, or into `AppError::Server` carrying
/// the backend's `message`/`error` text when the status is not a success.
pub fn read_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    let body = response.text()?;

    if !status.is_success() {
        return Err(AppError::Server {
            status: status.as_u16(),
            message: error_message_from_body(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string()),
        });
    }

    Ok(serde_json::from_str(&body)?)
}

pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Backends answer either with the payload itself or wrapped as
/// `{ "<key>": payload }` or `{ "data": payload }`.
pub fn unwrap_payload(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(inner) = map.remove(key) {
                inner
            } else if let Some(inner) = map.remove("data") {
                inner
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_known_envelopes() {
        assert_eq!(unwrap_payload(json!([1, 2]), "contacts"), json!([1, 2]));
        assert_eq!(unwrap_payload(json!({"contacts": [1]}), "contacts"), json!([1]));
        assert_eq!(unwrap_payload(json!({"success": true, "data": [2]}), "contacts"), json!([2]));
        assert_eq!(unwrap_payload(json!({"id": "x"}), "contact"), json!({"id": "x"}));
    }

    #[test]
    fn picks_message_then_error() {
        assert_eq!(
            error_message_from_body(r#"{"success":false,"message":"Invalid address"}"#).as_deref(),
            Some("Invalid address")
        );
        assert_eq!(
            error_message_from_body(r#"{"error":"Contact not found"}"#).as_deref(),
            Some("Contact not found")
        );
        assert_eq!(error_message_from_body("<html>"), None);
    }
}
