use super::*;

use crate::helper;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// REST client for the contact directory.
pub struct RemoteDirectory {
    pub base_url: String,
    client: Client,
}

impl RemoteDirectory {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        if !is_valid_url(base_url) {
            return Err(AppError::Config(format!("invalid directory url: {}", base_url)));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: helper::build_http_client(timeout)?,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/contacts/{id}` with the id encoded as a single path segment.
    fn contact_url(&self, id: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.endpoint("/contacts"))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("invalid directory url: {}", self.base_url)))?
            .push(id);
        Ok(url)
    }
}

impl ContactDirectory for RemoteDirectory {
    fn list(&self, owner_email: Option<&str>) -> Result<Vec<Contact>, AppError> {
        let mut request = self.client.get(self.endpoint("/contacts"));
        if let Some(email) = owner_email {
            request = request.query(&[("userEmail", email)]);
        }

        debug!(owner = ?owner_email, "fetching contact list");
        let value: Value = helper::read_json_response(request.send()?)?;
        let contacts: Vec<Contact> =
            serde_json::from_value(helper::unwrap_payload(value, "contacts"))?;
        Ok(contacts)
    }

    fn create(&self, contact: &NewContact) -> Result<Contact, AppError> {
        debug!(name = %contact.name, "creating contact");
        let response = self
            .client
            .post(self.endpoint("/contacts"))
            .json(contact)
            .send()?;

        let value: Value = helper::read_json_response(response)?;
        let created: Contact = serde_json::from_value(helper::unwrap_payload(value, "contact"))?;
        Ok(created)
    }

    fn delete(&self, id: &str) -> Result<(), AppError> {
        debug!(%id, "deleting contact");
        let response = self
            .client
            .delete(self.contact_url(id)?)
            .send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        Err(AppError::Server {
            status: status.as_u16(),
            message: helper::error_message_from_body(&body)
                .unwrap_or_else(|| "Delete failed".to_string()),
        })
    }

    fn transfer(&self, request: &DirectoryTransfer) -> Result<TransferOutcome, AppError> {
        debug!(contact = %request.contact_name, amount = request.amount, "directory transfer");
        let response = self
            .client
            .post(self.endpoint("/contacts/transfer"))
            .json(request)
            .send()?;

        let status = response.status();
        let body = response.text()?;

        // The transfer endpoint reports failures in the body, often with 4xx/5xx
        match serde_json::from_str::<TransferOutcome>(&body) {
            Ok(outcome) => Ok(outcome),
            Err(_) if !status.is_success() => Err(AppError::Server {
                status: status.as_u16(),
                message: helper::error_message_from_body(&body)
                    .unwrap_or_else(|| "Transfer failed".to_string()),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url).is_ok()
}
