use crate::errors::AppError;
use crate::helper;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const TRANSFER_ENDPOINT: &str = "/cavos/transfer";
pub const BALANCE_ENDPOINT: &str = "/cavos/balance";

/// Active wallet account. Signing and key custody live behind the
/// implementation; callers only see addresses and transfer results.
pub trait WalletSession: Send + Sync {
    fn address(&self) -> &str;

    /// `None` until the account is authenticated.
    fn email(&self) -> Option<&str>;

    fn execute_transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, AppError>;
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub network: String,
    pub from_address: String,
    pub to_address: String,
    pub token_address: String,
    pub amount: f64,
    pub decimals: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TransferReceipt {
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// `{ success, message, data?, errors? }` envelope of the wallet backend.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> Result<T, AppError> {
        if !self.success {
            let mut message = self.message;
            if !self.errors.is_empty() {
                message = format!("{} ({})", message, self.errors.join(", "));
            }
            return Err(AppError::Transfer(message));
        }
        self.data
            .ok_or_else(|| AppError::NotFound("Response data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferData {
    #[serde(default)]
    transaction_result: Value,
}

/// Wallet session backed by the wallet REST backend.
pub struct ApiWallet {
    base_url: String,
    address: String,
    email: Option<String>,
    client: Client,
}

impl ApiWallet {
    pub fn new(
        base_url: &str,
        address: &str,
        email: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            address: address.to_string(),
            email: email.map(str::to_string),
            client: helper::build_http_client(timeout)?,
        })
    }
}

impl WalletSession for ApiWallet {
    fn address(&self) -> &str {
        &self.address
    }

    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn execute_transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, AppError> {
        debug!(to = %request.to_address, amount = request.amount, "executing transfer");
        let response = self
            .client
            .post(format!("{}{}", self.base_url, TRANSFER_ENDPOINT))
            .json(request)
            .send()?;

        let envelope: ApiResponse<TransferData> = helper::read_json_response(response)?;
        let data = envelope.into_data()?;

        let result = data.transaction_result;
        Ok(TransferReceipt {
            transaction_hash: result
                .get("transaction_hash")
                .and_then(Value::as_str)
                .map(str::to_string),
            status: result.get("status").and_then(Value::as_str).map(str::to_string),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceQuery<'a> {
    wallet_address: &'a str,
    token_address: &'a str,
    decimals: String,
}

#[derive(Debug, Deserialize)]
struct BalanceData {
    balance: Value,
}

pub struct BalanceClient {
    base_url: String,
    client: Client,
}

impl BalanceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: helper::build_http_client(timeout)?,
        })
    }

    pub fn fetch(
        &self,
        wallet_address: &str,
        token_address: &str,
        decimals: u32,
    ) -> Result<f64, AppError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, BALANCE_ENDPOINT))
            .json(&BalanceQuery {
                wallet_address,
                token_address,
                decimals: decimals.to_string(),
            })
            .send()?;

        let envelope: ApiResponse<BalanceData> = helper::read_json_response(response)?;
        let balance = envelope.into_data()?.balance;

        // The backend sends the balance as a decimal string
        let parsed = match &balance {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        parsed.ok_or_else(|| AppError::Validation(format!("Unreadable balance: {}", balance)))
    }
}
