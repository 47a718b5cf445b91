pub mod agent;
pub mod book;
pub mod command;
pub mod contact;

pub use crate::errors::AppError;
pub use crate::storage::{ContactCache, ContactDirectory};
pub use crate::wallet::{TransferReceipt, TransferRequest, WalletSession};
pub use uuid::Uuid;
