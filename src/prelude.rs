pub use crate::cli::{command, run_app};
pub use crate::config::Config;
pub use crate::domain::{
    agent::{AgentReply, AgentSession, ChatRole, ChatTurn},
    book::ContactBook,
    command::{Assistant, AssistantEvent, CommandTable, Intent, TransferDefaults},
    contact::{self, Contact, NewContact},
};
pub use crate::errors::AppError;
pub use crate::storage::{
    ContactCache, ContactDirectory, DirectoryTransfer, KeyValueStore, TransferOutcome,
    file::JsonFileStore, memory::MemStore, remote::RemoteDirectory,
};
pub use crate::wallet::{ApiWallet, BalanceClient, TransferReceipt, TransferRequest, WalletSession};
