#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rusty_paybook::prelude::*;

pub const PABLO_ADDRESS: &str = "0x04a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3";
pub const ANA_ADDRESS: &str = "0x0bb1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f";
pub const OWNER_EMAIL: &str = "me@example.com";

pub fn contact(id: &str, name: &str, address: &str) -> Contact {
    Contact {
        id: id.to_string(),
        name: name.to_string(),
        email: None,
        wallet_address: address.to_string(),
        created_at: contact::Utc::now(),
        added_by: Some(OWNER_EMAIL.to_string()),
        provisional: false,
    }
}

fn failure(status: Option<u16>) -> Result<(), AppError> {
    match status {
        Some(status) => Err(AppError::Server {
            status,
            message: format!("fake directory answered {}", status),
        }),
        None => Ok(()),
    }
}

/// In-process directory. `*_status` set to `Some(code)` makes that call fail.
#[derive(Default)]
pub struct FakeDirectory {
    pub remote: Mutex<Vec<Contact>>,
    pub list_status: Mutex<Option<u16>>,
    pub create_status: Mutex<Option<u16>>,
    pub delete_status: Mutex<Option<u16>>,
    pub calls: Mutex<Vec<String>>,
    pub transfers: Mutex<Vec<DirectoryTransfer>>,
    next_id: AtomicUsize,
}

impl FakeDirectory {
    pub fn with_remote(contacts: Vec<Contact>) -> Self {
        let directory = Self::default();
        *directory.remote.lock().unwrap() = contacts;
        directory
    }

    pub fn fail_list(&self, status: Option<u16>) {
        *self.list_status.lock().unwrap() = status;
    }

    pub fn fail_create(&self, status: Option<u16>) {
        *self.create_status.lock().unwrap() = status;
    }

    pub fn fail_delete(&self, status: Option<u16>) {
        *self.delete_status.lock().unwrap() = status;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ContactDirectory for FakeDirectory {
    fn list(&self, owner_email: Option<&str>) -> Result<Vec<Contact>, AppError> {
        self.record(format!("list {}", owner_email.unwrap_or("-")));
        failure(*self.list_status.lock().unwrap())?;
        Ok(self.remote.lock().unwrap().clone())
    }

    fn create(&self, new_contact: &NewContact) -> Result<Contact, AppError> {
        self.record(format!("create {}", new_contact.name));
        failure(*self.create_status.lock().unwrap())?;

        let id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let created = Contact {
            id,
            name: new_contact.name.clone(),
            email: new_contact.email.clone(),
            wallet_address: new_contact.wallet_address.clone(),
            created_at: contact::Utc::now(),
            added_by: new_contact.added_by.clone(),
            provisional: false,
        };
        self.remote.lock().unwrap().push(created.clone());
        Ok(created)
    }

    fn delete(&self, id: &str) -> Result<(), AppError> {
        self.record(format!("delete {}", id));
        failure(*self.delete_status.lock().unwrap())?;
        self.remote.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    fn transfer(&self, request: &DirectoryTransfer) -> Result<TransferOutcome, AppError> {
        self.record(format!("transfer {}", request.contact_name));
        self.transfers.lock().unwrap().push(request.clone());

        let known = self
            .remote
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(&request.contact_name));
        Ok(TransferOutcome {
            success: known,
            error: if known {
                None
            } else {
                Some("Contact not found".to_string())
            },
        })
    }
}

pub struct FakeWallet {
    pub address: String,
    pub email: Option<String>,
    pub transfers: Mutex<Vec<TransferRequest>>,
    pub reject_with: Mutex<Option<String>>,
}

impl Default for FakeWallet {
    fn default() -> Self {
        Self {
            address: "0x0600000000000000000000000000000000000001".to_string(),
            email: Some(OWNER_EMAIL.to_string()),
            transfers: Mutex::new(Vec::new()),
            reject_with: Mutex::new(None),
        }
    }
}

impl FakeWallet {
    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.transfers.lock().unwrap().clone()
    }
}

impl WalletSession for FakeWallet {
    fn address(&self) -> &str {
        &self.address
    }

    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn execute_transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, AppError> {
        self.transfers.lock().unwrap().push(request.clone());
        if let Some(reason) = self.reject_with.lock().unwrap().clone() {
            return Err(AppError::Transfer(reason));
        }
        Ok(TransferReceipt {
            transaction_hash: Some(format!("0xtx{}", self.transfers.lock().unwrap().len())),
            status: Some("ACCEPTED".to_string()),
        })
    }
}

pub struct Fixture {
    pub directory: Arc<FakeDirectory>,
    pub wallet: Arc<FakeWallet>,
    pub store: Arc<MemStore>,
    pub book: Arc<ContactBook>,
}

pub fn fixture(directory: FakeDirectory, cached: &[Contact]) -> Fixture {
    let directory = Arc::new(directory);
    let wallet = Arc::new(FakeWallet::default());
    let store = Arc::new(MemStore::new());

    let cache = ContactCache::new(store.clone());
    cache.save(cached).unwrap();

    let book = Arc::new(ContactBook::new(directory.clone(), cache, wallet.clone()));
    Fixture {
        directory,
        wallet,
        store,
        book,
    }
}

impl Fixture {
    pub fn cached(&self) -> Vec<Contact> {
        ContactCache::new(self.store.clone()).load().unwrap()
    }

    pub fn names(&self) -> Vec<String> {
        self.book.contacts().into_iter().map(|c| c.name).collect()
    }
}
