use super::*;

use crate::storage::DirectoryTransfer;
use contact::{Contact, NewContact};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Named wallet contacts for the active session: a cached snapshot that a
/// directory refresh replaces wholesale.
pub struct ContactBook {
    directory: Arc<dyn ContactDirectory>,
    cache: ContactCache,
    session: Arc<dyn WalletSession>,
    validate_addresses: bool,
    state: Mutex<BookState>,
    // Bumped by every refresh; only the latest one may publish.
    generation: AtomicU64,
}

#[derive(Debug, Default)]
struct BookState {
    contacts: Vec<Contact>,
    in_flight: usize,
    error: Option<String>,
    // Provisional ids some refresh is currently re-sending.
    reconciling: HashSet<String>,
}

impl ContactBook {
    pub fn new(
        directory: Arc<dyn ContactDirectory>,
        cache: ContactCache,
        session: Arc<dyn WalletSession>,
    ) -> Self {
        Self {
            directory,
            cache,
            session,
            validate_addresses: true,
            state: Mutex::new(BookState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Leave address format checks to the directory.
    pub fn with_address_validation(mut self, enabled: bool) -> Self {
        self.validate_addresses = enabled;
        self
    }

    pub fn session(&self) -> &Arc<dyn WalletSession> {
        &self.session
    }

    pub fn cache(&self) -> &ContactCache {
        &self.cache
    }

    // A poisoned lock still holds a usable snapshot.
    fn state(&self) -> MutexGuard<'_, BookState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.state().contacts.clone()
    }

    pub fn loading(&self) -> bool {
        self.state().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Serves the cached snapshot, then refreshes it from the directory.
    /// Failures only land in `error()`.
    pub fn load(&self) {
        self.load_cached();
        if let Err(e) = self.refresh() {
            debug!(error = %e, "keeping cached contacts");
        }
    }

    /// Publishes whatever the persisted cache holds. Returns the number of
    /// contacts served.
    pub fn load_cached(&self) -> usize {
        match self.cache.load() {
            Ok(cached) => {
                let count = cached.len();
                self.state().contacts = cached;
                count
            }
            Err(e) => {
                warn!(error = %e, "unreadable contact cache");
                self.state().error = Some(e.to_string());
                0
            }
        }
    }

    /// Replaces the snapshot with the directory's list and rewrites the
    /// cache. Returns `Ok(false)` when a newer refresh started meanwhile and
    /// this result was discarded.
    pub fn refresh(&self) -> Result<bool, AppError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state().in_flight += 1;

        let fetched = self.directory.list(self.session.email());

        let remote = match fetched {
            Ok(remote) => remote,
            Err(e) => {
                let mut state = self.state();
                state.in_flight -= 1;
                if self.is_latest(generation) {
                    warn!(error = %e, "contact sync failed");
                    state.error = Some(e.to_string());
                }
                return Err(e);
            }
        };

        if !self.is_latest(generation) {
            self.state().in_flight -= 1;
            debug!(generation, "discarding superseded contact sync");
            return Ok(false);
        }

        let (claimed, confirmed) = self.reconcile_provisional();

        let snapshot = {
            let mut state = self.state();
            state.in_flight -= 1;
            for id in &claimed {
                state.reconciling.remove(id);
            }

            // Confirmations apply whether or not this refresh still wins.
            for (provisional_id, server) in &confirmed {
                if state.contacts.iter().any(|c| c.id == server.id) {
                    state.contacts.retain(|c| c.id != *provisional_id);
                } else if let Some(contact) =
                    state.contacts.iter_mut().find(|c| c.id == *provisional_id)
                {
                    *contact = server.clone();
                }
            }

            if !self.is_latest(generation) {
                let confirmed_snapshot = (!confirmed.is_empty()).then(|| state.contacts.clone());
                drop(state);
                if let Some(snapshot) = confirmed_snapshot {
                    self.persist(&snapshot);
                }
                debug!(generation, "discarding superseded contact sync");
                return Ok(false);
            }

            let mut merged = remote;
            let carried: Vec<Contact> = state
                .contacts
                .iter()
                .filter(|c| c.is_provisional() || confirmed.values().any(|s| s.id == c.id))
                .filter(|c| !merged.iter().any(|r| r.id == c.id))
                .cloned()
                .collect();
            merged.extend(carried);

            state.contacts = merged;
            state.error = None;
            state.contacts.clone()
        };

        info!(count = snapshot.len(), "contacts synced");
        self.persist(&snapshot);
        Ok(true)
    }

    /// Runs `refresh` on a background thread.
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let book = Arc::clone(self);
        thread::spawn(move || {
            let _ = book.refresh();
        })
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Re-sends the provisional records no other refresh has claimed.
    /// Returns the claimed ids and the server records keyed by the
    /// provisional id they replace. Claims must be released by the caller.
    fn reconcile_provisional(&self) -> (Vec<String>, HashMap<String, Contact>) {
        let pending: Vec<Contact> = {
            let mut state = self.state();
            let pending: Vec<Contact> = state
                .contacts
                .iter()
                .filter(|c| c.is_provisional() && !state.reconciling.contains(&c.id))
                .cloned()
                .collect();
            state
                .reconciling
                .extend(pending.iter().map(|c| c.id.clone()));
            pending
        };
        let claimed = pending.iter().map(|c| c.id.clone()).collect();

        let mut confirmed = HashMap::new();
        for contact in pending {
            match self.directory.create(&contact.to_new_contact()) {
                Ok(server) => {
                    debug!(provisional = %contact.id, id = %server.id, "provisional contact confirmed");
                    confirmed.insert(contact.id, server);
                }
                Err(e) => {
                    debug!(provisional = %contact.id, error = %e, "provisional contact still pending");
                }
            }
        }
        (claimed, confirmed)
    }

    fn persist(&self, contacts: &[Contact]) {
        if let Err(e) = self.cache.save(contacts) {
            warn!(error = %e, "failed to persist contacts");
        }
    }

    fn push_and_persist(&self, contact: Contact) {
        let snapshot = {
            let mut state = self.state();
            state.contacts.push(contact);
            state.contacts.clone()
        };
        self.persist(&snapshot);
    }

    /// Creates a contact in the directory. A transient directory failure
    /// stores a provisional record instead, which is returned as success.
    pub fn add_contact(
        &self,
        name: &str,
        email: Option<&str>,
        wallet_address: &str,
    ) -> Result<Contact, AppError> {
        let mut new_contact = NewContact::new(name, email, wallet_address);
        new_contact.added_by = self.session.email().map(str::to_string);
        new_contact.validate(self.validate_addresses)?;

        match self.directory.create(&new_contact) {
            Ok(created) => {
                self.push_and_persist(created.clone());
                Ok(created)
            }
            Err(e) if e.is_transient() => {
                warn!(error = %e, name = %new_contact.name, "directory unavailable, storing provisional contact");
                let provisional = new_contact.into_provisional();
                self.push_and_persist(provisional.clone());
                Ok(provisional)
            }
            Err(e) => Err(e),
        }
    }

    /// Removes a contact locally whatever the directory answers. An id the
    /// snapshot does not know is still deleted remotely; it is `NotFound`
    /// only when that delete fails too.
    pub fn remove_contact(&self, id: &str) -> Result<(), AppError> {
        let local = self
            .state()
            .contacts
            .iter()
            .find(|c| c.id == id)
            .map(Contact::is_provisional);

        match local {
            // The directory never saw provisional records.
            Some(true) => {}
            Some(false) => {
                if let Err(e) = self.directory.delete(id) {
                    warn!(%id, error = %e, "remote delete failed, removing locally anyway");
                }
            }
            None => {
                return match self.directory.delete(id) {
                    Ok(()) => {
                        info!(%id, "deleted contact missing from the local snapshot");
                        Ok(())
                    }
                    Err(e) => {
                        debug!(%id, error = %e, "unknown contact");
                        Err(AppError::NotFound("Contact".to_string()))
                    }
                };
            }
        }

        let snapshot = {
            let mut state = self.state();
            state.contacts.retain(|c| c.id != id);
            state.contacts.clone()
        };
        self.persist(&snapshot);
        Ok(())
    }

    /// First contact, in snapshot order, whose name or email contains
    /// `query` case-insensitively.
    pub fn find_by_name(&self, query: &str) -> Option<Contact> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.state()
            .contacts
            .iter()
            .find(|c| c.matches(&needle))
            .cloned()
    }

    /// Resolves `name` locally and hands the transfer to the wallet session.
    pub fn transfer_to_contact(
        &self,
        name: &str,
        amount: f64,
        network: &str,
        token_address: &str,
        decimals: u32,
    ) -> Result<TransferReceipt, AppError> {
        validate_amount(amount)?;

        let contact = self
            .find_by_name(name)
            .ok_or_else(|| AppError::NotFound(format!("Contact '{}'", name.trim())))?;

        let request = TransferRequest {
            network: network.to_string(),
            from_address: self.session.address().to_string(),
            to_address: contact.wallet_address.clone(),
            token_address: token_address.to_string(),
            amount,
            decimals,
        };

        info!(contact = %contact.name, amount, network, "transferring to contact");
        self.session.execute_transfer(&request)
    }

    /// Lets the directory resolve `name` and run the transfer server-side.
    pub fn transfer_via_directory(
        &self,
        name: &str,
        amount: f64,
        network: &str,
        token_address: &str,
        decimals: u32,
    ) -> Result<(), AppError> {
        validate_amount(amount)?;

        let request = DirectoryTransfer {
            contact_name: name.trim().to_string(),
            network: network.to_string(),
            from_address: self.session.address().to_string(),
            token_address: token_address.to_string(),
            amount,
            decimals,
            user_email: self.session.email().map(str::to_string),
        };

        let outcome = self.directory.transfer(&request)?;
        if outcome.success {
            Ok(())
        } else {
            Err(AppError::Transfer(
                outcome.error.unwrap_or_else(|| "rejected by directory".to_string()),
            ))
        }
    }
}

pub fn validate_amount(amount: f64) -> Result<(), AppError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Amount must be a positive number".to_string(),
        ))
    }
}
