use super::*;

use agent::AgentReply;
use book::ContactBook;
use regex::{Captures, Regex};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

pub const HELP_TEXT: &str = "I can help you with:\n\
    - send <amount> to <name> (or: enviar <amount> a <name>)\n\
    - balance (or: saldo)";

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Send { amount: f64, name: String },
    Balance,
    Help,
}

/// One row of the command grammar.
pub struct CommandPattern {
    pub name: &'static str,
    regex: Regex,
    extract: fn(&Captures) -> Result<Intent, AppError>,
}

/// Closed grammar evaluated top to bottom, first match wins. Input nothing
/// matches is a request for help.
pub struct CommandTable {
    patterns: Vec<CommandPattern>,
}

impl CommandTable {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            patterns: vec![
                CommandPattern {
                    name: "send",
                    regex: Regex::new(r"(?i)^\s*(?:send|enviar)\s+(\S+)\s+(?:to|a)\s+(.+?)\s*$")?,
                    extract: extract_send,
                },
                CommandPattern {
                    name: "balance",
                    regex: Regex::new(r"(?i)balance|saldo")?,
                    extract: extract_balance,
                },
            ],
        })
    }

    pub fn parse(&self, input: &str) -> Result<Intent, AppError> {
        for pattern in &self.patterns {
            if let Some(caps) = pattern.regex.captures(input) {
                debug!(pattern = pattern.name, "command matched");
                return (pattern.extract)(&caps);
            }
        }
        Ok(Intent::Help)
    }
}

fn extract_balance(_caps: &Captures) -> Result<Intent, AppError> {
    Ok(Intent::Balance)
}

fn extract_send(caps: &Captures) -> Result<Intent, AppError> {
    let raw_amount = &caps[1];
    let amount = raw_amount
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a > 0.0)
        .ok_or_else(|| AppError::Validation(format!("Invalid amount: {}", raw_amount)))?;

    Ok(Intent::Send {
        amount,
        name: caps[2].trim().to_string(),
    })
}

/// Where transfers started from a command go.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferDefaults {
    pub network: String,
    pub token_address: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssistantEvent {
    TransferSettled {
        name: String,
        amount: f64,
        result: Result<TransferReceipt, String>,
    },
    BalanceRefreshDue,
}

/// Answers free-text commands right away; transfers finish later and
/// report on the event channel.
pub struct Assistant {
    book: Arc<ContactBook>,
    table: CommandTable,
    defaults: TransferDefaults,
    delay: Duration,
    last_balance: Mutex<Option<f64>>,
    events: Sender<AssistantEvent>,
}

impl Assistant {
    pub fn new(
        book: Arc<ContactBook>,
        defaults: TransferDefaults,
        delay: Duration,
    ) -> Result<(Self, Receiver<AssistantEvent>), AppError> {
        let (events, receiver) = mpsc::channel();
        let assistant = Self {
            book,
            table: CommandTable::new()?,
            defaults,
            delay,
            last_balance: Mutex::new(None),
            events,
        };
        Ok((assistant, receiver))
    }

    /// Last balance shown to the user; `balance` reports it without fetching.
    pub fn set_balance(&self, balance: Option<f64>) {
        *self
            .last_balance
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = balance;
    }

    pub fn respond(&self, input: &str) -> String {
        match self.table.parse(input) {
            Ok(Intent::Send { amount, name }) => {
                self.schedule_transfer(name.clone(), amount);
                format!("Sending {} to {}...", amount, name)
            }
            Ok(Intent::Balance) => {
                let balance = *self
                    .last_balance
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                match balance {
                    Some(b) => format!("Your balance is {:.2}", b),
                    None => "Balance not available yet".to_string(),
                }
            }
            Ok(Intent::Help) => HELP_TEXT.to_string(),
            Err(AppError::Validation(_)) => {
                "Invalid amount. Use a positive number, e.g. send 10 to Pablo".to_string()
            }
            Err(e) => e.to_string(),
        }
    }

    fn schedule_transfer(&self, name: String, amount: f64) {
        let book = Arc::clone(&self.book);
        let defaults = self.defaults.clone();
        let events = self.events.clone();
        let delay = self.delay;

        thread::spawn(move || {
            thread::sleep(delay);
            let result = book
                .transfer_to_contact(
                    &name,
                    amount,
                    &defaults.network,
                    &defaults.token_address,
                    defaults.decimals,
                )
                .map_err(|e| e.to_string());

            if let Err(e) = &result {
                warn!(%name, amount, error = %e, "command transfer failed");
            }

            // The receiver may be gone; nobody is waiting then.
            let _ = events.send(AssistantEvent::TransferSettled {
                name,
                amount,
                result,
            });
        });
    }

    /// Schedules a balance refresh when the agent reports a transfer.
    pub fn on_agent_reply(&self, reply: &AgentReply) {
        if !reply.transfer_executed {
            return;
        }

        let events = self.events.clone();
        let delay = self.delay;
        thread::spawn(move || {
            thread::sleep(delay);
            let _ = events.send(AssistantEvent::BalanceRefreshDue);
        });
    }
}
