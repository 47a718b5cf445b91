use crate::{
    prelude::{
        AgentSession, ApiWallet, AppError, Assistant, AssistantEvent, BalanceClient, ChatTurn,
        CommandTable, Config, Contact, ContactBook, ContactCache, Intent, JsonFileStore,
        KeyValueStore, RemoteDirectory, TransferDefaults,
        command::{Cli, Commands},
    },
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const BALANCE_KEY: &str = "last_balance";
pub const AGENT_HISTORY_KEY: &str = "agent_history";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedConversation {
    session_id: String,
    history: Vec<ChatTurn>,
}

pub fn run_app() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(path) = cli.cache_path {
        config.cache_path = path;
    }
    if let Some(wallet) = cli.wallet {
        config.wallet_address = wallet;
    }
    if let Some(email) = cli.email.filter(|e| !e.trim().is_empty()) {
        config.user_email = Some(email);
    }
    config.validate()?;
    debug!(?config, "configuration loaded");

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&config.cache_path)?);
    let book = Arc::new(build_book(&config, Arc::clone(&store))?);

    // Every command starts from the cached snapshot so writes never drop it.
    book.load_cached();

    match cli.command {
        Commands::List => {
            let contacts = book.contacts();
            if contacts.is_empty() {
                println!("No contact yet");
                return Ok(());
            }
            for (mut i, c) in contacts.iter().enumerate() {
                i += 1;
                println!("{i:>3}. {}", display_contact(c));
            }
            Ok(())
        }

        Commands::Sync => {
            book.refresh()?;
            println!("Synced {} contacts", book.contacts().len());
            Ok(())
        }

        Commands::Add {
            name,
            address,
            email,
        } => {
            let contact = book.add_contact(&name, email.as_deref(), &address)?;
            if contact.is_provisional() {
                println!(
                    "Directory unavailable, contact saved locally as {}",
                    contact.id
                );
            } else {
                println!("Contact added successfully");
            }
            Ok(())
        }

        Commands::Remove { id } => {
            book.remove_contact(&id)?;
            println!("Contact removed successfully");
            Ok(())
        }

        Commands::Find { query } => {
            match book.find_by_name(&query) {
                Some(contact) => println!("{}", display_contact(&contact)),
                None => eprintln!("{}", AppError::NotFound("Contact".to_string())),
            }
            Ok(())
        }

        Commands::Send {
            name,
            amount,
            network,
            token,
            decimals,
            via_directory,
        } => {
            require_wallet(&config)?;
            let network = network.unwrap_or_else(|| config.network.clone());
            let token = token.unwrap_or_else(|| config.token_address.clone());
            let decimals = decimals.unwrap_or(config.token_decimals);

            if via_directory {
                book.transfer_via_directory(&name, amount, &network, &token, decimals)?;
                println!("Transfer of {} to {} submitted", amount, name);
                return Ok(());
            }

            if let Err(e) = book.refresh() {
                debug!(error = %e, "sending with cached contacts");
            }
            let receipt = book.transfer_to_contact(&name, amount, &network, &token, decimals)?;
            println!(
                "Sent {} to {} (tx {})",
                amount,
                name,
                receipt.transaction_hash.unwrap_or_else(|| "pending".to_string())
            );
            Ok(())
        }

        Commands::Ask { text } => {
            let text = text.join(" ");
            if let Err(e) = book.refresh() {
                debug!(error = %e, "answering with cached contacts");
            }

            let (assistant, events) = Assistant::new(
                Arc::clone(&book),
                transfer_defaults(&config),
                config.transfer_delay,
            )?;
            assistant.set_balance(read_balance(store.as_ref())?);

            println!("{}", assistant.respond(&text));

            if matches!(CommandTable::new()?.parse(&text), Ok(Intent::Send { .. })) {
                let wait = config.transfer_delay + config.timeout + Duration::from_secs(1);
                match events.recv_timeout(wait) {
                    Ok(AssistantEvent::TransferSettled { name, result, .. }) => match result {
                        Ok(receipt) => println!(
                            "Transfer to {} completed (tx {})",
                            name,
                            receipt.transaction_hash.unwrap_or_else(|| "pending".to_string())
                        ),
                        Err(e) => println!("Transfer to {} failed: {}", name, e),
                    },
                    Ok(AssistantEvent::BalanceRefreshDue) => {}
                    Err(_) => println!("Transfer still pending"),
                }
            }
            Ok(())
        }

        Commands::Chat { text, reset } => {
            let text = text.join(" ");
            let mut session = AgentSession::new(&config.api_url, config.timeout)?;

            if !reset
                && let Some(saved) = store.get(AGENT_HISTORY_KEY)?
                && let Ok(saved) = serde_json::from_str::<SavedConversation>(&saved)
            {
                session = session.with_history(&saved.session_id, saved.history);
            }

            let reply = session.send(&text)?;
            println!("{}", reply.text);

            let saved = SavedConversation {
                session_id: session.session_id().to_string(),
                history: session.history().to_vec(),
            };
            store.set(AGENT_HISTORY_KEY, &serde_json::to_string(&saved)?)?;

            if reply.transfer_executed && !config.wallet_address.is_empty() {
                let (assistant, events) = Assistant::new(
                    Arc::clone(&book),
                    transfer_defaults(&config),
                    config.transfer_delay,
                )?;
                assistant.on_agent_reply(&reply);

                let wait = config.transfer_delay + Duration::from_secs(1);
                if let Ok(AssistantEvent::BalanceRefreshDue) = events.recv_timeout(wait) {
                    let balance = refresh_balance(&config, store.as_ref())?;
                    println!("Balance: {:.2}", balance);
                }
            }
            Ok(())
        }

        Commands::Balance => {
            let balance = refresh_balance(&config, store.as_ref())?;
            println!("Balance: {:.2}", balance);
            Ok(())
        }
    }
}

pub fn build_book(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<ContactBook, AppError> {
    let directory = RemoteDirectory::new(&config.api_url, config.timeout)?;
    let wallet = ApiWallet::new(
        &config.api_url,
        &config.wallet_address,
        config.user_email.as_deref(),
        config.timeout,
    )?;

    Ok(ContactBook::new(
        Arc::new(directory),
        ContactCache::new(store),
        Arc::new(wallet),
    )
    .with_address_validation(config.validate_addresses))
}

pub fn display_contact(contact: &Contact) -> String {
    let mut output = format!(
        "{:<20} {:<68} {:<30}",
        contact.name,
        contact.wallet_address,
        contact.email.as_deref().unwrap_or("")
    );
    if contact.is_provisional() {
        output.push_str(" (pending)");
    }
    output.push_str(&format!(" [{}]", contact.id));
    output
}

fn transfer_defaults(config: &Config) -> TransferDefaults {
    TransferDefaults {
        network: config.network.clone(),
        token_address: config.token_address.clone(),
        decimals: config.token_decimals,
    }
}

fn require_wallet(config: &Config) -> Result<(), AppError> {
    if config.wallet_address.trim().is_empty() {
        return Err(AppError::Config(
            "wallet address is not set (PAYBOOK_WALLET_ADDRESS or --wallet)".to_string(),
        ));
    }
    Ok(())
}

fn read_balance(store: &dyn KeyValueStore) -> Result<Option<f64>, AppError> {
    Ok(store
        .get(BALANCE_KEY)?
        .and_then(|b| b.trim().parse::<f64>().ok()))
}

fn refresh_balance(config: &Config, store: &dyn KeyValueStore) -> Result<f64, AppError> {
    require_wallet(config)?;
    let client = BalanceClient::new(&config.api_url, config.timeout)?;
    let balance = client.fetch(
        &config.wallet_address,
        &config.token_address,
        config.token_decimals,
    )?;
    store.set(BALANCE_KEY, &balance.to_string())?;
    info!(balance, "balance refreshed");
    Ok(balance)
}
