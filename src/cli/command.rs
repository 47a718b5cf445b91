use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "paybook", version, about = "Wallet contact book")]
pub struct Cli {
    /// Base url of the wallet backend (contacts, transfers, agent)
    #[arg(long, env = "PAYBOOK_API_URL")]
    pub api_url: Option<String>,

    /// JSON file holding the local contact cache
    #[arg(long, env = "PAYBOOK_CACHE_PATH")]
    pub cache_path: Option<String>,

    /// Address of the active wallet
    #[arg(long, env = "PAYBOOK_WALLET_ADDRESS")]
    pub wallet: Option<String>,

    /// Email of the signed-in account
    #[arg(long, env = "PAYBOOK_USER_EMAIL")]
    pub email: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommand and their flags
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List cached contacts
    List,

    /// Refresh contacts from the directory
    Sync,

    /// Add a new contact
    Add {
        /// Contact name
        #[arg(long)]
        name: String,

        /// Wallet address (0x followed by 40 to 65 hex digits)
        #[arg(long)]
        address: String,

        /// Contact email address
        #[arg(long)]
        email: Option<String>,
    },

    /// Remove a contact by id
    Remove {
        #[arg(long)]
        id: String,
    },

    /// Find the first contact whose name or email contains the query
    Find { query: String },

    /// Transfer tokens to a contact by name
    Send {
        #[arg(long)]
        name: String,

        #[arg(long)]
        amount: f64,

        /// Network (mainnet, sepolia, goerli)
        #[arg(long)]
        network: Option<String>,

        /// Token contract address
        #[arg(long)]
        token: Option<String>,

        #[arg(long)]
        decimals: Option<u32>,

        /// Let the directory resolve the name and run the transfer
        #[arg(long)]
        via_directory: bool,
    },

    /// Run a free-text command, e.g. "send 10 to Pablo"
    Ask {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Talk to the remote agent
    Chat {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,

        /// Start a new conversation instead of resuming the saved one
        #[arg(long)]
        reset: bool,
    },

    /// Fetch and remember the wallet balance
    Balance,
}
