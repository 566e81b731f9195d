mod menu;

pub use menu::{Connector, Menu};

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::LedgerService;
use crate::config::{DatabaseConfig, DEFAULT_CONFIG_PATH};
use crate::domain::{format_cents, parse_cents, AccountNumber, Operation};
use crate::io::Exporter;

/// Teller - console ledger
#[derive(Parser)]
#[command(name = "teller")]
#[command(about = "Open accounts, deposit, withdraw and transfer money from the console")]
#[command(version)]
pub struct Cli {
    /// Properties file holding the database url, username and password
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// SQLite database file to use instead of the configuration file
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run (the interactive menu when omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and the accounts table
    Init,

    /// Interactive numbered menu
    Menu,

    /// Open a new account
    Create {
        /// Holder's name
        name: String,

        /// Initial deposit (e.g., "100.00" or "100")
        #[arg(default_value = "0", allow_hyphen_values = true)]
        initial_deposit: String,
    },

    /// Deposit money into an account
    Deposit {
        /// Account number
        account: AccountNumber,

        /// Amount to deposit
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Withdraw money from an account
    Withdraw {
        /// Account number
        account: AccountNumber,

        /// Amount to withdraw
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Move money between two accounts
    Transfer {
        /// Amount to transfer
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Sender account number
        #[arg(long)]
        from: AccountNumber,

        /// Receiver account number
        #[arg(long)]
        to: AccountNumber,
    },

    /// Show the balance of one account, or of all accounts
    Balance {
        /// Account number (omit for all accounts)
        account: Option<AccountNumber>,
    },

    /// Export all accounts
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl Cli {
    fn connector(&self) -> Connector {
        match &self.database {
            Some(path) => Connector::Config(DatabaseConfig::sqlite_file(path)),
            None => Connector::ConfigFile(self.config.clone()),
        }
    }

    pub async fn run(self) -> Result<()> {
        let connector = self.connector();

        match self.command.unwrap_or(Commands::Menu) {
            Commands::Init => {
                let config = connector.config()?;
                let service = LedgerService::init(&config).await?;
                println!("Database initialized: {}", config.url);
                service.close().await;
            }

            Commands::Menu => {
                let stdin = io::stdin();
                let mut menu = Menu::new(connector, stdin.lock(), io::stdout());
                let result = menu.run().await;
                menu.close().await;
                result?;
            }

            command => {
                let service = LedgerService::connect(&connector.config()?).await?;
                let result = run_command(&service, command).await;
                service.close().await;
                result?;
            }
        }

        Ok(())
    }
}

async fn run_command(service: &LedgerService, command: Commands) -> Result<()> {
    let op = match command {
        Commands::Create {
            name,
            initial_deposit,
        } => Operation::CreateAccount {
            name,
            initial_deposit: parse_amount(&initial_deposit)?,
        },

        Commands::Deposit { account, amount } => Operation::Deposit {
            account,
            amount: parse_amount(&amount)?,
        },

        Commands::Withdraw { account, amount } => Operation::Withdraw {
            account,
            amount: parse_amount(&amount)?,
        },

        Commands::Transfer { amount, from, to } => Operation::Transfer {
            from,
            to,
            amount: parse_amount(&amount)?,
        },

        Commands::Balance {
            account: Some(account),
        } => Operation::ShowBalance { account },

        Commands::Balance { account: None } => return run_balances_command(service).await,

        Commands::Export { format, output } => {
            return run_export_command(service, format, output).await;
        }

        Commands::Init | Commands::Menu => return Ok(()),
    };

    let outcome = service.execute(op).await?;
    println!("{}", outcome);
    Ok(())
}

fn parse_amount(raw: &str) -> Result<crate::domain::Cents> {
    parse_cents(raw).context("Invalid amount format. Use '50.00' or '50'")
}

async fn run_balances_command(service: &LedgerService) -> Result<()> {
    let accounts = service.list_accounts().await?;
    if accounts.is_empty() {
        println!("No accounts found.");
        return Ok(());
    }

    println!("{:<8} {:<24} {:>14}", "NUMBER", "NAME", "BALANCE");
    println!("{}", "-".repeat(48));
    for account in accounts {
        println!(
            "{:<8} {:<24} {:>14}",
            account.number,
            account.name,
            format_cents(account.balance)
        );
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let writer: Box<dyn io::Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };

    let exporter = Exporter::new(service);
    let count = match format {
        ExportFormat::Csv => exporter.export_accounts_csv(writer).await?,
        ExportFormat::Json => exporter.export_accounts_json(writer).await?.accounts.len(),
    };

    if let Some(path) = output {
        eprintln!("Exported {} account(s) to {}", count, path.display());
    }
    Ok(())
}
