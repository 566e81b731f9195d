use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use thiserror::Error;

use crate::application::{AppError, LedgerService};
use crate::config::DatabaseConfig;
use crate::domain::{parse_cents, AccountNumber, Cents, Operation};

const MENU: &str = "\n--- Banking Menu ---\n\
1. Create Account\n\
2. Deposit\n\
3. Withdraw\n\
4. Transfer\n\
5. Show Balance\n\
6. Exit";

/// Where the menu gets its database settings when it needs a connection.
#[derive(Debug, Clone)]
pub enum Connector {
    /// Re-read on every connection attempt, so a fixed file is picked up without a restart.
    ConfigFile(PathBuf),
    Config(DatabaseConfig),
}

impl Connector {
    pub fn config(&self) -> Result<DatabaseConfig> {
        match self {
            Connector::ConfigFile(path) => Ok(DatabaseConfig::load(path)?),
            Connector::Config(config) => Ok(config.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Create,
    Deposit,
    Withdraw,
    Transfer,
    ShowBalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Run(Action),
    Exit,
}

impl MenuChoice {
    fn from_input(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Run(Action::Create)),
            "2" => Some(MenuChoice::Run(Action::Deposit)),
            "3" => Some(MenuChoice::Run(Action::Withdraw)),
            "4" => Some(MenuChoice::Run(Action::Transfer)),
            "5" => Some(MenuChoice::Run(Action::ShowBalance)),
            "6" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
enum InputError {
    #[error("{0}")]
    Invalid(String),

    #[error("end of input")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Interactive numbered menu over any line-based input and output.
///
/// Domain rejections are printed for the operator. Store and connection
/// failures are logged and the loop moves on to the next choice.
pub struct Menu<R, W> {
    input: R,
    output: W,
    connector: Option<Connector>,
    service: Option<LedgerService>,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    /// A menu that connects lazily and retries after a failed connection.
    /// A missing database file or table is created on first use.
    pub fn new(connector: Connector, input: R, output: W) -> Self {
        Self {
            input,
            output,
            connector: Some(connector),
            service: None,
        }
    }

    /// A menu bound to an already connected service.
    pub fn with_service(service: LedgerService, input: R, output: W) -> Self {
        Self {
            input,
            output,
            connector: None,
            service: Some(service),
        }
    }

    pub fn service(&self) -> Option<&LedgerService> {
        self.service.as_ref()
    }

    /// Release the connection pool, if one was opened.
    pub async fn close(&mut self) {
        if let Some(service) = self.service.take() {
            service.close().await;
        }
    }

    /// Loop until the operator exits or input runs out.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "{}", MENU)?;
            let choice = match self.prompt("Choose: ") {
                Ok(line) => MenuChoice::from_input(&line),
                Err(InputError::Closed) => break,
                Err(err) => return Err(err.into()),
            };

            let action = match choice {
                Some(MenuChoice::Exit) => break,
                Some(MenuChoice::Run(action)) => action,
                None => {
                    writeln!(self.output, "Invalid choice!")?;
                    continue;
                }
            };

            let op = match self.read_operation(action) {
                Ok(op) => op,
                Err(InputError::Invalid(message)) => {
                    writeln!(self.output, "{}", message)?;
                    continue;
                }
                Err(InputError::Closed) => break,
                Err(InputError::Io(err)) => return Err(err.into()),
            };

            let result = match self.ensure_service().await {
                Ok(service) => service.execute(op).await,
                Err(err) => {
                    tracing::error!("Failed to connect to the database: {:#}", err);
                    continue;
                }
            };

            match result {
                Ok(outcome) => writeln!(self.output, "{}", outcome)?,
                Err(AppError::Ledger(err)) => writeln!(self.output, "{}", err)?,
                Err(AppError::Database(err)) => {
                    tracing::error!("Operation failed: {:#}", err);
                }
            }
        }

        writeln!(self.output, "Exiting...")?;
        self.output.flush()?;
        Ok(())
    }

    async fn ensure_service(&mut self) -> Result<&LedgerService> {
        let service = match self.service.take() {
            Some(service) => service,
            None => {
                let connector = self
                    .connector
                    .as_ref()
                    .ok_or_else(|| anyhow!("No database configured"))?;
                LedgerService::init(&connector.config()?).await?
            }
        };
        Ok(&*self.service.insert(service))
    }

    fn read_operation(&mut self, action: Action) -> Result<Operation, InputError> {
        let op = match action {
            Action::Create => {
                let name = self.prompt("Enter name: ")?;
                let initial_deposit = self.prompt_amount("Enter initial deposit: ")?;
                Operation::CreateAccount {
                    name: name.trim().to_string(),
                    initial_deposit,
                }
            }
            Action::Deposit => {
                let account = self.prompt_account("Enter account number: ")?;
                let amount = self.prompt_amount("Enter amount to deposit: ")?;
                Operation::Deposit { account, amount }
            }
            Action::Withdraw => {
                let account = self.prompt_account("Enter account number: ")?;
                let amount = self.prompt_amount("Enter amount to withdraw: ")?;
                Operation::Withdraw { account, amount }
            }
            Action::Transfer => {
                let from = self.prompt_account("From account number: ")?;
                let to = self.prompt_account("To account number: ")?;
                let amount = self.prompt_amount("Amount to transfer: ")?;
                Operation::Transfer { from, to, amount }
            }
            Action::ShowBalance => {
                let account = self.prompt_account("Enter account number: ")?;
                Operation::ShowBalance { account }
            }
        };
        Ok(op)
    }

    fn prompt(&mut self, label: &str) -> Result<String, InputError> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn prompt_account(&mut self, label: &str) -> Result<AccountNumber, InputError> {
        let raw = self.prompt(label)?;
        raw.trim()
            .parse()
            .map_err(|_| InputError::Invalid(format!("Invalid account number: '{}'", raw.trim())))
    }

    fn prompt_amount(&mut self, label: &str) -> Result<Cents, InputError> {
        let raw = self.prompt(label)?;
        parse_cents(&raw).map_err(|e| InputError::Invalid(format!("Invalid amount: {}", e)))
    }
}
