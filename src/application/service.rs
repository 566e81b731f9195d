use chrono::Utc;

use crate::config::DatabaseConfig;
use crate::domain::{
    validate_amount, validate_opening, Account, AccountNumber, Cents, LedgerError, Operation,
    Outcome,
};
use crate::storage::{CreditOutcome, DebitOutcome, Repository, TransferOutcome};

use super::AppError;

/// Ledger operations over the account store.
/// This is the primary interface for any client (menu, one-shot CLI, export).
pub struct LedgerService {
    repo: Repository,
}

/// Balances on both sides after a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferResult {
    pub from_balance: Cents,
    pub to_balance: Cents,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create the database if needed and bring the schema up to date.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, AppError> {
        config.log_credentials_usage();
        let repo = Repository::init(&config.url, config.max_connections).await?;
        tracing::info!("Ledger database ready at {}", config.url);
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        config.log_credentials_usage();
        let repo = Repository::connect(&config.url, config.max_connections).await?;
        tracing::debug!("Connected to {}", config.url);
        Ok(Self::new(repo))
    }

    /// Release pooled connections.
    pub async fn close(&self) {
        self.repo.close().await;
    }

    // ========================
    // Money movement
    // ========================

    /// Open an account with a non-negative initial deposit.
    pub async fn create_account(&self, name: &str, initial_deposit: Cents) -> Result<Account, AppError> {
        validate_opening(name, initial_deposit).inspect_err(log_rejection)?;

        let account = self
            .repo
            .insert_account(name.trim(), initial_deposit, Utc::now())
            .await?;
        tracing::info!(
            "Created account {} for {} with {} cents",
            account.number,
            account.name,
            account.balance
        );
        Ok(account)
    }

    /// Add a positive amount to an account. Returns the new balance.
    pub async fn deposit(&self, account: AccountNumber, amount: Cents) -> Result<Cents, AppError> {
        validate_amount("deposit", amount).inspect_err(log_rejection)?;

        let result = match self.repo.deposit(account, amount).await? {
            CreditOutcome::Applied { balance } => Ok(balance),
            CreditOutcome::Missing => Err(LedgerError::AccountNotFound(account)),
            CreditOutcome::Overflow => Err(LedgerError::BalanceOverflow(account)),
        };
        let balance = result.inspect_err(log_rejection)?;

        tracing::info!("Deposited {} cents into account {}", amount, account);
        Ok(balance)
    }

    /// Take a positive amount out of an account that covers it. Returns the new balance.
    pub async fn withdraw(&self, account: AccountNumber, amount: Cents) -> Result<Cents, AppError> {
        validate_amount("withdraw", amount).inspect_err(log_rejection)?;

        let result = match self.repo.withdraw(account, amount).await? {
            DebitOutcome::Applied { balance } => Ok(balance),
            DebitOutcome::Missing => Err(LedgerError::AccountNotFound(account)),
            DebitOutcome::Insufficient { balance } => Err(LedgerError::InsufficientFunds {
                account,
                balance,
                requested: amount,
            }),
        };
        let balance = result.inspect_err(log_rejection)?;

        tracing::info!("Withdrew {} cents from account {}", amount, account);
        Ok(balance)
    }

    /// Move a positive amount between accounts. Either both balances change or neither does.
    pub async fn transfer(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: Cents,
    ) -> Result<TransferResult, AppError> {
        validate_amount("transfer", amount).inspect_err(log_rejection)?;

        let result = match self.repo.transfer(from, to, amount).await? {
            TransferOutcome::Applied {
                from_balance,
                to_balance,
            } => Ok(TransferResult {
                from_balance,
                to_balance,
            }),
            TransferOutcome::SenderMissing => Err(LedgerError::SenderNotFound(from)),
            TransferOutcome::Insufficient { balance } => Err(LedgerError::InsufficientFunds {
                account: from,
                balance,
                requested: amount,
            }),
            TransferOutcome::ReceiverMissing => Err(LedgerError::ReceiverNotFound(to)),
            TransferOutcome::ReceiverOverflow => Err(LedgerError::BalanceOverflow(to)),
        };
        let balances = result.inspect_err(log_rejection)?;

        tracing::info!("Transferred {} cents from account {} to {}", amount, from, to);
        Ok(balances)
    }

    // ========================
    // Queries
    // ========================

    /// Look up an account and its current balance.
    pub async fn show_balance(&self, account: AccountNumber) -> Result<Account, AppError> {
        let found = self
            .repo
            .get_account(account)
            .await?
            .ok_or(LedgerError::AccountNotFound(account));
        Ok(found.inspect_err(log_rejection)?)
    }

    /// All accounts, in account number order.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    // ========================
    // Dispatch
    // ========================

    /// Run one operator request and describe what happened.
    pub async fn execute(&self, op: Operation) -> Result<Outcome, AppError> {
        tracing::debug!("Executing {}", op.name());

        match op {
            Operation::CreateAccount {
                name,
                initial_deposit,
            } => self
                .create_account(&name, initial_deposit)
                .await
                .map(Outcome::AccountCreated),

            Operation::Deposit { account, amount } => {
                let balance = self.deposit(account, amount).await?;
                Ok(Outcome::Deposited {
                    account,
                    amount,
                    balance,
                })
            }

            Operation::Withdraw { account, amount } => {
                let balance = self.withdraw(account, amount).await?;
                Ok(Outcome::Withdrew {
                    account,
                    amount,
                    balance,
                })
            }

            Operation::Transfer { from, to, amount } => {
                let result = self.transfer(from, to, amount).await?;
                Ok(Outcome::Transferred {
                    from,
                    to,
                    amount,
                    from_balance: result.from_balance,
                    to_balance: result.to_balance,
                })
            }

            Operation::ShowBalance { account } => {
                self.show_balance(account).await.map(Outcome::Balance)
            }
        }
    }
}

fn log_rejection(err: &LedgerError) {
    tracing::warn!("Rejected: {}", err);
}
