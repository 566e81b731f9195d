use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::domain::{Account, AccountNumber, Cents};

use super::MIGRATION_001_ACCOUNTS;

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a conditional increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    Applied { balance: Cents },
    Missing,
    Overflow,
}

/// Result of a conditional decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Applied { balance: Cents },
    Missing,
    Insufficient { balance: Cents },
}

/// Result of an atomic transfer. Anything but `Applied` was rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Applied { from_balance: Cents, to_balance: Cents },
    SenderMissing,
    Insufficient { balance: Cents },
    ReceiverMissing,
    ReceiverOverflow,
}

/// Repository for persisting and mutating accounts.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool against an existing database.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?;
        Self::connect_with(options, max_connections).await
    }

    /// Open a pool, creating the database file when it is missing, and migrate it.
    pub async fn init(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);
        let repo = Self::connect_with(options, max_connections).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    async fn connect_with(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options.busy_timeout(BUSY_TIMEOUT))
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_ACCOUNTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Wait for checked-out connections to come back and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Account records
    // ========================

    /// Insert a new account. Storage assigns the account number.
    pub async fn insert_account(
        &self,
        name: &str,
        balance: Cents,
        created_at: DateTime<Utc>,
    ) -> Result<Account> {
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (name, balance, created_at)
            VALUES (?, ?, ?)
            RETURNING account_number
            "#,
        )
        .bind(name)
        .bind(balance)
        .bind(created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert account")?;

        Ok(Account::new(row.get("account_number"), name.to_string(), balance, created_at))
    }

    /// Get an account by number.
    pub async fn get_account(&self, number: AccountNumber) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT account_number, name, balance, created_at
            FROM accounts
            WHERE account_number = ?
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// List all accounts in number order.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT account_number, name, balance, created_at
            FROM accounts
            ORDER BY account_number
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            number: row.get("account_number"),
            name: row.get("name"),
            balance: row.get("balance"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Balance mutations
    // ========================

    /// Increment a balance with a single statement.
    pub async fn deposit(&self, number: AccountNumber, amount: Cents) -> Result<CreditOutcome> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;
        credit(&mut conn, number, amount).await
    }

    /// Decrement a balance if it covers `amount`. The check and the write are one statement.
    pub async fn withdraw(&self, number: AccountNumber, amount: Cents) -> Result<DebitOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let outcome = debit(&mut tx, number, amount).await?;
        match outcome {
            DebitOutcome::Applied { .. } => tx.commit().await.context("Failed to commit withdrawal")?,
            _ => tx.rollback().await.context("Failed to roll back withdrawal")?,
        }
        Ok(outcome)
    }

    /// Move `amount` between two accounts in one transaction.
    ///
    /// The sender is debited first, which takes SQLite's write lock, so no other
    /// writer can interleave between the funds check and the credit.
    pub async fn transfer(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: Cents,
    ) -> Result<TransferOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let from_balance = match debit(&mut tx, from, amount).await? {
            DebitOutcome::Applied { balance } => balance,
            DebitOutcome::Missing => {
                tx.rollback().await.context("Failed to roll back transfer")?;
                return Ok(TransferOutcome::SenderMissing);
            }
            DebitOutcome::Insufficient { balance } => {
                tx.rollback().await.context("Failed to roll back transfer")?;
                return Ok(TransferOutcome::Insufficient { balance });
            }
        };

        let to_balance = match credit(&mut tx, to, amount).await? {
            CreditOutcome::Applied { balance } => balance,
            CreditOutcome::Missing => {
                tx.rollback().await.context("Failed to roll back transfer")?;
                return Ok(TransferOutcome::ReceiverMissing);
            }
            CreditOutcome::Overflow => {
                tx.rollback().await.context("Failed to roll back transfer")?;
                return Ok(TransferOutcome::ReceiverOverflow);
            }
        };

        tx.commit().await.context("Failed to commit transfer")?;

        let from_balance = if from == to { to_balance } else { from_balance };
        Ok(TransferOutcome::Applied {
            from_balance,
            to_balance,
        })
    }
}

async fn current_balance(conn: &mut SqliteConnection, number: AccountNumber) -> Result<Option<Cents>> {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE account_number = ?")
        .bind(number)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to read balance")
}

async fn credit(conn: &mut SqliteConnection, number: AccountNumber, amount: Cents) -> Result<CreditOutcome> {
    // SQLite silently turns an overflowing integer sum into a REAL, so cap it here.
    let row = sqlx::query(
        r#"
        UPDATE accounts
        SET balance = balance + ?
        WHERE account_number = ? AND balance <= ?
        RETURNING balance
        "#,
    )
    .bind(amount)
    .bind(number)
    .bind(Cents::MAX - amount)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to credit account")?;

    if let Some(row) = row {
        return Ok(CreditOutcome::Applied {
            balance: row.get("balance"),
        });
    }

    Ok(match current_balance(conn, number).await? {
        Some(_) => CreditOutcome::Overflow,
        None => CreditOutcome::Missing,
    })
}

async fn debit(conn: &mut SqliteConnection, number: AccountNumber, amount: Cents) -> Result<DebitOutcome> {
    let row = sqlx::query(
        r#"
        UPDATE accounts
        SET balance = balance - ?
        WHERE account_number = ? AND balance >= ?
        RETURNING balance
        "#,
    )
    .bind(amount)
    .bind(number)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to debit account")?;

    if let Some(row) = row {
        return Ok(DebitOutcome::Applied {
            balance: row.get("balance"),
        });
    }

    Ok(match current_balance(conn, number).await? {
        Some(balance) => DebitOutcome::Insufficient { balance },
        None => DebitOutcome::Missing,
    })
}
