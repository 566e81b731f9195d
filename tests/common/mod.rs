// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use teller::application::LedgerService;
use teller::config::DatabaseConfig;
use teller::domain::{AccountNumber, Cents};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::init(&test_config(&temp_dir)).await?;
    Ok((service, temp_dir))
}

/// Database settings pointing at a file inside `temp_dir`
pub fn test_config(temp_dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig::sqlite_file(temp_dir.path().join("test.db"))
}

/// Current balance of an account that is known to exist
pub async fn balance_of(service: &LedgerService, account: AccountNumber) -> Result<Cents> {
    Ok(service.show_balance(account).await?.balance)
}

/// Test fixture: the two holders used by most scenarios
pub struct StandardAccounts {
    pub alice: AccountNumber,
    pub bob: AccountNumber,
}

impl StandardAccounts {
    /// Alice opens with 100.00, Bob with nothing
    pub async fn create(service: &LedgerService) -> Result<Self> {
        let alice = service.create_account("Alice", 10000).await?.number;
        let bob = service.create_account("Bob", 0).await?.number;
        Ok(Self { alice, bob })
    }
}
