use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_cents, Cents};

/// Account numbers are assigned by storage on insert.
pub type AccountNumber = i64;

/// A named holder of a non-negative balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub number: AccountNumber,
    /// Display name of the holder. Fixed at creation.
    pub name: String,
    /// Current balance in cents, never negative.
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(number: AccountNumber, name: String, balance: Cents, created_at: DateTime<Utc>) -> Self {
        Self {
            number,
            name,
            balance,
            created_at,
        }
    }

    pub fn covers(&self, amount: Cents) -> bool {
        self.balance >= amount
    }

    pub fn formatted_balance(&self) -> String {
        format_cents(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_is_inclusive() {
        let account = Account::new(1, "Alice".into(), 10000, Utc::now());
        assert!(account.covers(10000));
        assert!(account.covers(1));
        assert!(!account.covers(10001));
    }

    #[test]
    fn test_formatted_balance() {
        let account = Account::new(7, "Bob".into(), 5, Utc::now());
        assert_eq!(account.formatted_balance(), "0.05");
    }
}
