use std::fmt;

use thiserror::Error;

use super::{format_cents, Account, AccountNumber, Cents};

/// A single request the operator can make against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateAccount {
        name: String,
        initial_deposit: Cents,
    },
    Deposit {
        account: AccountNumber,
        amount: Cents,
    },
    Withdraw {
        account: AccountNumber,
        amount: Cents,
    },
    Transfer {
        from: AccountNumber,
        to: AccountNumber,
        amount: Cents,
    },
    ShowBalance {
        account: AccountNumber,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateAccount { .. } => "create_account",
            Operation::Deposit { .. } => "deposit",
            Operation::Withdraw { .. } => "withdraw",
            Operation::Transfer { .. } => "transfer",
            Operation::ShowBalance { .. } => "show_balance",
        }
    }

    /// Checks that need no stored state. Runs before any store access.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match self {
            Operation::CreateAccount {
                name,
                initial_deposit,
            } => validate_opening(name, *initial_deposit),
            Operation::Deposit { amount, .. } => validate_amount("deposit", *amount),
            Operation::Withdraw { amount, .. } => validate_amount("withdraw", *amount),
            Operation::Transfer { amount, .. } => validate_amount("transfer", *amount),
            Operation::ShowBalance { .. } => Ok(()),
        }
    }
}

/// A new account needs a non-blank name and a deposit of zero or more.
pub fn validate_opening(name: &str, initial_deposit: Cents) -> Result<(), LedgerError> {
    if name.trim().is_empty() {
        return Err(LedgerError::EmptyName);
    }
    if initial_deposit < 0 {
        return Err(LedgerError::InvalidAmount(format!(
            "initial deposit cannot be negative ({})",
            format_cents(initial_deposit)
        )));
    }
    Ok(())
}

/// Deposits, withdrawals and transfers must move a strictly positive amount.
pub fn validate_amount(action: &str, amount: Cents) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(format!(
            "cannot {} {}, amount must be positive",
            action,
            format_cents(amount)
        )));
    }
    Ok(())
}

fn money(cents: &Cents) -> String {
    format_cents(*cents)
}

/// Rejections reported to the operator. None of them leaves a partial write behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Account name cannot be empty")]
    EmptyName,

    #[error("Account not found: {0}")]
    AccountNotFound(AccountNumber),

    #[error("Sender account not found: {0}")]
    SenderNotFound(AccountNumber),

    #[error("Receiver account not found: {0}")]
    ReceiverNotFound(AccountNumber),

    #[error(
        "Insufficient balance in account {account}: balance {}, requested {}",
        money(.balance),
        money(.requested)
    )]
    InsufficientFunds {
        account: AccountNumber,
        balance: Cents,
        requested: Cents,
    },

    #[error("Balance of account {0} would exceed the largest representable amount")]
    BalanceOverflow(AccountNumber),
}

/// What a successful operation did, rendered as console status text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    AccountCreated(Account),
    Deposited {
        account: AccountNumber,
        amount: Cents,
        balance: Cents,
    },
    Withdrew {
        account: AccountNumber,
        amount: Cents,
        balance: Cents,
    },
    Transferred {
        from: AccountNumber,
        to: AccountNumber,
        amount: Cents,
        from_balance: Cents,
        to_balance: Cents,
    },
    Balance(Account),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::AccountCreated(account) => write!(
                f,
                "Account created successfully! Account number: {} ({}, balance {})",
                account.number,
                account.name,
                account.formatted_balance()
            ),
            Outcome::Deposited {
                account,
                amount,
                balance,
            } => write!(
                f,
                "Deposit successful! {} added to account {}, new balance {}",
                format_cents(*amount),
                account,
                format_cents(*balance)
            ),
            Outcome::Withdrew {
                account,
                amount,
                balance,
            } => write!(
                f,
                "Withdrawal successful! {} taken from account {}, new balance {}",
                format_cents(*amount),
                account,
                format_cents(*balance)
            ),
            Outcome::Transferred {
                from,
                to,
                amount,
                from_balance,
                to_balance,
            } => write!(
                f,
                "Transfer successful! {} moved from account {} ({}) to account {} ({})",
                format_cents(*amount),
                from,
                format_cents(*from_balance),
                to,
                format_cents(*to_balance)
            ),
            Outcome::Balance(account) => write!(
                f,
                "Balance: {} (account {}, {})",
                account.formatted_balance(),
                account.number,
                account.name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_zero_and_negative_amounts_are_rejected() {
        for amount in [0, -1, -10000] {
            let ops = [
                Operation::Deposit { account: 1, amount },
                Operation::Withdraw { account: 1, amount },
                Operation::Transfer {
                    from: 1,
                    to: 2,
                    amount,
                },
            ];
            for op in ops {
                assert!(
                    matches!(op.validate(), Err(LedgerError::InvalidAmount(_))),
                    "{} of {} should be rejected",
                    op.name(),
                    amount
                );
            }
        }
    }

    #[test]
    fn test_zero_initial_deposit_is_allowed() {
        let op = Operation::CreateAccount {
            name: "Bob".into(),
            initial_deposit: 0,
        };
        assert_eq!(op.validate(), Ok(()));
    }

    #[test]
    fn test_negative_initial_deposit_is_rejected() {
        let op = Operation::CreateAccount {
            name: "Bob".into(),
            initial_deposit: -1,
        };
        assert!(matches!(op.validate(), Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let op = Operation::CreateAccount {
            name: "   ".into(),
            initial_deposit: 100,
        };
        assert_eq!(op.validate(), Err(LedgerError::EmptyName));
    }

    #[test]
    fn test_show_balance_needs_no_validation() {
        assert_eq!(Operation::ShowBalance { account: -4 }.validate(), Ok(()));
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = LedgerError::InsufficientFunds {
            account: 1,
            balance: 15000,
            requested: 20000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance in account 1: balance 150.00, requested 200.00"
        );
    }

    #[test]
    fn test_outcome_messages() {
        let created = Outcome::AccountCreated(Account::new(3, "Alice".into(), 10000, Utc::now()));
        assert!(created.to_string().starts_with("Account created successfully! Account number: 3"));

        let balance = Outcome::Balance(Account::new(3, "Alice".into(), 15000, Utc::now()));
        assert_eq!(balance.to_string(), "Balance: 150.00 (account 3, Alice)");
    }
}
