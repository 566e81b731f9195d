use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{Account, AccountNumber, Cents, LedgerError, Operation, Outcome};

/// In-memory ledger with the same rules the database-backed service enforces.
///
/// `apply` never mutates `self`: it returns the next state alongside the result,
/// and a rejected operation hands back an unchanged copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    accounts: BTreeMap<AccountNumber, Account>,
    last_number: AccountNumber,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, number: AccountNumber) -> Option<&Account> {
        self.accounts.get(&number)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Sum of all balances.
    pub fn total(&self) -> i128 {
        self.accounts.values().map(|a| a.balance as i128).sum()
    }

    pub fn apply(&self, op: &Operation, now: DateTime<Utc>) -> (Ledger, Result<Outcome, LedgerError>) {
        let mut next = self.clone();
        match next.apply_in_place(op, now) {
            Ok(outcome) => (next, Ok(outcome)),
            Err(err) => (self.clone(), Err(err)),
        }
    }

    fn apply_in_place(&mut self, op: &Operation, now: DateTime<Utc>) -> Result<Outcome, LedgerError> {
        op.validate()?;

        match op {
            Operation::CreateAccount {
                name,
                initial_deposit,
            } => {
                self.last_number += 1;
                let account = Account::new(self.last_number, name.trim().to_string(), *initial_deposit, now);
                self.accounts.insert(account.number, account.clone());
                Ok(Outcome::AccountCreated(account))
            }

            Operation::Deposit { account, amount } => {
                let balance = self.credit(*account, *amount, LedgerError::AccountNotFound(*account))?;
                Ok(Outcome::Deposited {
                    account: *account,
                    amount: *amount,
                    balance,
                })
            }

            Operation::Withdraw { account, amount } => {
                let balance = self.debit(*account, *amount, LedgerError::AccountNotFound(*account))?;
                Ok(Outcome::Withdrew {
                    account: *account,
                    amount: *amount,
                    balance,
                })
            }

            Operation::Transfer { from, to, amount } => {
                // Both sides are checked before either balance moves.
                let sender = self
                    .accounts
                    .get(from)
                    .ok_or(LedgerError::SenderNotFound(*from))?;
                if !sender.covers(*amount) {
                    return Err(LedgerError::InsufficientFunds {
                        account: *from,
                        balance: sender.balance,
                        requested: *amount,
                    });
                }
                if !self.accounts.contains_key(to) {
                    return Err(LedgerError::ReceiverNotFound(*to));
                }

                let from_balance = self.debit(*from, *amount, LedgerError::SenderNotFound(*from))?;
                let to_balance = self.credit(*to, *amount, LedgerError::ReceiverNotFound(*to))?;
                // Self-transfers net to zero; report the final balance on both sides.
                let from_balance = if from == to { to_balance } else { from_balance };

                Ok(Outcome::Transferred {
                    from: *from,
                    to: *to,
                    amount: *amount,
                    from_balance,
                    to_balance,
                })
            }

            Operation::ShowBalance { account } => self
                .accounts
                .get(account)
                .cloned()
                .map(Outcome::Balance)
                .ok_or(LedgerError::AccountNotFound(*account)),
        }
    }

    fn credit(&mut self, number: AccountNumber, amount: Cents, missing: LedgerError) -> Result<Cents, LedgerError> {
        let account = self.accounts.get_mut(&number).ok_or(missing)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(number))?;
        Ok(account.balance)
    }

    fn debit(&mut self, number: AccountNumber, amount: Cents, missing: LedgerError) -> Result<Cents, LedgerError> {
        let account = self.accounts.get_mut(&number).ok_or(missing)?;
        if !account.covers(amount) {
            return Err(LedgerError::InsufficientFunds {
                account: number,
                balance: account.balance,
                requested: amount,
            });
        }
        account.balance -= amount;
        Ok(account.balance)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn create(name: &str, initial_deposit: Cents) -> Operation {
        Operation::CreateAccount {
            name: name.to_string(),
            initial_deposit,
        }
    }

    fn run(ledger: Ledger, op: Operation) -> (Ledger, Result<Outcome, LedgerError>) {
        ledger.apply(&op, Utc::now())
    }

    fn balance(ledger: &Ledger, number: AccountNumber) -> Cents {
        ledger.account(number).map(|a| a.balance).unwrap()
    }

    #[test]
    fn test_create_then_query_returns_initial_deposit() {
        let (ledger, result) = run(Ledger::new(), create("Alice", 10000));
        assert!(matches!(result, Ok(Outcome::AccountCreated(ref a)) if a.number == 1));

        let (_, result) = run(ledger, Operation::ShowBalance { account: 1 });
        match result {
            Ok(Outcome::Balance(account)) => assert_eq!(account.balance, 10000),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_account_numbers_increase() {
        let (ledger, _) = run(Ledger::new(), create("Alice", 0));
        let (ledger, _) = run(ledger, create("Bob", 0));
        let numbers: Vec<_> = ledger.accounts().map(|a| a.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_rejection_leaves_state_untouched() {
        let (ledger, _) = run(Ledger::new(), create("Alice", 5000));
        let before = ledger.clone();

        let (after, result) = run(ledger, Operation::Withdraw { account: 1, amount: 5001 });
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(after, before);
    }

    #[test]
    fn test_deposit_to_missing_account() {
        let (_, result) = run(Ledger::new(), Operation::Deposit { account: 42, amount: 100 });
        assert_eq!(result, Err(LedgerError::AccountNotFound(42)));
    }

    #[test]
    fn test_deposit_overflow_is_rejected() {
        let (ledger, _) = run(Ledger::new(), create("Whale", i64::MAX - 10));
        let (ledger, result) = run(ledger, Operation::Deposit { account: 1, amount: 11 });
        assert_eq!(result, Err(LedgerError::BalanceOverflow(1)));
        assert_eq!(balance(&ledger, 1), i64::MAX - 10);
    }

    #[test]
    fn test_transfer_rejection_order() {
        let (ledger, _) = run(Ledger::new(), create("Alice", 100));

        // Missing sender wins over a missing receiver.
        let (ledger, result) = run(ledger, Operation::Transfer { from: 8, to: 9, amount: 1 });
        assert_eq!(result, Err(LedgerError::SenderNotFound(8)));

        // Insufficient funds wins over a missing receiver.
        let (ledger, result) = run(ledger, Operation::Transfer { from: 1, to: 9, amount: 101 });
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { account: 1, .. })));

        let (ledger, result) = run(ledger, Operation::Transfer { from: 1, to: 9, amount: 100 });
        assert_eq!(result, Err(LedgerError::ReceiverNotFound(9)));
        assert_eq!(balance(&ledger, 1), 100);
    }

    #[test]
    fn test_self_transfer_is_a_no_op() {
        let (ledger, _) = run(Ledger::new(), create("Alice", 100));
        let (ledger, result) = run(ledger, Operation::Transfer { from: 1, to: 1, amount: 60 });
        assert!(matches!(
            result,
            Ok(Outcome::Transferred {
                from_balance: 100,
                to_balance: 100,
                ..
            })
        ));
        assert_eq!(balance(&ledger, 1), 100);
    }

    #[test]
    fn test_reference_scenario() {
        let (ledger, _) = run(Ledger::new(), create("Alice", 10000));
        let (ledger, _) = run(ledger, Operation::Deposit { account: 1, amount: 5000 });
        assert_eq!(balance(&ledger, 1), 15000);

        let (ledger, result) = run(ledger, Operation::Withdraw { account: 1, amount: 20000 });
        assert!(result.is_err());
        assert_eq!(balance(&ledger, 1), 15000);

        let (ledger, result) = run(ledger, Operation::Transfer { from: 1, to: 9999, amount: 15000 });
        assert_eq!(result, Err(LedgerError::ReceiverNotFound(9999)));
        assert_eq!(balance(&ledger, 1), 15000);

        let (ledger, _) = run(ledger, create("Bob", 0));
        let (ledger, result) = run(ledger, Operation::Transfer { from: 1, to: 2, amount: 10000 });
        assert!(result.is_ok());
        assert_eq!(balance(&ledger, 1), 5000);
        assert_eq!(balance(&ledger, 2), 10000);
    }

    fn arb_operation() -> impl Strategy<Value = Operation> {
        prop_oneof![
            (-100i64..10_000).prop_map(|d| create("holder", d)),
            (1i64..6, -100i64..10_000).prop_map(|(account, amount)| Operation::Deposit { account, amount }),
            (1i64..6, -100i64..10_000).prop_map(|(account, amount)| Operation::Withdraw { account, amount }),
            (1i64..6, 1i64..6, -100i64..10_000)
                .prop_map(|(from, to, amount)| Operation::Transfer { from, to, amount }),
            (1i64..6).prop_map(|account| Operation::ShowBalance { account }),
        ]
    }

    proptest! {
        #[test]
        fn prop_balances_never_go_negative(ops in prop::collection::vec(arb_operation(), 0..60)) {
            let mut ledger = Ledger::new();
            for op in &ops {
                let (next, _) = ledger.apply(op, Utc::now());
                ledger = next;
                prop_assert!(ledger.accounts().all(|a| a.balance >= 0));
            }
        }

        #[test]
        fn prop_only_money_movement_changes_total(ops in prop::collection::vec(arb_operation(), 0..60)) {
            let mut ledger = Ledger::new();
            for op in &ops {
                let before = ledger.total();
                let (next, result) = ledger.apply(op, Utc::now());
                let expected = match (op, &result) {
                    (Operation::CreateAccount { initial_deposit, .. }, Ok(_)) => before + *initial_deposit as i128,
                    (Operation::Deposit { amount, .. }, Ok(_)) => before + *amount as i128,
                    (Operation::Withdraw { amount, .. }, Ok(_)) => before - *amount as i128,
                    _ => before,
                };
                prop_assert_eq!(next.total(), expected);
                ledger = next;
            }
        }
    }
}
