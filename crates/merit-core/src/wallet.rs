//! # Wallet aggregate
//!
//! One balance for one (user, wallet-scope) pair. Pure data plus
//! invariant-preserving operations; persistence and atomicity belong to
//! the wallet service and storage layer.
//!
//! ## Invariants
//!
//! - `balance >= 0` at all times (structural: balances are unsigned and
//!   `deduct` refuses to underflow)
//! - exactly one wallet per (user, scope) pair, created lazily on first use
//! - every mutation stamps `updated_at`

use crate::error::{LedgerError, Result};
use crate::types::{Amount, CurrencyNames, UserId, WalletId, WalletScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's balance in one wallet scope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Synthetic id assigned at creation
    pub id: WalletId,

    /// Owning user
    pub user_id: UserId,

    /// Scope the balance belongs to (community or global pool)
    pub scope: WalletScope,

    /// Current balance in whole merit units
    pub balance: Amount,

    /// Cosmetic display names for the currency
    pub currency: CurrencyNames,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Stamped on every balance mutation
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a new wallet. Pure construction, always succeeds.
    pub fn new(
        user_id: UserId,
        scope: WalletScope,
        currency: CurrencyNames,
        initial_balance: Amount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WalletId::generate(),
            user_id,
            scope,
            balance: initial_balance,
            currency,
            created_at: now,
            updated_at: now,
        }
    }

    /// Increase the balance, refusing to overflow
    pub fn add(&mut self, amount: Amount, now: DateTime<Utc>) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                balance: self.balance,
                amount,
            })?;
        self.updated_at = now;
        Ok(())
    }

    /// Decrease the balance, refusing to underflow
    pub fn deduct(&mut self, amount: Amount, now: DateTime<Utc>) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }
        if amount > self.balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.updated_at = now;
        Ok(())
    }

    /// Pure affordability predicate
    pub fn can_afford(&self, amount: Amount) -> bool {
        self.balance >= amount
    }

    /// Human-readable balance using the cosmetic currency names
    pub fn display_balance(&self) -> String {
        format!("{} {}", self.balance, self.currency.for_amount(self.balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(balance: Amount) -> Wallet {
        Wallet::new(
            UserId::new("u1"),
            WalletScope::Global,
            CurrencyNames::default(),
            balance,
            Utc::now(),
        )
    }

    #[test]
    fn test_add_and_deduct() {
        let mut w = wallet(0);
        w.add(10, Utc::now()).unwrap();
        assert_eq!(w.balance, 10);

        w.deduct(4, Utc::now()).unwrap();
        assert_eq!(w.balance, 6);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut w = wallet(10);
        assert_eq!(
            w.add(0, Utc::now()),
            Err(LedgerError::InvalidAmount { amount: 0 })
        );
        assert_eq!(
            w.deduct(0, Utc::now()),
            Err(LedgerError::InvalidAmount { amount: 0 })
        );
        assert_eq!(w.balance, 10);
    }

    #[test]
    fn test_overdraw_rejected_with_amounts() {
        let mut w = wallet(10);
        let err = w.deduct(15, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                requested: 15,
                available: 10
            }
        );
        // Failed deduct leaves the balance untouched
        assert_eq!(w.balance, 10);
    }

    #[test]
    fn test_credit_overflow_rejected() {
        let mut w = wallet(Amount::MAX - 1);
        let err = w.add(2, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::BalanceOverflow {
                balance: Amount::MAX - 1,
                amount: 2
            }
        );
        // Rejected credit leaves the balance untouched
        assert_eq!(w.balance, Amount::MAX - 1);

        // The exact remaining headroom still fits
        w.add(1, Utc::now()).unwrap();
        assert_eq!(w.balance, Amount::MAX);
    }

    #[test]
    fn test_can_afford() {
        let w = wallet(10);
        assert!(w.can_afford(10));
        assert!(w.can_afford(0));
        assert!(!w.can_afford(11));
    }

    #[test]
    fn test_mutation_stamps_updated_at() {
        let created = Utc::now();
        let mut w = wallet(5);
        let later = created + chrono::Duration::seconds(60);
        w.add(1, later).unwrap();
        assert_eq!(w.updated_at, later);
    }

    #[test]
    fn test_display_balance() {
        let mut w = wallet(1);
        assert_eq!(w.display_balance(), "1 merit");
        w.add(4, Utc::now()).unwrap();
        assert_eq!(w.display_balance(), "5 merits");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Add(Amount),
            Deduct(Amount),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u64..1_000).prop_map(Op::Add),
                (0u64..1_000).prop_map(Op::Deduct),
            ]
        }

        proptest! {
            /// Balance never underflows and always equals the sum of the
            /// operations that succeeded.
            #[test]
            fn balance_tracks_successful_ops(
                initial in 0u64..1_000,
                ops in prop::collection::vec(op_strategy(), 0..64),
            ) {
                let mut w = wallet(initial);
                let mut expected = initial as i128;

                for op in ops {
                    match op {
                        Op::Add(amount) => {
                            if w.add(amount, Utc::now()).is_ok() {
                                expected += amount as i128;
                            }
                        }
                        Op::Deduct(amount) => {
                            if w.deduct(amount, Utc::now()).is_ok() {
                                expected -= amount as i128;
                            }
                        }
                    }
                    prop_assert!(expected >= 0);
                    prop_assert_eq!(w.balance as i128, expected);
                }
            }
        }
    }
}
