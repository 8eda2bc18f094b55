//! # Merit Ledger
//!
//! Orchestration layer of the merit accounting subsystem:
//!
//! - `MeritResolver` - the single source of truth for which wallet scope an
//!   operation debits or credits
//! - `QuotaAccounting` - remaining renewable daily allowance per
//!   (user, community, window)
//! - `WalletService` - the only component allowed to mutate wallets; every
//!   mutation is one atomic balance-change-plus-log-record unit
//! - `QuotaResetService` - administrative window resets with best-effort
//!   notification fan-out
//!
//! ```text
//!   caller (vote / publication / poll / withdrawal flow)
//!      │ which scope?          how much quota left?
//!      ▼                       ▼
//!   MeritResolver          QuotaAccounting
//!      │                       │
//!      └──────► WalletService ◄┘
//!                  │ commit (both writes or neither)
//!                  ▼
//!              LedgerStore        ──► BalanceChanged events
//! ```

pub mod config;
pub mod events;
pub mod quota;
pub mod reset;
pub mod resolver;
pub mod service;

pub use config::{CommitRetryConfig, EventConfig, LedgerConfig, QuotaConfig, RoutingConfig};
pub use events::{BalanceChanged, BalanceEvents};
pub use quota::QuotaAccounting;
pub use reset::{NoopNotifier, QuotaResetOutcome, QuotaResetService, ResetNotifier};
pub use resolver::{MeritResolver, OperationKind};
pub use service::{
    ChargeRequest, CommittedTransaction, TransactionRequest, VoteDirection, VoteFunding,
    VoteRequest, WalletService, WithdrawalRequest,
};
