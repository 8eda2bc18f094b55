//! Balance-changed event fan-out
//!
//! Emitted after a commit succeeds. Delivery is best-effort: a lagging or
//! absent subscriber never affects the financial write that already
//! committed.

use crate::config::EventConfig;
use chrono::{DateTime, Utc};
use merit_core::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Notification that a wallet balance moved
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceChanged {
    pub wallet_id: WalletId,
    pub user_id: UserId,
    pub scope: WalletScope,
    pub transaction_type: TransactionType,
    pub amount: Amount,
    /// Balance after the committed mutation
    pub balance_after: Amount,
    pub reference_type: ReferenceType,
    pub reference_id: ReferenceId,
    pub occurred_at: DateTime<Utc>,
}

/// Broadcast channel for balance-changed events
#[derive(Clone)]
pub struct BalanceEvents {
    sender: broadcast::Sender<BalanceChanged>,
}

impl BalanceEvents {
    pub fn new(config: &EventConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BalanceChanged> {
        self.sender.subscribe()
    }

    /// Best-effort emit; having no subscribers is not an error
    pub fn emit(&self, event: BalanceChanged) {
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(receivers, "balance-changed event emitted");
            }
            Err(_) => {
                tracing::debug!("balance-changed event dropped (no subscribers)");
            }
        }
    }
}

impl Default for BalanceEvents {
    fn default() -> Self {
        Self::new(&EventConfig::default())
    }
}
