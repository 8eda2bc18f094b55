//! # Quota reset
//!
//! Administrative operation that slides a community's quota-window boundary
//! forward to "now". Historical transactions and usage records are never
//! altered; only future window computations change. Each call is a fresh
//! reset, so calling twice in a row is safe.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use merit_core::prelude::*;
use merit_storage::LedgerStore;
use std::sync::Arc;

/// Downstream notification fan-out after a reset
///
/// External collaborator; a failure here must never fail the reset itself.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    /// Notify community members that their allowance renewed; returns how
    /// many notifications were created
    async fn notify_members(
        &self,
        community_id: &CommunityId,
        reset_at: DateTime<Utc>,
    ) -> Result<usize>;
}

/// Notifier that does nothing (fan-out disabled)
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl ResetNotifier for NoopNotifier {
    async fn notify_members(&self, _: &CommunityId, _: DateTime<Utc>) -> Result<usize> {
        Ok(0)
    }
}

/// Outcome of a quota reset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotaResetOutcome {
    pub reset_at: DateTime<Utc>,
    pub notifications_created: usize,
}

/// Administrative quota-reset service
pub struct QuotaResetService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn TimeSource>,
    notifier: Arc<dyn ResetNotifier>,
}

impl QuotaResetService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn TimeSource>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
        }
    }

    /// Advance the community's reset timestamp to now and fan out
    /// notifications best-effort
    ///
    /// The reset succeeds or fails strictly on the timestamp write.
    pub async fn reset_quota_for_community(
        &self,
        community_id: &CommunityId,
    ) -> Result<QuotaResetOutcome> {
        let reset_at = self.clock.now();
        self.store
            .set_last_quota_reset(community_id, reset_at)
            .await?;
        tracing::info!(community = %community_id, %reset_at, "quota window reset");

        let notifications_created = match self
            .notifier
            .notify_members(community_id, reset_at)
            .await
        {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(
                    community = %community_id,
                    error = %err,
                    "reset notification fan-out failed"
                );
                0
            }
        };

        Ok(QuotaResetOutcome {
            reset_at,
            notifications_created,
        })
    }
}
