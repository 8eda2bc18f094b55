//! # Quota accounting
//!
//! Computes how much of the renewable daily allowance a user has left in a
//! community. Usage is the sum of quota-sourced consumption records since
//! the community's window boundary: `last_quota_reset_at` when set,
//! otherwise midnight UTC of the current day.
//!
//! Reads here are advisory; two concurrent requests may each see enough
//! quota and together exceed it slightly. The final wallet deduct cannot
//! itself overdraw, which bounds the damage.

use crate::config::QuotaConfig;
use chrono::{DateTime, Utc};
use merit_core::prelude::*;
use merit_storage::LedgerStore;
use std::collections::HashSet;
use std::sync::Arc;

/// Read-only quota computation over the store
#[derive(Clone)]
pub struct QuotaAccounting {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn TimeSource>,
    excluded_roles: HashSet<UserRole>,
}

impl QuotaAccounting {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn TimeSource>, config: QuotaConfig) -> Self {
        Self {
            store,
            clock,
            excluded_roles: config.excluded_roles,
        }
    }

    /// The boundary of the current quota window for a community
    pub fn window_start(&self, community: &Community) -> DateTime<Utc> {
        community
            .last_quota_reset_at
            .unwrap_or_else(|| midnight_utc(self.clock.now()))
    }

    /// Whether quota applies at all for this (role, community) pair
    pub fn is_eligible(&self, role: UserRole, community: &Community) -> bool {
        community.settings.daily_emission > 0
            && community.settings.quota_enabled
            && !self.excluded_roles.contains(&role)
    }

    /// Remaining renewable allowance, floored at zero
    ///
    /// Returns 0 without touching the store when the allowance is zero,
    /// quota is disabled for the community, or the role is excluded.
    pub async fn remaining(
        &self,
        user: &UserId,
        role: UserRole,
        community: &Community,
    ) -> Result<Amount> {
        if !self.is_eligible(role, community) {
            return Ok(0);
        }
        let since = self.window_start(community);
        let used = self
            .store
            .quota_used_since(user, &community.id, since)
            .await?;
        tracing::debug!(
            user = %user,
            community = %community.id,
            used,
            emission = community.settings.daily_emission,
            "quota window computed"
        );
        Ok(community.settings.daily_emission.saturating_sub(used))
    }
}
