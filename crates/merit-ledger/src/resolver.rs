//! # Merit resolver
//!
//! The single source of truth for "which wallet scope does this operation
//! touch". Every write path consults it; no caller computes a scope on its
//! own, so the routing rules cannot drift apart across call sites.
//!
//! ## Rule table (evaluated in order)
//!
//! | # | Condition | Scope |
//! |---|-----------|-------|
//! | 1 | operation is `Fee` | global, even with no community |
//! | 2 | operation is `Withdrawal` | global, for every community |
//! | 3 | community is priority (flag or tag allow-list) | global |
//! | 4 | otherwise | the community's own scope |
//! | 5 | community required but absent | `CommunityRequired` |

use crate::config::RoutingConfig;
use merit_core::prelude::*;
use std::collections::HashSet;

/// The kind of write operation asking for a wallet scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Platform-level fee, never community-scoped
    Fee,
    /// Crediting accumulated content score; always lands in the shared pool
    Withdrawal,
    /// Community-scoped spending: votes, poll casts, creation costs
    Voting,
}

/// Pure routing function from (community, operation) to wallet scope
///
/// Holds no mutable state; safe for unlimited concurrent calls.
#[derive(Clone, Debug)]
pub struct MeritResolver {
    priority_tags: HashSet<String>,
}

impl MeritResolver {
    pub fn new(routing: RoutingConfig) -> Self {
        Self {
            priority_tags: routing.priority_type_tags,
        }
    }

    /// Resolve the wallet scope an operation must debit or credit
    pub fn wallet_scope(
        &self,
        community: Option<&Community>,
        operation: OperationKind,
    ) -> Result<WalletScope> {
        match operation {
            // Fees are platform-level. Withdrawals always land in the
            // shared pool; the cross-community bridging rule is
            // centralized here rather than scattered across callers.
            OperationKind::Fee | OperationKind::Withdrawal => Ok(WalletScope::Global),
            OperationKind::Voting => {
                let community = community.ok_or(LedgerError::CommunityRequired)?;
                if self.is_priority(community) {
                    Ok(WalletScope::Global)
                } else {
                    Ok(WalletScope::Community(community.id.clone()))
                }
            }
        }
    }

    /// Whether a community shares the global pool
    pub fn is_priority(&self, community: &Community) -> bool {
        community.is_priority || self.priority_tags.contains(&community.type_tag)
    }
}
