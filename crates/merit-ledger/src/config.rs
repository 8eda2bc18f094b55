//! Ledger configuration types
//!
//! All sections carry serde defaults so an embedding service can
//! deserialize a partial document and get sensible behavior.

use merit_core::types::UserRole;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete ledger configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Merit-routing settings
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Quota eligibility settings
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Commit retry bounds for transient storage failures
    #[serde(default)]
    pub commit_retry: CommitRetryConfig,

    /// Balance-changed event channel capacity
    #[serde(default)]
    pub events: EventConfig,
}

/// Routing configuration consumed by the merit resolver
///
/// The priority allow-list is injected here rather than hard-coded so it is
/// testable and environment-overridable.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Community type-tags routed to the shared global wallet scope
    #[serde(default)]
    pub priority_type_tags: HashSet<String>,
}

/// Quota eligibility configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Roles whose actions never draw from the renewable allowance
    #[serde(default)]
    pub excluded_roles: HashSet<UserRole>,
}

/// Bounded retry for transient commit failures
///
/// Only errors classified transient by `LedgerError::is_transient` are
/// retried; business rejections surface immediately.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitRetryConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts, multiplied by the attempt number
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    10
}

impl Default for CommitRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Balance-changed event channel settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default = "default_event_capacity")]
    pub channel_capacity: usize,
}

fn default_event_capacity() -> usize {
    256
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_event_capacity(),
        }
    }
}
