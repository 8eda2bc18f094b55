//! External community view
//!
//! The community content model lives outside the ledger; these are the
//! fields the ledger consumes for routing, quota windows, and display.

use crate::types::{Amount, CommunityId, CurrencyNames};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an upvote's funds may come from in this community
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencySourcePolicy {
    /// Quota first, wallet covers the remainder
    #[default]
    Mixed,
    /// Standing balance only; no quota draw
    WalletOnly,
    /// Renewable allowance only; rejected when quota cannot cover,
    /// never silently falls back to the wallet
    QuotaOnly,
}

/// Ledger-relevant community settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunitySettings {
    /// Size of the renewable daily allowance per user
    #[serde(default)]
    pub daily_emission: Amount,

    /// Cosmetic currency display names
    #[serde(default)]
    pub currency_names: CurrencyNames,

    /// Funding policy for upvotes
    #[serde(default)]
    pub currency_source_policy: CurrencySourcePolicy,

    /// Quota switched off entirely for this community
    #[serde(default = "default_true")]
    pub quota_enabled: bool,

    /// Posting mode: whether ordinary votes are accepted at all.
    /// Author top-ups bypass this restriction.
    #[serde(default = "default_true")]
    pub voting_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CommunitySettings {
    fn default() -> Self {
        Self {
            daily_emission: 0,
            currency_names: CurrencyNames::default(),
            currency_source_policy: CurrencySourcePolicy::default(),
            quota_enabled: true,
            voting_enabled: true,
        }
    }
}

/// The slice of a community the ledger reads
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,

    /// Classification tag; priority routing matches it against the
    /// configured allow-list
    pub type_tag: String,

    /// Explicit priority override, checked before the tag
    #[serde(default)]
    pub is_priority: bool,

    #[serde(default)]
    pub settings: CommunitySettings,

    /// Quota-window boundary; when unset the window opens at midnight UTC
    #[serde(default)]
    pub last_quota_reset_at: Option<DateTime<Utc>>,
}

impl Community {
    pub fn new(id: CommunityId, type_tag: impl Into<String>) -> Self {
        Self {
            id,
            type_tag: type_tag.into(),
            is_priority: false,
            settings: CommunitySettings::default(),
            last_quota_reset_at: None,
        }
    }

    pub fn with_daily_emission(mut self, emission: Amount) -> Self {
        self.settings.daily_emission = emission;
        self
    }

    pub fn with_priority(mut self, priority: bool) -> Self {
        self.is_priority = priority;
        self
    }

    pub fn with_source_policy(mut self, policy: CurrencySourcePolicy) -> Self {
        self.settings.currency_source_policy = policy;
        self
    }

    pub fn with_voting_enabled(mut self, enabled: bool) -> Self {
        self.settings.voting_enabled = enabled;
        self
    }
}
