//! Core type definitions for the Merit ledger
//!
//! Identifier newtypes and the wallet-scope routing key shared by every
//! other crate in the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Merit amounts are whole units; fractional merits are not modeled.
pub type Amount = u64;

/// UserId - identifier minted by the (external) account system
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CommunityId - identifier minted by the (external) community system
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommunityId(String);

impl CommunityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommunityId({})", self.0)
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WalletScope - the namespace a wallet balance belongs to
///
/// Either a specific community or the single shared global pool. Priority
/// communities route to `Global` instead of owning an independent balance;
/// that routing decision lives in the merit resolver, never here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum WalletScope {
    /// The single shared pool wallet scope
    Global,
    /// An independent per-community scope
    Community(CommunityId),
}

impl WalletScope {
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// The community this scope belongs to, if any
    pub fn community(&self) -> Option<&CommunityId> {
        match self {
            Self::Global => None,
            Self::Community(id) => Some(id),
        }
    }
}

impl fmt::Display for WalletScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Community(id) => write!(f, "community:{}", id),
        }
    }
}

/// WalletId - synthetic identifier assigned at wallet creation
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletId(Uuid);

impl WalletId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletId({})", self.0)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// TransactionId - synthetic identifier assigned at append time
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ReferenceId - identifier of the entity that caused a balance movement
///
/// Owned by the content model (publication, poll, vote, admin action);
/// opaque to the ledger.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceId(String);

impl ReferenceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceId({})", self.0)
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cosmetic currency display names (singular/plural/genitive)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyNames {
    pub singular: String,
    pub plural: String,
    pub genitive: String,
}

impl Default for CurrencyNames {
    fn default() -> Self {
        Self {
            singular: "merit".to_string(),
            plural: "merits".to_string(),
            genitive: "merits".to_string(),
        }
    }
}

impl CurrencyNames {
    pub fn new(
        singular: impl Into<String>,
        plural: impl Into<String>,
        genitive: impl Into<String>,
    ) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
            genitive: genitive.into(),
        }
    }

    /// Pick the display name for an amount (1 merit, 5 merits)
    pub fn for_amount(&self, amount: Amount) -> &str {
        if amount == 1 {
            &self.singular
        } else {
            &self.plural
        }
    }
}

/// UserRole - platform role consumed by quota eligibility checks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Member,
    Organizer,
    Admin,
}

impl UserRole {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Organizer => "organizer",
            Self::Admin => "admin",
        }
    }
}
