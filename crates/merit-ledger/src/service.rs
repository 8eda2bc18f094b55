//! # Wallet service
//!
//! The only component allowed to mutate wallets. Every mutation follows the
//! same pipeline: resolve the target scope, validate structure before
//! sufficiency, then commit the balance change and its transaction record
//! as one atomic unit, retrying only on transient storage failures. A
//! balance-changed event goes out after the commit, best-effort.

use crate::config::{CommitRetryConfig, LedgerConfig};
use crate::events::{BalanceChanged, BalanceEvents};
use crate::quota::QuotaAccounting;
use crate::resolver::{MeritResolver, OperationKind};
use merit_core::prelude::*;
use merit_storage::{LedgerStore, LedgerWrite};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// A request for the central `add_transaction` operation
#[derive(Clone, Debug)]
pub struct TransactionRequest {
    pub user_id: UserId,
    pub scope: WalletScope,
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub source_type: SourceType,
    pub reference_type: ReferenceType,
    pub reference_id: ReferenceId,
    /// Currency names for a lazily-created wallet
    pub currency: CurrencyNames,
    pub description: Option<String>,
}

/// A committed balance mutation with its log record
#[derive(Clone, Debug)]
pub struct CommittedTransaction {
    pub wallet: Wallet,
    pub transaction: Transaction,
}

/// Vote direction; downvotes never draw from quota
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

/// A vote (or poll cast) asking to be funded
#[derive(Clone, Debug)]
pub struct VoteRequest {
    pub user_id: UserId,
    pub role: UserRole,
    pub community_id: CommunityId,
    pub direction: VoteDirection,
    /// Total merit the vote moves
    pub amount: Amount,
    /// Explicit quota share requested by the caller; `None` lets the
    /// community's source policy split
    pub quota_requested: Option<Amount>,
    pub reference_type: ReferenceType,
    pub reference_id: ReferenceId,
    pub description: Option<String>,
    /// A user adding merit to their own post: a direct personal transfer,
    /// bypassing quota splitting and posting-mode restrictions
    pub author_top_up: bool,
    pub usage_kind: QuotaUsageKind,
}

/// How a vote was funded
#[derive(Clone, Debug)]
pub struct VoteFunding {
    /// Share drawn from the renewable allowance (no wallet mutation)
    pub quota_amount: Amount,
    /// Share debited from the standing balance
    pub wallet_amount: Amount,
    /// The wallet-share commit, when there was one
    pub committed: Option<CommittedTransaction>,
}

/// Crediting accumulated content score into a wallet
#[derive(Clone, Debug)]
pub struct WithdrawalRequest {
    pub user_id: UserId,
    /// Origin community, if any; withdrawals land in the global pool
    /// regardless
    pub community_id: Option<CommunityId>,
    pub amount: Amount,
    /// Must be one of the withdrawal reference types
    pub reference_type: ReferenceType,
    pub reference_id: ReferenceId,
    pub description: Option<String>,
    pub currency: CurrencyNames,
}

/// A community-scoped debit for creation costs and platform fees
#[derive(Clone, Debug)]
pub struct ChargeRequest {
    pub user_id: UserId,
    pub community_id: Option<CommunityId>,
    pub operation: OperationKind,
    pub amount: Amount,
    pub reference_type: ReferenceType,
    pub reference_id: ReferenceId,
    pub description: Option<String>,
}

/// Orchestrator for all wallet mutations
pub struct WalletService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn TimeSource>,
    quota: QuotaAccounting,
    resolver: MeritResolver,
    events: BalanceEvents,
    retry: CommitRetryConfig,
}

impl WalletService {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn TimeSource>, config: LedgerConfig) -> Self {
        let quota = QuotaAccounting::new(store.clone(), clock.clone(), config.quota);
        let resolver = MeritResolver::new(config.routing);
        let events = BalanceEvents::new(&config.events);
        Self {
            store,
            clock,
            quota,
            resolver,
            events,
            retry: config.commit_retry,
        }
    }

    pub fn resolver(&self) -> &MeritResolver {
        &self.resolver
    }

    pub fn quota(&self) -> &QuotaAccounting {
        &self.quota
    }

    /// Subscribe to committed balance changes
    pub fn subscribe(&self) -> broadcast::Receiver<BalanceChanged> {
        self.events.subscribe()
    }

    /// Current wallet for a (user, scope) pair, if one exists
    pub async fn wallet(&self, user: &UserId, scope: &WalletScope) -> Result<Option<Wallet>> {
        Ok(self
            .store
            .load_wallet(user, scope)
            .await?
            .map(|versioned| versioned.wallet))
    }

    /// Transaction history for a wallet, newest-first
    pub async fn transactions(
        &self,
        wallet_id: &WalletId,
        limit: usize,
        offset: usize,
    ) -> Result<TransactionPage> {
        self.store
            .transactions_by_wallet(wallet_id, limit, offset)
            .await
    }

    /// Total already credited for a (reference type, id) pair; callers use
    /// this to cap withdrawals before touching the ledger
    pub async fn withdrawn_total(
        &self,
        reference_type: ReferenceType,
        reference_id: &ReferenceId,
    ) -> Result<Amount> {
        self.store
            .sum_credits_by_reference(reference_type, reference_id)
            .await
    }

    /// The central atomic operation: load-or-create the wallet, apply the
    /// mutation, and commit balance plus log record as one unit
    pub async fn add_transaction(&self, request: TransactionRequest) -> Result<CommittedTransaction> {
        self.execute(request, None).await
    }

    /// Fund a vote or poll cast, splitting between quota and wallet
    ///
    /// Structural checks run before any sufficiency check: amount
    /// positivity, the downvote-quota guard (before any read), community
    /// existence, and posting mode. The split then follows the community's
    /// currency-source policy; `QuotaOnly` rejects rather than silently
    /// falling back to the wallet.
    pub async fn fund_vote(&self, request: VoteRequest) -> Result<VoteFunding> {
        if request.amount == 0 {
            return Err(LedgerError::InvalidAmount { amount: 0 });
        }
        // Downvotes never draw from quota; rejected before any read
        if request.direction == VoteDirection::Down
            && request.quota_requested.unwrap_or(0) > 0
        {
            return Err(LedgerError::QuotaNotAllowed {
                reason: "downvotes cannot draw from quota".to_string(),
            });
        }

        let community = self
            .store
            .community(&request.community_id)
            .await?
            .ok_or_else(|| LedgerError::CommunityNotFound(request.community_id.to_string()))?;

        if !request.author_top_up && !community.settings.voting_enabled {
            return Err(LedgerError::VotingDisabled(community.id.to_string()));
        }

        let scope = self
            .resolver
            .wallet_scope(Some(&community), OperationKind::Voting)?;

        let (quota_amount, wallet_amount) = if request.author_top_up
            || request.direction == VoteDirection::Down
        {
            (0, request.amount)
        } else {
            self.split_upvote(&request, &community).await?
        };

        tracing::debug!(
            user = %request.user_id,
            community = %community.id,
            %scope,
            quota_amount,
            wallet_amount,
            "vote funding split"
        );

        let usage = (quota_amount > 0).then(|| QuotaUsage {
            user_id: request.user_id.clone(),
            community_id: community.id.clone(),
            amount: quota_amount,
            kind: request.usage_kind,
            created_at: self.clock.now(),
        });

        if wallet_amount > 0 {
            // Quota usage rides inside the same commit as the wallet debit
            let committed = self
                .execute(
                    TransactionRequest {
                        user_id: request.user_id,
                        scope,
                        transaction_type: TransactionType::Debit,
                        amount: wallet_amount,
                        source_type: SourceType::Personal,
                        reference_type: request.reference_type,
                        reference_id: request.reference_id,
                        currency: community.settings.currency_names.clone(),
                        description: request.description,
                    },
                    usage,
                )
                .await?;
            Ok(VoteFunding {
                quota_amount,
                wallet_amount,
                committed: Some(committed),
            })
        } else {
            // Fully quota-funded: the standing balance is untouched, only
            // the consumption record is written
            if let Some(usage) = usage {
                self.store.record_quota_usage(usage).await?;
            }
            Ok(VoteFunding {
                quota_amount,
                wallet_amount,
                committed: None,
            })
        }
    }

    /// Credit accumulated content score into the (always global) pool wallet
    pub async fn withdraw(&self, request: WithdrawalRequest) -> Result<CommittedTransaction> {
        if !request.reference_type.is_withdrawal() {
            return Err(LedgerError::InvalidInput(format!(
                "{} is not a withdrawal reference type",
                request.reference_type.name()
            )));
        }

        let community = match &request.community_id {
            Some(id) => Some(
                self.store
                    .community(id)
                    .await?
                    .ok_or_else(|| LedgerError::CommunityNotFound(id.to_string()))?,
            ),
            None => None,
        };
        let scope = self
            .resolver
            .wallet_scope(community.as_ref(), OperationKind::Withdrawal)?;

        self.execute(
            TransactionRequest {
                user_id: request.user_id,
                scope,
                transaction_type: TransactionType::Credit,
                amount: request.amount,
                source_type: SourceType::Personal,
                reference_type: request.reference_type,
                reference_id: request.reference_id,
                currency: request.currency,
                description: request.description,
            },
            None,
        )
        .await
    }

    /// Debit a creation cost or platform fee from the resolver-chosen scope
    pub async fn charge(&self, request: ChargeRequest) -> Result<CommittedTransaction> {
        let community = match &request.community_id {
            Some(id) => Some(
                self.store
                    .community(id)
                    .await?
                    .ok_or_else(|| LedgerError::CommunityNotFound(id.to_string()))?,
            ),
            None => None,
        };
        let currency = community
            .as_ref()
            .map(|c| c.settings.currency_names.clone())
            .unwrap_or_default();
        let scope = self
            .resolver
            .wallet_scope(community.as_ref(), request.operation)?;

        self.execute(
            TransactionRequest {
                user_id: request.user_id,
                scope,
                transaction_type: TransactionType::Debit,
                amount: request.amount,
                source_type: SourceType::Personal,
                reference_type: request.reference_type,
                reference_id: request.reference_id,
                currency,
                description: request.description,
            },
            None,
        )
        .await
    }

    /// Unconditional admin grant
    pub async fn admin_credit(
        &self,
        user: UserId,
        scope: WalletScope,
        amount: Amount,
        reference_id: ReferenceId,
        description: Option<String>,
    ) -> Result<CommittedTransaction> {
        self.add_transaction(TransactionRequest {
            user_id: user,
            scope,
            transaction_type: TransactionType::Credit,
            amount,
            source_type: SourceType::Personal,
            reference_type: ReferenceType::AdminCredit,
            reference_id,
            currency: CurrencyNames::default(),
            description,
        })
        .await
    }

    /// Admin debit; still enforces `InsufficientBalance`
    pub async fn admin_debit(
        &self,
        user: UserId,
        scope: WalletScope,
        amount: Amount,
        reference_id: ReferenceId,
        description: Option<String>,
    ) -> Result<CommittedTransaction> {
        self.add_transaction(TransactionRequest {
            user_id: user,
            scope,
            transaction_type: TransactionType::Debit,
            amount,
            source_type: SourceType::Personal,
            reference_type: ReferenceType::AdminDebit,
            reference_id,
            currency: CurrencyNames::default(),
            description,
        })
        .await
    }

    /// Quota/wallet split for an upvote per the community's source policy
    async fn split_upvote(
        &self,
        request: &VoteRequest,
        community: &Community,
    ) -> Result<(Amount, Amount)> {
        let policy = community.settings.currency_source_policy;

        let quota_amount = match policy {
            CurrencySourcePolicy::WalletOnly => 0,
            CurrencySourcePolicy::QuotaOnly => {
                let remaining = self
                    .quota
                    .remaining(&request.user_id, request.role, community)
                    .await?;
                if request.amount > remaining {
                    // Strict: no silent fallback to the wallet
                    return Err(LedgerError::InsufficientQuota {
                        requested: request.amount,
                        remaining,
                    });
                }
                request.amount
            }
            CurrencySourcePolicy::Mixed => {
                let remaining = self
                    .quota
                    .remaining(&request.user_id, request.role, community)
                    .await?;
                match request.quota_requested {
                    Some(requested) => {
                        if requested > remaining {
                            return Err(LedgerError::InsufficientQuota {
                                requested,
                                remaining,
                            });
                        }
                        requested.min(request.amount)
                    }
                    None => request.amount.min(remaining),
                }
            }
        };
        Ok((quota_amount, request.amount - quota_amount))
    }

    /// Atomic load-or-create, mutate, commit pipeline with bounded retry
    /// on transient failures
    async fn execute(
        &self,
        request: TransactionRequest,
        quota_usage: Option<QuotaUsage>,
    ) -> Result<CommittedTransaction> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let now = self.clock.now();
            let (mut wallet, expected_version) = match self
                .store
                .load_wallet(&request.user_id, &request.scope)
                .await?
            {
                Some(versioned) => (versioned.wallet, Some(versioned.version)),
                None => (
                    // Lazy upsert-on-first-use
                    Wallet::new(
                        request.user_id.clone(),
                        request.scope.clone(),
                        request.currency.clone(),
                        0,
                        now,
                    ),
                    None,
                ),
            };

            // Business rejections abort with nothing written
            match request.transaction_type {
                TransactionType::Credit => wallet.add(request.amount, now)?,
                TransactionType::Debit => wallet.deduct(request.amount, now)?,
            }

            let transaction = Transaction::new(
                wallet.id,
                request.transaction_type,
                request.amount,
                request.source_type,
                request.reference_type,
                request.reference_id.clone(),
                request.description.clone(),
                now,
            )?;

            let write = LedgerWrite {
                wallet: wallet.clone(),
                expected_version,
                transaction: transaction.clone(),
                quota_usage: quota_usage.clone(),
            };

            match self.store.commit(write).await {
                Ok(()) => {
                    tracing::info!(
                        user = %wallet.user_id,
                        scope = %wallet.scope,
                        transaction = %transaction.id,
                        amount = request.amount,
                        balance = wallet.balance,
                        reference = transaction.reference_type.name(),
                        "transaction committed"
                    );
                    // Best-effort; never affects the committed write
                    self.events.emit(BalanceChanged {
                        wallet_id: wallet.id,
                        user_id: wallet.user_id.clone(),
                        scope: wallet.scope.clone(),
                        transaction_type: transaction.transaction_type,
                        amount: transaction.amount,
                        balance_after: wallet.balance,
                        reference_type: transaction.reference_type,
                        reference_id: transaction.reference_id.clone(),
                        occurred_at: now,
                    });
                    return Ok(CommittedTransaction {
                        wallet,
                        transaction,
                    });
                }
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    tracing::warn!(
                        user = %request.user_id,
                        scope = %request.scope,
                        attempt,
                        error = %err,
                        "transient commit failure, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(
                        self.retry.backoff_ms * attempt as u64,
                    ))
                    .await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
