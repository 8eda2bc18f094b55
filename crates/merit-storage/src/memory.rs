//! In-memory reference implementation of the storage contract
//!
//! A single `parking_lot::RwLock` over the whole state makes the commit's
//! both-writes-or-neither guarantee trivial: every commit holds the write
//! lock for its full duration, so commit order is lock-acquisition order
//! and `transactions_by_wallet` observes it.

use crate::store::{LedgerStore, LedgerWrite, Version, VersionedWallet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use merit_core::prelude::*;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct StoreInner {
    /// Wallet rows with their optimistic-concurrency version
    wallets: HashMap<(UserId, WalletScope), (Wallet, Version)>,
    /// WalletId -> owning (user, scope) key
    wallet_keys: HashMap<WalletId, (UserId, WalletScope)>,
    /// Append-only, insertion order = commit order
    transactions: Vec<Transaction>,
    /// Append-only quota consumption records
    quota_usage: Vec<QuotaUsage>,
    communities: HashMap<CommunityId, Community>,
}

/// In-memory ledger store
///
/// `fail_next_commit` injects a transient failure into the next commit
/// before anything is applied, for atomicity tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
    fail_next_commit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with `StorageUnavailable`, atomically
    /// (nothing is applied)
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Total transaction records across all wallets (test observability)
    pub fn transaction_count(&self) -> usize {
        self.inner.read().transactions.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load_wallet(
        &self,
        user: &UserId,
        scope: &WalletScope,
    ) -> Result<Option<VersionedWallet>> {
        let inner = self.inner.read();
        Ok(inner
            .wallets
            .get(&(user.clone(), scope.clone()))
            .map(|(wallet, version)| VersionedWallet {
                wallet: wallet.clone(),
                version: *version,
            }))
    }

    async fn wallet_by_id(&self, id: &WalletId) -> Result<Option<Wallet>> {
        let inner = self.inner.read();
        Ok(inner
            .wallet_keys
            .get(id)
            .and_then(|key| inner.wallets.get(key))
            .map(|(wallet, _)| wallet.clone()))
    }

    async fn commit(&self, write: LedgerWrite) -> Result<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::StorageUnavailable(
                "injected commit failure".to_string(),
            ));
        }

        let mut inner = self.inner.write();
        let key = (write.wallet.user_id.clone(), write.wallet.scope.clone());

        match (inner.wallets.get(&key), write.expected_version) {
            // Update: version must not have moved since the read
            (Some((_, stored)), Some(expected)) if *stored == expected => {}
            // Insert: no row may exist yet
            (None, None) => {}
            (stored, _) => {
                return Err(LedgerError::CommitConflict {
                    wallet_id: write.wallet.id.to_string(),
                    expected: stored.map(|(_, v)| *v).unwrap_or(0),
                });
            }
        }

        let next_version = write.expected_version.map(|v| v + 1).unwrap_or(1);
        inner
            .wallet_keys
            .insert(write.wallet.id, key.clone());
        inner.wallets.insert(key, (write.wallet, next_version));
        inner.transactions.push(write.transaction);
        if let Some(usage) = write.quota_usage {
            inner.quota_usage.push(usage);
        }
        Ok(())
    }

    async fn transactions_by_wallet(
        &self,
        wallet_id: &WalletId,
        limit: usize,
        offset: usize,
    ) -> Result<TransactionPage> {
        let inner = self.inner.read();
        let mut matching: Vec<Transaction> = inner
            .transactions
            .iter()
            .filter(|tx| tx.wallet_id == *wallet_id)
            .cloned()
            .collect();
        // Newest first; commit order within the store is insertion order
        matching.reverse();

        let total = matching.len();
        let transactions = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect();
        Ok(TransactionPage {
            transactions,
            total,
            limit,
            offset,
        })
    }

    async fn sum_by_wallet_since(
        &self,
        wallet_id: &WalletId,
        since: DateTime<Utc>,
    ) -> Result<i128> {
        let inner = self.inner.read();
        Ok(inner
            .transactions
            .iter()
            .filter(|tx| tx.wallet_id == *wallet_id && tx.created_at >= since)
            .map(|tx| tx.signed_amount())
            .sum())
    }

    async fn sum_credits_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: &ReferenceId,
    ) -> Result<Amount> {
        let inner = self.inner.read();
        Ok(inner
            .transactions
            .iter()
            .filter(|tx| {
                tx.transaction_type == TransactionType::Credit
                    && tx.reference_type == reference_type
                    && tx.reference_id == *reference_id
            })
            .map(|tx| tx.amount)
            .sum())
    }

    async fn record_quota_usage(&self, usage: QuotaUsage) -> Result<()> {
        self.inner.write().quota_usage.push(usage);
        Ok(())
    }

    async fn quota_used_since(
        &self,
        user: &UserId,
        community: &CommunityId,
        since: DateTime<Utc>,
    ) -> Result<Amount> {
        let inner = self.inner.read();
        Ok(inner
            .quota_usage
            .iter()
            .filter(|usage| {
                usage.user_id == *user
                    && usage.community_id == *community
                    && usage.created_at >= since
            })
            .map(|usage| usage.amount)
            .sum())
    }

    async fn community(&self, id: &CommunityId) -> Result<Option<Community>> {
        Ok(self.inner.read().communities.get(id).cloned())
    }

    async fn upsert_community(&self, community: Community) -> Result<()> {
        self.inner
            .write()
            .communities
            .insert(community.id.clone(), community);
        Ok(())
    }

    async fn set_last_quota_reset(&self, id: &CommunityId, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.write();
        let community = inner
            .communities
            .get_mut(id)
            .ok_or_else(|| LedgerError::CommunityNotFound(id.to_string()))?;
        community.last_quota_reset_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_wallet(user: &str, scope: WalletScope, balance: Amount) -> Wallet {
        Wallet::new(
            UserId::new(user),
            scope,
            CurrencyNames::default(),
            balance,
            Utc::now(),
        )
    }

    fn sample_transaction(
        wallet_id: WalletId,
        transaction_type: TransactionType,
        amount: Amount,
    ) -> Transaction {
        Transaction::new(
            wallet_id,
            transaction_type,
            amount,
            SourceType::Personal,
            ReferenceType::AdminCredit,
            ReferenceId::new("r1"),
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_load() {
        let store = MemoryStore::new();
        let wallet = sample_wallet("u1", WalletScope::Global, 10);
        let wallet_id = wallet.id;

        store
            .commit(LedgerWrite {
                wallet: wallet.clone(),
                expected_version: None,
                transaction: sample_transaction(wallet_id, TransactionType::Credit, 10),
                quota_usage: None,
            })
            .await
            .unwrap();

        let loaded = store
            .load_wallet(&UserId::new("u1"), &WalletScope::Global)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.wallet.balance, 10);
        assert_eq!(loaded.version, 1);

        let by_id = store.wallet_by_id(&wallet_id).await.unwrap().unwrap();
        assert_eq!(by_id.id, wallet_id);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = MemoryStore::new();
        let mut wallet = sample_wallet("u1", WalletScope::Global, 10);

        store
            .commit(LedgerWrite {
                wallet: wallet.clone(),
                expected_version: None,
                transaction: sample_transaction(wallet.id, TransactionType::Credit, 10),
                quota_usage: None,
            })
            .await
            .unwrap();

        // First update at version 1 wins
        wallet.balance = 15;
        store
            .commit(LedgerWrite {
                wallet: wallet.clone(),
                expected_version: Some(1),
                transaction: sample_transaction(wallet.id, TransactionType::Credit, 5),
                quota_usage: None,
            })
            .await
            .unwrap();

        // Second update against the stale version loses
        let err = store
            .commit(LedgerWrite {
                wallet: wallet.clone(),
                expected_version: Some(1),
                transaction: sample_transaction(wallet.id, TransactionType::Credit, 5),
                quota_usage: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(store.transaction_count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = MemoryStore::new();
        let first = sample_wallet("u1", WalletScope::Global, 1);
        let second = sample_wallet("u1", WalletScope::Global, 2);

        store
            .commit(LedgerWrite {
                wallet: first.clone(),
                expected_version: None,
                transaction: sample_transaction(first.id, TransactionType::Credit, 1),
                quota_usage: None,
            })
            .await
            .unwrap();

        let err = store
            .commit(LedgerWrite {
                wallet: second.clone(),
                expected_version: None,
                transaction: sample_transaction(second.id, TransactionType::Credit, 2),
                quota_usage: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CommitConflict { .. }));
    }

    #[tokio::test]
    async fn test_injected_failure_applies_nothing() {
        let store = MemoryStore::new();
        let wallet = sample_wallet("u1", WalletScope::Global, 10);
        store.fail_next_commit();

        let err = store
            .commit(LedgerWrite {
                wallet: wallet.clone(),
                expected_version: None,
                transaction: sample_transaction(wallet.id, TransactionType::Credit, 10),
                quota_usage: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::StorageUnavailable(_)));
        assert_eq!(store.transaction_count(), 0);
        assert!(store
            .load_wallet(&UserId::new("u1"), &WalletScope::Global)
            .await
            .unwrap()
            .is_none());

        // Injection is one-shot
        store
            .commit(LedgerWrite {
                wallet,
                expected_version: None,
                transaction: sample_transaction(WalletId::generate(), TransactionType::Credit, 10),
                quota_usage: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let store = MemoryStore::new();
        let mut wallet = sample_wallet("u1", WalletScope::Global, 0);
        let wallet_id = wallet.id;

        for (i, amount) in [1u64, 2, 3].iter().enumerate() {
            wallet.balance += amount;
            store
                .commit(LedgerWrite {
                    wallet: wallet.clone(),
                    expected_version: if i == 0 { None } else { Some(i as u64) },
                    transaction: sample_transaction(wallet_id, TransactionType::Credit, *amount),
                    quota_usage: None,
                })
                .await
                .unwrap();
        }

        let page = store
            .transactions_by_wallet(&wallet_id, 2, 0)
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.transactions[0].amount, 3);
        assert_eq!(page.transactions[1].amount, 2);

        let rest = store
            .transactions_by_wallet(&wallet_id, 2, 2)
            .await
            .unwrap();
        assert_eq!(rest.transactions.len(), 1);
        assert_eq!(rest.transactions[0].amount, 1);
    }

    #[tokio::test]
    async fn test_signed_sum_respects_window() {
        let store = MemoryStore::new();
        let mut wallet = sample_wallet("u1", WalletScope::Global, 0);
        let wallet_id = wallet.id;
        let t0: DateTime<Utc> = "2026-03-15T10:00:00Z".parse().unwrap();
        let t1 = t0 + chrono::Duration::hours(1);
        let t2 = t0 + chrono::Duration::hours(2);

        let history = [
            (10u64, TransactionType::Credit, t0),
            (4, TransactionType::Debit, t1),
            (2, TransactionType::Credit, t2),
        ];
        for (i, (amount, transaction_type, at)) in history.into_iter().enumerate() {
            match transaction_type {
                TransactionType::Credit => wallet.balance += amount,
                TransactionType::Debit => wallet.balance -= amount,
            }
            store
                .commit(LedgerWrite {
                    wallet: wallet.clone(),
                    expected_version: if i == 0 { None } else { Some(i as u64) },
                    transaction: Transaction::new(
                        wallet_id,
                        transaction_type,
                        amount,
                        SourceType::Personal,
                        ReferenceType::AdminCredit,
                        ReferenceId::new("r1"),
                        None,
                        at,
                    )
                    .unwrap(),
                    quota_usage: None,
                })
                .await
                .unwrap();
        }

        // Full history nets credits minus debits
        assert_eq!(store.sum_by_wallet_since(&wallet_id, t0).await.unwrap(), 8);
        // Window start is inclusive, so a window opening at the debit
        // sees the debit and the later credit
        assert_eq!(store.sum_by_wallet_since(&wallet_id, t1).await.unwrap(), -2);
        // A window opening after the last record sums to zero
        let later = t2 + chrono::Duration::seconds(1);
        assert_eq!(store.sum_by_wallet_since(&wallet_id, later).await.unwrap(), 0);
        // Other wallets never contribute
        assert_eq!(
            store
                .sum_by_wallet_since(&WalletId::generate(), t0)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_reference_and_quota_sums() {
        let store = MemoryStore::new();
        let wallet = sample_wallet("u1", WalletScope::Global, 7);
        let reference = ReferenceId::new("pub-1");

        let tx = Transaction::new(
            wallet.id,
            TransactionType::Credit,
            7,
            SourceType::Personal,
            ReferenceType::PublicationWithdrawal,
            reference.clone(),
            None,
            Utc::now(),
        )
        .unwrap();

        let community = CommunityId::new("c1");
        store
            .commit(LedgerWrite {
                wallet,
                expected_version: None,
                transaction: tx,
                quota_usage: Some(QuotaUsage {
                    user_id: UserId::new("u1"),
                    community_id: community.clone(),
                    amount: 3,
                    kind: QuotaUsageKind::Vote,
                    created_at: Utc::now(),
                }),
            })
            .await
            .unwrap();

        let withdrawn = store
            .sum_credits_by_reference(ReferenceType::PublicationWithdrawal, &reference)
            .await
            .unwrap();
        assert_eq!(withdrawn, 7);

        let used = store
            .quota_used_since(
                &UserId::new("u1"),
                &community,
                Utc::now() - chrono::Duration::hours(1),
            )
            .await
            .unwrap();
        assert_eq!(used, 3);

        // Window starting after the record excludes it
        let used_later = store
            .quota_used_since(
                &UserId::new("u1"),
                &community,
                Utc::now() + chrono::Duration::hours(1),
            )
            .await
            .unwrap();
        assert_eq!(used_later, 0);
    }

    #[tokio::test]
    async fn test_set_last_quota_reset() {
        let store = MemoryStore::new();
        let id = CommunityId::new("c1");
        store
            .upsert_community(Community::new(id.clone(), "standard"))
            .await
            .unwrap();

        let at = Utc::now();
        store.set_last_quota_reset(&id, at).await.unwrap();
        let community = store.community(&id).await.unwrap().unwrap();
        assert_eq!(community.last_quota_reset_at, Some(at));

        let missing = store
            .set_last_quota_reset(&CommunityId::new("nope"), at)
            .await;
        assert!(matches!(missing, Err(LedgerError::CommunityNotFound(_))));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Credit(Amount),
            Debit(Amount),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u64..1_000).prop_map(Op::Credit),
                (1u64..1_000).prop_map(Op::Debit),
            ]
        }

        proptest! {
            /// After any sequence of committed operations, the stored
            /// balance equals the signed sum of the transaction log.
            /// Rejected operations commit nothing and leave both sides
            /// unchanged.
            #[test]
            fn balance_matches_log_net(ops in prop::collection::vec(op_strategy(), 1..32)) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                rt.block_on(async {
                    let store = MemoryStore::new();
                    let user = UserId::new("u1");
                    let mut wallet_id = None;

                    for op in ops {
                        let loaded = store
                            .load_wallet(&user, &WalletScope::Global)
                            .await
                            .unwrap();
                        let (mut wallet, expected_version) = match loaded {
                            Some(v) => (v.wallet, Some(v.version)),
                            None => (sample_wallet("u1", WalletScope::Global, 0), None),
                        };
                        let (transaction_type, amount) = match op {
                            Op::Credit(a) => (TransactionType::Credit, a),
                            Op::Debit(a) => (TransactionType::Debit, a),
                        };
                        let applied = match transaction_type {
                            TransactionType::Credit => wallet.add(amount, Utc::now()),
                            TransactionType::Debit => wallet.deduct(amount, Utc::now()),
                        };
                        if applied.is_err() {
                            continue;
                        }
                        wallet_id = Some(wallet.id);
                        store
                            .commit(LedgerWrite {
                                wallet: wallet.clone(),
                                expected_version,
                                transaction: sample_transaction(
                                    wallet.id,
                                    transaction_type,
                                    amount,
                                ),
                                quota_usage: None,
                            })
                            .await
                            .unwrap();
                    }

                    if let Some(id) = wallet_id {
                        let net = store
                            .sum_by_wallet_since(&id, DateTime::<Utc>::MIN_UTC)
                            .await
                            .unwrap();
                        let balance = store.wallet_by_id(&id).await.unwrap().unwrap().balance;
                        assert_eq!(balance as i128, net);
                    }
                });
            }
        }
    }
}
