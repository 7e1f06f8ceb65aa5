//! Token approval lifecycle
//!
//! Before a pool can pull the caller's input token the spender's allowance
//! must cover the trade. The sequence is check, reset to zero, approve
//! unlimited, re-read. Some tokens reject changing a non-zero allowance to
//! another non-zero value, hence the reset; it is best-effort because other
//! tokens reject the redundant zero approval instead.
//!
//! Concurrent calls for the same (token, spender) are serialized for the
//! whole sequence, so two swaps never interleave their reset and approve.

use crate::clients::TokenClient;
use crate::error::{RouterError, RouterResult};
use crate::types::Allowance;
use alloy::primitives::{Address, U256};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What `ensure_allowance` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Allowance already covered the amount; no transaction sent
    AlreadySufficient(Allowance),
    /// Unlimited approval confirmed
    Approved(Allowance),
}

impl ApprovalOutcome {
    pub fn allowance(&self) -> Allowance {
        match self {
            ApprovalOutcome::AlreadySufficient(a) | ApprovalOutcome::Approved(a) => *a,
        }
    }

    pub fn sent_transaction(&self) -> bool {
        matches!(self, ApprovalOutcome::Approved(_))
    }
}

#[derive(Default)]
pub struct ApprovalManager {
    locks: DashMap<(Address, Address), Arc<Mutex<()>>>,
}

impl ApprovalManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, token: Address, spender: Address) -> Arc<Mutex<()>> {
        self.locks
            .entry((token, spender))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Make sure `spender` may move at least `required` of `token` from `owner`.
    pub async fn ensure_allowance(
        &self,
        token: &dyn TokenClient,
        owner: Address,
        spender: Address,
        required: U256,
    ) -> RouterResult<ApprovalOutcome> {
        let token_address = token.address();
        let lock = self.lock_for(token_address, spender);
        let _guard = lock.lock().await;

        let current = token.allowance(owner, spender).await?;
        if current >= required {
            debug!(
                "Allowance of {:?} for {:?} already {} (need {})",
                token_address, spender, current, required
            );
            return Ok(ApprovalOutcome::AlreadySufficient(Allowance {
                owner,
                spender,
                amount: current,
            }));
        }

        info!(
            "Approving {:?} for {:?}: allowance {} < required {}",
            token_address, spender, current, required
        );

        match token.approve(spender, U256::ZERO).await {
            Ok(receipt) if !receipt.success => {
                warn!("Allowance reset reverted ({:?}), continuing", receipt.tx_hash);
            }
            Ok(_) => debug!("Allowance reset to zero"),
            Err(e) => warn!("Allowance reset failed, continuing: {}", e),
        }

        let receipt = token
            .approve(spender, U256::MAX)
            .await
            .map_err(RouterError::from_write)?;
        if !receipt.success {
            return Err(RouterError::TransactionReverted {
                tx_hash: Some(receipt.tx_hash),
                reason: Some("approve reverted".to_string()),
            });
        }

        let confirmed = token.allowance(owner, spender).await?;
        if confirmed < required {
            warn!(
                "Allowance of {:?} for {:?} still {} after approve (need {})",
                token_address, spender, confirmed, required
            );
            return Err(RouterError::ApprovalInsufficient {
                token: token_address,
                spender,
                current: confirmed,
                required,
            });
        }

        info!("Approval confirmed in {:?}", receipt.tx_hash);
        Ok(ApprovalOutcome::Approved(Allowance {
            owner,
            spender,
            amount: confirmed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ether, MockToken, ACCOUNT, TOKEN_A};

    const POOL: Address = Address::with_last_byte(0x50);

    #[tokio::test]
    async fn test_sufficient_allowance_sends_nothing() {
        let token = MockToken::new(TOKEN_A).with_allowance(ACCOUNT, POOL, ether(5));
        let manager = ApprovalManager::new();

        let outcome = manager
            .ensure_allowance(&token, ACCOUNT, POOL, ether(5))
            .await
            .unwrap();
        assert!(!outcome.sent_transaction());
        assert!(token.approvals().is_empty());

        // Second call is equally idle
        manager.ensure_allowance(&token, ACCOUNT, POOL, ether(1)).await.unwrap();
        assert!(token.approvals().is_empty());
    }

    #[tokio::test]
    async fn test_resets_then_approves_unlimited() {
        let token = MockToken::new(TOKEN_A).with_allowance(ACCOUNT, POOL, ether(1));
        let manager = ApprovalManager::new();

        let outcome = manager
            .ensure_allowance(&token, ACCOUNT, POOL, ether(10))
            .await
            .unwrap();

        assert!(outcome.sent_transaction());
        assert_eq!(outcome.allowance().amount, U256::MAX);
        assert_eq!(token.approvals(), vec![U256::ZERO, U256::MAX]);

        // Now idempotent
        manager.ensure_allowance(&token, ACCOUNT, POOL, ether(10)).await.unwrap();
        assert_eq!(token.approvals().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_reset_is_swallowed() {
        let mut token = MockToken::new(TOKEN_A);
        token.revert_zero_approval = true;
        let manager = ApprovalManager::new();

        let outcome = manager
            .ensure_allowance(&token, ACCOUNT, POOL, ether(3))
            .await
            .unwrap();
        assert!(outcome.sent_transaction());
        assert_eq!(token.current_allowance(ACCOUNT, POOL), U256::MAX);
    }

    #[tokio::test]
    async fn test_unchanged_allowance_is_insufficient() {
        let mut token = MockToken::new(TOKEN_A);
        token.ignore_approvals = true;
        let manager = ApprovalManager::new();

        let err = manager
            .ensure_allowance(&token, ACCOUNT, POOL, ether(3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::ApprovalInsufficient { current, required, .. }
                if current == U256::ZERO && required == ether(3)
        ));
    }

    #[tokio::test]
    async fn test_reverted_approve_propagates_reason() {
        let mut token = MockToken::new(TOKEN_A);
        token.revert_approvals = true;
        let manager = ApprovalManager::new();

        let err = manager
            .ensure_allowance(&token, ACCOUNT, POOL, ether(3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::TransactionReverted { reason: Some(ref r), .. } if r == "approve reverted"
        ));
    }

    #[tokio::test]
    async fn test_concurrent_calls_approve_once() {
        let token = MockToken::new(TOKEN_A);
        let manager = ApprovalManager::new();

        let (a, b) = tokio::join!(
            manager.ensure_allowance(&token, ACCOUNT, POOL, ether(1)),
            manager.ensure_allowance(&token, ACCOUNT, POOL, ether(2)),
        );
        assert_ne!(a.unwrap().sent_transaction(), b.unwrap().sent_transaction());
        assert_eq!(token.approvals(), vec![U256::ZERO, U256::MAX]);
    }
}
