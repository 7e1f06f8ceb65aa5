//! Liquidity provision
//!
//! Deposits must keep the pool price: once a pool has shares outstanding,
//! the token B side of a deposit is fixed by the token A side as
//! `floor(amount_a * reserve_b / reserve_a)`. The first deposit sets the
//! price, so any amounts are accepted.
//!
//! Reserves are re-read on every call.

use crate::approval::ApprovalManager;
use crate::clients::PoolClient;
use crate::error::{ClientError, RouterError, RouterResult};
use crate::math;
use crate::positions::PositionSync;
use crate::session::Session;
use crate::types::{Positions, Venue};
use alloy::primitives::{TxHash, U256};
use std::sync::Arc;
use tracing::{info, warn};

/// Counterpart amount for one side of a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositAmount {
    /// Empty pool: the caller sets the initial price
    Initial,
    /// Amount of the other token the deposit must carry
    Paired(U256),
}

/// Confirmed deposit or withdrawal plus the positions read afterwards.
#[derive(Debug, Clone)]
pub struct LiquidityReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub amount_a: U256,
    pub amount_b: U256,
    pub shares: Option<U256>,
    pub positions: Positions,
}

pub struct LiquidityManager {
    approvals: Arc<ApprovalManager>,
    positions: PositionSync,
}

impl LiquidityManager {
    pub fn new(approvals: Arc<ApprovalManager>, positions: PositionSync) -> Self {
        Self { approvals, positions }
    }

    /// Token B required alongside `amount_a`.
    pub async fn deposit_amounts(&self, pool: &dyn PoolClient, amount_a: U256) -> RouterResult<DepositAmount> {
        if pool.total_shares().await?.is_zero() {
            return Ok(DepositAmount::Initial);
        }
        let (reserve_a, reserve_b) = (pool.reserve_a().await?, pool.reserve_b().await?);
        paired(amount_a, reserve_a, reserve_b)
    }

    /// Token A required alongside `amount_b`.
    pub async fn deposit_amounts_for_b(
        &self,
        pool: &dyn PoolClient,
        amount_b: U256,
    ) -> RouterResult<DepositAmount> {
        if pool.total_shares().await?.is_zero() {
            return Ok(DepositAmount::Initial);
        }
        let (reserve_a, reserve_b) = (pool.reserve_a().await?, pool.reserve_b().await?);
        paired(amount_b, reserve_b, reserve_a)
    }

    /// Tokens released by burning `shares`, from the pool's own preview.
    pub async fn withdraw_amounts(&self, pool: &dyn PoolClient, shares: U256) -> RouterResult<(U256, U256)> {
        Ok(pool.withdraw_preview(shares).await?)
    }

    /// Add `amount_a` / `amount_b` to `venue`.
    pub async fn deposit(
        &self,
        session: &Session,
        venue: &Venue,
        amount_a: U256,
        amount_b: U256,
    ) -> RouterResult<LiquidityReceipt> {
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(RouterError::InvalidAmount("deposit amounts must be non-zero".into()));
        }

        if let DepositAmount::Paired(expected) = self.deposit_amounts(venue.pool.as_ref(), amount_a).await? {
            if amount_b != expected {
                warn!(
                    "Deposit on {} rejected: {} A needs {} B, got {}",
                    venue.id, amount_a, expected, amount_b
                );
                return Err(RouterError::DepositRatioMismatch {
                    expected,
                    provided: amount_b,
                });
            }
        }

        let spender = venue.spender();
        self.approvals
            .ensure_allowance(session.token_a.as_ref(), session.account, spender, amount_a)
            .await?;
        self.approvals
            .ensure_allowance(session.token_b.as_ref(), session.account, spender, amount_b)
            .await?;

        info!("Depositing {} A + {} B into {}", amount_a, amount_b, venue.id);
        let receipt = venue
            .pool
            .add_liquidity(amount_a, amount_b)
            .await
            .map_err(RouterError::from_write)?;
        if !receipt.success {
            return Err(RouterError::TransactionReverted {
                tx_hash: Some(receipt.tx_hash),
                reason: None,
            });
        }
        info!("Deposit confirmed in block {}", receipt.block_number);

        let positions = self
            .positions
            .refresh(&session.tokens(), &session.venues, session.account)
            .await;

        Ok(LiquidityReceipt {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            amount_a,
            amount_b,
            shares: None,
            positions,
        })
    }

    /// Burn `shares` on `venue`. Checked against the account's holding first.
    pub async fn withdraw(&self, session: &Session, venue: &Venue, shares: U256) -> RouterResult<LiquidityReceipt> {
        if shares.is_zero() {
            return Err(RouterError::InvalidAmount("shares must be non-zero".into()));
        }

        let held = venue.pool.shares_of(session.account).await?;
        if held < shares {
            warn!("Withdraw on {} rejected: hold {} shares, requested {}", venue.id, held, shares);
            return Err(RouterError::InsufficientShares {
                held,
                requested: shares,
            });
        }

        let (amount_a, amount_b) = self.withdraw_amounts(venue.pool.as_ref(), shares).await?;
        info!(
            "Withdrawing {} shares from {} (expect {} A + {} B)",
            shares, venue.id, amount_a, amount_b
        );

        let receipt = venue
            .pool
            .remove_liquidity(shares)
            .await
            .map_err(RouterError::from_write)?;
        if !receipt.success {
            return Err(RouterError::TransactionReverted {
                tx_hash: Some(receipt.tx_hash),
                reason: None,
            });
        }
        info!("Withdrawal confirmed in block {}", receipt.block_number);

        let positions = self
            .positions
            .refresh(&session.tokens(), &session.venues, session.account)
            .await;

        Ok(LiquidityReceipt {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            amount_a,
            amount_b,
            shares: Some(shares),
            positions,
        })
    }
}

fn paired(amount: U256, reserve_in: U256, reserve_other: U256) -> RouterResult<DepositAmount> {
    math::paired_deposit(amount, reserve_in, reserve_other)
        .map(DepositAmount::Paired)
        .ok_or_else(|| {
            RouterError::Client(ClientError::Decode(format!(
                "cannot pair {} against reserves ({}, {})",
                amount, reserve_in, reserve_other
            )))
        })
}
