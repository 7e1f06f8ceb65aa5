//! Swap Executor
//!
//! Submits one swap against a chosen venue and reports what actually
//! happened on chain:
//! 1. Balance pre-check (no transaction on shortfall)
//! 2. Gas limit: estimate + buffer, or the fallback ceiling if simulation fails
//! 3. Network gas price
//! 4. Send once, wait for one confirmation
//! 5. Realized output from the pool's `Swap` event
//!
//! A broadcast transaction is never retried. If the caller abandons the
//! confirmation wait the transaction stays pending on its own.

use crate::clients::{GasParams, Network, TokenClient};
use crate::error::{RouterError, RouterResult};
use crate::types::{Direction, GasSource, SwapReceipt, SwapStatus, Venue};
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    /// Added on top of a successful estimate, in percent
    pub buffer_percent: u64,
    /// Used when estimation fails
    pub fallback_limit: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            buffer_percent: 20,
            fallback_limit: 500_000,
        }
    }
}

impl GasPolicy {
    pub fn buffered(&self, estimate: u64) -> u64 {
        estimate.saturating_mul(100 + self.buffer_percent) / 100
    }
}

pub struct SwapExecutor {
    network: Arc<dyn Network>,
    gas: GasPolicy,
}

impl SwapExecutor {
    pub fn new(network: Arc<dyn Network>, gas: GasPolicy) -> Self {
        Self { network, gas }
    }

    /// Local pre-check: `account` holds at least `amount_in` of `input_token`.
    /// Sends nothing.
    pub async fn check_balance(
        &self,
        input_token: &dyn TokenClient,
        amount_in: U256,
        account: Address,
    ) -> RouterResult<U256> {
        if amount_in.is_zero() {
            return Err(RouterError::InvalidAmount("amount in must be non-zero".into()));
        }

        let balance = input_token.balance_of(account).await?;
        if balance < amount_in {
            warn!(
                "Balance of {:?} is {}, swap needs {}",
                input_token.address(),
                balance,
                amount_in
            );
            return Err(RouterError::InsufficientBalance {
                token: input_token.address(),
                balance,
                required: amount_in,
            });
        }
        Ok(balance)
    }

    /// Swap `amount_in` of `input_token` on `venue`.
    ///
    /// The allowance must already be in place.
    pub async fn execute(
        &self,
        venue: &Venue,
        direction: Direction,
        input_token: &dyn TokenClient,
        amount_in: U256,
        account: Address,
    ) -> RouterResult<SwapReceipt> {
        self.check_balance(input_token, amount_in, account).await?;

        let (gas_limit, gas_source) = match venue.pool.estimate_swap_gas(direction, amount_in).await {
            Ok(estimate) => (self.gas.buffered(estimate), GasSource::Estimated),
            Err(e) => {
                let err = RouterError::GasEstimationFailed {
                    venue: venue.id.clone(),
                    reason: e.to_string(),
                };
                warn!("{}; using fallback limit {}", err, self.gas.fallback_limit);
                (self.gas.fallback_limit, GasSource::Fallback)
            }
        };

        let gas_price = self.network.gas_price().await?;

        info!(
            "Swapping {} {} on {} (gas limit {}, price {} wei)",
            amount_in, direction, venue.id, gas_limit, gas_price
        );

        let receipt = venue
            .pool
            .swap(direction, amount_in, GasParams { gas_limit, gas_price })
            .await
            .map_err(|e| {
                error!("Swap on {} failed: {}", venue.id, e);
                RouterError::from_write(e)
            })?;

        if !receipt.success {
            error!("Swap {:?} reverted on {}", receipt.tx_hash, venue.id);
            return Err(RouterError::TransactionReverted {
                tx_hash: Some(receipt.tx_hash),
                reason: None,
            });
        }

        // A router venue emits its inner pool's event; the last one is the trade
        let realized_output = receipt.swap_events.last().map(|e| e.amount_get);
        match realized_output {
            Some(out) => info!(
                "Swap confirmed in block {} ({:?}): received {}",
                receipt.block_number, receipt.tx_hash, out
            ),
            None => warn!(
                "Swap confirmed in block {} ({:?}) without a Swap event; output unknown",
                receipt.block_number, receipt.tx_hash
            ),
        }

        Ok(SwapReceipt {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            realized_output,
            status: SwapStatus::Confirmed,
            gas_limit,
            gas_source,
        })
    }
}
