//! Router venue
//!
//! An on-chain aggregator that picks an inner pool itself. It quotes and
//! swaps with the same shape as a pool, so the engine treats it as one more
//! venue. It holds no reserves and mints no shares: those reads are
//! unsupported and fall out of the position fallback chain on their own.

use super::amm::to_receipt;
use super::{contract_error, pending_error, ClientResult, GasParams, PoolClient};
use crate::contracts::IDexAggregator::{self, IDexAggregatorInstance};
use crate::error::ClientError;
use crate::types::{Direction, SwapEvent, TxReceipt, VenueId};
use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use async_trait::async_trait;
use tracing::{debug, info};

pub struct AggregatorVenue {
    venue: VenueId,
    contract: IDexAggregatorInstance<DynProvider>,
}

impl AggregatorVenue {
    pub fn new(venue: VenueId, address: Address, provider: DynProvider) -> Self {
        Self {
            venue,
            contract: IDexAggregator::new(address, provider),
        }
    }

    async fn best_rate(&self, amount_in: U256, token1_to_token2: bool) -> ClientResult<U256> {
        let rate = self
            .contract
            .getBestRate(amount_in, token1_to_token2)
            .call()
            .await
            .map_err(contract_error)?;
        debug!("{}: best rate {} via {:?}", self.venue, rate.amountOut, rate.amm);
        Ok(rate.amountOut)
    }

    async fn send_swap(&self, direction: Direction, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt> {
        // The two entry points have distinct call types; send each in its own arm.
        let pending = match direction {
            Direction::Forward => {
                self.contract
                    .swapToken1ForToken2(amount_in)
                    .gas(gas.gas_limit)
                    .gas_price(gas.gas_price)
                    .send()
                    .await
            }
            Direction::Backward => {
                self.contract
                    .swapToken2ForToken1(amount_in)
                    .gas(gas.gas_limit)
                    .gas_price(gas.gas_price)
                    .send()
                    .await
            }
        }
        .map_err(contract_error)?;
        info!("{}: {} swap tx submitted: {:?}", self.venue, direction, pending.tx_hash());
        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await
            .map_err(|e| pending_error(tx_hash, e))?;
        Ok(to_receipt(&receipt, Some(&self.venue)))
    }
}

#[async_trait]
impl PoolClient for AggregatorVenue {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn quote_forward(&self, amount_in: U256) -> ClientResult<U256> {
        self.best_rate(amount_in, true).await
    }

    async fn quote_backward(&self, amount_in: U256) -> ClientResult<U256> {
        self.best_rate(amount_in, false).await
    }

    async fn reserve_a(&self) -> ClientResult<U256> {
        Err(ClientError::Unsupported("reserve_a"))
    }

    async fn reserve_b(&self) -> ClientResult<U256> {
        Err(ClientError::Unsupported("reserve_b"))
    }

    async fn total_shares(&self) -> ClientResult<U256> {
        Err(ClientError::Unsupported("total_shares"))
    }

    async fn shares_of(&self, _owner: Address) -> ClientResult<U256> {
        Err(ClientError::Unsupported("shares_of"))
    }

    async fn withdraw_preview(&self, _shares: U256) -> ClientResult<(U256, U256)> {
        Err(ClientError::Unsupported("withdraw_preview"))
    }

    async fn estimate_swap_gas(&self, direction: Direction, amount_in: U256) -> ClientResult<u64> {
        let estimate = match direction {
            Direction::Forward => self.contract.swapToken1ForToken2(amount_in).estimate_gas().await,
            Direction::Backward => self.contract.swapToken2ForToken1(amount_in).estimate_gas().await,
        };
        estimate.map_err(contract_error)
    }

    async fn swap_forward(&self, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt> {
        self.send_swap(Direction::Forward, amount_in, gas).await
    }

    async fn swap_backward(&self, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt> {
        self.send_swap(Direction::Backward, amount_in, gas).await
    }

    async fn add_liquidity(&self, _amount_a: U256, _amount_b: U256) -> ClientResult<TxReceipt> {
        Err(ClientError::Unsupported("add_liquidity"))
    }

    async fn remove_liquidity(&self, _shares: U256) -> ClientResult<TxReceipt> {
        Err(ClientError::Unsupported("remove_liquidity"))
    }

    /// The inner pools emit the events; history is collected from them directly.
    async fn swap_history(&self, _from_block: u64) -> ClientResult<Vec<SwapEvent>> {
        Ok(Vec::new())
    }
}
