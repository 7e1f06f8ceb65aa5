//! Constant-product pool client
//!
//! Wraps the on-chain AMM contract. Reads map one-to-one onto contract
//! views; writes send, wait for one confirmation and hand back the receipt
//! with any `Swap` events decoded.

use super::{contract_error, pending_error, ClientResult, GasParams, PoolClient};
use crate::contracts::IAutomatedMarketMaker::{self, IAutomatedMarketMakerInstance};
use crate::types::{Direction, SwapEvent, TxReceipt, VenueId};
use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use alloy::rpc::types::{Log, TransactionReceipt};
use async_trait::async_trait;
use chrono::DateTime;
use tracing::{debug, info, warn};

pub struct AmmPool {
    venue: VenueId,
    contract: IAutomatedMarketMakerInstance<DynProvider>,
}

impl AmmPool {
    pub fn new(venue: VenueId, address: Address, provider: DynProvider) -> Self {
        Self {
            venue,
            contract: IAutomatedMarketMaker::new(address, provider),
        }
    }
}

#[async_trait]
impl PoolClient for AmmPool {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn quote_forward(&self, amount_in: U256) -> ClientResult<U256> {
        self.contract
            .calculateToken1Swap(amount_in)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn quote_backward(&self, amount_in: U256) -> ClientResult<U256> {
        self.contract
            .calculateToken2Swap(amount_in)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn reserve_a(&self) -> ClientResult<U256> {
        self.contract.token1Balance().call().await.map_err(contract_error)
    }

    async fn reserve_b(&self) -> ClientResult<U256> {
        self.contract.token2Balance().call().await.map_err(contract_error)
    }

    async fn total_shares(&self) -> ClientResult<U256> {
        self.contract.totalShares().call().await.map_err(contract_error)
    }

    /// `shares(owner)` first; pools that expose LP shares as a token only
    /// answer `balanceOf(owner)`.
    async fn shares_of(&self, owner: Address) -> ClientResult<U256> {
        match self.contract.shares(owner).call().await {
            Ok(shares) => Ok(shares),
            Err(e) => {
                debug!("{}: shares() failed ({}), trying balanceOf()", self.venue, e);
                self.contract
                    .balanceOf(owner)
                    .call()
                    .await
                    .map_err(contract_error)
            }
        }
    }

    async fn withdraw_preview(&self, shares: U256) -> ClientResult<(U256, U256)> {
        let amounts = self
            .contract
            .calculateWithdrawAmount(shares)
            .call()
            .await
            .map_err(contract_error)?;
        Ok((amounts.token1Amount, amounts.token2Amount))
    }

    async fn estimate_swap_gas(&self, direction: Direction, amount_in: U256) -> ClientResult<u64> {
        let estimate = match direction {
            Direction::Forward => self.contract.swapToken1(amount_in).estimate_gas().await,
            Direction::Backward => self.contract.swapToken2(amount_in).estimate_gas().await,
        };
        estimate.map_err(contract_error)
    }

    async fn swap_forward(&self, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt> {
        let pending = self
            .contract
            .swapToken1(amount_in)
            .gas(gas.gas_limit)
            .gas_price(gas.gas_price)
            .send()
            .await
            .map_err(contract_error)?;
        info!("{}: swapToken1 tx submitted: {:?}", self.venue, pending.tx_hash());
        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await
            .map_err(|e| pending_error(tx_hash, e))?;
        Ok(to_receipt(&receipt, Some(&self.venue)))
    }

    async fn swap_backward(&self, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt> {
        let pending = self
            .contract
            .swapToken2(amount_in)
            .gas(gas.gas_limit)
            .gas_price(gas.gas_price)
            .send()
            .await
            .map_err(contract_error)?;
        info!("{}: swapToken2 tx submitted: {:?}", self.venue, pending.tx_hash());
        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await
            .map_err(|e| pending_error(tx_hash, e))?;
        Ok(to_receipt(&receipt, Some(&self.venue)))
    }

    async fn add_liquidity(&self, amount_a: U256, amount_b: U256) -> ClientResult<TxReceipt> {
        let pending = self
            .contract
            .addLiquidity(amount_a, amount_b)
            .send()
            .await
            .map_err(contract_error)?;
        info!("{}: addLiquidity tx submitted: {:?}", self.venue, pending.tx_hash());
        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await
            .map_err(|e| pending_error(tx_hash, e))?;
        Ok(to_receipt(&receipt, Some(&self.venue)))
    }

    async fn remove_liquidity(&self, shares: U256) -> ClientResult<TxReceipt> {
        let pending = self
            .contract
            .removeLiquidity(shares)
            .send()
            .await
            .map_err(contract_error)?;
        info!("{}: removeLiquidity tx submitted: {:?}", self.venue, pending.tx_hash());
        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await
            .map_err(|e| pending_error(tx_hash, e))?;
        Ok(to_receipt(&receipt, Some(&self.venue)))
    }

    async fn swap_history(&self, from_block: u64) -> ClientResult<Vec<SwapEvent>> {
        let logs = self
            .contract
            .Swap_filter()
            .from_block(from_block)
            .query()
            .await
            .map_err(contract_error)?;
        Ok(logs
            .into_iter()
            .map(|(event, log)| swap_event(event, &log, Some(&self.venue)))
            .collect())
    }
}

/// Convert an alloy receipt, decoding every pool `Swap` log it carries.
pub(crate) fn to_receipt(receipt: &TransactionReceipt, venue: Option<&VenueId>) -> TxReceipt {
    let swap_events = receipt
        .inner
        .logs()
        .iter()
        .filter_map(|log| match log.log_decode::<IAutomatedMarketMaker::Swap>() {
            Ok(decoded) => Some(swap_event(decoded.inner.data, log, venue)),
            Err(_) => None,
        })
        .collect();

    TxReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.unwrap_or(0),
        success: receipt.status(),
        gas_used: receipt.gas_used,
        swap_events,
    }
}

fn swap_event(event: IAutomatedMarketMaker::Swap, log: &Log, venue: Option<&VenueId>) -> SwapEvent {
    let timestamp = u64::try_from(event.timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0));
    if timestamp.is_none() {
        warn!("Swap event with out-of-range timestamp {}", event.timestamp);
    }

    SwapEvent {
        venue: venue.cloned(),
        user: event.user,
        token_give: event.tokenGive,
        amount_give: event.tokenGiveAmount,
        token_get: event.tokenGet,
        amount_get: event.tokenGetAmount,
        reserve_a: event.token1Balance,
        reserve_b: event.token2Balance,
        timestamp,
        block_number: log.block_number,
        tx_hash: log.transaction_hash,
    }
}
