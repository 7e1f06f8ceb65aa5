//! Contract client interfaces
//!
//! The engine only ever talks to these traits. `Erc20Token`, `AmmPool`,
//! `AggregatorVenue` and `RpcNetwork` implement them over an alloy provider;
//! tests implement them in memory.
//!
//! Every write waits for exactly one confirmation before returning and is
//! sent exactly once. Nonce ordering is left to the provider's signer.

pub mod aggregator;
pub mod amm;
pub mod network;
pub mod token;

pub use aggregator::AggregatorVenue;
pub use amm::AmmPool;
pub use network::{connect, RpcNetwork};
pub use token::Erc20Token;

use crate::error::ClientError;
use crate::types::{Direction, SwapEvent, TxReceipt};
use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

pub type ClientResult<T> = Result<T, ClientError>;

/// Gas parameters attached to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
    pub gas_limit: u64,
    pub gas_price: u128,
}

/// ERC20-like token.
#[async_trait]
pub trait TokenClient: Send + Sync {
    fn address(&self) -> Address;

    async fn balance_of(&self, owner: Address) -> ClientResult<U256>;

    async fn allowance(&self, owner: Address, spender: Address) -> ClientResult<U256>;

    /// Approve `spender` for `amount` from the signing account.
    async fn approve(&self, spender: Address, amount: U256) -> ClientResult<TxReceipt>;

    async fn transfer(&self, to: Address, amount: U256) -> ClientResult<TxReceipt>;

    async fn symbol(&self) -> ClientResult<String>;

    async fn decimals(&self) -> ClientResult<u8>;
}

/// One constant-product pool, or a router that behaves like one.
#[async_trait]
pub trait PoolClient: Send + Sync {
    fn address(&self) -> Address;

    /// Output for `amount_in` of token A.
    async fn quote_forward(&self, amount_in: U256) -> ClientResult<U256>;

    /// Output for `amount_in` of token B.
    async fn quote_backward(&self, amount_in: U256) -> ClientResult<U256>;

    async fn reserve_a(&self) -> ClientResult<U256>;

    async fn reserve_b(&self) -> ClientResult<U256>;

    async fn total_shares(&self) -> ClientResult<U256>;

    async fn shares_of(&self, owner: Address) -> ClientResult<U256>;

    /// Token amounts returned for burning `shares`.
    async fn withdraw_preview(&self, shares: U256) -> ClientResult<(U256, U256)>;

    /// Read-only simulation of the swap entry point.
    async fn estimate_swap_gas(&self, direction: Direction, amount_in: U256) -> ClientResult<u64>;

    async fn swap_forward(&self, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt>;

    async fn swap_backward(&self, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt>;

    async fn add_liquidity(&self, amount_a: U256, amount_b: U256) -> ClientResult<TxReceipt>;

    async fn remove_liquidity(&self, shares: U256) -> ClientResult<TxReceipt>;

    /// Every `Swap` event emitted by this pool from `from_block` to the head.
    async fn swap_history(&self, from_block: u64) -> ClientResult<Vec<SwapEvent>>;

    async fn quote(&self, direction: Direction, amount_in: U256) -> ClientResult<U256> {
        match direction {
            Direction::Forward => self.quote_forward(amount_in).await,
            Direction::Backward => self.quote_backward(amount_in).await,
        }
    }

    async fn swap(&self, direction: Direction, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt> {
        match direction {
            Direction::Forward => self.swap_forward(amount_in, gas).await,
            Direction::Backward => self.swap_backward(amount_in, gas).await,
        }
    }
}

/// Chain-level reads not tied to a contract.
#[async_trait]
pub trait Network: Send + Sync {
    async fn chain_id(&self) -> ClientResult<u64>;

    async fn block_number(&self) -> ClientResult<u64>;

    /// Current network gas price in wei.
    async fn gas_price(&self) -> ClientResult<u128>;
}

/// Map an alloy contract error onto `ClientError`, keeping the revert reason.
pub(crate) fn contract_error(err: alloy::contract::Error) -> ClientError {
    if let Some(data) = err.as_revert_data() {
        return ClientError::Reverted {
            reason: alloy::sol_types::decode_revert_reason(&data),
        };
    }
    let message = err.to_string();
    if let Some(idx) = message.find("execution reverted") {
        let reason = message[idx + "execution reverted".len()..]
            .trim_start_matches(':')
            .trim();
        return ClientError::Reverted {
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        };
    }
    ClientError::Transport(message)
}

/// Map a failed confirmation wait onto `ClientError`, keeping the hash of
/// the already broadcast transaction.
pub(crate) fn pending_error(tx_hash: TxHash, err: alloy::providers::PendingTransactionError) -> ClientError {
    ClientError::Unconfirmed {
        tx_hash,
        reason: err.to_string(),
    }
}
