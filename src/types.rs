//! Core data structures shared by the router components

use crate::clients::PoolClient;
use alloy::primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Swap direction relative to the pool's token ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// token A -> token B
    Forward,
    /// token B -> token A
    Backward,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "A->B"),
            Direction::Backward => write!(f, "B->A"),
        }
    }
}

/// Venue identifier (registry key, e.g. "amm1" or "aggregator")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VenueId(pub String);

impl VenueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timeout policy for a venue's quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueTrust {
    /// Established pool: quote is awaited without a deadline
    Trusted,
    /// Newly added pool: quote races a bounded timeout
    Untrusted,
}

/// A tradeable pool instance. Lower `priority` is consulted first and wins ties.
#[derive(Clone)]
pub struct Venue {
    pub id: VenueId,
    pub pool: Arc<dyn PoolClient>,
    pub priority: u32,
    pub trust: VenueTrust,
}

impl Venue {
    pub fn new(id: impl Into<String>, pool: Arc<dyn PoolClient>, priority: u32) -> Self {
        Self {
            id: VenueId::new(id),
            pool,
            priority,
            trust: VenueTrust::Trusted,
        }
    }

    pub fn untrusted(mut self) -> Self {
        self.trust = VenueTrust::Untrusted;
        self
    }

    /// Address that must be approved to move the caller's input token.
    pub fn spender(&self) -> Address {
        self.pool.address()
    }
}

impl fmt::Debug for Venue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Venue")
            .field("id", &self.id)
            .field("address", &self.pool.address())
            .field("priority", &self.priority)
            .field("trust", &self.trust)
            .finish()
    }
}

/// Sort venues into priority order. Stable, so equal priorities keep input order.
pub fn by_priority(venues: &[Venue]) -> Vec<&Venue> {
    let mut ordered: Vec<&Venue> = venues.iter().collect();
    ordered.sort_by_key(|v| v.priority);
    ordered
}

/// Result of one venue's read-only price query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub venue_id: VenueId,
    pub direction: Direction,
    pub output_amount: U256,
    pub valid: bool,
    pub error_kind: Option<crate::error::QuoteErrorKind>,
}

impl Quote {
    pub fn valid(venue_id: VenueId, direction: Direction, output_amount: U256) -> Self {
        Self {
            venue_id,
            direction,
            output_amount,
            valid: true,
            error_kind: None,
        }
    }

    pub fn invalid(
        venue_id: VenueId,
        direction: Direction,
        error_kind: crate::error::QuoteErrorKind,
    ) -> Self {
        Self {
            venue_id,
            direction,
            output_amount: U256::ZERO,
            valid: false,
            error_kind: Some(error_kind),
        }
    }
}

/// Winning quote plus every per-venue quote that was considered.
#[derive(Debug, Clone)]
pub struct BestQuote {
    pub best: Quote,
    pub amount_in: U256,
    /// All quotes, in venue priority order
    pub quotes: Vec<Quote>,
}

impl BestQuote {
    pub fn venue_id(&self) -> &VenueId {
        &self.best.venue_id
    }

    pub fn output_amount(&self) -> U256 {
        self.best.output_amount
    }

    /// Output per unit of input. `None` when either side exceeds Decimal range.
    pub fn price(&self) -> Option<Decimal> {
        if self.amount_in.is_zero() {
            return None;
        }
        let out = Decimal::from_str(&self.best.output_amount.to_string()).ok()?;
        let inp = Decimal::from_str(&self.amount_in.to_string()).ok()?;
        out.checked_div(inp)
    }
}

/// Pool reserves oriented to a swap direction. Always freshly read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    pub reserve_in: U256,
    pub reserve_out: U256,
    pub total_shares: U256,
}

/// Current approval of a token for a spender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Caller intent, immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub input_token: Address,
    pub output_token: Address,
    pub amount_in: U256,
    pub account: Address,
}

impl SwapRequest {
    pub fn new(input_token: Address, output_token: Address, amount_in: U256, account: Address) -> Self {
        Self {
            input_token,
            output_token,
            amount_in,
            account,
        }
    }
}

/// Confirmed transaction as returned by a client write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub success: bool,
    pub gas_used: u64,
    /// Pool `Swap` events found in the receipt logs, in log order
    pub swap_events: Vec<SwapEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStatus {
    Confirmed,
    Reverted,
}

/// Where the swap's gas limit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasSource {
    /// Simulated estimate plus buffer
    Estimated,
    /// Estimation failed; fixed ceiling used
    Fallback,
}

/// Outcome of a submitted swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// Output read from the pool's Swap event; `None` when no event was found
    pub realized_output: Option<U256>,
    pub status: SwapStatus,
    pub gas_limit: u64,
    pub gas_source: GasSource,
}

/// Decoded pool `Swap` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapEvent {
    pub venue: Option<VenueId>,
    pub user: Address,
    pub token_give: Address,
    pub amount_give: U256,
    pub token_get: Address,
    pub amount_get: U256,
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub timestamp: Option<DateTime<Utc>>,
    pub block_number: Option<u64>,
    pub tx_hash: Option<TxHash>,
}

/// Token balance at full precision plus its display rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub token: Address,
    pub raw: U256,
    pub display: String,
}

/// LP share holding and the venue that answered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareBalance {
    pub raw: U256,
    pub display: String,
    pub venue: Option<VenueId>,
}

/// Snapshot produced by a position refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positions {
    pub balances: Vec<TokenBalance>,
    pub shares: ShareBalance,
}
