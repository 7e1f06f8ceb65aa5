//! Error taxonomy
//!
//! `ClientError` is what a single contract read/write can fail with.
//! `RouterError` is what the engine surfaces to its caller. Quote-path
//! failures never reach the caller as errors: they degrade to invalid
//! quotes. Approval and swap path failures always propagate.

use crate::types::{Direction, VenueId};
use alloy::primitives::{Address, TxHash, U256};
use thiserror::Error;

pub type RouterResult<T> = Result<T, RouterError>;

/// Failure of one contract interaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("execution reverted{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Reverted { reason: Option<String> },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("operation not supported by this venue: {0}")]
    Unsupported(&'static str),

    /// Sent, but the confirmation wait failed. The transaction may still land.
    #[error("transaction {tx_hash} sent but not confirmed: {reason}")]
    Unconfirmed { tx_hash: TxHash, reason: String },
}

impl ClientError {
    /// Decoded revert reason, if this failure carries one.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            ClientError::Reverted { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// Hash of a broadcast transaction this failure refers to.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            ClientError::Unconfirmed { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// Why a venue produced no usable quote.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteErrorKind {
    #[error("timed out after {timeout_ms} ms")]
    NetworkTimeout { timeout_ms: u64 },

    #[error("venue error: {0}")]
    UnknownVenueError(String),
}

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("no liquidity available: all {venues} venue(s) returned invalid {direction} quotes for {amount_in}")]
    NoLiquidityAvailable {
        direction: Direction,
        amount_in: U256,
        venues: usize,
    },

    #[error("allowance of {token} for {spender} is {current}, required {required}")]
    ApprovalInsufficient {
        token: Address,
        spender: Address,
        current: U256,
        required: U256,
    },

    #[error("insufficient balance of {token}: have {balance}, need {required}")]
    InsufficientBalance {
        token: Address,
        balance: U256,
        required: U256,
    },

    #[error("gas estimation failed on {venue}: {reason}")]
    GasEstimationFailed { venue: VenueId, reason: String },

    #[error("transaction reverted{}{}",
        .tx_hash.map(|h| format!(" ({h})")).unwrap_or_default(),
        .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    TransactionReverted {
        tx_hash: Option<TxHash>,
        reason: Option<String>,
    },

    #[error("venue {venue} timed out after {timeout_ms} ms")]
    NetworkTimeout { venue: VenueId, timeout_ms: u64 },

    #[error("venue {venue} failed: {message}")]
    UnknownVenueError { venue: VenueId, message: String },

    #[error("insufficient LP shares: hold {held}, requested {requested}")]
    InsufficientShares { held: U256, requested: U256 },

    #[error("deposit ratio mismatch: expected {expected} of token B, got {provided}")]
    DepositRatioMismatch { expected: U256, provided: U256 },

    #[error("token pair {input} -> {output} is not tradeable in this session")]
    InvalidPair { input: Address, output: Address },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("request account {requested} is not the session signer {signer}")]
    AccountMismatch { signer: Address, requested: Address },

    #[error("transaction {tx_hash} is pending without confirmation: {reason}")]
    Unconfirmed { tx_hash: TxHash, reason: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl RouterError {
    /// Normalize a failed write into a terminal error carrying the revert
    /// reason, or the hash of a transaction left pending.
    pub fn from_write(err: ClientError) -> Self {
        match err {
            ClientError::Reverted { reason } => RouterError::TransactionReverted {
                tx_hash: None,
                reason,
            },
            ClientError::Unconfirmed { tx_hash, reason } => RouterError::Unconfirmed { tx_hash, reason },
            other => RouterError::Client(other),
        }
    }

    /// Hash of the transaction this error refers to, if one was broadcast.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            RouterError::TransactionReverted { tx_hash, .. } => *tx_hash,
            RouterError::Unconfirmed { tx_hash, .. } => Some(*tx_hash),
            RouterError::Client(e) => e.tx_hash(),
            _ => None,
        }
    }

    /// Best-effort human readable reason for display.
    pub fn user_message(&self) -> String {
        match self {
            RouterError::TransactionReverted {
                reason: Some(reason),
                ..
            } => format!("Transaction failed: {reason}"),
            RouterError::Client(ClientError::Reverted {
                reason: Some(reason),
            }) => format!("Transaction failed: {reason}"),
            other => format!("Transaction failed: {other}"),
        }
    }
}
