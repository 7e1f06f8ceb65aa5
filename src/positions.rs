//! Balance and LP share synchronization
//!
//! A refresh never fails. Each read that errors degrades to zero so a
//! flaky venue cannot leave stale numbers on display.

use crate::clients::TokenClient;
use crate::types::{by_priority, Positions, ShareBalance, TokenBalance, Venue};
use alloy::primitives::utils::format_units;
use alloy::primitives::{Address, U256};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct PositionSync {
    /// Unit decimals of tokens and LP shares
    pub decimals: u8,
    /// Decimal places in display strings
    pub precision: usize,
}

impl Default for PositionSync {
    fn default() -> Self {
        Self {
            decimals: 18,
            precision: 4,
        }
    }
}

impl PositionSync {
    pub fn new(decimals: u8, precision: usize) -> Self {
        Self { decimals, precision }
    }

    /// Render a raw amount, e.g. 1.5e18 -> "1.5000".
    pub fn format(&self, raw: U256) -> String {
        let Ok(units) = format_units(raw, self.decimals) else {
            return format!("{:.*}", self.precision, 0.0);
        };
        match Decimal::from_str(&units) {
            Ok(d) => format!("{:.*}", self.precision, d.round_dp(self.precision as u32)),
            // Beyond Decimal range; f64 is close enough for display
            Err(_) => format!("{:.*}", self.precision, units.parse::<f64>().unwrap_or(0.0)),
        }
    }

    pub async fn refresh(
        &self,
        tokens: &[Arc<dyn TokenClient>],
        venues: &[Venue],
        account: Address,
    ) -> Positions {
        let balances = join_all(tokens.iter().map(|t| self.balance(t.as_ref(), account))).await;
        let shares = self.shares(venues, account).await;
        Positions { balances, shares }
    }

    async fn balance(&self, token: &dyn TokenClient, account: Address) -> TokenBalance {
        let raw = match token.balance_of(account).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Balance read for {:?} failed, showing zero: {}", token.address(), e);
                U256::ZERO
            }
        };
        TokenBalance {
            token: token.address(),
            raw,
            display: self.format(raw),
        }
    }

    async fn shares(&self, venues: &[Venue], account: Address) -> ShareBalance {
        for venue in by_priority(venues) {
            match venue.pool.shares_of(account).await {
                Ok(raw) => {
                    debug!("Shares for {:?} read from {}: {}", account, venue.id, raw);
                    return ShareBalance {
                        raw,
                        display: self.format(raw),
                        venue: Some(venue.id.clone()),
                    };
                }
                Err(e) => debug!("Share read on {} failed, trying next: {}", venue.id, e),
            }
        }

        warn!("No venue answered the share read; resetting shares to zero");
        ShareBalance {
            raw: U256::ZERO,
            display: self.format(U256::ZERO),
            venue: None,
        }
    }
}
