//! Swap Router
//!
//! Entry point for callers. A trade is two calls with a confirmation step
//! in between:
//!
//! ```text
//! quote(session, request)          read-only, all venues
//!   -> caller confirms BestQuote
//! swap(session, request, best)     approve -> execute -> refresh
//! ```
//!
//! Liquidity calls are independent of the trade path and refresh positions
//! on their own. Nothing here serializes independent swaps from the same
//! account; that is the caller's concern.

use crate::approval::{ApprovalManager, ApprovalOutcome};
use crate::config::RouterConfig;
use crate::error::{RouterError, RouterResult};
use crate::executor::{GasPolicy, SwapExecutor};
use crate::history;
use crate::liquidity::{DepositAmount, LiquidityManager, LiquidityReceipt};
use crate::positions::PositionSync;
use crate::quote::QuoteAggregator;
use crate::session::Session;
use crate::subscription::{ChainWatcher, Subscription};
use crate::types::{BestQuote, Positions, SwapEvent, SwapReceipt, SwapRequest, Venue, VenueId};
use alloy::primitives::U256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Everything a confirmed swap produced.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub quote: BestQuote,
    pub approval: ApprovalOutcome,
    pub receipt: SwapReceipt,
    pub positions: Positions,
}

pub struct SwapRouter {
    quotes: QuoteAggregator,
    approvals: Arc<ApprovalManager>,
    gas: GasPolicy,
    positions: PositionSync,
    liquidity: LiquidityManager,
    watch_interval: Duration,
}

impl SwapRouter {
    pub fn new(config: &RouterConfig) -> Self {
        let approvals = Arc::new(ApprovalManager::new());
        let positions = PositionSync::new(config.token_decimals, config.display_precision);
        Self {
            quotes: QuoteAggregator::new(config.untrusted_timeout()),
            gas: GasPolicy {
                buffer_percent: config.gas_buffer_percent,
                fallback_limit: config.fallback_gas_limit,
            },
            liquidity: LiquidityManager::new(approvals.clone(), positions),
            approvals,
            positions,
            watch_interval: config.watch_interval(),
        }
    }

    /// Best quote for `request` across the session's venues.
    pub async fn quote(&self, session: &Session, request: &SwapRequest) -> RouterResult<BestQuote> {
        let direction = session.direction(request.input_token, request.output_token)?;
        self.quotes
            .quote(direction, request.amount_in, &session.venues)
            .await
    }

    /// Execute a confirmed quote: approve the venue, swap, refresh positions.
    ///
    /// The request must be for the session's signer, and the balance is
    /// checked before any approval goes out.
    pub async fn swap(
        &self,
        session: &Session,
        request: &SwapRequest,
        best: BestQuote,
    ) -> RouterResult<SwapOutcome> {
        if request.account != session.account {
            return Err(RouterError::AccountMismatch {
                signer: session.account,
                requested: request.account,
            });
        }
        let direction = session.direction(request.input_token, request.output_token)?;
        if best.best.direction != direction || best.amount_in != request.amount_in {
            return Err(RouterError::InvalidAmount(format!(
                "quote is for {} {} but request is {} {}",
                best.amount_in, best.best.direction, request.amount_in, direction
            )));
        }
        let venue = self.venue(session, best.venue_id().as_str())?;
        let input = session.input_token(direction);

        info!(
            "Swap {} {} via {} (quoted {})",
            request.amount_in,
            direction,
            venue.id,
            best.output_amount()
        );

        let executor = SwapExecutor::new(session.network.clone(), self.gas);
        executor
            .check_balance(input, request.amount_in, session.account)
            .await?;

        let approval = self
            .approvals
            .ensure_allowance(input, session.account, venue.spender(), request.amount_in)
            .await?;

        let receipt = executor
            .execute(venue, direction, input, request.amount_in, session.account)
            .await?;

        if let Some(realized) = receipt.realized_output {
            if realized != best.output_amount() {
                warn!(
                    "Realized output {} differs from quote {} (pool moved)",
                    realized,
                    best.output_amount()
                );
            }
        }

        let positions = self.refresh(session).await;
        Ok(SwapOutcome {
            quote: best,
            approval,
            receipt,
            positions,
        })
    }

    /// Quote and swap in one call, skipping the caller confirmation step.
    pub async fn quote_and_swap(&self, session: &Session, request: &SwapRequest) -> RouterResult<SwapOutcome> {
        let best = self.quote(session, request).await?;
        self.swap(session, request, best).await
    }

    pub async fn refresh(&self, session: &Session) -> Positions {
        self.positions
            .refresh(&session.tokens(), &session.venues, session.account)
            .await
    }

    /// Every swap on every venue since genesis, oldest first.
    pub async fn swap_history(&self, session: &Session) -> Vec<SwapEvent> {
        history::load_swaps(&session.venues, 0).await
    }

    pub async fn deposit_amounts(&self, session: &Session, venue_id: &str, amount_a: U256) -> RouterResult<DepositAmount> {
        let venue = self.venue(session, venue_id)?;
        self.liquidity.deposit_amounts(venue.pool.as_ref(), amount_a).await
    }

    pub async fn deposit_amounts_for_b(
        &self,
        session: &Session,
        venue_id: &str,
        amount_b: U256,
    ) -> RouterResult<DepositAmount> {
        let venue = self.venue(session, venue_id)?;
        self.liquidity.deposit_amounts_for_b(venue.pool.as_ref(), amount_b).await
    }

    pub async fn withdraw_amounts(&self, session: &Session, venue_id: &str, shares: U256) -> RouterResult<(U256, U256)> {
        let venue = self.venue(session, venue_id)?;
        self.liquidity.withdraw_amounts(venue.pool.as_ref(), shares).await
    }

    pub async fn deposit(
        &self,
        session: &Session,
        venue_id: &str,
        amount_a: U256,
        amount_b: U256,
    ) -> RouterResult<LiquidityReceipt> {
        let venue = self.venue(session, venue_id)?;
        self.liquidity.deposit(session, venue, amount_a, amount_b).await
    }

    pub async fn withdraw(&self, session: &Session, venue_id: &str, shares: U256) -> RouterResult<LiquidityReceipt> {
        let venue = self.venue(session, venue_id)?;
        self.liquidity.withdraw(session, venue, shares).await
    }

    /// Watch the session's network for new blocks and chain switches.
    pub fn subscribe(&self, session: &Session) -> Subscription {
        ChainWatcher::new(session.network.clone(), self.watch_interval).spawn()
    }

    fn venue<'a>(&self, session: &'a Session, id: &str) -> RouterResult<&'a Venue> {
        session.venue(id).ok_or_else(|| RouterError::UnknownVenueError {
            venue: VenueId::new(id),
            message: "not part of this session".to_string(),
        })
    }
}
