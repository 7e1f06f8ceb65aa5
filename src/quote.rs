//! Best-price quote aggregation
//!
//! Fans one read-only quote out to every venue at once and keeps the
//! strictly greatest output. Venues are awaited together via
//! `futures::future::join_all`, so total latency is the slowest trusted
//! venue or the untrusted deadline, whichever is larger.
//!
//! Untrusted venues race `tokio::time::timeout`. Losing the race drops the
//! query future: the RPC request may still complete remotely and its answer
//! is ignored.

use crate::error::{QuoteErrorKind, RouterError, RouterResult};
use crate::types::{by_priority, BestQuote, Direction, Quote, Venue, VenueTrust};
use alloy::primitives::U256;
use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct QuoteAggregator {
    untrusted_timeout: Duration,
}

impl QuoteAggregator {
    pub fn new(untrusted_timeout: Duration) -> Self {
        Self { untrusted_timeout }
    }

    pub fn untrusted_timeout(&self) -> Duration {
        self.untrusted_timeout
    }

    /// Quote `amount_in` on every venue and pick the best.
    ///
    /// Ties keep the venue that comes first in priority order. Fails with
    /// `NoLiquidityAvailable` when no venue produced a valid quote.
    pub async fn quote(
        &self,
        direction: Direction,
        amount_in: U256,
        venues: &[Venue],
    ) -> RouterResult<BestQuote> {
        if amount_in.is_zero() {
            return Err(RouterError::InvalidAmount("amount in must be non-zero".into()));
        }

        let ordered = by_priority(venues);
        let futs: Vec<_> = ordered
            .iter()
            .map(|venue| self.quote_venue(venue, direction, amount_in))
            .collect();
        let quotes = join_all(futs).await;

        let mut best: Option<&Quote> = None;
        for quote in quotes.iter().filter(|q| q.valid) {
            // Strictly greater: an equal later venue never displaces an earlier one
            if best.map_or(true, |b| quote.output_amount > b.output_amount) {
                best = Some(quote);
            }
        }

        let Some(best) = best.cloned() else {
            warn!(
                "No valid {} quote for {} across {} venue(s)",
                direction,
                amount_in,
                quotes.len()
            );
            return Err(RouterError::NoLiquidityAvailable {
                direction,
                amount_in,
                venues: quotes.len(),
            });
        };

        info!(
            "Best {} quote: {} -> {} on {} ({} of {} venues valid)",
            direction,
            amount_in,
            best.output_amount,
            best.venue_id,
            quotes.iter().filter(|q| q.valid).count(),
            quotes.len()
        );

        Ok(BestQuote {
            best,
            amount_in,
            quotes,
        })
    }

    async fn quote_venue(&self, venue: &Venue, direction: Direction, amount_in: U256) -> Quote {
        let call = venue.pool.quote(direction, amount_in);

        let result = match venue.trust {
            VenueTrust::Trusted => call.await,
            VenueTrust::Untrusted => match tokio::time::timeout(self.untrusted_timeout, call).await {
                Ok(result) => result,
                Err(_) => {
                    let timeout_ms = self.untrusted_timeout.as_millis() as u64;
                    warn!("Quote from {} timed out after {} ms", venue.id, timeout_ms);
                    return Quote::invalid(
                        venue.id.clone(),
                        direction,
                        QuoteErrorKind::NetworkTimeout { timeout_ms },
                    );
                }
            },
        };

        match result {
            Ok(output) => {
                debug!("{} quoted {} -> {} ({})", venue.id, amount_in, output, direction);
                Quote::valid(venue.id.clone(), direction, output)
            }
            Err(e) => {
                warn!("Quote from {} failed: {}", venue.id, e);
                Quote::invalid(
                    venue.id.clone(),
                    direction,
                    QuoteErrorKind::UnknownVenueError(e.to_string()),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ether, venue, MockPool};
    use alloy::primitives::Address;
    use std::sync::Arc;

    fn pool(last: u8, ra: u64, rb: u64) -> MockPool {
        MockPool::new(Address::with_last_byte(last), ether(ra), ether(rb))
    }

    #[tokio::test]
    async fn test_picks_greatest_output() {
        // X(100, 100) vs Y(80, 120): Y gives more B per A
        let x = Arc::new(pool(1, 100, 100));
        let y = Arc::new(pool(2, 80, 120));
        let venues = vec![venue("x", x, 0), venue("y", y, 1)];

        let best = QuoteAggregator::new(Duration::from_secs(5))
            .quote(Direction::Forward, ether(10), &venues)
            .await
            .unwrap();

        assert_eq!(best.venue_id().as_str(), "y");
        assert_eq!(best.quotes.len(), 2);
        assert!(best.quotes.iter().all(|q| q.valid));
        assert!(best.quotes[0].output_amount < best.quotes[1].output_amount);
        assert!(best.price().is_some());
    }

    #[tokio::test]
    async fn test_backward_direction_uses_other_side() {
        // Backward on Y(80, 120) is worse than on X(100, 100)
        let x = Arc::new(pool(1, 100, 100));
        let y = Arc::new(pool(2, 80, 120));
        let venues = vec![venue("x", x, 0), venue("y", y, 1)];

        let best = QuoteAggregator::new(Duration::from_secs(5))
            .quote(Direction::Backward, ether(10), &venues)
            .await
            .unwrap();
        assert_eq!(best.venue_id().as_str(), "x");
    }

    #[tokio::test]
    async fn test_tie_keeps_earlier_priority() {
        let a = Arc::new(pool(1, 100, 100));
        let b = Arc::new(pool(2, 100, 100));
        // Listed out of order; priority decides
        let venues = vec![venue("late", b, 5), venue("early", a, 1)];

        let best = QuoteAggregator::new(Duration::from_secs(5))
            .quote(Direction::Forward, ether(1), &venues)
            .await
            .unwrap();

        assert_eq!(best.venue_id().as_str(), "early");
        assert_eq!(best.quotes[0].venue_id.as_str(), "early");
        assert_eq!(best.quotes[0].output_amount, best.quotes[1].output_amount);
    }

    #[tokio::test(start_paused = true)]
    async fn test_untrusted_timeout_is_excluded() {
        let trusted = Arc::new(pool(1, 100, 100));
        // Slow venue has the better price but misses the deadline
        let mut slow = pool(2, 80, 120);
        slow.quote_delay = Some(Duration::from_millis(6000));
        let venues = vec![
            venue("amm1", trusted, 0),
            venue("amm3", Arc::new(slow), 1).untrusted(),
        ];

        let best = QuoteAggregator::new(Duration::from_millis(5000))
            .quote(Direction::Forward, ether(10), &venues)
            .await
            .unwrap();

        assert_eq!(best.venue_id().as_str(), "amm1");
        let slow_quote = &best.quotes[1];
        assert!(!slow_quote.valid);
        assert_eq!(slow_quote.output_amount, U256::ZERO);
        assert_eq!(
            slow_quote.error_kind,
            Some(QuoteErrorKind::NetworkTimeout { timeout_ms: 5000 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_trusted_venue_has_no_deadline() {
        let mut slow = pool(1, 100, 100);
        slow.quote_delay = Some(Duration::from_millis(9000));
        let venues = vec![venue("amm1", Arc::new(slow), 0)];

        let best = QuoteAggregator::new(Duration::from_millis(5000))
            .quote(Direction::Forward, ether(1), &venues)
            .await
            .unwrap();
        assert!(best.best.valid);
    }

    #[tokio::test]
    async fn test_all_invalid_is_no_liquidity() {
        let mut a = pool(1, 100, 100);
        a.fail_quotes = true;
        let mut b = pool(2, 100, 100);
        b.fail_quotes = true;
        let venues = vec![venue("a", Arc::new(a), 0), venue("b", Arc::new(b), 1)];

        let err = QuoteAggregator::new(Duration::from_secs(5))
            .quote(Direction::Forward, ether(1), &venues)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::NoLiquidityAvailable { venues: 2, .. }));
    }

    #[tokio::test]
    async fn test_failed_venue_is_skipped() {
        let mut broken = pool(1, 80, 120);
        broken.fail_quotes = true;
        let ok = Arc::new(pool(2, 100, 100));
        let venues = vec![venue("broken", Arc::new(broken), 0), venue("ok", ok, 1)];

        let best = QuoteAggregator::new(Duration::from_secs(5))
            .quote(Direction::Forward, ether(1), &venues)
            .await
            .unwrap();
        assert_eq!(best.venue_id().as_str(), "ok");
        assert!(matches!(
            best.quotes[0].error_kind,
            Some(QuoteErrorKind::UnknownVenueError(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_amount_and_no_venues() {
        let agg = QuoteAggregator::new(Duration::from_secs(5));
        let err = agg.quote(Direction::Forward, U256::ZERO, &[]).await.unwrap_err();
        assert!(matches!(err, RouterError::InvalidAmount(_)));

        let err = agg.quote(Direction::Forward, ether(1), &[]).await.unwrap_err();
        assert!(matches!(err, RouterError::NoLiquidityAvailable { venues: 0, .. }));
    }
}
