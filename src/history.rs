//! Swap history across venues
//!
//! Pulls `Swap` events from every venue concurrently. A venue whose log
//! query fails contributes nothing rather than failing the whole load.

use crate::types::{SwapEvent, Venue};
use futures::future::join_all;
use tracing::{debug, warn};

/// All swaps since `from_block`, oldest first. Events from the same block
/// keep venue priority order.
pub async fn load_swaps(venues: &[Venue], from_block: u64) -> Vec<SwapEvent> {
    let futs = venues.iter().map(|venue| async move {
        match venue.pool.swap_history(from_block).await {
            Ok(events) => {
                debug!("{} swap event(s) from {}", events.len(), venue.id);
                events
                    .into_iter()
                    .map(|mut e| {
                        e.venue.get_or_insert_with(|| venue.id.clone());
                        e
                    })
                    .collect()
            }
            Err(e) => {
                warn!("Swap history from {} unavailable: {}", venue.id, e);
                Vec::new()
            }
        }
    });

    let mut swaps: Vec<SwapEvent> = join_all(futs).await.into_iter().flatten().collect();
    // Stable: ties keep venue order
    swaps.sort_by_key(|e| e.block_number.unwrap_or(0));
    swaps
}
