//! Multi-venue constant-product swap router
//!
//! Quotes a token pair across several AMM pools at once, picks the best
//! output, manages the approval the chosen pool needs, executes and
//! confirms the swap, then resynchronizes balances and LP shares.

pub mod approval;
pub mod clients;
pub mod config;
pub mod contracts;
pub mod error;
pub mod executor;
pub mod history;
pub mod liquidity;
pub mod math;
pub mod positions;
pub mod quote;
pub mod registry;
pub mod router;
pub mod session;
pub mod subscription;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{load_config, RouterConfig};
pub use error::{ClientError, RouterError, RouterResult};
pub use router::{SwapOutcome, SwapRouter};
pub use session::Session;
pub use subscription::{ChainEvent, Subscription};
pub use types::{BestQuote, Direction, Positions, Quote, SwapReceipt, SwapRequest, Venue, VenueId};
