//! Static address registry
//!
//! Per-network map of token, pool and router addresses, keyed by chain id:
//!
//! ```json
//! {
//!   "31337": {
//!     "tokens": { "kel": { "address": "0x..." }, "usd": { "address": "0x..." } },
//!     "amms": {
//!       "amm1": { "address": "0x..." },
//!       "amm3": { "address": "0x...", "trust": "untrusted" }
//!     },
//!     "aggregator": { "address": "0x..." }
//!   }
//! }
//! ```
//!
//! Loaded once and never written. Pools default to priority order by key
//! (`amm1` before `amm2`); an explicit `priority` overrides that.

use crate::clients::{AggregatorVenue, AmmPool, Erc20Token, TokenClient};
use crate::types::{Venue, VenueId, VenueTrust};
use alloy::primitives::Address;
use alloy::providers::DynProvider;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct Registry {
    #[serde(flatten)]
    pub networks: BTreeMap<String, NetworkEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkEntry {
    /// Exactly two tokens; the pair order is set by `pair`
    pub tokens: BTreeMap<String, AddressEntry>,
    /// Token keys as (A, B). Defaults to the first two token keys in order.
    #[serde(default)]
    pub pair: Option<(String, String)>,
    #[serde(default)]
    pub amms: BTreeMap<String, PoolEntry>,
    #[serde(default)]
    pub aggregator: Option<PoolEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AddressEntry {
    pub address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PoolEntry {
    /// Null/absent for a pool that is not deployed on this network
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default = "default_trust")]
    pub trust: VenueTrust,
}

fn default_trust() -> VenueTrust {
    VenueTrust::Trusted
}

/// Addresses resolved for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNetwork {
    pub chain_id: u64,
    pub token_a: Address,
    pub token_b: Address,
    /// (id, address, priority, trust), in priority order
    pub pools: Vec<(VenueId, Address, u32, VenueTrust)>,
    pub aggregator: Option<(Address, u32, VenueTrust)>,
}

impl Registry {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read registry: {}", path.as_ref().display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(content).context("Failed to parse registry JSON")?;
        info!("Registry loaded: {} network(s)", registry.networks.len());
        Ok(registry)
    }

    /// Resolve and validate every address for `chain_id`.
    pub fn resolve(&self, chain_id: u64) -> Result<ResolvedNetwork> {
        let entry = self
            .networks
            .get(&chain_id.to_string())
            .ok_or_else(|| anyhow!("Registry has no entry for chain {}", chain_id))?;

        let (key_a, key_b) = match &entry.pair {
            Some((a, b)) => (a.clone(), b.clone()),
            None => {
                let mut keys = entry.tokens.keys();
                match (keys.next(), keys.next()) {
                    (Some(a), Some(b)) => (a.clone(), b.clone()),
                    _ => bail!("Registry chain {} needs two tokens", chain_id),
                }
            }
        };
        let token_a = token_address(entry, &key_a)?;
        let token_b = token_address(entry, &key_b)?;

        let mut pools = Vec::new();
        for (index, (key, pool)) in entry.amms.iter().enumerate() {
            let Some(raw) = pool.address.as_deref() else {
                debug!("Pool {} not deployed on chain {}, skipping", key, chain_id);
                continue;
            };
            let address = parse_address(raw).with_context(|| format!("Pool {}", key))?;
            let priority = pool.priority.unwrap_or(index as u32);
            pools.push((VenueId::new(key.clone()), address, priority, pool.trust));
        }
        pools.sort_by_key(|(_, _, priority, _)| *priority);

        let aggregator = match &entry.aggregator {
            Some(PoolEntry {
                address: Some(raw),
                priority,
                trust,
            }) => {
                let address = parse_address(raw).context("Aggregator")?;
                // Behind every direct pool unless told otherwise
                Some((address, priority.unwrap_or(entry.amms.len() as u32), *trust))
            }
            _ => None,
        };

        if pools.is_empty() && aggregator.is_none() {
            warn!("Registry chain {} has no tradeable venues", chain_id);
        }

        Ok(ResolvedNetwork {
            chain_id,
            token_a,
            token_b,
            pools,
            aggregator,
        })
    }
}

impl ResolvedNetwork {
    /// Build venues over `provider`, in priority order.
    pub fn venues(&self, provider: &DynProvider) -> Vec<Venue> {
        let mut venues: Vec<Venue> = self
            .pools
            .iter()
            .map(|(id, address, priority, trust)| Venue {
                id: id.clone(),
                pool: Arc::new(AmmPool::new(id.clone(), *address, provider.clone())),
                priority: *priority,
                trust: *trust,
            })
            .collect();

        if let Some((address, priority, trust)) = self.aggregator {
            let id = VenueId::new("aggregator");
            venues.push(Venue {
                id: id.clone(),
                pool: Arc::new(AggregatorVenue::new(id, address, provider.clone())),
                priority,
                trust,
            });
        }

        venues.sort_by_key(|v| v.priority);
        venues
    }

    pub fn tokens(&self, provider: &DynProvider) -> (Arc<dyn TokenClient>, Arc<dyn TokenClient>) {
        (
            Arc::new(Erc20Token::new(self.token_a, provider.clone())),
            Arc::new(Erc20Token::new(self.token_b, provider.clone())),
        )
    }
}

fn token_address(entry: &NetworkEntry, key: &str) -> Result<Address> {
    let token = entry
        .tokens
        .get(key)
        .ok_or_else(|| anyhow!("Token {} missing from registry", key))?;
    parse_address(&token.address).with_context(|| format!("Token {}", key))
}

fn parse_address(raw: &str) -> Result<Address> {
    raw.trim()
        .parse::<Address>()
        .with_context(|| format!("Invalid address format: {}", raw))
}
