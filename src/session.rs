//! Per-connection state passed explicitly to every router call

use crate::clients::{connect, Network, RpcNetwork, TokenClient};
use crate::config::RouterConfig;
use crate::error::{RouterError, RouterResult};
use crate::registry::Registry;
use crate::types::{Direction, Venue};
use alloy::primitives::Address;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Signing account, chain handle, the token pair and its venues.
///
/// Built once per connection; a network change means building a new one.
#[derive(Clone)]
pub struct Session {
    pub account: Address,
    pub network: Arc<dyn Network>,
    pub token_a: Arc<dyn TokenClient>,
    pub token_b: Arc<dyn TokenClient>,
    /// In priority order
    pub venues: Vec<Venue>,
}

impl Session {
    pub fn new(
        account: Address,
        network: Arc<dyn Network>,
        token_a: Arc<dyn TokenClient>,
        token_b: Arc<dyn TokenClient>,
        mut venues: Vec<Venue>,
    ) -> Self {
        venues.sort_by_key(|v| v.priority);
        Self {
            account,
            network,
            token_a,
            token_b,
            venues,
        }
    }

    /// Connect with `config`, then resolve tokens and venues from its registry file.
    pub async fn connect(config: &RouterConfig) -> Result<Self> {
        let registry = Registry::load(&config.registry_file)?;
        let resolved = registry
            .resolve(config.chain_id)
            .with_context(|| format!("Resolving registry for chain {}", config.chain_id))?;
        let (provider, account) = connect(config).await?;

        let (token_a, token_b) = resolved.tokens(&provider);
        let venues = resolved.venues(&provider);
        info!(
            "Session ready on chain {}: {} venue(s), pair {:?}/{:?}",
            resolved.chain_id,
            venues.len(),
            resolved.token_a,
            resolved.token_b
        );

        Ok(Self::new(
            account,
            Arc::new(RpcNetwork::new(provider)),
            token_a,
            token_b,
            venues,
        ))
    }

    pub fn tokens(&self) -> [Arc<dyn TokenClient>; 2] {
        [self.token_a.clone(), self.token_b.clone()]
    }

    /// Direction of a trade from `input` to `output`, if it is this session's pair.
    pub fn direction(&self, input: Address, output: Address) -> RouterResult<Direction> {
        let (a, b) = (self.token_a.address(), self.token_b.address());
        if input == a && output == b {
            Ok(Direction::Forward)
        } else if input == b && output == a {
            Ok(Direction::Backward)
        } else {
            Err(RouterError::InvalidPair { input, output })
        }
    }

    pub fn input_token(&self, direction: Direction) -> &dyn TokenClient {
        match direction {
            Direction::Forward => self.token_a.as_ref(),
            Direction::Backward => self.token_b.as_ref(),
        }
    }

    pub fn venue(&self, id: &str) -> Option<&Venue> {
        self.venues.iter().find(|v| v.id.as_str() == id)
    }
}
