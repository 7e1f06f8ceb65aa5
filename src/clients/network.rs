//! Provider construction and chain-level reads

use super::{ClientResult, Network};
use crate::config::RouterConfig;
use crate::error::ClientError;
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Build a signing provider for `config` and check it is on the expected chain.
///
/// Returns the type-erased provider and the signing account. All writes from
/// every client built on this provider share the one signer, so nonce ordering
/// is the provider's job.
pub async fn connect(config: &RouterConfig) -> Result<(DynProvider, Address)> {
    let signer: PrivateKeySigner = config
        .private_key
        .trim_start_matches("0x")
        .parse()
        .context("Invalid PRIVATE_KEY")?;
    let account = signer.address();

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect(&config.rpc_url)
        .await
        .with_context(|| format!("Failed to connect to {}", config.rpc_url))?;

    let chain_id = provider
        .get_chain_id()
        .await
        .context("Failed to read chain id")?;
    if chain_id != config.chain_id {
        bail!(
            "RPC endpoint is on chain {} but CHAIN_ID is {}",
            chain_id,
            config.chain_id
        );
    }

    info!("Connected to chain {} as {:?}", chain_id, account);
    Ok((provider.erased(), account))
}

pub struct RpcNetwork {
    provider: DynProvider,
}

impl RpcNetwork {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Network for RpcNetwork {
    async fn chain_id(&self) -> ClientResult<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn block_number(&self) -> ClientResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn gas_price(&self) -> ClientResult<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}
