//! ERC20 token client

use super::amm::to_receipt;
use super::{contract_error, pending_error, ClientResult, TokenClient};
use crate::contracts::IERC20::{self, IERC20Instance};
use crate::types::TxReceipt;
use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use async_trait::async_trait;
use tracing::info;

pub struct Erc20Token {
    contract: IERC20Instance<DynProvider>,
}

impl Erc20Token {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            contract: IERC20::new(address, provider),
        }
    }
}

#[async_trait]
impl TokenClient for Erc20Token {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn balance_of(&self, owner: Address) -> ClientResult<U256> {
        self.contract.balanceOf(owner).call().await.map_err(contract_error)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> ClientResult<U256> {
        self.contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn approve(&self, spender: Address, amount: U256) -> ClientResult<TxReceipt> {
        let pending = self
            .contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(contract_error)?;
        info!("approve({:?}, {}) on {:?}: {:?}", spender, amount, self.address(), pending.tx_hash());
        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await
            .map_err(|e| pending_error(tx_hash, e))?;
        Ok(to_receipt(&receipt, None))
    }

    async fn transfer(&self, to: Address, amount: U256) -> ClientResult<TxReceipt> {
        let pending = self
            .contract
            .transfer(to, amount)
            .send()
            .await
            .map_err(contract_error)?;
        info!("transfer({:?}, {}) on {:?}: {:?}", to, amount, self.address(), pending.tx_hash());
        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .with_required_confirmations(1)
            .get_receipt()
            .await
            .map_err(|e| pending_error(tx_hash, e))?;
        Ok(to_receipt(&receipt, None))
    }

    async fn symbol(&self) -> ClientResult<String> {
        self.contract.symbol().call().await.map_err(contract_error)
    }

    async fn decimals(&self) -> ClientResult<u8> {
        self.contract.decimals().call().await.map_err(contract_error)
    }
}
