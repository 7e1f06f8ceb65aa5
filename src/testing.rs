//! In-memory clients for unit tests

use crate::clients::{ClientResult, GasParams, Network, PoolClient, TokenClient};
use crate::error::ClientError;
use crate::math;
use crate::types::{Direction, SwapEvent, TxReceipt, Venue};
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ACCOUNT: Address = Address::with_last_byte(0xAA);
pub const TOKEN_A: Address = Address::with_last_byte(0x0A);
pub const TOKEN_B: Address = Address::with_last_byte(0x0B);

static TX_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_receipt(success: bool, swap_events: Vec<SwapEvent>) -> TxReceipt {
    let n = TX_COUNTER.fetch_add(1, Ordering::SeqCst);
    TxReceipt {
        tx_hash: B256::from(U256::from(n)),
        block_number: n,
        success,
        gas_used: 21_000,
        swap_events,
    }
}

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18))
}

// ── Token ────────────────────────────────────────────────────────────

#[derive(Default)]
struct TokenBook {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

pub struct MockToken {
    address: Address,
    book: Mutex<TokenBook>,
    /// approve(_, 0) reverts (tokens that reject a redundant reset)
    pub revert_zero_approval: bool,
    /// every approve() reverts
    pub revert_approvals: bool,
    /// approve() confirms but leaves the allowance untouched
    pub ignore_approvals: bool,
    pub fail_balance: bool,
    approvals: Mutex<Vec<U256>>,
}

impl MockToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            book: Mutex::new(TokenBook::default()),
            revert_zero_approval: false,
            revert_approvals: false,
            ignore_approvals: false,
            fail_balance: false,
            approvals: Mutex::new(Vec::new()),
        }
    }

    pub fn with_balance(self, owner: Address, amount: U256) -> Self {
        self.book.lock().unwrap().balances.insert(owner, amount);
        self
    }

    pub fn with_allowance(self, owner: Address, spender: Address, amount: U256) -> Self {
        self.book
            .lock()
            .unwrap()
            .allowances
            .insert((owner, spender), amount);
        self
    }

    /// Amounts passed to approve(), in call order (reverted calls included)
    pub fn approvals(&self) -> Vec<U256> {
        self.approvals.lock().unwrap().clone()
    }

    pub fn current_allowance(&self, owner: Address, spender: Address) -> U256 {
        self.book
            .lock()
            .unwrap()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TokenClient for MockToken {
    fn address(&self) -> Address {
        self.address
    }

    async fn balance_of(&self, owner: Address) -> ClientResult<U256> {
        if self.fail_balance {
            return Err(ClientError::Transport("balance read failed".into()));
        }
        Ok(self
            .book
            .lock()
            .unwrap()
            .balances
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn allowance(&self, owner: Address, spender: Address) -> ClientResult<U256> {
        Ok(self.current_allowance(owner, spender))
    }

    async fn approve(&self, spender: Address, amount: U256) -> ClientResult<TxReceipt> {
        self.approvals.lock().unwrap().push(amount);
        if self.revert_approvals || (self.revert_zero_approval && amount.is_zero()) {
            return Err(ClientError::Reverted {
                reason: Some("approve reverted".into()),
            });
        }
        if !self.ignore_approvals {
            self.book
                .lock()
                .unwrap()
                .allowances
                .insert((ACCOUNT, spender), amount);
        }
        Ok(next_receipt(true, Vec::new()))
    }

    async fn transfer(&self, to: Address, amount: U256) -> ClientResult<TxReceipt> {
        let mut book = self.book.lock().unwrap();
        let from = book.balances.get(&ACCOUNT).copied().unwrap_or_default();
        if from < amount {
            return Err(ClientError::Reverted {
                reason: Some("insufficient balance".into()),
            });
        }
        book.balances.insert(ACCOUNT, from - amount);
        *book.balances.entry(to).or_default() += amount;
        Ok(next_receipt(true, Vec::new()))
    }

    async fn symbol(&self) -> ClientResult<String> {
        Ok("MOCK".to_string())
    }

    async fn decimals(&self) -> ClientResult<u8> {
        Ok(18)
    }
}

// ── Pool ─────────────────────────────────────────────────────────────

struct PoolBook {
    reserve_a: U256,
    reserve_b: U256,
    total_shares: U256,
    shares: HashMap<Address, U256>,
}

pub struct MockPool {
    address: Address,
    book: Mutex<PoolBook>,
    pub quote_delay: Option<Duration>,
    pub fail_quotes: bool,
    pub fail_estimate: bool,
    pub fail_shares: bool,
    pub fail_history: bool,
    /// swap confirms with a failure status
    pub revert_status: bool,
    /// swap send is rejected with a revert reason
    pub revert_send: Option<String>,
    /// swap confirms without emitting a Swap event
    pub silent_swaps: bool,
    /// writes are sent but the confirmation wait fails
    pub drop_confirmations: bool,
    pub estimate: u64,
    writes: AtomicUsize,
    last_gas: Mutex<Option<GasParams>>,
    history: Mutex<Vec<SwapEvent>>,
}

impl MockPool {
    pub fn new(address: Address, reserve_a: U256, reserve_b: U256) -> Self {
        Self {
            address,
            book: Mutex::new(PoolBook {
                reserve_a,
                reserve_b,
                total_shares: U256::ZERO,
                shares: HashMap::new(),
            }),
            quote_delay: None,
            fail_quotes: false,
            fail_estimate: false,
            fail_shares: false,
            fail_history: false,
            revert_status: false,
            revert_send: None,
            silent_swaps: false,
            drop_confirmations: false,
            estimate: 100_000,
            writes: AtomicUsize::new(0),
            last_gas: Mutex::new(None),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn with_shares(self, total: U256, owner: Address, held: U256) -> Self {
        {
            let mut book = self.book.lock().unwrap();
            book.total_shares = total;
            book.shares.insert(owner, held);
        }
        self
    }

    pub fn with_history(self, events: Vec<SwapEvent>) -> Self {
        *self.history.lock().unwrap() = events;
        self
    }

    /// Number of state-changing transactions sent to this pool
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn last_gas(&self) -> Option<GasParams> {
        *self.last_gas.lock().unwrap()
    }

    pub fn reserves(&self) -> (U256, U256) {
        let book = self.book.lock().unwrap();
        (book.reserve_a, book.reserve_b)
    }

    fn oriented(&self, direction: Direction) -> (U256, U256) {
        let (a, b) = self.reserves();
        match direction {
            Direction::Forward => (a, b),
            Direction::Backward => (b, a),
        }
    }

    async fn quote_for(&self, direction: Direction, amount_in: U256) -> ClientResult<U256> {
        if let Some(delay) = self.quote_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_quotes {
            return Err(ClientError::Reverted {
                reason: Some("quote failed".into()),
            });
        }
        let (reserve_in, reserve_out) = self.oriented(direction);
        math::amount_out(amount_in, reserve_in, reserve_out)
            .ok_or_else(|| ClientError::Decode("overflow".into()))
    }

    fn do_swap(&self, direction: Direction, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last_gas.lock().unwrap() = Some(gas);
        if let Some(reason) = &self.revert_send {
            return Err(ClientError::Reverted {
                reason: Some(reason.clone()),
            });
        }
        if self.revert_status {
            return Ok(next_receipt(false, Vec::new()));
        }
        if self.drop_confirmations {
            return Err(ClientError::Unconfirmed {
                tx_hash: next_receipt(true, Vec::new()).tx_hash,
                reason: "confirmation timed out".to_string(),
            });
        }

        let mut book = self.book.lock().unwrap();
        let (reserve_in, reserve_out) = match direction {
            Direction::Forward => (book.reserve_a, book.reserve_b),
            Direction::Backward => (book.reserve_b, book.reserve_a),
        };
        let out = math::amount_out(amount_in, reserve_in, reserve_out)
            .ok_or_else(|| ClientError::Decode("overflow".into()))?;
        let (token_give, token_get) = match direction {
            Direction::Forward => {
                book.reserve_a += amount_in;
                book.reserve_b -= out;
                (TOKEN_A, TOKEN_B)
            }
            Direction::Backward => {
                book.reserve_b += amount_in;
                book.reserve_a -= out;
                (TOKEN_B, TOKEN_A)
            }
        };

        let events = if self.silent_swaps {
            Vec::new()
        } else {
            vec![SwapEvent {
                venue: None,
                user: ACCOUNT,
                token_give,
                amount_give: amount_in,
                token_get,
                amount_get: out,
                reserve_a: book.reserve_a,
                reserve_b: book.reserve_b,
                timestamp: None,
                block_number: None,
                tx_hash: None,
            }]
        };
        Ok(next_receipt(true, events))
    }
}

#[async_trait]
impl PoolClient for MockPool {
    fn address(&self) -> Address {
        self.address
    }

    async fn quote_forward(&self, amount_in: U256) -> ClientResult<U256> {
        self.quote_for(Direction::Forward, amount_in).await
    }

    async fn quote_backward(&self, amount_in: U256) -> ClientResult<U256> {
        self.quote_for(Direction::Backward, amount_in).await
    }

    async fn reserve_a(&self) -> ClientResult<U256> {
        Ok(self.book.lock().unwrap().reserve_a)
    }

    async fn reserve_b(&self) -> ClientResult<U256> {
        Ok(self.book.lock().unwrap().reserve_b)
    }

    async fn total_shares(&self) -> ClientResult<U256> {
        Ok(self.book.lock().unwrap().total_shares)
    }

    async fn shares_of(&self, owner: Address) -> ClientResult<U256> {
        if self.fail_shares {
            return Err(ClientError::Transport("shares read failed".into()));
        }
        Ok(self
            .book
            .lock()
            .unwrap()
            .shares
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn withdraw_preview(&self, shares: U256) -> ClientResult<(U256, U256)> {
        let book = self.book.lock().unwrap();
        math::withdraw_amounts(shares, book.total_shares, book.reserve_a, book.reserve_b)
            .ok_or_else(|| ClientError::Reverted {
                reason: Some("no shares".into()),
            })
    }

    async fn estimate_swap_gas(&self, _direction: Direction, _amount_in: U256) -> ClientResult<u64> {
        if self.fail_estimate {
            return Err(ClientError::Reverted {
                reason: Some("estimate failed".into()),
            });
        }
        Ok(self.estimate)
    }

    async fn swap_forward(&self, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt> {
        self.do_swap(Direction::Forward, amount_in, gas)
    }

    async fn swap_backward(&self, amount_in: U256, gas: GasParams) -> ClientResult<TxReceipt> {
        self.do_swap(Direction::Backward, amount_in, gas)
    }

    async fn add_liquidity(&self, amount_a: U256, amount_b: U256) -> ClientResult<TxReceipt> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.drop_confirmations {
            return Err(ClientError::Unconfirmed {
                tx_hash: next_receipt(true, Vec::new()).tx_hash,
                reason: "confirmation timed out".to_string(),
            });
        }
        let mut book = self.book.lock().unwrap();
        let minted = if book.total_shares.is_zero() {
            U256::from(100) * U256::from(10u64).pow(U256::from(18))
        } else {
            amount_a * book.total_shares / book.reserve_a
        };
        book.reserve_a += amount_a;
        book.reserve_b += amount_b;
        book.total_shares += minted;
        *book.shares.entry(ACCOUNT).or_default() += minted;
        Ok(next_receipt(true, Vec::new()))
    }

    async fn remove_liquidity(&self, shares: U256) -> ClientResult<TxReceipt> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut book = self.book.lock().unwrap();
        let held = book.shares.get(&ACCOUNT).copied().unwrap_or_default();
        if held < shares {
            return Err(ClientError::Reverted {
                reason: Some("insufficient shares".into()),
            });
        }
        let (a, b) = math::withdraw_amounts(shares, book.total_shares, book.reserve_a, book.reserve_b)
            .unwrap_or_default();
        book.reserve_a -= a;
        book.reserve_b -= b;
        book.total_shares -= shares;
        book.shares.insert(ACCOUNT, held - shares);
        Ok(next_receipt(true, Vec::new()))
    }

    async fn swap_history(&self, _from_block: u64) -> ClientResult<Vec<SwapEvent>> {
        if self.fail_history {
            return Err(ClientError::Transport("log query failed".into()));
        }
        Ok(self.history.lock().unwrap().clone())
    }
}

// ── Network ──────────────────────────────────────────────────────────

pub struct MockNetwork {
    pub chain_id: AtomicU64,
    pub block: AtomicU64,
    pub gas_price: u128,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self {
            chain_id: AtomicU64::new(31337),
            block: AtomicU64::new(1),
            gas_price: 10_000_000_000,
        }
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn chain_id(&self) -> ClientResult<u64> {
        Ok(self.chain_id.load(Ordering::SeqCst))
    }

    async fn block_number(&self) -> ClientResult<u64> {
        Ok(self.block.load(Ordering::SeqCst))
    }

    async fn gas_price(&self) -> ClientResult<u128> {
        Ok(self.gas_price)
    }
}

pub fn venue(id: &str, pool: Arc<MockPool>, priority: u32) -> Venue {
    Venue::new(id, pool, priority)
}
