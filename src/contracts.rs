//! Centralized Contract Definitions
//!
//! Solidity interfaces consumed by the router, defined with alloy's `sol!`
//! macro. Each interface is annotated with `#[sol(rpc)]` so it generates a
//! contract instance type usable with any alloy Provider.

use alloy::sol;

// ── ERC20 ─────────────────────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}

// ── Constant-product pool ────────────────────────────────────────────
//
// token1 is the pool's "A" side, token2 the "B" side. calculateToken1Swap
// quotes A→B, calculateToken2Swap quotes B→A.

sol! {
    #[sol(rpc)]
    interface IAutomatedMarketMaker {
        event Swap(
            address user,
            address tokenGive,
            uint256 tokenGiveAmount,
            address tokenGet,
            uint256 tokenGetAmount,
            uint256 token1Balance,
            uint256 token2Balance,
            uint256 timestamp
        );

        function token1Balance() external view returns (uint256);
        function token2Balance() external view returns (uint256);
        function totalShares() external view returns (uint256);
        function shares(address owner) external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);

        function calculateToken1Swap(uint256 token1Amount) external view returns (uint256 token2Amount);
        function calculateToken2Swap(uint256 token2Amount) external view returns (uint256 token1Amount);
        function calculateWithdrawAmount(uint256 share) external view returns (uint256 token1Amount, uint256 token2Amount);

        function swapToken1(uint256 token1Amount) external returns (uint256 token2Amount);
        function swapToken2(uint256 token2Amount) external returns (uint256 token1Amount);
        function addLiquidity(uint256 token1Amount, uint256 token2Amount) external;
        function removeLiquidity(uint256 share) external returns (uint256 token1Amount, uint256 token2Amount);
    }
}

// ── Router venue (picks an inner pool on-chain) ──────────────────────

sol! {
    #[sol(rpc)]
    interface IDexAggregator {
        function getBestRate(uint256 amountIn, bool token1ToToken2) external view returns (uint256 amountOut, address amm);
        function swapToken1ForToken2(uint256 amountIn) external returns (uint256 amountOut);
        function swapToken2ForToken1(uint256 amountIn) external returns (uint256 amountOut);
    }
}
