//! Solidity ABI surfaces the engine speaks.

use alloy_sol_types::sol;

sol! {
    /// The subset of ERC-20 used for fee settlement.
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
    }

    /// Account entrypoints reachable through a self-targeted operation.
    interface IRelayAccount {
        function addAuthKey(address authKey) external;
        function removeAuthKey(address authKey) external;
    }
}
