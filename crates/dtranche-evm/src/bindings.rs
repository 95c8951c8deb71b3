//! Solidity interfaces of the protocol contracts, limited to the methods the
//! tooling calls.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IFaucetToken {
        function mint(address to, uint256 amount) external;
        function balanceOf(address account) external view returns (uint256);
    }

    #[sol(rpc)]
    interface ITrancheToken {
        function isVault(address vault) external view returns (bool);
        function setVault(address vault) external;
        function balanceOf(address account) external view returns (uint256);
    }

    #[sol(rpc)]
    interface IProtocolToken {
        function isMinter(address account) external view returns (bool);
        function addMinter(address account) external;
        function balanceOf(address account) external view returns (uint256);
    }

    #[sol(rpc)]
    interface ITrancheVault {
        function getCurrentSTSupplyRate() external view returns (uint256);
        function setSeniorTokenSupplyRate(uint256 rate) external;
        function getAPY(uint256 tranche) external view returns (uint256);
        function setAPY(uint256 tranche, uint256 rate) external;
        function getCurrentPeriod() external view returns (uint256);
        function startTime() external view returns (uint256);
        function settleProfitsByOwner(uint256[2] calldata profits, uint256[2] calldata losses) external;
        function investByOwner(uint256[2] calldata allocation) external;
    }

    #[sol(rpc)]
    interface IRewardPool {
        function setRewardDistributionManager(address manager) external;
        function notifyRewardAmount(uint256 reward) external;
    }
}
