use alloy_sol_types::sol;

sol! {
    /// ENS registry; the SID registry on Gnosis shares this interface
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    interface IEnsResolver {
        function contenthash(bytes32 node) external view returns (bytes memory);
        function supportsInterface(bytes4 interfaceID) external view returns (bool);
    }

    /// ENSIP-10 wildcard resolution
    interface IExtendedResolver {
        function resolve(bytes memory name, bytes memory data) external view returns (bytes memory);
    }
}

sol! {
    /// EIP-3668 revert asking the caller to fetch `callData` from a gateway
    error OffchainLookup(address sender, string[] urls, bytes callData, bytes4 callbackFunction, bytes extraData);
}
