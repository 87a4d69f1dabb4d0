//! Address aliases and canonical asset ordering.
//!
//! Every on-ledger entity (asset, pool, caller, fee recipient) is addressed
//! by a 20-byte identifier. Pools always store their two assets in ascending
//! address order; [`sort_assets`] is the single place that ordering rule
//! lives.

use ethers_core::types::H160;

/// 20-byte ledger address.
pub type Address = H160;

/// Identifier of a pooled fungible asset.
pub type AssetId = Address;

/// Identifier of a pool derived by the registry.
pub type PairAddress = Address;

/// Returns the pair in canonical (ascending) order.
///
/// The ordering is total and stable: `sort_assets(a, b) == sort_assets(b, a)`
/// for every `a != b`, so lookups keyed on the sorted pair resolve
/// identically regardless of argument order.
pub fn sort_assets(asset_a: AssetId, asset_b: AssetId) -> (AssetId, AssetId) {
    if asset_a < asset_b {
        (asset_a, asset_b)
    } else {
        (asset_b, asset_a)
    }
}

/// First 8 hex characters of an address, for log lines.
pub fn short_hex(address: &Address) -> String {
    hex::encode(address.as_bytes())[..8].to_string()
}
