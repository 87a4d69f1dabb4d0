//! Typed-data digests for signature-based approvals.
//!
//! A permit signature commits to `(owner, spender, value, nonce, deadline)`
//! under a per-token domain separator, so the same signature can never be
//! replayed on another token, another chain, or after its nonce has been
//! consumed. Digest layout follows the EIP-712 / EIP-2612 encoding byte
//! for byte, so any standard typed-data signer produces valid permits.

use ethers_core::abi::{encode, Token};
use ethers_core::types::{RecoveryMessage, Signature, H256, U256};
use ethers_core::utils::keccak256;
use once_cell::sync::Lazy;
use types::Address;

use crate::error::EngineError;

/// `keccak256("EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")`
pub static EIP712_DOMAIN_TYPEHASH: Lazy<H256> = Lazy::new(|| {
    H256(keccak256(
        b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
    ))
});

/// `keccak256("Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)")`
pub static PERMIT_TYPEHASH: Lazy<H256> = Lazy::new(|| {
    H256(keccak256(
        b"Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)",
    ))
});

/// Domain separator binding signatures to one token on one chain.
pub fn domain_separator(
    name: &str,
    version: &str,
    chain_id: u64,
    verifying_contract: Address,
) -> H256 {
    let encoded = encode(&[
        Token::FixedBytes(EIP712_DOMAIN_TYPEHASH.as_bytes().to_vec()),
        Token::FixedBytes(keccak256(name.as_bytes()).to_vec()),
        Token::FixedBytes(keccak256(version.as_bytes()).to_vec()),
        Token::Uint(U256::from(chain_id)),
        Token::Address(verifying_contract),
    ]);
    H256(keccak256(&encoded))
}

/// Digest the owner signs: `keccak256(0x19 ‖ 0x01 ‖ domain ‖ structHash)`.
pub fn permit_digest(
    domain: H256,
    owner: Address,
    spender: Address,
    value: U256,
    nonce: U256,
    deadline: u64,
) -> H256 {
    let struct_hash = keccak256(&encode(&[
        Token::FixedBytes(PERMIT_TYPEHASH.as_bytes().to_vec()),
        Token::Address(owner),
        Token::Address(spender),
        Token::Uint(value),
        Token::Uint(nonce),
        Token::Uint(U256::from(deadline)),
    ]));

    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(domain.as_bytes());
    preimage.extend_from_slice(&struct_hash);
    H256(keccak256(&preimage))
}

/// Recovers the signer; a malformed signature is an authorization failure,
/// not a distinct error class.
pub fn recover_signer(digest: H256, signature: &Signature) -> Result<Address, EngineError> {
    signature
        .recover(RecoveryMessage::Hash(digest))
        .map_err(|_| EngineError::InvalidSignature)
}
