//! Batch authentication for the two key classes.
//!
//! Any failure here rejects the whole call before state is touched.

use alloy_primitives::{Address, Bytes, FixedBytes};
use alloy_sol_types::SolValue;
use relay_account_types::{
    constants::{ERC1271_INVALID, ERC1271_MAGIC_VALUE},
    digest::{delegated_key_digest, DigestScope},
    DelegatedKeyAttestation,
};
use tracing::trace;

use crate::{
    account::Account,
    crypto::{ecrecover_address, SIGNATURE_LENGTH},
    errors::AccountError,
    ledger::Ledger,
    validator::{ValidationContext, ValidatorRegistry},
};

/// Recover the signer of `digest` and require it to be a registered auth key.
pub fn authenticate_auth_key(
    account: &Account,
    digest: FixedBytes<32>,
    signature: &[u8],
) -> Result<Address, AccountError> {
    let signer = ecrecover_address(digest, signature)?;
    if !account.is_auth_key(signer) {
        return Err(AccountError::InvalidSignature(signer));
    }
    trace!(%signer, "auth key signature verified");
    Ok(signer)
}

/// Require `digest` to be signed by the attested delegated key, and the attestation to be signed
/// by a currently registered auth key. Returns the attesting auth key.
pub fn authenticate_delegated_key(
    account: &Account,
    scope: &DigestScope,
    digest: FixedBytes<32>,
    signature: &[u8],
    attestation: &DelegatedKeyAttestation,
) -> Result<Address, AccountError> {
    let signer = ecrecover_address(digest, signature)?;
    if signer != attestation.delegated_key {
        return Err(AccountError::InvalidDelegatedSignature {
            recovered: signer,
            expected: attestation.delegated_key,
        });
    }

    let attestation_digest =
        delegated_key_digest(scope, attestation.delegated_key, &attestation.restrictions);
    let attester = ecrecover_address(attestation_digest, &attestation.signature)?;
    if !account.is_auth_key(attester) {
        return Err(AccountError::InvalidAttestation(attester));
    }
    trace!(delegated_key = %signer, %attester, "delegated key signature verified");
    Ok(attester)
}

/// ERC-1271 check of `signature` over an arbitrary `hash`.
///
/// `signature` is either a 65-byte auth key signature or
/// `abi.encode(bytes signature, address delegatedKey, bytes restrictions, bytes attestation)`.
pub fn is_valid_signature<L: Ledger>(
    account: &Account,
    ledger: &L,
    validators: &ValidatorRegistry,
    hash: FixedBytes<32>,
    signature: &[u8],
) -> FixedBytes<4> {
    let valid = if signature.len() == SIGNATURE_LENGTH {
        authenticate_auth_key(account, hash, signature).is_ok()
    } else {
        check_delegated_signature(account, ledger, validators, hash, signature).is_ok()
    };
    if valid {
        ERC1271_MAGIC_VALUE
    } else {
        ERC1271_INVALID
    }
}

fn check_delegated_signature<L: Ledger>(
    account: &Account,
    ledger: &L,
    validators: &ValidatorRegistry,
    hash: FixedBytes<32>,
    bundle: &[u8],
) -> Result<(), AccountError> {
    let Ok((signature, delegated_key, restrictions, attestation_signature)) =
        <(Bytes, Address, Bytes, Bytes)>::abi_decode_params(bundle, true)
    else {
        return Err(AccountError::InvalidSignature(Address::ZERO));
    };
    let attestation =
        DelegatedKeyAttestation { delegated_key, restrictions, signature: attestation_signature };
    let scope = DigestScope::new(account.address(), ledger.chain_id());
    authenticate_delegated_key(account, &scope, hash, &signature, &attestation)?;

    let ctx = ValidationContext {
        account: account.address(),
        delegated_key,
        relayer: Address::ZERO,
        timestamp: ledger.timestamp(),
    };
    validators.check_signature(ledger, &ctx, &attestation.restrictions)
}

/// Pack a delegated-key ERC-1271 signature bundle.
pub fn encode_delegated_signature(signature: &[u8], attestation: &DelegatedKeyAttestation) -> Bytes {
    (
        Bytes::copy_from_slice(signature),
        attestation.delegated_key,
        attestation.restrictions.clone(),
        attestation.signature.clone(),
    )
        .abi_encode_params()
        .into()
}
