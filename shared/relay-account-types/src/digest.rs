//! Canonical EIP-712 digests for batches and delegated-key attestations.
//!
//! Domain: `EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)`
//! with `name = DOMAIN_NAME`, `version = DIGEST_VERSION` and the account as verifying contract.

use alloc::vec::Vec;

use alloy_primitives::{keccak256, Address, FixedBytes, U256};

use crate::{
    constants::{AUTH_KEY_BATCH_METHOD, DELEGATED_KEY_BATCH_METHOD, DIGEST_VERSION, DOMAIN_NAME},
    operation::{Batch, Operation},
};

const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const OPERATION_TYPE: &[u8] =
    b"Operation(address target,uint256 value,bytes data,uint256 gasLimit)";
const BATCH_TYPE: &[u8] = b"Batch(bytes32 method,uint256 nonce,Operation[] operations,uint256 gasPrice,uint256 gasOverhead,address feeToken,uint256 feeRate)Operation(address target,uint256 value,bytes data,uint256 gasLimit)";
const DELEGATED_KEY_TYPE: &[u8] = b"DelegatedKey(address delegatedKey,bytes restrictions)";

/// Which entrypoint a batch signature is valid for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchMethod {
    AuthKey,
    DelegatedKey,
}

impl BatchMethod {
    pub fn tag(self) -> FixedBytes<32> {
        match self {
            BatchMethod::AuthKey => keccak256(AUTH_KEY_BATCH_METHOD.as_bytes()),
            BatchMethod::DelegatedKey => keccak256(DELEGATED_KEY_BATCH_METHOD.as_bytes()),
        }
    }
}

/// Everything a digest is scoped to besides the batch itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigestScope {
    pub account: Address,
    pub chain_id: u64,
}

impl DigestScope {
    pub fn new(account: Address, chain_id: u64) -> Self {
        Self { account, chain_id }
    }

    pub fn domain_separator(&self) -> FixedBytes<32> {
        let mut buf = Vec::with_capacity(32 * 5);
        buf.extend_from_slice(keccak256(DOMAIN_TYPE).as_slice());
        buf.extend_from_slice(keccak256(DOMAIN_NAME.as_bytes()).as_slice());
        buf.extend_from_slice(keccak256(DIGEST_VERSION.as_bytes()).as_slice());
        buf.extend_from_slice(&U256::from(self.chain_id).to_be_bytes::<32>());
        buf.extend_from_slice(&pad_address(self.account));
        keccak256(buf)
    }
}

/// Digest an auth key or delegated key signs to authorise `batch` at `nonce`.
pub fn batch_digest(
    scope: &DigestScope,
    method: BatchMethod,
    nonce: u64,
    batch: &Batch,
) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 * 8);
    buf.extend_from_slice(keccak256(BATCH_TYPE).as_slice());
    buf.extend_from_slice(method.tag().as_slice());
    buf.extend_from_slice(&U256::from(nonce).to_be_bytes::<32>());
    buf.extend_from_slice(operations_hash(&batch.operations).as_slice());
    buf.extend_from_slice(&batch.gas_price.to_be_bytes::<32>());
    buf.extend_from_slice(&batch.gas_overhead.to_be_bytes::<32>());
    buf.extend_from_slice(&pad_address(batch.fee_token));
    buf.extend_from_slice(&batch.fee_rate.to_be_bytes::<32>());
    typed_data_digest(scope, keccak256(buf))
}

/// Digest an auth key signs to attest a delegated key and its restrictions.
pub fn delegated_key_digest(
    scope: &DigestScope,
    delegated_key: Address,
    restrictions: &[u8],
) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 * 3);
    buf.extend_from_slice(keccak256(DELEGATED_KEY_TYPE).as_slice());
    buf.extend_from_slice(&pad_address(delegated_key));
    buf.extend_from_slice(keccak256(restrictions).as_slice());
    typed_data_digest(scope, keccak256(buf))
}

fn operation_hash(op: &Operation) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 * 5);
    buf.extend_from_slice(keccak256(OPERATION_TYPE).as_slice());
    buf.extend_from_slice(&pad_address(op.target));
    buf.extend_from_slice(&op.value.to_be_bytes::<32>());
    buf.extend_from_slice(keccak256(&op.data).as_slice());
    buf.extend_from_slice(&U256::from(op.gas_limit).to_be_bytes::<32>());
    keccak256(buf)
}

// EIP-712 arrays of structs hash the concatenation of the member struct hashes.
fn operations_hash(ops: &[Operation]) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 * ops.len());
    for op in ops {
        buf.extend_from_slice(operation_hash(op).as_slice());
    }
    keccak256(buf)
}

fn typed_data_digest(scope: &DigestScope, struct_hash: FixedBytes<32>) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(b"\x19\x01");
    buf.extend_from_slice(scope.domain_separator().as_slice());
    buf.extend_from_slice(struct_hash.as_slice());
    keccak256(buf)
}

fn pad_address(address: Address) -> [u8; 32] {
    let mut padded = [0u8; 32];
    padded[12..32].copy_from_slice(address.as_slice());
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Bytes};

    fn sample_batch() -> Batch {
        Batch::new(vec![
            Operation::transfer(address!("0000000000000000000000000000000000000b0b"), U256::from(1), 21_000),
            Operation::call(
                address!("0000000000000000000000000000000000000c0c"),
                U256::ZERO,
                Bytes::from_static(&[0xde, 0xad]),
                50_000,
            ),
        ])
        .with_native_fee(U256::from(10), U256::from(30_000))
    }

    fn scope() -> DigestScope {
        DigestScope::new(address!("00000000000000000000000000000000000000aa"), 1)
    }

    #[test]
    fn digest_binds_every_field() {
        let batch = sample_batch();
        let base = batch_digest(&scope(), BatchMethod::AuthKey, 0, &batch);

        assert_ne!(base, batch_digest(&scope(), BatchMethod::AuthKey, 1, &batch));
        assert_ne!(base, batch_digest(&scope(), BatchMethod::DelegatedKey, 0, &batch));
        assert_ne!(
            base,
            batch_digest(&DigestScope::new(scope().account, 5), BatchMethod::AuthKey, 0, &batch)
        );

        let mut tweaked = batch.clone();
        tweaked.operations[1].gas_limit += 1;
        assert_ne!(base, batch_digest(&scope(), BatchMethod::AuthKey, 0, &tweaked));

        let mut tweaked = batch.clone();
        tweaked.fee_rate = U256::from(1);
        assert_ne!(base, batch_digest(&scope(), BatchMethod::AuthKey, 0, &tweaked));

        let mut reordered = batch.clone();
        reordered.operations.reverse();
        assert_ne!(base, batch_digest(&scope(), BatchMethod::AuthKey, 0, &reordered));
    }

    #[test]
    fn digest_is_deterministic() {
        let batch = sample_batch();
        assert_eq!(
            batch_digest(&scope(), BatchMethod::AuthKey, 7, &batch),
            batch_digest(&scope(), BatchMethod::AuthKey, 7, &batch.clone())
        );
    }

    #[test]
    fn attestation_digest_binds_restrictions() {
        let key = address!("0000000000000000000000000000000000000d0d");
        let a = delegated_key_digest(&scope(), key, &[1, 2, 3]);
        let b = delegated_key_digest(&scope(), key, &[1, 2, 4]);
        assert_ne!(a, b);
        assert_ne!(a, delegated_key_digest(&scope(), address!("0000000000000000000000000000000000000e0e"), &[1, 2, 3]));
    }
}
