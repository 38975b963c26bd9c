use alloy_primitives::{Address, Bytes, FixedBytes};
use k256::ecdsa::SigningKey;
use relay_account_types::{
    digest::{batch_digest, delegated_key_digest, BatchMethod, DigestScope},
    Batch, DelegatedKeyAttestation, Restrictions,
};

use crate::crypto::{public_key_address, sign_digest};

/// A deterministic secp256k1 key.
#[derive(Clone, Debug)]
pub struct TestKey {
    key: SigningKey,
    address: Address,
}

impl TestKey {
    /// Key with scalar `[seed; 32]`. Seed zero is bumped to one.
    pub fn from_seed(seed: u8) -> Self {
        let key = SigningKey::from_slice(&[seed.max(1); 32])
            .expect("repeated non-zero byte is a valid scalar");
        Self::from_signing_key(key)
    }

    pub fn from_signing_key(key: SigningKey) -> Self {
        let address = public_key_address(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sign(&self, digest: FixedBytes<32>) -> Bytes {
        let signature = sign_digest(&self.key, digest).expect("signing a 32-byte prehash");
        Bytes::copy_from_slice(&signature)
    }

    pub fn sign_batch(
        &self,
        scope: &DigestScope,
        method: BatchMethod,
        nonce: u64,
        batch: &Batch,
    ) -> Bytes {
        self.sign(batch_digest(scope, method, nonce, batch))
    }

    /// Attest `delegated_key` under `restrictions`, signed by this key.
    pub fn attest(
        &self,
        scope: &DigestScope,
        delegated_key: Address,
        restrictions: &Restrictions,
    ) -> DelegatedKeyAttestation {
        let restrictions = restrictions.encode();
        let signature = self.sign(delegated_key_digest(scope, delegated_key, &restrictions));
        DelegatedKeyAttestation { delegated_key, restrictions, signature }
    }
}
