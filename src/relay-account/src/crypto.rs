//! Signature recovery and signing.

use alloy_primitives::{keccak256, Address, FixedBytes};
use k256::{
    ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};

pub const SIGNATURE_LENGTH: usize = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("expected a 65-byte signature, got {0} bytes")]
    InvalidLength(usize),
    #[error("unsupported recovery id {0}")]
    InvalidRecoveryId(u8),
    #[error("signature does not recover to a public key")]
    Unrecoverable,
}

/// Recover the signer address from a 32-byte digest and a 65-byte `r || s || v` signature.
///
/// Accepts `v` in {0, 1, 27, 28}. High-s signatures do not recover.
pub fn ecrecover_address(digest: FixedBytes<32>, sig: &[u8]) -> Result<Address, SignatureError> {
    if sig.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength(sig.len()));
    }
    let v = match sig[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        other => return Err(SignatureError::InvalidRecoveryId(other)),
    };
    let recovery_id = RecoveryId::from_byte(v).ok_or(SignatureError::InvalidRecoveryId(v))?;
    let signature = Signature::from_slice(&sig[..64]).map_err(|_| SignatureError::Unrecoverable)?;

    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
        .map_err(|_| SignatureError::Unrecoverable)?;
    Ok(public_key_address(&key))
}

/// Ethereum address of a secp256k1 public key.
pub fn public_key_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Sign `digest` without re-hashing, returning `r || s || v` with `v` in {27, 28}.
pub fn sign_digest(
    key: &SigningKey,
    digest: FixedBytes<32>,
) -> Result<[u8; SIGNATURE_LENGTH], k256::ecdsa::Error> {
    let (signature, recovery_id) = key.sign_prehash_recoverable(digest.as_slice())?;
    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte() + 27;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SigningKey {
        SigningKey::from_slice(&[0x11; 32]).unwrap()
    }

    #[test]
    fn recovers_signer() {
        let key = key();
        let digest = keccak256(b"batch");
        let sig = sign_digest(&key, digest).unwrap();

        let expected = public_key_address(key.verifying_key());
        assert_eq!(ecrecover_address(digest, &sig).unwrap(), expected);
    }

    #[test]
    fn accepts_both_v_conventions() {
        let key = key();
        let digest = keccak256(b"batch");
        let mut sig = sign_digest(&key, digest).unwrap();
        let expected = ecrecover_address(digest, &sig).unwrap();

        sig[64] -= 27;
        assert_eq!(ecrecover_address(digest, &sig).unwrap(), expected);
    }

    #[test]
    fn other_digest_recovers_someone_else() {
        let key = key();
        let sig = sign_digest(&key, keccak256(b"batch")).unwrap();
        let recovered = ecrecover_address(keccak256(b"other"), &sig).unwrap();
        assert_ne!(recovered, public_key_address(key.verifying_key()));
    }

    #[test]
    fn rejects_bad_shapes() {
        let digest = keccak256(b"batch");
        assert_eq!(ecrecover_address(digest, &[0u8; 64]), Err(SignatureError::InvalidLength(64)));

        let mut sig = sign_digest(&key(), digest).unwrap();
        sig[64] = 5;
        assert_eq!(ecrecover_address(digest, &sig), Err(SignatureError::InvalidRecoveryId(5)));

        assert_eq!(ecrecover_address(digest, &[0u8; 65]), Err(SignatureError::Unrecoverable));
    }

    #[test]
    fn rejects_high_s_twin() {
        use alloy_primitives::{uint, U256};

        const ORDER: U256 =
            uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

        let key = key();
        let digest = keccak256(b"batch");
        let low = sign_digest(&key, digest).unwrap();
        assert_eq!(ecrecover_address(digest, &low), Ok(public_key_address(key.verifying_key())));

        // (r, n - s, v ^ 1) recovers the same key on a permissive verifier.
        let mut high = low;
        let s = U256::from_be_slice(&low[32..64]);
        high[32..64].copy_from_slice(&(ORDER - s).to_be_bytes::<32>());
        high[64] = if low[64] == 27 { 28 } else { 27 };
        assert_eq!(ecrecover_address(digest, &high), Err(SignatureError::Unrecoverable));
    }
}
