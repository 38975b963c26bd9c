//! Delegated-key restrictions codec.
//!
//! The restrictions blob is opaque to the engine beyond its outer layout,
//! `abi.encode(address validator, bytes policyData)`. `policyData` belongs to the validator.

use alloc::vec::Vec;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;

use crate::constants::NULL_SENTINEL;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestrictionsError {
    #[error("restrictions blob is not abi.encode(address, bytes)")]
    MalformedBlob,
    #[error("policy data is not a single uint256 expiration")]
    MalformedExpiry,
}

/// Decoded restrictions blob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Restrictions {
    /// Validator consulted for every delegated-key batch; [`NULL_SENTINEL`] means no policy.
    pub validator: Address,
    pub policy_data: Bytes,
}

impl Restrictions {
    pub fn new(validator: Address, policy_data: impl Into<Bytes>) -> Self {
        Self { validator, policy_data: policy_data.into() }
    }

    /// Restrictions that always pass.
    pub fn unrestricted() -> Self {
        Self::new(NULL_SENTINEL, Bytes::new())
    }

    /// Restrictions for the reference expiring policy.
    pub fn expiring(validator: Address, expires_at: u64) -> Self {
        Self::new(validator, encode_expiry(expires_at))
    }

    pub fn has_validator(&self) -> bool {
        self.validator != NULL_SENTINEL
    }

    pub fn encode(&self) -> Bytes {
        (self.validator, self.policy_data.clone()).abi_encode_params().into()
    }

    pub fn decode(blob: &[u8]) -> Result<Self, RestrictionsError> {
        let (validator, policy_data) = <(Address, Bytes)>::abi_decode_params(blob, true)
            .map_err(|_| RestrictionsError::MalformedBlob)?;
        Ok(Self { validator, policy_data })
    }
}

/// Encode the reference policy payload: a single `uint256` expiration timestamp.
pub fn encode_expiry(expires_at: u64) -> Vec<u8> {
    U256::from(expires_at).abi_encode()
}

/// Decode the reference policy payload. Timestamps past `u64::MAX` never expire.
pub fn decode_expiry(policy_data: &[u8]) -> Result<u64, RestrictionsError> {
    if policy_data.len() != 32 {
        return Err(RestrictionsError::MalformedExpiry);
    }
    let expires_at = U256::from_be_slice(policy_data);
    Ok(expires_at.saturating_to::<u64>())
}
