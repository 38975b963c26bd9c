use alloc::vec::Vec;

use alloy_primitives::{Address, Bytes, U256};

use crate::constants::NULL_SENTINEL;

/// A single call the account performs on behalf of its owner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Operation {
    pub target: Address,
    /// Native value forwarded with the call.
    pub value: U256,
    pub data: Bytes,
    /// Gas forwarded to the call. Also drives the delegated-key stipend check.
    pub gas_limit: u64,
}

impl Operation {
    /// A bare value transfer with no payload.
    pub fn transfer(target: Address, value: U256, gas_limit: u64) -> Self {
        Self { target, value, data: Bytes::new(), gas_limit }
    }

    /// A data-bearing call.
    pub fn call(target: Address, value: U256, data: impl Into<Bytes>, gas_limit: u64) -> Self {
        Self { target, value, data: data.into(), gas_limit }
    }
}

/// An ordered list of operations authorised together under one signature and one nonce, plus
/// the terms on which the relayer is reimbursed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    pub operations: Vec<Operation>,
    /// Native price per gas unit. Zero means the relayer absorbs its own cost.
    pub gas_price: U256,
    /// Fixed gas added to the measured consumption to cover settlement itself.
    pub gas_overhead: U256,
    /// Token the relayer is paid in, or [`NULL_SENTINEL`] for native value.
    pub fee_token: Address,
    /// Fee token units (18-decimal normalised) per gas unit.
    pub fee_rate: U256,
}

impl Batch {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations, ..Default::default() }
    }

    pub fn with_native_fee(mut self, gas_price: U256, gas_overhead: U256) -> Self {
        self.gas_price = gas_price;
        self.gas_overhead = gas_overhead;
        self.fee_token = NULL_SENTINEL;
        self.fee_rate = U256::ZERO;
        self
    }

    pub fn with_token_fee(
        mut self,
        gas_price: U256,
        gas_overhead: U256,
        fee_token: Address,
        fee_rate: U256,
    ) -> Self {
        self.gas_price = gas_price;
        self.gas_overhead = gas_overhead;
        self.fee_token = fee_token;
        self.fee_rate = fee_rate;
        self
    }

    pub fn pays_in_token(&self) -> bool {
        self.fee_token != NULL_SENTINEL
    }
}

/// Proof that a registered auth key delegated signing rights to `delegated_key` under
/// `restrictions`.
///
/// Never persisted: supplied with every delegated-key batch and re-verified against the current
/// key registry, so removing the attesting auth key revokes every attestation it issued.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DelegatedKeyAttestation {
    pub delegated_key: Address,
    /// ABI-encoded [`crate::Restrictions`].
    pub restrictions: Bytes,
    /// Auth key signature over the `DelegatedKey` digest.
    pub signature: Bytes,
}
