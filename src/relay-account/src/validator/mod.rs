//! Delegated-key validators.
//!
//! A delegated key's restrictions name a validator by address. The engine resolves that address
//! through a [`ValidatorRegistry`] at call time and never interprets `policyData` itself.

mod expiry;

use std::{collections::BTreeMap, fmt, sync::Arc};

use alloy_primitives::Address;
use relay_account_types::{Operation, Restrictions};

use crate::{
    errors::{AccountError, PolicyViolation},
    ledger::Ledger,
};

pub use expiry::ExpiringRelayerValidator;

/// Facts a validator may base its decision on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationContext {
    pub account: Address,
    pub delegated_key: Address,
    /// Whoever submitted the batch. For signature checks this is the zero address.
    pub relayer: Address,
    pub timestamp: u64,
}

pub trait DelegatedKeyValidator: Send + Sync {
    /// Decide whether `operations` may run under `policy_data`.
    fn validate_batch(
        &self,
        ctx: &ValidationContext,
        operations: &[Operation],
        policy_data: &[u8],
    ) -> Result<(), PolicyViolation>;

    /// Decide whether the delegated key may still produce ERC-1271 signatures.
    fn validate_signature(
        &self,
        _ctx: &ValidationContext,
        _policy_data: &[u8],
    ) -> Result<(), PolicyViolation> {
        Ok(())
    }
}

/// Validator implementations by the address restrictions refer to them with.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: BTreeMap<Address, Arc<dyn DelegatedKeyValidator>>,
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.validators.keys()).finish()
    }
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        address: Address,
        validator: impl DelegatedKeyValidator + 'static,
    ) -> &mut Self {
        self.validators.insert(address, Arc::new(validator));
        self
    }

    pub fn with(mut self, address: Address, validator: impl DelegatedKeyValidator + 'static) -> Self {
        self.register(address, validator);
        self
    }

    /// Resolve the validator `restrictions` names. `Ok(None)` means "no policy".
    ///
    /// An address without code is a hard failure regardless of what is registered for it.
    pub fn resolve<L: Ledger>(
        &self,
        ledger: &L,
        restrictions: &Restrictions,
    ) -> Result<Option<&dyn DelegatedKeyValidator>, AccountError> {
        if !restrictions.has_validator() {
            return Ok(None);
        }
        let address = restrictions.validator;
        if !ledger.has_code(address) {
            return Err(AccountError::ValidatorNotContract(address));
        }
        self.validators
            .get(&address)
            .map(|validator| Some(validator.as_ref()))
            .ok_or(AccountError::ValidatorUnavailable(address))
    }

    /// Decode `restrictions` and run its validator over a batch.
    pub fn check_batch<L: Ledger>(
        &self,
        ledger: &L,
        ctx: &ValidationContext,
        restrictions: &[u8],
        operations: &[Operation],
    ) -> Result<(), AccountError> {
        let restrictions = Restrictions::decode(restrictions)?;
        match self.resolve(ledger, &restrictions)? {
            Some(validator) => {
                validator.validate_batch(ctx, operations, &restrictions.policy_data)?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Decode `restrictions` and ask its validator whether the key may still sign.
    pub fn check_signature<L: Ledger>(
        &self,
        ledger: &L,
        ctx: &ValidationContext,
        restrictions: &[u8],
    ) -> Result<(), AccountError> {
        let restrictions = Restrictions::decode(restrictions)?;
        match self.resolve(ledger, &restrictions)? {
            Some(validator) => {
                validator.validate_signature(ctx, &restrictions.policy_data)?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}
