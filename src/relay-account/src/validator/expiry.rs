use std::{collections::BTreeSet, sync::Arc};

use alloy_primitives::Address;
use parking_lot::RwLock;
use relay_account_types::{restrictions::decode_expiry, Operation};

use super::{DelegatedKeyValidator, ValidationContext};
use crate::errors::PolicyViolation;

/// Reference policy: `policyData` is a single `uint256` expiration timestamp, and only
/// allow-listed relayers may submit delegated-key batches.
///
/// Clones share one allow-list, so a handle kept after registration keeps maintaining the list
/// the engine consults.
#[derive(Clone, Debug, Default)]
pub struct ExpiringRelayerValidator {
    allowed_relayers: Arc<RwLock<BTreeSet<Address>>>,
}

impl ExpiringRelayerValidator {
    pub fn new(relayers: impl IntoIterator<Item = Address>) -> Self {
        Self { allowed_relayers: Arc::new(RwLock::new(relayers.into_iter().collect())) }
    }

    pub fn allow_relayer(&self, relayer: Address) -> bool {
        self.allowed_relayers.write().insert(relayer)
    }

    pub fn disallow_relayer(&self, relayer: Address) -> bool {
        self.allowed_relayers.write().remove(&relayer)
    }

    pub fn is_allowed(&self, relayer: Address) -> bool {
        self.allowed_relayers.read().contains(&relayer)
    }

    fn check_expiry(ctx: &ValidationContext, policy_data: &[u8]) -> Result<(), PolicyViolation> {
        let expires_at =
            decode_expiry(policy_data).map_err(|_| PolicyViolation::MalformedPolicyData)?;
        if ctx.timestamp >= expires_at {
            return Err(PolicyViolation::Expired { expires_at, now: ctx.timestamp });
        }
        Ok(())
    }
}

impl DelegatedKeyValidator for ExpiringRelayerValidator {
    fn validate_batch(
        &self,
        ctx: &ValidationContext,
        _operations: &[Operation],
        policy_data: &[u8],
    ) -> Result<(), PolicyViolation> {
        Self::check_expiry(ctx, policy_data)?;
        if !self.is_allowed(ctx.relayer) {
            return Err(PolicyViolation::UnauthorizedRelayer(ctx.relayer));
        }
        Ok(())
    }

    fn validate_signature(
        &self,
        ctx: &ValidationContext,
        policy_data: &[u8],
    ) -> Result<(), PolicyViolation> {
        Self::check_expiry(ctx, policy_data)
    }
}
