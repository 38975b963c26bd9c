//! Call permission guard for delegated keys.
//!
//! A delegated key may never call the account itself, and may reach an auth key only with a bare
//! value transfer: no data, and no more gas than the stipend. Destination code is never inspected.

use relay_account_types::Operation;

use crate::{account::Account, errors::AccountError};

/// Check every operation of a delegated-key batch before anything runs.
pub fn check_delegated_operations(
    account: &Account,
    operations: &[Operation],
    call_stipend: u64,
) -> Result<(), AccountError> {
    for (index, op) in operations.iter().enumerate() {
        if op.target == account.address() {
            return Err(AccountError::DelegatedKeyCallsSelf { index });
        }
        if account.is_auth_key(op.target) && !is_bare_transfer(op, call_stipend) {
            return Err(AccountError::DelegatedKeyCallsAuthKey { index, target: op.target });
        }
    }
    Ok(())
}

pub fn is_bare_transfer(op: &Operation, call_stipend: u64) -> bool {
    op.data.is_empty() && op.gas_limit <= call_stipend
}
