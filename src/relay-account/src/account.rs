use std::collections::BTreeSet;

use alloy_primitives::Address;

use crate::errors::AccountError;

/// The account aggregate: its auth keys and its nonce.
///
/// Owned by the caller and passed by reference through every engine component. Balances live in
/// the [`Ledger`](crate::ledger::Ledger).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    address: Address,
    pub(crate) auth_keys: BTreeSet<Address>,
    pub(crate) nonce: u64,
}

impl Account {
    /// Create an account with its single initial auth key.
    pub fn new(address: Address, initial_auth_key: Address) -> Result<Self, AccountError> {
        let mut account = Self { address, auth_keys: BTreeSet::new(), nonce: 0 };
        account.check_new_auth_key(initial_auth_key)?;
        account.auth_keys.insert(initial_auth_key);
        Ok(account)
    }

    /// Rebuild an account from persisted state, re-checking the key set invariants.
    pub fn restore(
        address: Address,
        auth_keys: impl IntoIterator<Item = Address>,
        nonce: u64,
    ) -> Result<Self, AccountError> {
        let mut account = Self { address, auth_keys: BTreeSet::new(), nonce };
        for key in auth_keys {
            account.check_new_auth_key(key)?;
            account.auth_keys.insert(key);
        }
        if account.auth_keys.is_empty() {
            return Err(AccountError::LastAuthKey);
        }
        Ok(account)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn auth_keys(&self) -> impl Iterator<Item = &Address> {
        self.auth_keys.iter()
    }

    pub fn auth_key_count(&self) -> usize {
        self.auth_keys.len()
    }

    pub fn is_auth_key(&self, who: Address) -> bool {
        self.auth_keys.contains(&who)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_checks_key_set() {
        let account = Address::repeat_byte(0xaa);
        let key = Address::repeat_byte(0x01);

        let restored = Account::restore(account, [key], 7).unwrap();
        assert_eq!(restored.nonce(), 7);
        assert!(restored.is_auth_key(key));

        assert_eq!(Account::restore(account, Vec::new(), 0), Err(AccountError::LastAuthKey));
        assert_eq!(
            Account::restore(account, [key, key], 0),
            Err(AccountError::AuthKeyAlreadyRegistered(key))
        );
        assert_eq!(Account::restore(account, [account], 0), Err(AccountError::SelfAsAuthKey));
    }
}
