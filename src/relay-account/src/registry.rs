//! Auth key registry.
//!
//! Invariants: at least one auth key at all times, no duplicates, never the account itself (nor
//! the zero address).

use alloy_primitives::Address;
use tracing::{debug, instrument};

use crate::{
    account::Account,
    errors::AccountError,
    events::{emit, AuthKeyAdded, AuthKeyRemoved},
    ledger::Ledger,
};

impl Account {
    /// Register `key` as an auth key. `caller` must be the account itself or an auth key.
    #[instrument(skip(self, ledger), fields(account = %self.address()))]
    pub fn add_auth_key<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: Address,
        key: Address,
    ) -> Result<(), AccountError> {
        self.ensure_key_manager(caller)?;
        self.insert_auth_key(ledger, key)
    }

    /// Remove `key` from the auth keys. `caller` must be the account itself or an auth key.
    #[instrument(skip(self, ledger), fields(account = %self.address()))]
    pub fn remove_auth_key<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: Address,
        key: Address,
    ) -> Result<(), AccountError> {
        self.ensure_key_manager(caller)?;
        self.delete_auth_key(ledger, key)
    }

    pub(crate) fn ensure_key_manager(&self, caller: Address) -> Result<(), AccountError> {
        if caller == self.address() || self.is_auth_key(caller) {
            Ok(())
        } else {
            Err(AccountError::Unauthorized(caller))
        }
    }

    pub(crate) fn check_new_auth_key(&self, key: Address) -> Result<(), AccountError> {
        if key == Address::ZERO {
            return Err(AccountError::ZeroAuthKey);
        }
        if key == self.address() {
            return Err(AccountError::SelfAsAuthKey);
        }
        if self.is_auth_key(key) {
            return Err(AccountError::AuthKeyAlreadyRegistered(key));
        }
        Ok(())
    }

    pub(crate) fn insert_auth_key<L: Ledger>(
        &mut self,
        ledger: &mut L,
        key: Address,
    ) -> Result<(), AccountError> {
        self.check_new_auth_key(key)?;
        self.auth_keys.insert(key);
        emit(ledger, self.address(), &AuthKeyAdded { authKey: key });
        debug!(%key, count = self.auth_key_count(), "auth key added");
        Ok(())
    }

    pub(crate) fn delete_auth_key<L: Ledger>(
        &mut self,
        ledger: &mut L,
        key: Address,
    ) -> Result<(), AccountError> {
        if !self.is_auth_key(key) {
            return Err(AccountError::AuthKeyNotRegistered(key));
        }
        if self.auth_key_count() == 1 {
            return Err(AccountError::LastAuthKey);
        }
        self.auth_keys.remove(&key);
        emit(ledger, self.address(), &AuthKeyRemoved { authKey: key });
        debug!(%key, count = self.auth_key_count(), "auth key removed");
        Ok(())
    }
}
