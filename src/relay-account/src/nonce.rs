//! Replay protection: a single counter per account that only ever grows.

use crate::{account::Account, errors::AccountError};

impl Account {
    /// The nonce the next batch must be signed against.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Advance past `attempted` operations. Every attempted operation consumes one nonce slot,
    /// whether it succeeded or not.
    pub(crate) fn advance_nonce(&mut self, attempted: usize) -> Result<u64, AccountError> {
        let attempted = u64::try_from(attempted).map_err(|_| AccountError::NonceOverflow)?;
        self.nonce = self.nonce.checked_add(attempted).ok_or(AccountError::NonceOverflow)?;
        Ok(self.nonce)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;

    use super::*;

    #[test]
    fn advances_by_attempted_count() {
        let mut account = Account::new(Address::repeat_byte(1), Address::repeat_byte(2)).unwrap();
        assert_eq!(account.nonce(), 0);
        assert_eq!(account.advance_nonce(3).unwrap(), 3);
        assert_eq!(account.advance_nonce(2).unwrap(), 5);
    }

    #[test]
    fn refuses_to_wrap() {
        let mut account = Account::new(Address::repeat_byte(1), Address::repeat_byte(2)).unwrap();
        account.nonce = u64::MAX - 1;
        assert_eq!(account.advance_nonce(2), Err(AccountError::NonceOverflow));
        assert_eq!(account.nonce(), u64::MAX - 1);
    }
}
