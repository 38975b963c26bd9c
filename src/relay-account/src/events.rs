//! Observable events, ABI-encoded the way the account's Solidity interface declares them.

use alloy_primitives::{keccak256, Address, FixedBytes, Log, U256};
use alloy_sol_types::{sol, SolEvent};

use crate::ledger::Ledger;

sol! {
    /// An auth key was registered.
    event AuthKeyAdded(address indexed authKey);

    /// An auth key was removed.
    event AuthKeyRemoved(address indexed authKey);

    /// A batch operation failed and was skipped. `encodedData` identifies the operation,
    /// `reason` is the raw revert payload.
    event CallFailed(bytes32 indexed encodedData, bytes reason);

    /// The relayer was paid `amount` of `feeToken` (zero address for native value).
    event RelayerReimbursed(address indexed relayer, address indexed feeToken, uint256 amount);
}

/// Emit `event` as a log of `account`.
pub fn emit<L: Ledger, E: SolEvent>(ledger: &mut L, account: Address, event: &E) {
    ledger.emit(Log { address: account, data: event.encode_log_data() });
}

/// Deterministic identifier of a failed operation:
/// `keccak256(abi.encodePacked(uint256 nonce, address target, uint256 value, bytes data))`.
pub fn failure_record(nonce: u64, target: Address, value: U256, data: &[u8]) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 + 20 + 32 + data.len());
    buf.extend_from_slice(&U256::from(nonce).to_be_bytes::<32>());
    buf.extend_from_slice(target.as_slice());
    buf.extend_from_slice(&value.to_be_bytes::<32>());
    buf.extend_from_slice(data);
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_record_separates_nonces() {
        let target = Address::repeat_byte(0x42);
        let a = failure_record(1, target, U256::from(1), b"");
        let b = failure_record(2, target, U256::from(1), b"");
        assert_ne!(a, b);
        assert_eq!(a, failure_record(1, target, U256::from(1), b""));
    }

    #[test]
    fn events_roundtrip_through_logs() {
        let key = Address::repeat_byte(0x07);
        let data = AuthKeyAdded { authKey: key }.encode_log_data();
        let decoded = AuthKeyAdded::decode_log_data(&data, true).unwrap();
        assert_eq!(decoded.authKey, key);
    }
}
