//! Constants shared between the engine and off-chain tooling.

use alloy_primitives::{Address, FixedBytes};

/// Gas stipend a bare value transfer receives. A delegated key may only reach an auth key with a
/// call that carries no data and forwards at most this much gas.
pub const CALL_STIPEND: u64 = 2300;

/// Decimals every `feeRate` is expressed in, independent of the fee token's own precision.
pub const FEE_RATE_DECIMALS: u8 = 18;

/// Sentinel for "pay in native value" (`feeToken`) and "no policy" (`validator`).
pub const NULL_SENTINEL: Address = Address::ZERO;

/// EIP-712 domain name of the account.
pub const DOMAIN_NAME: &str = "Relay Account";

/// Version tag of the canonical digest schema. Bumped whenever the signed layout changes; digests
/// from other versions never verify.
pub const DIGEST_VERSION: &str = "2";

/// Method tag mixed into auth-key batch digests.
pub const AUTH_KEY_BATCH_METHOD: &str = "executeAuthKeyBatch";

/// Method tag mixed into delegated-key batch digests.
pub const DELEGATED_KEY_BATCH_METHOD: &str = "executeDelegatedKeyBatch";

/// ERC-1271 `isValidSignature` success value.
pub const ERC1271_MAGIC_VALUE: FixedBytes<4> = FixedBytes([0x16, 0x26, 0xba, 0x7e]);

/// ERC-1271 `isValidSignature` failure value.
pub const ERC1271_INVALID: FixedBytes<4> = FixedBytes([0xff, 0xff, 0xff, 0xff]);
