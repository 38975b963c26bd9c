//! In-memory host ledger, mock contracts and deterministic keys.
//!
//! Used by the engine's own tests and by the signer tool's `simulate` command.

mod contracts;
mod keys;
mod ledger;

pub use contracts::{AlwaysRevert, Echo, MockToken, Stub};
pub use keys::TestKey;
pub use ledger::{CallContext, Contract, MemoryLedger, CALL_GAS, SLOAD_GAS, SSTORE_GAS};
