//! Host ledger capability.
//!
//! The engine never reaches a concrete chain directly. Every balance read, external call, log and
//! gas measurement goes through [`Ledger`], which keeps the account logic independent of the
//! host's call semantics.

use alloy_primitives::{Address, Bytes, Log, U256};

/// Why an external call did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    #[error("call reverted")]
    Reverted(Bytes),
    #[error("out of gas")]
    OutOfGas,
    #[error("insufficient balance for value transfer")]
    InsufficientBalance,
    #[error("no code at target")]
    NoCode,
}

impl Fault {
    /// Raw revert payload, empty for faults the host raised itself.
    pub fn revert_data(&self) -> Bytes {
        match self {
            Fault::Reverted(data) => data.clone(),
            _ => Bytes::new(),
        }
    }
}

/// An outgoing call from the account (or on its behalf) to `to`.
#[derive(Clone, Copy, Debug)]
pub struct Call<'a> {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: &'a [u8],
    pub gas_limit: u64,
}

/// Opaque handle returned by [`Ledger::checkpoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint(pub usize);

pub trait Ledger {
    fn chain_id(&self) -> u64;

    /// Current block timestamp, in seconds.
    fn timestamp(&self) -> u64;

    /// Gas left in the budget the relayer forwarded with the current call.
    fn gas_left(&self) -> u64;

    /// Consume `amount` of the budget for work the engine performs itself.
    fn charge_gas(&mut self, amount: u64) -> Result<(), Fault>;

    fn balance_of(&self, who: Address) -> U256;

    fn has_code(&self, who: Address) -> bool;

    /// Perform `call`. A failed call must leave no value transfer, storage write or log behind;
    /// gas it spent stays spent.
    fn invoke(&mut self, call: Call<'_>) -> Result<Bytes, Fault>;

    /// Read-only call.
    fn view(&self, to: Address, data: &[u8]) -> Result<Bytes, Fault>;

    fn emit(&mut self, log: Log);

    /// Mark a point the whole call can be rolled back to.
    fn checkpoint(&mut self) -> Checkpoint;

    /// Undo every effect since `checkpoint` (gas excepted).
    fn revert_to(&mut self, checkpoint: Checkpoint);

    /// Keep every effect since `checkpoint`.
    fn commit(&mut self, checkpoint: Checkpoint);
}
