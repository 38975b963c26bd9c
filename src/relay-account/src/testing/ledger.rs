use std::{collections::BTreeMap, fmt, sync::Arc};

use alloy_primitives::{Address, Bytes, Log, B256, U256};

use super::contracts::Stub;
use crate::ledger::{Call, Checkpoint, Fault, Ledger};

/// Gas charged per call before anything is forwarded.
pub const CALL_GAS: u64 = 2_600;
pub const SLOAD_GAS: u64 = 2_100;
pub const SSTORE_GAS: u64 = 5_000;

const VIEW_GAS: u64 = 1_000_000;

/// Contract code living in a [`MemoryLedger`]. State lives in the ledger, never in the contract.
pub trait Contract: Send + Sync {
    fn call(&self, ctx: &mut CallContext<'_>, data: &[u8]) -> Result<Bytes, Fault>;
}

#[derive(Clone, Debug, Default)]
struct WorldState {
    balances: BTreeMap<Address, U256>,
    storage: BTreeMap<(Address, B256), U256>,
    logs: Vec<Log>,
}

/// Execution context handed to a [`Contract`].
pub struct CallContext<'a> {
    pub address: Address,
    pub caller: Address,
    pub value: U256,
    state: &'a mut WorldState,
    gas_limit: u64,
    gas_used: u64,
    read_only: bool,
}

impl CallContext<'_> {
    pub fn charge(&mut self, gas: u64) -> Result<(), Fault> {
        match self.gas_used.checked_add(gas) {
            Some(used) if used <= self.gas_limit => {
                self.gas_used = used;
                Ok(())
            }
            _ => {
                self.gas_used = self.gas_limit;
                Err(Fault::OutOfGas)
            }
        }
    }

    pub fn sload(&mut self, slot: B256) -> Result<U256, Fault> {
        self.charge(SLOAD_GAS)?;
        Ok(self.state.storage.get(&(self.address, slot)).copied().unwrap_or_default())
    }

    pub fn sstore(&mut self, slot: B256, value: U256) -> Result<(), Fault> {
        if self.read_only {
            return Err(Fault::Reverted(Bytes::new()));
        }
        self.charge(SSTORE_GAS)?;
        self.state.storage.insert((self.address, slot), value);
        Ok(())
    }

    pub fn emit(&mut self, log: Log) {
        if !self.read_only {
            self.state.logs.push(log);
        }
    }
}

/// Deterministic single-threaded host: balances, contract storage, logs and a gas budget.
///
/// Failed calls roll back everything but gas, like the EVM.
pub struct MemoryLedger {
    chain_id: u64,
    timestamp: u64,
    gas_left: u64,
    state: WorldState,
    code: BTreeMap<Address, Arc<dyn Contract>>,
    checkpoints: Vec<WorldState>,
}

impl fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryLedger")
            .field("chain_id", &self.chain_id)
            .field("timestamp", &self.timestamp)
            .field("gas_left", &self.gas_left)
            .field("balances", &self.state.balances)
            .field("contracts", &self.code.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self {
            chain_id: 1,
            timestamp: 1_700_000_000,
            gas_left: 10_000_000,
            state: WorldState::default(),
            code: BTreeMap::new(),
            checkpoints: Vec::new(),
        }
    }
}

impl MemoryLedger {
    pub fn new(chain_id: u64, timestamp: u64) -> Self {
        Self { chain_id, timestamp, ..Default::default() }
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Reset the gas budget, as a relayer does per submitted transaction.
    pub fn set_gas(&mut self, gas: u64) {
        self.gas_left = gas;
    }

    pub fn fund(&mut self, who: Address, amount: U256) {
        let balance = self.state.balances.entry(who).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn deploy(&mut self, at: Address, contract: impl Contract + 'static) {
        self.code.insert(at, Arc::new(contract));
    }

    /// Put inert code at `at`, e.g. for a validator implemented off-ledger.
    pub fn install_stub(&mut self, at: Address) {
        self.deploy(at, Stub);
    }

    pub fn storage_at(&self, contract: Address, slot: B256) -> U256 {
        self.state.storage.get(&(contract, slot)).copied().unwrap_or_default()
    }

    pub fn set_storage(&mut self, contract: Address, slot: B256, value: U256) {
        self.state.storage.insert((contract, slot), value);
    }

    pub fn logs(&self) -> &[Log] {
        &self.state.logs
    }

    pub fn logs_of(&self, emitter: Address) -> impl Iterator<Item = &Log> {
        self.state.logs.iter().filter(move |log| log.address == emitter)
    }

    fn run(
        &mut self,
        call: Call<'_>,
        gas_limit: u64,
        read_only: bool,
    ) -> Result<(Bytes, u64), (Fault, u64)> {
        if !call.value.is_zero() {
            let from = self.state.balances.get(&call.from).copied().unwrap_or_default();
            if from < call.value {
                return Err((Fault::InsufficientBalance, 0));
            }
            self.state.balances.insert(call.from, from - call.value);
            let to = self.state.balances.entry(call.to).or_default();
            *to = to.saturating_add(call.value);
        }

        let Some(code) = self.code.get(&call.to).cloned() else {
            return Ok((Bytes::new(), 0));
        };
        let mut ctx = CallContext {
            address: call.to,
            caller: call.from,
            value: call.value,
            state: &mut self.state,
            gas_limit,
            gas_used: 0,
            read_only,
        };
        let result = code.call(&mut ctx, call.data);
        let used = ctx.gas_used;
        match result {
            Ok(output) => Ok((output, used)),
            Err(fault) => Err((fault, used)),
        }
    }
}

impl Ledger for MemoryLedger {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn gas_left(&self) -> u64 {
        self.gas_left
    }

    fn charge_gas(&mut self, amount: u64) -> Result<(), Fault> {
        if amount > self.gas_left {
            self.gas_left = 0;
            return Err(Fault::OutOfGas);
        }
        self.gas_left -= amount;
        Ok(())
    }

    fn balance_of(&self, who: Address) -> U256 {
        self.state.balances.get(&who).copied().unwrap_or_default()
    }

    fn has_code(&self, who: Address) -> bool {
        self.code.contains_key(&who)
    }

    fn invoke(&mut self, call: Call<'_>) -> Result<Bytes, Fault> {
        self.charge_gas(CALL_GAS)?;
        let forwarded = call.gas_limit.min(self.gas_left);
        let snapshot = self.state.clone();
        match self.run(call, forwarded, false) {
            Ok((output, used)) => {
                self.gas_left -= used;
                Ok(output)
            }
            Err((fault, used)) => {
                self.gas_left -= used;
                self.state = snapshot;
                Err(fault)
            }
        }
    }

    fn view(&self, to: Address, data: &[u8]) -> Result<Bytes, Fault> {
        let code = self.code.get(&to).cloned().ok_or(Fault::NoCode)?;
        let mut state = self.state.clone();
        let mut ctx = CallContext {
            address: to,
            caller: Address::ZERO,
            value: U256::ZERO,
            state: &mut state,
            gas_limit: VIEW_GAS,
            gas_used: 0,
            read_only: true,
        };
        code.call(&mut ctx, data)
    }

    fn emit(&mut self, log: Log) {
        self.state.logs.push(log);
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.checkpoints.push(self.state.clone());
        Checkpoint(self.checkpoints.len() - 1)
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        if let Some(state) = self.checkpoints.get(checkpoint.0).cloned() {
            self.state = state;
        }
        self.checkpoints.truncate(checkpoint.0);
    }

    fn commit(&mut self, checkpoint: Checkpoint) {
        self.checkpoints.truncate(checkpoint.0);
    }
}
