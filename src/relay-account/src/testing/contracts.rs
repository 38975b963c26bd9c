use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{Revert, SolCall, SolError, SolInterface, SolValue};

use super::ledger::{CallContext, Contract};
use crate::{
    interfaces::IERC20::{self, IERC20Calls},
    ledger::Fault,
};

fn revert(reason: &str) -> Fault {
    Fault::Reverted(SolError::abi_encode(&Revert { reason: reason.into() }).into())
}

/// Inert code: accepts everything, returns nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stub;

impl Contract for Stub {
    fn call(&self, _ctx: &mut CallContext<'_>, _data: &[u8]) -> Result<Bytes, Fault> {
        Ok(Bytes::new())
    }
}

/// Reverts every call with `Error(reason)`.
#[derive(Clone, Debug)]
pub struct AlwaysRevert {
    reason: String,
}

impl AlwaysRevert {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl Contract for AlwaysRevert {
    fn call(&self, _ctx: &mut CallContext<'_>, _data: &[u8]) -> Result<Bytes, Fault> {
        Err(revert(&self.reason))
    }
}

/// Returns its calldata and records the last caller at slot zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Echo;

impl Echo {
    pub fn last_caller_slot() -> B256 {
        B256::ZERO
    }
}

impl Contract for Echo {
    fn call(&self, ctx: &mut CallContext<'_>, data: &[u8]) -> Result<Bytes, Fault> {
        let caller = ctx.caller;
        ctx.sstore(Self::last_caller_slot(), U256::from_be_slice(caller.as_slice()))?;
        Ok(Bytes::copy_from_slice(data))
    }
}

/// Minimal ERC-20 with configurable decimals. Balances live at `keccak256(holder)`.
#[derive(Clone, Copy, Debug)]
pub struct MockToken {
    decimals: u8,
    refuse_transfers: bool,
}

impl MockToken {
    pub fn new(decimals: u8) -> Self {
        Self { decimals, refuse_transfers: false }
    }

    /// A token whose `transfer` returns `false` instead of moving funds.
    pub fn refusing_transfers(mut self) -> Self {
        self.refuse_transfers = true;
        self
    }

    pub fn balance_slot(holder: Address) -> B256 {
        keccak256(holder.as_slice())
    }

    fn transfer(&self, ctx: &mut CallContext<'_>, to: Address, amount: U256) -> Result<Bytes, Fault> {
        if self.refuse_transfers {
            return Ok(false.abi_encode().into());
        }
        let from = ctx.caller;
        let from_balance = ctx.sload(Self::balance_slot(from))?;
        if from_balance < amount {
            return Err(revert("ERC20: transfer amount exceeds balance"));
        }
        ctx.sstore(Self::balance_slot(from), from_balance - amount)?;
        let to_balance = ctx.sload(Self::balance_slot(to))?;
        ctx.sstore(Self::balance_slot(to), to_balance.saturating_add(amount))?;
        Ok(true.abi_encode().into())
    }
}

impl Contract for MockToken {
    fn call(&self, ctx: &mut CallContext<'_>, data: &[u8]) -> Result<Bytes, Fault> {
        let call = IERC20Calls::abi_decode(data, true).map_err(|_| revert("unknown selector"))?;
        match call {
            IERC20Calls::transfer(IERC20::transferCall { to, amount }) => self.transfer(ctx, to, amount),
            IERC20Calls::balanceOf(IERC20::balanceOfCall { owner }) => {
                Ok(ctx.sload(Self::balance_slot(owner))?.abi_encode().into())
            }
            IERC20Calls::decimals(_) => {
                Ok(IERC20::decimalsCall::abi_encode_returns(&(self.decimals,)).into())
            }
        }
    }
}

/// Helpers for reading and minting [`MockToken`] balances directly.
impl super::MemoryLedger {
    pub fn mint_token(&mut self, token: Address, holder: Address, amount: U256) {
        let slot = MockToken::balance_slot(holder);
        let balance = self.storage_at(token, slot).saturating_add(amount);
        self.set_storage(token, slot, balance);
    }

    pub fn token_balance(&self, token: Address, holder: Address) -> U256 {
        self.storage_at(token, MockToken::balance_slot(holder))
    }
}
