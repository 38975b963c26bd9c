//! Relayer reimbursement.
//!
//! Consumption is measured from entry to just before settlement, plus the batch's declared
//! `gasOverhead` for settlement itself. A failing settlement fails the whole call.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use relay_account_types::{constants::FEE_RATE_DECIMALS, Batch};
use tracing::debug;

use crate::{
    account::Account,
    config::EngineConfig,
    errors::AccountError,
    events::{emit, RelayerReimbursed},
    interfaces::IERC20,
    ledger::{Call, Ledger},
};

/// How the relayer was reimbursed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// `gasPrice` was zero: the relayer absorbed its own cost.
    Waived,
    Paid {
        relayer: Address,
        /// Zero address for native value.
        fee_token: Address,
        gas_consumed: U256,
        amount: U256,
    },
}

impl Settlement {
    pub fn amount(&self) -> U256 {
        match self {
            Settlement::Waived => U256::ZERO,
            Settlement::Paid { amount, .. } => *amount,
        }
    }
}

/// Fee owed in a token with `decimals` for `gas_consumed` at an 18-decimal `fee_rate`.
pub fn token_amount_due(gas_consumed: U256, fee_rate: U256, decimals: u8) -> Result<U256, AccountError> {
    let normalized = gas_consumed.checked_mul(fee_rate).ok_or(AccountError::FeeOverflow)?;
    if decimals <= FEE_RATE_DECIMALS {
        let scale = U256::from(10u8).pow(U256::from(FEE_RATE_DECIMALS - decimals));
        Ok(normalized / scale)
    } else {
        let scale = U256::from(10u8)
            .checked_pow(U256::from(decimals - FEE_RATE_DECIMALS))
            .ok_or(AccountError::FeeOverflow)?;
        normalized.checked_mul(scale).ok_or(AccountError::FeeOverflow)
    }
}

/// Pay `relayer` for everything consumed since `start_gas`.
pub fn settle<L: Ledger>(
    account: &Account,
    ledger: &mut L,
    config: &EngineConfig,
    relayer: Address,
    batch: &Batch,
    start_gas: u64,
) -> Result<Settlement, AccountError> {
    if batch.gas_price.is_zero() {
        debug!("gas price is zero, settlement waived");
        return Ok(Settlement::Waived);
    }

    let gas_consumed = U256::from(start_gas.saturating_sub(ledger.gas_left()))
        .checked_add(batch.gas_overhead)
        .ok_or(AccountError::FeeOverflow)?;

    let amount = if batch.pays_in_token() {
        pay_in_token(account, ledger, config, relayer, batch, gas_consumed)?
    } else {
        pay_native(account, ledger, config, relayer, batch, gas_consumed)?
    };

    emit(
        ledger,
        account.address(),
        &RelayerReimbursed { relayer, feeToken: batch.fee_token, amount },
    );
    debug!(%relayer, fee_token = %batch.fee_token, %gas_consumed, %amount, "relayer reimbursed");
    Ok(Settlement::Paid { relayer, fee_token: batch.fee_token, gas_consumed, amount })
}

fn pay_native<L: Ledger>(
    account: &Account,
    ledger: &mut L,
    config: &EngineConfig,
    relayer: Address,
    batch: &Batch,
    gas_consumed: U256,
) -> Result<U256, AccountError> {
    let due = gas_consumed.checked_mul(batch.gas_price).ok_or(AccountError::FeeOverflow)?;
    let available = ledger.balance_of(account.address());
    if available < due {
        return Err(AccountError::InsufficientFeeBalance { due, available });
    }
    ledger
        .invoke(Call {
            from: account.address(),
            to: relayer,
            value: due,
            data: &[],
            gas_limit: config.call_stipend,
        })
        .map_err(|_| AccountError::FeeTransferFailed(relayer))?;
    Ok(due)
}

fn pay_in_token<L: Ledger>(
    account: &Account,
    ledger: &mut L,
    config: &EngineConfig,
    relayer: Address,
    batch: &Batch,
    gas_consumed: U256,
) -> Result<U256, AccountError> {
    let token = batch.fee_token;
    let decimals = ledger
        .view(token, &SolCall::abi_encode(&IERC20::decimalsCall {}))
        .ok()
        .and_then(|out| IERC20::decimalsCall::abi_decode_returns(&out, true).ok())
        .map(|ret| ret._0)
        .ok_or(AccountError::FeeTokenDecimals(token))?;
    let due = token_amount_due(gas_consumed, batch.fee_rate, decimals)?;

    let available = ledger
        .view(token, &SolCall::abi_encode(&IERC20::balanceOfCall { owner: account.address() }))
        .ok()
        .and_then(|out| IERC20::balanceOfCall::abi_decode_returns(&out, true).ok())
        .map(|ret| ret._0)
        .ok_or(AccountError::FeeTokenBalance(token))?;
    if available < due {
        return Err(AccountError::InsufficientFeeBalance { due, available });
    }

    let data = SolCall::abi_encode(&IERC20::transferCall { to: relayer, amount: due });
    let output = ledger
        .invoke(Call {
            from: account.address(),
            to: token,
            value: U256::ZERO,
            data: &data,
            gas_limit: config.settlement_reserve,
        })
        .map_err(|_| AccountError::FeeTransferFailed(relayer))?;
    // Tokens that return nothing are treated as successful, as SafeERC20 does.
    let transferred = output.is_empty() || bool::abi_decode(&output, true).unwrap_or(false);
    if !transferred {
        return Err(AccountError::FeeTransferFailed(relayer));
    }
    Ok(due)
}
