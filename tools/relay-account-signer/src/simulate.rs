//! Dry-run an auth-key batch against an in-memory ledger.

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Result};
use k256::ecdsa::SigningKey;
use relay_account::{
    crypto::public_key_address,
    testing::MemoryLedger,
    Account, AccountEngine, EngineConfig, Ledger, Settlement, ValidatorRegistry,
};
use relay_account_types::digest::BatchMethod;
use tracing::info;

use crate::{
    encoder::{sign, to_batch},
    types::{BatchFile, SimulationReport},
};

#[derive(Clone, Debug)]
pub struct SimulationParams {
    pub relayer: Address,
    pub balance: U256,
    pub gas: u64,
    pub timestamp: u64,
}

/// Deploy a fresh account owned by `key` with `file`'s address and run `file` on it.
///
/// The account starts at the file's nonce.
pub fn simulate(
    key: &SigningKey,
    file: &BatchFile,
    config: EngineConfig,
    params: &SimulationParams,
) -> Result<SimulationReport> {
    let owner = public_key_address(key.verifying_key());
    let mut account = Account::restore(file.account, [owner], file.nonce)
        .map_err(|err| anyhow!("cannot create account: {err}"))?;

    let mut ledger = MemoryLedger::new(file.chain_id, params.timestamp);
    ledger.set_gas(params.gas);
    ledger.fund(file.account, params.balance);

    let engine = AccountEngine::new(config, ValidatorRegistry::new());
    let batch = to_batch(file);
    let signed = sign(key, file, BatchMethod::AuthKey)?;

    let result = engine.execute_auth_key_batch(
        &mut account,
        &mut ledger,
        params.relayer,
        &batch,
        &signed.signature,
    );
    let report = match result {
        Ok(receipt) => {
            let gas_consumed = match &receipt.settlement {
                Settlement::Paid { gas_consumed, .. } => Some(*gas_consumed),
                Settlement::Waived => None,
            };
            SimulationReport {
                accepted: true,
                rejection: None,
                nonce: receipt.nonce,
                failed_operations: receipt.failed,
                gas_consumed,
                fee_paid: receipt.settlement.amount(),
                logs: ledger.logs().len(),
            }
        }
        Err(err) => SimulationReport {
            accepted: false,
            rejection: Some(err.reason().to_string()),
            nonce: account.nonce(),
            failed_operations: Vec::new(),
            gas_consumed: None,
            fee_paid: U256::ZERO,
            logs: ledger.logs().len(),
        },
    };
    info!(accepted = report.accepted, nonce = report.nonce, gas_left = ledger.gas_left(), "simulation finished");
    Ok(report)
}
