//! Batch execution: authentication, pre-checks, isolated per-operation calls, settlement.
//!
//! A call either commits in full or leaves no trace. The only failures that do not reject the
//! whole call are those of individual operations, which are rolled back on their own, recorded
//! as `CallFailed` and skipped.

use alloy_primitives::{Address, Bytes, FixedBytes};
use alloy_sol_types::{Revert, SolError, SolInterface};
use relay_account_types::{
    digest::{batch_digest, BatchMethod, DigestScope},
    Batch, DelegatedKeyAttestation, Operation,
};
use tracing::{debug, instrument, warn};

use crate::{
    account::Account,
    auth::{authenticate_auth_key, authenticate_delegated_key, is_valid_signature},
    config::EngineConfig,
    errors::AccountError,
    events::{emit, failure_record, CallFailed},
    guard::check_delegated_operations,
    interfaces::IRelayAccount::IRelayAccountCalls,
    ledger::{Call, Fault, Ledger},
    settlement::{settle, Settlement},
    validator::{ValidationContext, ValidatorRegistry},
};

/// What an accepted call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReceipt {
    /// Raw return data of every operation that succeeded, in submission order.
    pub results: Vec<Bytes>,
    /// Indices of operations that failed and were skipped.
    pub failed: Vec<usize>,
    /// Operations attempted, which is also how far the nonce moved.
    pub attempted: usize,
    /// Nonce after the call.
    pub nonce: u64,
    pub settlement: Settlement,
}

#[derive(Debug, Default)]
struct Outcome {
    results: Vec<Bytes>,
    failed: Vec<usize>,
}

/// Entry points of an account. Stateless apart from configuration and validator resolution;
/// the account and the host are passed in per call.
#[derive(Clone, Debug, Default)]
pub struct AccountEngine {
    config: EngineConfig,
    validators: ValidatorRegistry,
}

impl AccountEngine {
    pub fn new(config: EngineConfig, validators: ValidatorRegistry) -> Self {
        Self { config, validators }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a batch signed by an auth key, then reimburse `relayer`.
    #[instrument(skip_all, fields(account = %account.address(), nonce = account.nonce(), %relayer))]
    pub fn execute_auth_key_batch<L: Ledger>(
        &self,
        account: &mut Account,
        ledger: &mut L,
        relayer: Address,
        batch: &Batch,
        signature: &[u8],
    ) -> Result<BatchReceipt, AccountError> {
        let start_gas = ledger.gas_left();
        atomically(account, ledger, |account, ledger| {
            ensure_not_empty(&batch.operations)?;
            self.charge(ledger, self.config.signature_check_gas)?;

            let scope = DigestScope::new(account.address(), ledger.chain_id());
            let digest = batch_digest(&scope, BatchMethod::AuthKey, account.nonce(), batch);
            authenticate_auth_key(account, digest, signature)?;

            self.execute_and_settle(account, ledger, relayer, batch, start_gas)
        })
    }

    /// Run a batch signed by a delegated key, then reimburse `relayer`.
    ///
    /// On top of authentication, the attestation's validator and the call permission guard must
    /// accept every operation before any of them runs.
    #[instrument(skip_all, fields(
        account = %account.address(),
        nonce = account.nonce(),
        %relayer,
        delegated_key = %attestation.delegated_key,
    ))]
    pub fn execute_delegated_key_batch<L: Ledger>(
        &self,
        account: &mut Account,
        ledger: &mut L,
        relayer: Address,
        batch: &Batch,
        signature: &[u8],
        attestation: &DelegatedKeyAttestation,
    ) -> Result<BatchReceipt, AccountError> {
        let start_gas = ledger.gas_left();
        atomically(account, ledger, |account, ledger| {
            ensure_not_empty(&batch.operations)?;
            self.charge(ledger, self.config.signature_check_gas.saturating_mul(2))?;

            let scope = DigestScope::new(account.address(), ledger.chain_id());
            let digest = batch_digest(&scope, BatchMethod::DelegatedKey, account.nonce(), batch);
            authenticate_delegated_key(account, &scope, digest, signature, attestation)?;

            let ctx = ValidationContext {
                account: account.address(),
                delegated_key: attestation.delegated_key,
                relayer,
                timestamp: ledger.timestamp(),
            };
            self.validators.check_batch(ledger, &ctx, &attestation.restrictions, &batch.operations)?;
            check_delegated_operations(account, &batch.operations, self.config.call_stipend)?;

            self.execute_and_settle(account, ledger, relayer, batch, start_gas)
        })
    }

    /// Run operations submitted directly by an auth key or the account itself. Nothing is
    /// signed and nobody is reimbursed; the nonce still advances.
    #[instrument(skip_all, fields(account = %account.address(), nonce = account.nonce(), %caller))]
    pub fn execute_direct<L: Ledger>(
        &self,
        account: &mut Account,
        ledger: &mut L,
        caller: Address,
        operations: &[Operation],
    ) -> Result<BatchReceipt, AccountError> {
        atomically(account, ledger, |account, ledger| {
            account.ensure_key_manager(caller)?;
            ensure_not_empty(operations)?;
            self.reserve(ledger, operations, 0)?;
            let outcome = self.run_operations(account, ledger, operations)?;
            Ok(receipt(account, operations, outcome, Settlement::Waived))
        })
    }

    /// ERC-1271 signature check against the current key registry.
    pub fn is_valid_signature<L: Ledger>(
        &self,
        account: &Account,
        ledger: &L,
        hash: FixedBytes<32>,
        signature: &[u8],
    ) -> FixedBytes<4> {
        is_valid_signature(account, ledger, &self.validators, hash, signature)
    }

    fn execute_and_settle<L: Ledger>(
        &self,
        account: &mut Account,
        ledger: &mut L,
        relayer: Address,
        batch: &Batch,
        start_gas: u64,
    ) -> Result<BatchReceipt, AccountError> {
        self.reserve(ledger, &batch.operations, self.config.settlement_reserve)?;
        let outcome = self.run_operations(account, ledger, &batch.operations)?;
        let settlement = settle(account, ledger, &self.config, relayer, batch, start_gas)?;
        Ok(receipt(account, &batch.operations, outcome, settlement))
    }

    /// Require the remaining budget to cover every operation plus `extra` before any runs.
    fn reserve<L: Ledger>(
        &self,
        ledger: &L,
        operations: &[Operation],
        extra: u64,
    ) -> Result<(), AccountError> {
        let per_call = self.config.call_overhead_gas as u128;
        let required = operations.iter().map(|op| op.gas_limit as u128 + per_call).sum::<u128>()
            + extra as u128;
        let available = ledger.gas_left();
        if (available as u128) < required {
            return Err(AccountError::InsufficientGas { required, available });
        }
        Ok(())
    }

    fn charge<L: Ledger>(&self, ledger: &mut L, gas: u64) -> Result<(), AccountError> {
        let available = ledger.gas_left();
        ledger
            .charge_gas(gas)
            .map_err(|_| AccountError::InsufficientGas { required: gas as u128, available })
    }

    fn run_operations<L: Ledger>(
        &self,
        account: &mut Account,
        ledger: &mut L,
        operations: &[Operation],
    ) -> Result<Outcome, AccountError> {
        let first_nonce = account.nonce();
        let mut outcome = Outcome::default();

        for (index, op) in operations.iter().enumerate() {
            let result = if op.target == account.address() {
                self.self_call(account, ledger, op)
            } else {
                ledger.invoke(Call {
                    from: account.address(),
                    to: op.target,
                    value: op.value,
                    data: &op.data,
                    gas_limit: op.gas_limit,
                })
            };

            match result {
                Ok(output) => outcome.results.push(output),
                Err(fault) => {
                    let nonce = first_nonce.saturating_add(index as u64);
                    let encoded = failure_record(nonce, op.target, op.value, &op.data);
                    warn!(index, target = %op.target, %fault, %encoded, "operation failed");
                    emit(
                        ledger,
                        account.address(),
                        &CallFailed { encodedData: encoded, reason: fault.revert_data() },
                    );
                    outcome.failed.push(index);
                }
            }
        }

        let nonce = account.advance_nonce(operations.len())?;
        debug!(attempted = operations.len(), failed = outcome.failed.len(), nonce, "operations executed");
        Ok(outcome)
    }

    /// Operations aimed at the account are dispatched against its own ABI.
    fn self_call<L: Ledger>(
        &self,
        account: &mut Account,
        ledger: &mut L,
        op: &Operation,
    ) -> Result<Bytes, Fault> {
        ledger.charge_gas(self.config.call_overhead_gas)?;
        if op.data.is_empty() {
            return Ok(Bytes::new());
        }
        let call = IRelayAccountCalls::abi_decode(&op.data, true)
            .map_err(|_| revert_with("unknown account function"))?;
        let result = match call {
            IRelayAccountCalls::addAuthKey(call) => account.insert_auth_key(ledger, call.authKey),
            IRelayAccountCalls::removeAuthKey(call) => account.delete_auth_key(ledger, call.authKey),
        };
        result.map(|()| Bytes::new()).map_err(|err| revert_with(err.reason()))
    }
}

fn ensure_not_empty(operations: &[Operation]) -> Result<(), AccountError> {
    if operations.is_empty() {
        return Err(AccountError::EmptyBatch);
    }
    Ok(())
}

fn revert_with(reason: &str) -> Fault {
    Fault::Reverted(SolError::abi_encode(&Revert { reason: reason.into() }).into())
}

fn receipt(
    account: &Account,
    operations: &[Operation],
    outcome: Outcome,
    settlement: Settlement,
) -> BatchReceipt {
    BatchReceipt {
        results: outcome.results,
        failed: outcome.failed,
        attempted: operations.len(),
        nonce: account.nonce(),
        settlement,
    }
}

/// Run `f`, rolling the account and the ledger back if it fails.
fn atomically<L, T, F>(account: &mut Account, ledger: &mut L, f: F) -> Result<T, AccountError>
where
    L: Ledger,
    F: FnOnce(&mut Account, &mut L) -> Result<T, AccountError>,
{
    let snapshot = account.clone();
    let checkpoint = ledger.checkpoint();
    match f(account, ledger) {
        Ok(value) => {
            ledger.commit(checkpoint);
            Ok(value)
        }
        Err(err) => {
            *account = snapshot;
            ledger.revert_to(checkpoint);
            warn!(reason = err.reason(), %err, "call rejected");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;
    use alloy_sol_types::{SolCall, SolEvent};

    use super::*;
    use crate::{
        events::AuthKeyAdded,
        interfaces::IRelayAccount,
        testing::{MemoryLedger, TestKey},
    };

    const ACCOUNT: Address = Address::new([0xaa; 20]);

    fn setup() -> (AccountEngine, Account, TestKey, MemoryLedger) {
        let owner = TestKey::from_seed(1);
        let account = Account::new(ACCOUNT, owner.address()).unwrap();
        (AccountEngine::default(), account, owner, MemoryLedger::default())
    }

    fn add_key(key: Address) -> Operation {
        let data = SolCall::abi_encode(&IRelayAccount::addAuthKeyCall { authKey: key });
        Operation::call(ACCOUNT, U256::ZERO, data, 0)
    }

    #[test]
    fn direct_self_call_adds_key() {
        let (engine, mut account, owner, mut ledger) = setup();
        let new_key = Address::repeat_byte(0x42);

        let receipt = engine
            .execute_direct(&mut account, &mut ledger, owner.address(), &[add_key(new_key)])
            .unwrap();
        assert!(receipt.failed.is_empty());
        assert_eq!(receipt.nonce, 1);
        assert_eq!(receipt.settlement, Settlement::Waived);
        assert!(account.is_auth_key(new_key));

        let added: Vec<_> = ledger
            .logs()
            .iter()
            .filter_map(|log| AuthKeyAdded::decode_log_data(&log.data, true).ok())
            .collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].authKey, new_key);
    }

    #[test]
    fn empty_self_call_is_a_no_op() {
        let (engine, mut account, owner, mut ledger) = setup();
        let op = Operation::call(ACCOUNT, U256::ZERO, Bytes::new(), 0);
        let receipt = engine.execute_direct(&mut account, &mut ledger, owner.address(), &[op]).unwrap();
        assert_eq!(receipt.results, vec![Bytes::new()]);
        assert_eq!(account.nonce(), 1);
    }

    #[test]
    fn rejected_self_call_is_isolated() {
        let (engine, mut account, owner, mut ledger) = setup();
        let remove_last = Operation::call(
            ACCOUNT,
            U256::ZERO,
            SolCall::abi_encode(&IRelayAccount::removeAuthKeyCall { authKey: owner.address() }),
            0,
        );
        let unknown = Operation::call(ACCOUNT, U256::ZERO, vec![0xde, 0xad, 0xbe, 0xefu8], 0);

        let receipt = engine
            .execute_direct(&mut account, &mut ledger, owner.address(), &[remove_last, unknown])
            .unwrap();
        assert_eq!(receipt.failed, vec![0, 1]);
        assert_eq!(account.nonce(), 2);
        assert!(account.is_auth_key(owner.address()));

        let failure = CallFailed::decode_log_data(&ledger.logs()[0].data, true).unwrap();
        let reason = <Revert as SolError>::abi_decode(&failure.reason, true).unwrap();
        assert_eq!(reason.reason, AccountError::LastAuthKey.reason());
    }

    #[test]
    fn direct_call_requires_key_manager() {
        let (engine, mut account, _, mut ledger) = setup();
        let stranger = Address::repeat_byte(0x99);
        let result = engine.execute_direct(&mut account, &mut ledger, stranger, &[add_key(stranger)]);
        assert_eq!(result, Err(AccountError::Unauthorized(stranger)));
        assert_eq!(account.nonce(), 0);
    }

    #[test]
    fn empty_batch_rejected() {
        let (engine, mut account, owner, mut ledger) = setup();
        let batch = Batch::new(Vec::new());
        let scope = DigestScope::new(ACCOUNT, ledger.chain_id());
        let signature = owner.sign_batch(&scope, BatchMethod::AuthKey, 0, &batch);

        let result =
            engine.execute_auth_key_batch(&mut account, &mut ledger, owner.address(), &batch, &signature);
        assert_eq!(result, Err(AccountError::EmptyBatch));
        assert!(ledger.logs().is_empty());
    }

    #[test]
    fn reservation_counts_overhead_and_settlement() {
        let (engine, _, _, mut ledger) = setup();
        let ops = vec![Operation::transfer(Address::repeat_byte(0x10), U256::ZERO, 1_000); 2];
        let required = 2 * (1_000 + 2_600) + 50_000;

        ledger.set_gas(required - 1);
        assert_eq!(
            engine.reserve(&ledger, &ops, engine.config().settlement_reserve),
            Err(AccountError::InsufficientGas { required: required as u128, available: required - 1 })
        );
        ledger.set_gas(required);
        assert_eq!(engine.reserve(&ledger, &ops, engine.config().settlement_reserve), Ok(()));
    }
}
