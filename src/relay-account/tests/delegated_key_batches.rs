mod common;

use alloy_primitives::{Address, U256};
use common::*;
use relay_account::{
    testing::TestKey, AccountEngine, AccountError, Batch, EngineConfig, ExpiringRelayerValidator,
    Ledger, Operation, PolicyViolation, Restrictions, ValidatorRegistry,
};

fn run(h: &mut Harness, relayer: Address, batch: &Batch) -> Result<relay_account::BatchReceipt, AccountError> {
    let signature = h.sign_delegated(batch);
    let attestation = h.attestation();
    h.engine.execute_delegated_key_batch(&mut h.account, &mut h.ledger, relayer, batch, &signature, &attestation)
}

#[test]
fn delegated_transfer_to_outsider() -> eyre::Result<()> {
    let mut h = Harness::new();
    h.ledger.fund(ACCOUNT, ether(2));
    let batch = Batch::new(vec![Operation::transfer(ALICE, ether(1), 0)])
        .with_native_fee(U256::from(GWEI), U256::ZERO);

    let receipt = run(&mut h, RELAYER, &batch)?;

    assert_eq!(receipt.nonce, 1);
    assert_eq!(h.ledger.balance_of(ALICE), ether(1));
    assert_eq!(h.ledger.balance_of(RELAYER), receipt.settlement.amount());
    Ok(())
}

#[test]
fn unlisted_relayer_is_rejected() {
    let mut h = Harness::new();
    h.ledger.fund(ACCOUNT, ether(3));
    let intruder = Address::repeat_byte(0x66);
    let batch = Batch::new(vec![Operation::transfer(ALICE, ether(1), 0)])
        .with_native_fee(U256::from(GWEI), U256::ZERO);
    let before = h.snapshot(&[ACCOUNT, ALICE, intruder]);

    let result = run(&mut h, intruder, &batch);

    assert_eq!(result, Err(AccountError::Policy(PolicyViolation::UnauthorizedRelayer(intruder))));
    assert_eq!(h.snapshot(&[ACCOUNT, ALICE, intruder]), before);
    assert!(h.ledger.logs().is_empty());
}

#[test]
fn expired_attestation_is_rejected() {
    let mut h = Harness::new();
    let batch = Batch::new(vec![Operation::transfer(ALICE, U256::ZERO, 0)]);
    let signature = h.sign_delegated(&batch);
    let attestation = h.attestation();
    let now = h.ledger.timestamp() + 3_600;
    h.ledger.set_timestamp(now);

    let result = h.engine.execute_delegated_key_batch(
        &mut h.account,
        &mut h.ledger,
        RELAYER,
        &batch,
        &signature,
        &attestation,
    );
    assert_eq!(
        result,
        Err(AccountError::Policy(PolicyViolation::Expired { expires_at: now, now }))
    );
    assert_eq!(h.account.nonce(), 0);
}

#[test]
fn stipend_boundary_towards_auth_keys() -> eyre::Result<()> {
    let mut h = Harness::new();
    h.ledger.fund(ACCOUNT, ether(1));
    let owner = h.owner.address();

    let at_stipend = Batch::new(vec![Operation::transfer(owner, U256::from(1), 2_300)]);
    run(&mut h, RELAYER, &at_stipend)?;
    assert_eq!(h.ledger.balance_of(owner), U256::from(1));

    let above_stipend = Batch::new(vec![Operation::transfer(owner, U256::from(1), 2_301)]);
    assert_eq!(
        run(&mut h, RELAYER, &above_stipend),
        Err(AccountError::DelegatedKeyCallsAuthKey { index: 0, target: owner })
    );

    let with_data = Batch::new(vec![
        Operation::transfer(ALICE, U256::ZERO, 0),
        Operation::call(owner, U256::ZERO, vec![0x01u8], 0),
    ]);
    assert_eq!(
        run(&mut h, RELAYER, &with_data),
        Err(AccountError::DelegatedKeyCallsAuthKey { index: 1, target: owner })
    );
    assert_eq!(h.account.nonce(), 1);
    Ok(())
}

#[test]
fn delegated_key_cannot_call_account() {
    let mut h = Harness::new();
    let batch = Batch::new(vec![Operation::call(ACCOUNT, U256::ZERO, vec![0xaau8], 0)]);
    assert_eq!(run(&mut h, RELAYER, &batch), Err(AccountError::DelegatedKeyCallsSelf { index: 0 }));
}

#[test]
fn revoking_the_attester_invalidates_the_attestation() -> eyre::Result<()> {
    let mut h = Harness::new();
    let batch = Batch::new(vec![Operation::transfer(ALICE, U256::ZERO, 0)]);
    let attestation = h.attestation();

    let successor = TestKey::from_seed(7);
    let owner = h.owner.address();
    h.account.add_auth_key(&mut h.ledger, owner, successor.address())?;
    h.account.remove_auth_key(&mut h.ledger, successor.address(), owner)?;

    let signature = h.sign_delegated(&batch);
    let result = h.engine.execute_delegated_key_batch(
        &mut h.account,
        &mut h.ledger,
        RELAYER,
        &batch,
        &signature,
        &attestation,
    );
    assert_eq!(result, Err(AccountError::InvalidAttestation(owner)));
    Ok(())
}

#[test]
fn validator_without_code_is_rejected() {
    let mut h = Harness::new();
    let missing = Address::repeat_byte(0x78);
    let batch = Batch::new(vec![Operation::transfer(ALICE, U256::ZERO, 0)]);
    let signature = h.sign_delegated(&batch);
    let attestation = h.owner.attest(
        &h.scope(),
        h.delegate.address(),
        &Restrictions::expiring(missing, u64::MAX),
    );

    let result = h.engine.execute_delegated_key_batch(
        &mut h.account,
        &mut h.ledger,
        RELAYER,
        &batch,
        &signature,
        &attestation,
    );
    assert_eq!(result, Err(AccountError::ValidatorNotContract(missing)));
}

#[test]
fn unrestricted_key_still_obeys_the_guard() -> eyre::Result<()> {
    let mut h = Harness::new();
    h.ledger.fund(ACCOUNT, U256::from(5));
    let attestation = h.owner.attest(&h.scope(), h.delegate.address(), &Restrictions::unrestricted());
    let batch = Batch::new(vec![Operation::transfer(BOB, U256::from(5), 0)]);
    let signature = h.sign_delegated(&batch);

    // Any relayer may submit when no validator is named.
    let anyone = Address::repeat_byte(0x31);
    h.engine.execute_delegated_key_batch(&mut h.account, &mut h.ledger, anyone, &batch, &signature, &attestation)?;
    assert_eq!(h.ledger.balance_of(BOB), U256::from(5));
    Ok(())
}

#[test]
fn allow_list_stays_maintainable_after_registration() -> eyre::Result<()> {
    let mut h = Harness::new();
    let policy = ExpiringRelayerValidator::new([RELAYER]);
    let validators = ValidatorRegistry::new().with(VALIDATOR, policy.clone());
    h.engine = AccountEngine::new(EngineConfig::default(), validators);

    let batch = Batch::new(vec![Operation::transfer(ALICE, U256::ZERO, 0)]);
    run(&mut h, RELAYER, &batch)?;

    let newcomer = Address::repeat_byte(0x61);
    assert!(policy.allow_relayer(newcomer));
    assert!(policy.disallow_relayer(RELAYER));

    assert_eq!(
        run(&mut h, RELAYER, &batch),
        Err(AccountError::Policy(PolicyViolation::UnauthorizedRelayer(RELAYER)))
    );
    run(&mut h, newcomer, &batch)?;
    assert_eq!(h.account.nonce(), 2);
    Ok(())
}
