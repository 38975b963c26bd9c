#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, U256};
use relay_account::{
    testing::{MemoryLedger, TestKey},
    Account, AccountEngine, Batch, EngineConfig, ExpiringRelayerValidator, Ledger, Restrictions,
    ValidatorRegistry,
};
use relay_account_types::{
    digest::{BatchMethod, DigestScope},
    DelegatedKeyAttestation,
};

pub const ACCOUNT: Address = Address::new([0xaa; 20]);
pub const RELAYER: Address = Address::new([0x5e; 20]);
pub const VALIDATOR: Address = Address::new([0x77; 20]);
pub const ALICE: Address = Address::new([0x0a; 20]);
pub const BOB: Address = Address::new([0x0b; 20]);

pub const GWEI: u64 = 1_000_000_000;

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u8).pow(U256::from(18))
}

pub struct Harness {
    pub engine: AccountEngine,
    pub account: Account,
    pub ledger: MemoryLedger,
    pub owner: TestKey,
    pub delegate: TestKey,
}

impl Harness {
    /// One auth key, the expiring validator deployed at [`VALIDATOR`] allowing [`RELAYER`].
    pub fn new() -> Self {
        let owner = TestKey::from_seed(1);
        let delegate = TestKey::from_seed(2);
        let account = Account::new(ACCOUNT, owner.address()).unwrap();

        let mut ledger = MemoryLedger::default();
        ledger.install_stub(VALIDATOR);

        let validators =
            ValidatorRegistry::new().with(VALIDATOR, ExpiringRelayerValidator::new([RELAYER]));
        let engine = AccountEngine::new(EngineConfig::default(), validators);
        Self { engine, account, ledger, owner, delegate }
    }

    pub fn scope(&self) -> DigestScope {
        DigestScope::new(ACCOUNT, self.ledger.chain_id())
    }

    pub fn sign_auth(&self, batch: &Batch) -> Bytes {
        self.owner.sign_batch(&self.scope(), BatchMethod::AuthKey, self.account.nonce(), batch)
    }

    pub fn sign_delegated(&self, batch: &Batch) -> Bytes {
        self.delegate.sign_batch(&self.scope(), BatchMethod::DelegatedKey, self.account.nonce(), batch)
    }

    /// Attestation of the delegate by the owner, expiring an hour from now.
    pub fn attestation(&self) -> DelegatedKeyAttestation {
        let expires_at = self.ledger.timestamp() + 3_600;
        self.owner.attest(
            &self.scope(),
            self.delegate.address(),
            &Restrictions::expiring(VALIDATOR, expires_at),
        )
    }

    /// Nonce, auth keys and the balances of `watched`.
    pub fn snapshot(&self, watched: &[Address]) -> (u64, Vec<Address>, Vec<U256>) {
        (
            self.account.nonce(),
            self.account.auth_keys().copied().collect(),
            watched.iter().map(|who| self.ledger.balance_of(*who)).collect(),
        )
    }
}
