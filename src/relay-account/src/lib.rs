//! Relay account engine.
//!
//! A self-custodied account whose auth keys authorise batches of calls. Batches are submitted by
//! a relayer, who is reimbursed from the account in native value or an ERC-20 token. Auth keys
//! may delegate to short-lived keys whose batches are additionally constrained by a pluggable
//! validator and may only move native value.
//!
//! The engine is host-agnostic: state the account does not own itself is reached through the
//! [`Ledger`] trait.

pub mod account;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod events;
pub mod executor;
pub mod guard;
pub mod interfaces;
pub mod ledger;
mod nonce;
mod registry;
pub mod settlement;
pub mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use account::Account;
pub use config::EngineConfig;
pub use errors::{AccountError, PolicyViolation};
pub use executor::{AccountEngine, BatchReceipt};
pub use ledger::{Call, Checkpoint, Fault, Ledger};
pub use relay_account_types::{
    Batch, DelegatedKeyAttestation, Operation, Restrictions, RestrictionsError,
};
pub use settlement::Settlement;
pub use validator::{
    DelegatedKeyValidator, ExpiringRelayerValidator, ValidationContext, ValidatorRegistry,
};
