//! Shared types for the relay account engine.
//!
//! Everything in here must produce byte-identical results on-chain and off-chain: the engine
//! verifies digests built by [`digest`], and the signer tooling produces them.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod constants;
pub mod digest;
pub mod operation;
pub mod restrictions;

pub use operation::{Batch, DelegatedKeyAttestation, Operation};
pub use restrictions::{Restrictions, RestrictionsError};
