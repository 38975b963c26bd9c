use alloy_primitives::{Address, U256};
use relay_account_types::RestrictionsError;

pub use crate::crypto::SignatureError;

/// Why a delegated-key validator refused a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("delegated key expired at {expires_at} (now {now})")]
    Expired { expires_at: u64, now: u64 },
    #[error("relayer {0} is not allowed by the policy")]
    UnauthorizedRelayer(Address),
    #[error("malformed policy data")]
    MalformedPolicyData,
    #[error("{0}")]
    Rejected(String),
}

impl PolicyViolation {
    pub fn reason(&self) -> &'static str {
        match self {
            PolicyViolation::Expired { .. } => "EXPIRED",
            PolicyViolation::UnauthorizedRelayer(_) => "UNAUTHORIZED_RELAYER",
            PolicyViolation::MalformedPolicyData => "MALFORMED_POLICY_DATA",
            PolicyViolation::Rejected(_) => "POLICY_REJECTED",
        }
    }
}

/// Whole-call rejections. Any of these leaves the account exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    // authentication
    #[error("malformed signature: {0}")]
    MalformedSignature(#[from] SignatureError),
    #[error("signature recovered {0}, which is not a registered auth key")]
    InvalidSignature(Address),
    #[error("batch signed by {recovered}, expected delegated key {expected}")]
    InvalidDelegatedSignature { recovered: Address, expected: Address },
    #[error("attestation signed by {0}, which is not a registered auth key")]
    InvalidAttestation(Address),

    // delegated-key policy
    #[error("malformed restrictions: {0}")]
    MalformedRestrictions(#[from] RestrictionsError),
    #[error("validator {0} is not a contract")]
    ValidatorNotContract(Address),
    #[error("no validator implementation registered at {0}")]
    ValidatorUnavailable(Address),
    #[error("policy rejected batch: {0}")]
    Policy(#[from] PolicyViolation),

    // call permission guard
    #[error("operation {index}: delegated key cannot call the account itself")]
    DelegatedKeyCallsSelf { index: usize },
    #[error("operation {index}: delegated key can only send bare value to auth key {target}")]
    DelegatedKeyCallsAuthKey { index: usize, target: Address },

    // execution
    #[error("batch has no operations")]
    EmptyBatch,
    #[error("insufficient gas: {required} required, {available} available")]
    InsufficientGas { required: u128, available: u64 },
    #[error("nonce overflow")]
    NonceOverflow,

    // settlement
    #[error("fee of {due} exceeds account balance {available}")]
    InsufficientFeeBalance { due: U256, available: U256 },
    #[error("fee amount overflows")]
    FeeOverflow,
    #[error("fee token {0} did not report its decimals")]
    FeeTokenDecimals(Address),
    #[error("fee token {0} did not report the account's balance")]
    FeeTokenBalance(Address),
    #[error("fee transfer to relayer {0} failed")]
    FeeTransferFailed(Address),

    // key registry
    #[error("{0} may not manage auth keys")]
    Unauthorized(Address),
    #[error("{0} is already an auth key")]
    AuthKeyAlreadyRegistered(Address),
    #[error("{0} is not an auth key")]
    AuthKeyNotRegistered(Address),
    #[error("cannot remove the last auth key")]
    LastAuthKey,
    #[error("the account cannot be its own auth key")]
    SelfAsAuthKey,
    #[error("the zero address cannot be an auth key")]
    ZeroAuthKey,
}

impl AccountError {
    /// Stable reason code surfaced to relayers.
    pub fn reason(&self) -> &'static str {
        match self {
            AccountError::MalformedSignature(_) => "MALFORMED_SIGNATURE",
            AccountError::InvalidSignature(_) => "INVALID_SIGNATURE",
            AccountError::InvalidDelegatedSignature { .. } => "INVALID_DELEGATED_SIGNATURE",
            AccountError::InvalidAttestation(_) => "INVALID_ATTESTATION",
            AccountError::MalformedRestrictions(_) => "MALFORMED_RESTRICTIONS",
            AccountError::ValidatorNotContract(_) => "VALIDATOR_NOT_CONTRACT",
            AccountError::ValidatorUnavailable(_) => "VALIDATOR_UNAVAILABLE",
            AccountError::Policy(violation) => violation.reason(),
            AccountError::DelegatedKeyCallsSelf { .. } => "DELEGATED_KEY_CALLS_SELF",
            AccountError::DelegatedKeyCallsAuthKey { .. } => "DELEGATED_KEY_CALLS_AUTH_KEY",
            AccountError::EmptyBatch => "EMPTY_BATCH",
            AccountError::InsufficientGas { .. } => "INSUFFICIENT_GAS",
            AccountError::NonceOverflow => "NONCE_OVERFLOW",
            AccountError::InsufficientFeeBalance { .. } => "INSUFFICIENT_FEE_BALANCE",
            AccountError::FeeOverflow => "FEE_OVERFLOW",
            AccountError::FeeTokenDecimals(_) => "FEE_TOKEN_DECIMALS",
            AccountError::FeeTokenBalance(_) => "FEE_TOKEN_BALANCE",
            AccountError::FeeTransferFailed(_) => "FEE_TRANSFER_FAILED",
            AccountError::Unauthorized(_) => "UNAUTHORIZED",
            AccountError::AuthKeyAlreadyRegistered(_) => "AUTH_KEY_ALREADY_REGISTERED",
            AccountError::AuthKeyNotRegistered(_) => "AUTH_KEY_NOT_REGISTERED",
            AccountError::LastAuthKey => "LAST_AUTH_KEY",
            AccountError::SelfAsAuthKey => "SELF_AS_AUTH_KEY",
            AccountError::ZeroAuthKey => "ZERO_AUTH_KEY",
        }
    }
}
