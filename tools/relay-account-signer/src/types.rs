use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use serde::{Deserialize, Serialize};

/// One operation as written in a batch file.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationEntry {
    pub target: Address,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub gas_limit: u64,
}

/// A batch plus the scope it is signed for.
///
/// Omitting `feeToken` settles in native value; omitting `gasPrice` waives settlement.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchFile {
    pub account: Address,
    pub chain_id: u64,
    pub nonce: u64,
    pub operations: Vec<OperationEntry>,
    #[serde(default)]
    pub gas_price: U256,
    #[serde(default)]
    pub gas_overhead: U256,
    #[serde(default)]
    pub fee_token: Option<Address>,
    #[serde(default)]
    pub fee_rate: U256,
}

/// Delegation to be attested. `expiresAt` is only meaningful with a `validator`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttestationFile {
    pub account: Address,
    pub chain_id: u64,
    pub delegated_key: Address,
    #[serde(default)]
    pub validator: Option<Address>,
    #[serde(default)]
    pub expires_at: Option<u64>,
    /// Raw policy data, used verbatim when `expiresAt` is absent.
    #[serde(default)]
    pub policy_data: Option<Bytes>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestOutput {
    pub method: String,
    pub domain_separator: FixedBytes<32>,
    pub digest: FixedBytes<32>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOutput {
    pub signer: Address,
    pub digest: FixedBytes<32>,
    pub signature: Bytes,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationOutput {
    pub attester: Address,
    pub delegated_key: Address,
    pub restrictions: Bytes,
    pub signature: Bytes,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub accepted: bool,
    /// Error reason code when the call was rejected.
    pub rejection: Option<String>,
    pub nonce: u64,
    pub failed_operations: Vec<usize>,
    pub gas_consumed: Option<U256>,
    pub fee_paid: U256,
    pub logs: usize,
}
