use relay_account_types::constants::CALL_STIPEND;
use serde::Deserialize;

/// Engine tunables. Every field has a default, so `{}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Highest gas limit a delegated key may forward to an auth key (data-less calls only).
    pub call_stipend: u64,
    /// Gas the host charges per call on top of what it forwards.
    pub call_overhead_gas: u64,
    /// Gas held back before execution so settlement can always run.
    pub settlement_reserve: u64,
    /// Gas charged per signature recovery.
    pub signature_check_gas: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_stipend: CALL_STIPEND,
            call_overhead_gas: 2_600,
            settlement_reserve: 50_000,
            signature_check_gas: 3_000,
        }
    }
}
