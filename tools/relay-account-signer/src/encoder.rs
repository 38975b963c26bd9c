use anyhow::{anyhow, Context, Result};
use k256::ecdsa::SigningKey;
use relay_account::{
    crypto::{public_key_address, sign_digest},
    Batch, Operation, Restrictions,
};
use relay_account_types::{
    constants::{AUTH_KEY_BATCH_METHOD, DELEGATED_KEY_BATCH_METHOD},
    digest::{batch_digest, delegated_key_digest, BatchMethod, DigestScope},
    restrictions::encode_expiry,
};

use crate::types::{
    AttestationFile, AttestationOutput, BatchFile, DigestOutput, OperationEntry, SignedOutput,
};

/// Parse a hex private key, with or without `0x`.
pub fn parse_signing_key(raw: &str) -> Result<SigningKey> {
    let trimmed = raw.trim();
    let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .context("private key is not valid hex")?;
    SigningKey::from_slice(&bytes).map_err(|_| anyhow!("private key is not a valid secp256k1 scalar"))
}

pub fn parse_method(raw: &str) -> Result<BatchMethod> {
    match raw {
        "auth" | "auth-key" => Ok(BatchMethod::AuthKey),
        "delegated" | "delegated-key" => Ok(BatchMethod::DelegatedKey),
        other => Err(anyhow!("unknown batch method `{other}` (expected `auth` or `delegated`)")),
    }
}

fn method_name(method: BatchMethod) -> &'static str {
    match method {
        BatchMethod::AuthKey => AUTH_KEY_BATCH_METHOD,
        BatchMethod::DelegatedKey => DELEGATED_KEY_BATCH_METHOD,
    }
}

fn operation(entry: &OperationEntry) -> Operation {
    Operation::call(entry.target, entry.value, entry.data.clone(), entry.gas_limit)
}

pub fn to_batch(file: &BatchFile) -> Batch {
    let batch = Batch::new(file.operations.iter().map(operation).collect());
    match file.fee_token {
        Some(token) => batch.with_token_fee(file.gas_price, file.gas_overhead, token, file.fee_rate),
        None => batch.with_native_fee(file.gas_price, file.gas_overhead),
    }
}

pub fn to_restrictions(file: &AttestationFile) -> Result<Restrictions> {
    let Some(validator) = file.validator else {
        if file.expires_at.is_some() || file.policy_data.is_some() {
            return Err(anyhow!("policy data given without a validator"));
        }
        return Ok(Restrictions::unrestricted());
    };
    let policy_data = match (file.expires_at, &file.policy_data) {
        (Some(_), Some(_)) => return Err(anyhow!("set either `expiresAt` or `policyData`, not both")),
        (Some(expires_at), None) => encode_expiry(expires_at).into(),
        (None, Some(raw)) => raw.clone(),
        (None, None) => Default::default(),
    };
    Ok(Restrictions::new(validator, policy_data))
}

pub fn digest(file: &BatchFile, method: BatchMethod) -> DigestOutput {
    let scope = DigestScope::new(file.account, file.chain_id);
    DigestOutput {
        method: method_name(method).to_string(),
        domain_separator: scope.domain_separator(),
        digest: batch_digest(&scope, method, file.nonce, &to_batch(file)),
    }
}

pub fn sign(key: &SigningKey, file: &BatchFile, method: BatchMethod) -> Result<SignedOutput> {
    let digest = digest(file, method).digest;
    let signature = sign_digest(key, digest).map_err(|err| anyhow!("signing failed: {err}"))?;
    Ok(SignedOutput {
        signer: public_key_address(key.verifying_key()),
        digest,
        signature: signature.to_vec().into(),
    })
}

pub fn attest(key: &SigningKey, file: &AttestationFile) -> Result<AttestationOutput> {
    let scope = DigestScope::new(file.account, file.chain_id);
    let restrictions = to_restrictions(file)?.encode();
    let digest = delegated_key_digest(&scope, file.delegated_key, &restrictions);
    let signature = sign_digest(key, digest).map_err(|err| anyhow!("signing failed: {err}"))?;
    Ok(AttestationOutput {
        attester: public_key_address(key.verifying_key()),
        delegated_key: file.delegated_key,
        restrictions,
        signature: signature.to_vec().into(),
    })
}
