use std::{fs, path::PathBuf};

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use k256::ecdsa::SigningKey;
use relay_account::EngineConfig;
use serde::{de::DeserializeOwned, Serialize};
use tracing_subscriber::EnvFilter;

mod encoder;
mod simulate;
mod types;


use crate::{
    encoder::{attest, digest, parse_method, parse_signing_key, sign},
    simulate::{simulate, SimulationParams},
    types::{AttestationFile, BatchFile},
};

/// Build, sign, attest and dry-run relay account batches.
///
/// Batch and attestation files are camelCase JSON. Results are printed as JSON on stdout.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Engine configuration JSON. Missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the digest a batch must be signed over.
    Digest {
        batch: PathBuf,
        /// `auth` or `delegated`.
        #[arg(long, default_value = "auth")]
        method: String,
    },
    /// Sign a batch.
    Sign {
        batch: PathBuf,
        #[arg(long, default_value = "auth")]
        method: String,
        /// Signing key (hex string, 0x...).
        #[arg(long, env = "PKEY", hide_env_values = true)]
        private_key: String,
    },
    /// Attest a delegated key with an auth key.
    Attest {
        attestation: PathBuf,
        /// Auth key (hex string, 0x...).
        #[arg(long, env = "PKEY", hide_env_values = true)]
        private_key: String,
    },
    /// Run an auth-key batch against a fresh in-memory account owned by the signing key.
    Simulate {
        batch: PathBuf,
        #[arg(long, env = "PKEY", hide_env_values = true)]
        private_key: String,
        #[arg(long, default_value_t = Address::repeat_byte(0x5e))]
        relayer: Address,
        /// Native balance of the account, in wei.
        #[arg(long, default_value_t = U256::ZERO)]
        balance: U256,
        #[arg(long, default_value_t = 10_000_000)]
        gas: u64,
        #[arg(long, default_value_t = 1_700_000_000)]
        timestamp: u64,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Digest { batch, method } => {
            let file: BatchFile = read_json(&batch)?;
            print_json(&digest(&file, parse_method(&method)?))
        }
        Command::Sign { batch, method, private_key } => {
            let file: BatchFile = read_json(&batch)?;
            let key = parse_signing_key(&private_key)?;
            print_json(&sign(&key, &file, parse_method(&method)?)?)
        }
        Command::Attest { attestation, private_key } => {
            let file: AttestationFile = read_json(&attestation)?;
            let key = parse_signing_key(&private_key)?;
            print_json(&attest(&key, &file)?)
        }
        Command::Simulate { batch, private_key, relayer, balance, gas, timestamp } => {
            let file: BatchFile = read_json(&batch)?;
            let key: SigningKey = parse_signing_key(&private_key)?;
            let params = SimulationParams { relayer, balance, gas, timestamp };
            print_json(&simulate(&key, &file, config, &params)?)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => read_json(path),
        None => Ok(EngineConfig::default()),
    }
}

fn read_json<T: DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).map_err(|err| anyhow!("invalid JSON in {}: {err}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
