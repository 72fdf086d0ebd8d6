//! A thin harness for exercising `evm_core` outside of its test suite:
//! load a hex bytecode + a small JSON scenario file, build an
//! in-memory mock host, run one call frame, and print the resulting
//! `CallResult`. This stands in for "the outer CLI" that the core's
//! specification places out of scope — it is a harness, not a node.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use clap::Parser;
use evm_core::{BlockEnv, CallStatus, Env, SpecId, TxEnv};
use primitives::parse_address;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "evm")]
#[command(about = "Run one EVM call frame against a scenario file", long_about = None)]
struct Opts {
    /// Path to a scenario JSON file (see `Scenario` for the schema).
    scenario: PathBuf,

    /// Print the `CallResult` as JSON instead of a human-readable summary.
    #[arg(long)]
    json: bool,
}

/// On-disk shape of a scenario file. Every field has a sensible
/// default so a minimal scenario only needs `fork` and `code`.
#[derive(Debug, Deserialize)]
struct Scenario {
    /// Hardfork name, e.g. `"berlin"`, `"shanghai"`, `"cancun"`.
    fork: String,
    /// Contract bytecode, hex-encoded, optional `0x` prefix.
    code: String,
    /// Calldata for the call, hex-encoded, optional `0x` prefix.
    #[serde(default)]
    calldata: String,
    #[serde(default = "default_gas_limit")]
    gas_limit: u64,
    #[serde(default)]
    value: String,
    #[serde(default = "default_address")]
    address: String,
    #[serde(default = "default_address")]
    caller: String,
    #[serde(default)]
    is_static: bool,
    #[serde(default)]
    block: ScenarioBlock,
}

fn default_gas_limit() -> u64 {
    1_000_000
}

fn default_address() -> String {
    "0x0000000000000000000000000000000000000000".to_string()
}

#[derive(Debug, Deserialize, Default)]
struct ScenarioBlock {
    #[serde(default)]
    number: u64,
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    gas_limit: u64,
    #[serde(default)]
    coinbase: Option<String>,
    #[serde(default)]
    basefee: u64,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read scenario file {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to parse scenario file {0}: {1}")]
    Parse(PathBuf, serde_json::Error),
    #[error("invalid hex in {field}: {source}")]
    Hex {
        field: &'static str,
        source: hex::FromHexError,
    },
    #[error("invalid address in {field}: {source}")]
    Address {
        field: &'static str,
        source: primitives::FixedBytesError,
    },
    #[error(transparent)]
    Fork(#[from] evm_core::spec::UnknownSpecId),
}

fn decode_hex(field: &'static str, s: &str) -> Result<Vec<u8>, CliError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    hex::decode(trimmed).map_err(|source| CliError::Hex { field, source })
}

fn main() -> Result<(), CliError> {
    env_logger::init();
    let opts = Opts::parse();

    let raw = fs::read_to_string(&opts.scenario)
        .map_err(|e| CliError::Read(opts.scenario.clone(), e))?;
    let scenario: Scenario =
        serde_json::from_str(&raw).map_err(|e| CliError::Parse(opts.scenario.clone(), e))?;

    let spec_id = SpecId::from_str(&scenario.fork)?;
    let spec = evm_core::Spec::resolve(spec_id);

    let code = decode_hex("code", &scenario.code)?;
    let calldata = decode_hex("calldata", &scenario.calldata)?;
    let address = parse_address(&scenario.address).map_err(|source| CliError::Address {
        field: "address",
        source,
    })?;
    let caller = parse_address(&scenario.caller).map_err(|source| CliError::Address {
        field: "caller",
        source,
    })?;
    let value = if scenario.value.is_empty() {
        U256::ZERO
    } else {
        U256::from_str(&scenario.value).unwrap_or(U256::ZERO)
    };

    let coinbase = match &scenario.block.coinbase {
        Some(s) => parse_address(s).map_err(|source| CliError::Address {
            field: "block.coinbase",
            source,
        })?,
        None => Address::ZERO,
    };

    let env = Rc::new(Env {
        block: BlockEnv {
            number: U256::from(scenario.block.number),
            coinbase,
            timestamp: U256::from(scenario.block.timestamp),
            gas_limit: U256::from(scenario.block.gas_limit),
            basefee: U256::from(scenario.block.basefee),
            ..Default::default()
        },
        tx: TxEnv {
            caller,
            ..Default::default()
        },
    });

    let mut host = evm_core::host::mock::MockHost::new();
    host.set_code(address, code.clone());

    let result = evm_core::run_transaction(
        &code,
        calldata,
        scenario.gas_limit,
        spec,
        env,
        scenario.is_static,
        address,
        caller,
        value,
        &mut host,
    );

    if opts.json {
        println!(
            "{}",
            serde_json::json!({
                "status": format!("{:?}", result.status),
                "gas_used": result.gas_used,
                "gas_refund": result.gas_refund,
                "output": format!("0x{}", hex::encode(&result.output)),
            })
        );
    } else {
        let verdict = match result.status {
            CallStatus::Success => "SUCCESS",
            CallStatus::Revert => "REVERT",
            _ => "FAILED",
        };
        println!("status:     {verdict} ({:?})", result.status);
        println!("gas_used:   {}", result.gas_used);
        println!("gas_refund: {}", result.gas_refund);
        println!("output:     0x{}", hex::encode(&result.output));
        for log in &result.logs {
            println!("log: {:?}", log);
        }
    }

    Ok(())
}
