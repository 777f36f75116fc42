//! Subcommand implementations.

pub mod canonicalize;
pub mod decide;
pub mod enforce;
pub mod health;
pub mod list;
pub mod proof;
pub mod status;
pub mod verify;

use crate::path;
use clap::Args;
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use synapse_governance::{
    load_ledger, read_journal, AuditLedger, GovernanceConfig, LedgerEntry, SynapseAuthority,
    SystemClock,
};
use synapse_journal::WriteOptions;

/// Options shared by commands that sign and append to a ledger.
#[derive(Args, Debug, Clone)]
pub struct AuthorityArgs {
    /// Path to ledger journal (created if missing)
    #[arg(long)]
    pub journal: String,
    /// Governance configuration file (JSON)
    #[arg(long)]
    pub config: Option<String>,
    /// Signer seed, overrides the configuration file
    #[arg(long, env = "SYNAPSE_SIGNER_SEED", hide_env_values = true)]
    pub seed: Option<String>,
}

/// An authority bound to an on-disk ledger.
pub struct Deployment {
    pub authority: SynapseAuthority,
    pub ledger: Arc<AuditLedger>,
}

/// Loads the configuration, or the empty default when none is given.
pub fn load_config(config: Option<&str>) -> Result<GovernanceConfig, Box<dyn std::error::Error>> {
    match config {
        Some(path) => Ok(GovernanceConfig::load(path)?),
        None => Ok(GovernanceConfig::default()),
    }
}

/// Opens the journal and wires engine, signer and ledger together.
pub fn open_deployment(args: &AuthorityArgs) -> Result<Deployment, Box<dyn std::error::Error>> {
    let governance = load_config(args.config.as_deref())?.build(args.seed.as_deref())?;
    let journal_path = path::validate_journal_path(&args.journal, true)
        .map_err(|e| format!("Invalid journal path: {}", e))?;

    let options = WriteOptions {
        sync: true,
        create: true,
    };
    let ledger = load_ledger(
        &journal_path,
        governance.signer,
        Arc::new(SystemClock),
        options,
    )
    .map_err(|e| {
        let sanitized = path::sanitize_path_for_error(&journal_path);
        format!("Failed to open ledger: {}: {}", sanitized, e)
    })?;
    let ledger = Arc::new(ledger);

    Ok(Deployment {
        authority: SynapseAuthority::new(governance.engine, Arc::clone(&ledger)),
        ledger,
    })
}

/// Reads every entry of an existing journal without a signer.
pub fn read_entries(
    journal: &str,
    max_size: Option<u64>,
) -> Result<(PathBuf, Vec<LedgerEntry>), Box<dyn std::error::Error>> {
    let journal_path = path::validate_journal_path(journal, false)
        .map_err(|e| format!("Invalid journal path: {}", e))?;
    check_size(&journal_path, max_size)?;
    let entries = read_journal(&journal_path).map_err(|e| {
        let sanitized = path::sanitize_path_for_error(&journal_path);
        format!("Failed to read journal: {}: {}", sanitized, e)
    })?;
    Ok((journal_path, entries))
}

/// Rejects journals over `max_size` bytes.
pub fn check_size(journal_path: &Path, max_size: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(max_bytes) = max_size {
        let metadata = std::fs::metadata(journal_path)?;
        if metadata.len() > max_bytes {
            return Err(format!(
                "Journal size {} exceeds maximum {} bytes",
                metadata.len(),
                max_bytes
            )
            .into());
        }
    }
    Ok(())
}

/// Parses a JSON argument given inline, as `@file`, or as `-` for stdin.
pub fn read_json_arg(arg: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let text = if arg == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if let Some(file) = arg.strip_prefix('@') {
        std::fs::read_to_string(file).map_err(|e| format!("Failed to read file {}: {}", file, e))?
    } else {
        arg.to_string()
    };
    Ok(serde_json::from_str(&text).map_err(|e| format!("Invalid JSON: {}", e))?)
}

/// Like [`read_json_arg`], deserialized into `T`; `what` names the argument in errors.
pub fn read_typed_arg<T: serde::de::DeserializeOwned>(
    arg: &str,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let value = read_json_arg(arg)?;
    Ok(serde_json::from_value(value).map_err(|e| format!("Invalid {}: {}", what, e))?)
}
