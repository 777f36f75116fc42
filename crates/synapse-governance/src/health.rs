//! Combined governance health signal for integrity endpoints.

use crate::errors::ConfigError;
use crate::ledger::{verify_entries, AuditLedger, ChainVerification, LedgerEntry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Anything whose hash chain can be verified.
pub trait ChainSource {
    /// Verifies the chain.
    fn verify(&self) -> ChainVerification;
}

impl ChainSource for AuditLedger {
    fn verify(&self) -> ChainVerification {
        self.verify_chain()
    }
}

impl ChainSource for [LedgerEntry] {
    fn verify(&self) -> ChainVerification {
        verify_entries(self)
    }
}

impl ChainSource for Vec<LedgerEntry> {
    fn verify(&self) -> ChainVerification {
        verify_entries(self)
    }
}

/// Operator declaration that the governance kernel is frozen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelFreeze {
    /// Whether the kernel is frozen.
    pub frozen: bool,
    /// When the freeze was declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_at: Option<String>,
    /// Why.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl KernelFreeze {
    /// Reads a declaration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Overall health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    /// Chain intact.
    Healthy,
    /// Chain broken; needs manual investigation.
    Degraded,
}

/// Health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceHealth {
    /// Overall status.
    pub status: HealthStatus,
    /// Whether the chain verified.
    pub ledger_valid: bool,
    /// Whether a freeze is declared.
    pub kernel_frozen: bool,
    /// First broken index, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broken_index: Option<u64>,
    /// Entries examined.
    pub chain_length: u64,
    /// Human-readable findings.
    pub issues: Vec<String>,
}

/// Combines chain validity with the kernel freeze declaration.
///
/// A broken chain is DEGRADED. A missing or unfrozen declaration is
/// reported as an issue but does not degrade the status.
pub fn check_governance<C: ChainSource + ?Sized>(
    chain: &C,
    freeze: Option<&KernelFreeze>,
) -> GovernanceHealth {
    let verification = chain.verify();
    let mut issues = Vec::new();

    if !verification.is_valid {
        match verification.broken_index {
            Some(index) => issues.push(format!("ledger chain broken at index {index}")),
            None => issues.push("ledger chain invalid".to_string()),
        }
    }
    let kernel_frozen = freeze.is_some_and(|f| f.frozen);
    match freeze {
        None => issues.push("no kernel freeze declaration".to_string()),
        Some(f) if !f.frozen => issues.push("kernel is not frozen".to_string()),
        Some(_) => {}
    }

    let status = if verification.is_valid {
        HealthStatus::Healthy
    } else {
        warn!(broken_index = ?verification.broken_index, "governance degraded");
        HealthStatus::Degraded
    };

    GovernanceHealth {
        status,
        ledger_valid: verification.is_valid,
        kernel_frozen,
        broken_index: verification.broken_index,
        chain_length: verification.total_entries,
        issues,
    }
}
