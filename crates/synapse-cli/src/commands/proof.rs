//! Proof bundle commands.

use crate::commands::{load_config, open_deployment, read_json_arg, read_typed_arg, AuthorityArgs};
use crate::output;
use chrono::Utc;
use serde_json::Value;
use synapse_governance::{
    verify_proof_bundle_json, verify_proof_bundle_signature, DecisionRecord, Ed25519Verifier,
    ProofBundle,
};

pub fn create(args: AuthorityArgs, record: String) -> Result<(), Box<dyn std::error::Error>> {
    let record: DecisionRecord = read_typed_arg(&record, "decision record")?;
    let deployment = open_deployment(&args)?;
    let bundle = deployment
        .authority
        .create_proof_bundle(&record)
        .map_err(|e| format!("Failed to create proof bundle: {}", e))?;
    println!("{}", output::format_json(&bundle));
    Ok(())
}

/// Verifies a bundle's shape and age, and its signature when a key is given.
///
/// `public_key` takes an Ed25519 key; otherwise `seed` rebuilds the
/// configured signer. With neither, only structural checks run.
pub fn verify(
    bundle: String,
    public_key: Option<String>,
    config: Option<String>,
    seed: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let value = read_json_arg(&bundle)?;
    let now = Utc::now();

    let structural = verify_proof_bundle_json(&value, now);
    let verification = if !structural.valid {
        structural
    } else if let Some(hex) = public_key {
        let verifier = Ed25519Verifier::from_public_key_hex(&hex)
            .map_err(|e| format!("Invalid public key: {}", e))?;
        verify_proof_bundle_signature(&typed_bundle(value)?, &verifier, now)
    } else if let Some(seed) = seed {
        let signer = load_config(config.as_deref())?.signer(Some(&seed))?;
        verify_proof_bundle_signature(&typed_bundle(value)?, signer.as_ref(), now)
    } else {
        structural
    };

    println!("{}", output::format_json(&verification));
    if !verification.valid {
        std::process::exit(1);
    }
    Ok(())
}

fn typed_bundle(value: Value) -> Result<ProofBundle, Box<dyn std::error::Error>> {
    Ok(serde_json::from_value(value).map_err(|e| format!("Invalid proof bundle: {}", e))?)
}
