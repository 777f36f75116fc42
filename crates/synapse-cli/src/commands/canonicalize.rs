//! Canonicalize command implementation.

use serde_json::Value;
use std::io::{self, Read};
use synapse_canonical::{sha256_hex, Canonicalizer};

pub fn run(input: Option<String>, hash: bool) -> Result<(), Box<dyn std::error::Error>> {
    let json_str = if let Some(path) = input {
        std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read file {}: {}", path, e))?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let value: Value = serde_json::from_str(&json_str)
        .map_err(|e| format!("Invalid JSON: {}", e))?;

    let canonical = Canonicalizer::new()
        .canonical_string(&value)
        .map_err(|e| format!("Canonicalization failed: {}", e))?;

    println!("{}", canonical);
    if hash {
        println!("sha256:{}", sha256_hex(canonical.as_bytes()));
    }
    Ok(())
}
