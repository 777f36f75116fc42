use synapse_canonical::{sha256_hex, Canonicalizer};
use serde_json::json;

fn main() {
    let canonicalizer = Canonicalizer::new();
    let intent = json!({
        "action": "OPEN_CAPABILITY",
        "target": "audit.view",
        "params": {
            "window": "floating"
        }
    });

    match canonicalizer.canonical_string(&intent) {
        Ok(canonical) => {
            println!("{}", canonical);
            println!("sha256: {}", sha256_hex(canonical.as_bytes()));
        }
        Err(err) => {
            eprintln!("canonicalization failed: {}", err);
            std::process::exit(1);
        }
    }
}
