//! Decide command implementation.

use crate::commands::{open_deployment, read_typed_arg, AuthorityArgs};
use crate::output;
use synapse_governance::{Intent, SecurityContext};
use tracing::debug;

pub fn run(
    args: AuthorityArgs,
    intent: String,
    context: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let intent: Intent = read_typed_arg(&intent, "intent")?;
    let context: SecurityContext = read_typed_arg(&context, "security context")?;
    let deployment = open_deployment(&args)?;
    debug!(entries = deployment.ledger.len(), "ledger loaded");

    let record = deployment
        .authority
        .request_decision(intent, context)
        .map_err(|e| format!("Failed to record decision: {}", e))?;

    println!("{}", output::format_json(&record));
    Ok(())
}
