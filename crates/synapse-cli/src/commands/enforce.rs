//! Enforce command implementation.

use crate::commands::{open_deployment, read_typed_arg, AuthorityArgs};
use crate::output;
use std::sync::Arc;
use synapse_governance::{Decision, DecisionRecord, GovernanceGate, Intent};

pub fn run(
    args: AuthorityArgs,
    record: String,
    intent: String,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let record: DecisionRecord = read_typed_arg(&record, "decision record")?;
    let proposed: Intent = read_typed_arg(&intent, "intent")?;
    let deployment = open_deployment(&args)?;

    let gate = GovernanceGate::new(Arc::clone(&deployment.ledger));
    let verdict = gate.enforce(&record, &proposed);
    println!("{}", output::format_json(&verdict));

    if strict && verdict.decision != Decision::Allow {
        std::process::exit(1);
    }
    Ok(())
}
