use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;
use synapse_governance::{
    verify_proof_bundle, verify_proof_bundle_json, verify_proof_bundle_signature, AuditLedger,
    CapabilityGraph, CapabilityManifest, Decision, Ed25519Signer, Ed25519Verifier, FixedClock,
    GateStatus, GovernanceError, GovernanceGate, HmacSigner, Intent, LedgerEvent, PolicyEngine,
    PolicyRegistry, Role, SecurityContext, SignatureVerifier, Signer, SynapseAuthority,
    OPEN_CAPABILITY, PASSED_INTEGRITY_CHECKS,
};

fn engine() -> PolicyEngine {
    let registry = Arc::new(PolicyRegistry::new());
    registry
        .register("notes.app", "1.2.0", CapabilityManifest::default())
        .unwrap();
    registry
        .register(
            "billing.admin",
            "2.0.0",
            CapabilityManifest::default()
                .require_policy("billing.write")
                .with_step_up(true),
        )
        .unwrap();
    let graph = CapabilityGraph::from_registry(&registry);
    PolicyEngine::new(registry, graph)
}

fn deploy(signer: Arc<dyn Signer>) -> (SynapseAuthority, GovernanceGate, Arc<AuditLedger>) {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap());
    let ledger = Arc::new(
        AuditLedger::builder(signer)
            .clock(Arc::new(clock))
            .build()
            .unwrap(),
    );
    let authority = SynapseAuthority::new(engine(), Arc::clone(&ledger));
    let gate = GovernanceGate::new(Arc::clone(&ledger));
    (authority, gate, ledger)
}

fn hmac() -> Arc<dyn Signer> {
    Arc::new(HmacSigner::from_seed("authority-gate").unwrap())
}

fn alice() -> SecurityContext {
    SecurityContext::authenticated("user:alice", Role::User)
}

#[test]
fn decide_then_enforce_end_to_end() {
    let (authority, gate, ledger) = deploy(hmac());
    let intent = Intent::new(OPEN_CAPABILITY, "notes.app");
    let record = authority.request_decision(intent.clone(), alice()).unwrap();
    assert_eq!(record.package.decision, Decision::Allow);
    assert_eq!(record.package.policy_version, "1.2.0");

    let verdict = gate.enforce(&record, &intent);
    assert_eq!(verdict.decision, Decision::Allow);
    assert_eq!(verdict.reason, PASSED_INTEGRITY_CHECKS);

    let events: Vec<_> = ledger.chain().iter().map(|e| e.event).collect();
    assert_eq!(
        events,
        vec![
            LedgerEvent::SystemEvent,
            LedgerEvent::DecisionRecorded,
            LedgerEvent::GateVerification
        ]
    );
    assert!(ledger.verify_chain().is_valid);
}

#[test]
fn gate_returns_recorded_escalation() {
    let (authority, gate, _) = deploy(hmac());
    let intent = Intent::new(OPEN_CAPABILITY, "billing.admin");
    let ctx = alice().with_policy("billing.write");
    let record = authority.request_decision(intent.clone(), ctx).unwrap();
    assert_eq!(record.package.decision, Decision::Escalate);
    let verdict = gate.enforce(&record, &intent);
    assert_eq!(verdict.status, GateStatus::Verified);
    assert_eq!(verdict.decision, Decision::Escalate);
}

#[test]
fn record_survives_json_round_trip_through_gate() {
    let (authority, gate, _) = deploy(hmac());
    let intent = Intent::new(OPEN_CAPABILITY, "notes.app");
    let record = authority.request_decision(intent.clone(), alice()).unwrap();
    let wire = serde_json::to_string(&record).unwrap();
    let received = serde_json::from_str(&wire).unwrap();
    assert_eq!(gate.enforce(&received, &intent).decision, Decision::Allow);
}

#[test]
fn record_from_another_authority_is_rejected() {
    let (authority, _, _) = deploy(hmac());
    let (_, foreign_gate, _) = deploy(Arc::new(HmacSigner::from_seed("someone-else").unwrap()));
    let intent = Intent::new(OPEN_CAPABILITY, "notes.app");
    let record = authority.request_decision(intent.clone(), alice()).unwrap();
    let verdict = foreign_gate.enforce(&record, &intent);
    assert_eq!(verdict.decision, Decision::Deny);
    assert_eq!(verdict.reason, "Invalid Signature");
}

#[test]
fn ed25519_deployment_and_public_proof_verification() {
    let signer = Arc::new(Ed25519Signer::from_seed("ed-authority").unwrap());
    let public_key = signer.public_key();
    let (authority, gate, ledger) = deploy(signer);
    let intent = Intent::new(OPEN_CAPABILITY, "notes.app");
    let record = authority.request_decision(intent.clone(), alice()).unwrap();
    assert_eq!(record.audit.signature.len(), 128);
    assert_eq!(gate.enforce(&record, &intent).decision, Decision::Allow);

    let bundle = authority.create_proof_bundle(&record).unwrap();
    let now = ledger.clock().now();
    let verifier = Ed25519Verifier::from_public_key_hex(&public_key).unwrap();
    assert!(verify_proof_bundle(&bundle, now).valid);
    assert!(verify_proof_bundle_signature(&bundle, &verifier, now).valid);
    assert!(!verify_proof_bundle(&bundle, now + Duration::days(400)).valid);
}

#[test]
fn proof_bundle_json_uses_public_field_names() {
    let (authority, _, ledger) = deploy(hmac());
    let record = authority
        .request_decision(Intent::new(OPEN_CAPABILITY, "notes.app"), alice())
        .unwrap();
    let bundle = serde_json::to_value(authority.create_proof_bundle(&record).unwrap()).unwrap();
    let mut keys: Vec<_> = bundle.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "authorityId",
            "decision",
            "decisionId",
            "intentHash",
            "issuedAt",
            "ledgerHash",
            "policyId",
            "policyVersion",
            "signature"
        ]
    );
    assert!(verify_proof_bundle_json(&bundle, ledger.clock().now()).valid);
}

#[test]
fn proof_bundle_refused_for_altered_record() {
    let (authority, gate, _) = deploy(hmac());
    let intent = Intent::new(OPEN_CAPABILITY, "billing.admin");
    let record = authority.request_decision(intent.clone(), alice()).unwrap();
    assert_eq!(record.package.decision, Decision::Deny);

    let mut forged = record.clone();
    forged.package.decision = Decision::Allow;
    forged.audit.ledger_ref = "f".repeat(64);
    assert_eq!(gate.enforce(&forged, &intent).reason, "Invalid Signature");
    assert!(matches!(
        authority.create_proof_bundle(&forged),
        Err(GovernanceError::UnrecordedDecision(_))
    ));

    let mut unanchored = record.clone();
    unanchored.audit.ledger_ref = "f".repeat(64);
    assert!(matches!(
        authority.create_proof_bundle(&unanchored),
        Err(GovernanceError::UnrecordedDecision(_))
    ));

    let bundle = authority.create_proof_bundle(&record).unwrap();
    assert_eq!(bundle.decision, Decision::Deny);
}

proptest! {
    #[test]
    fn changing_the_action_always_denies(action in "[A-Z_]{1,24}") {
        prop_assume!(action != OPEN_CAPABILITY);
        let (authority, gate, _) = deploy(hmac());
        let record = authority
            .request_decision(Intent::new(OPEN_CAPABILITY, "notes.app"), alice())
            .unwrap();
        prop_assert_eq!(record.package.decision, Decision::Allow);
        let verdict = gate.enforce(&record, &Intent::new(action, "notes.app"));
        prop_assert_eq!(verdict.decision, Decision::Deny);
        prop_assert_eq!(verdict.reason, "Action Mismatch");
    }

    #[test]
    fn signature_round_trips_and_bit_flips_fail(
        payload in ".{0,200}",
        byte in any::<prop::sample::Index>(),
        bit in 0u8..4,
    ) {
        let signer = HmacSigner::from_seed("bits").unwrap();
        let signature = signer.sign(&payload);
        prop_assert!(signer.verify(&payload, &signature));

        let mut chars: Vec<u8> = signature.into_bytes();
        let i = byte.index(chars.len());
        let nibble = u8::from_str_radix(std::str::from_utf8(&chars[i..=i]).unwrap(), 16).unwrap();
        let flipped = nibble ^ (1 << bit);
        chars[i] = format!("{flipped:x}").as_bytes()[0];
        let mutated = String::from_utf8(chars).unwrap();
        prop_assert!(!signer.verify(&payload, &mutated));
    }
}
