use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use kilngate_core::{
    create_proposal, evaluate_execution, reason_codes, ActorContext, ActorType, ApprovalState,
    CapabilityRegistry, Exemption, ExemptionStatus, InMemoryQuotaStore, KillSwitchState,
    PolicySnapshot, Proposal, ProposalRequest,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0).unwrap()
}

fn registry() -> CapabilityRegistry {
    CapabilityRegistry::from_yaml(
        r#"
capabilities:
  - id: firestore.batch.close
    target: firestore
    requires_approval: true
    max_calls_per_hour: 2
    risk: high
"#,
    )
    .unwrap()
}

fn staff(owner: &str) -> ActorContext {
    ActorContext::new(ActorType::Staff, "staff_lena", owner)
}

fn pending_proposal(actor: &ActorContext) -> Proposal {
    let request = ProposalRequest {
        capability_id: "firestore.batch.close".to_string(),
        requested_by: actor.actor_id.clone(),
        rationale: "kiln 2 finished its cone 6 hold".to_string(),
        preview_summary: "close kiln batch b-7".to_string(),
        expected_effects: vec![],
        input: json!({"batch": "b-7"}),
    };
    create_proposal(&registry(), actor, &request, t0())
        .unwrap()
        .proposal
        .unwrap()
}

fn approved_proposal(actor: &ActorContext) -> Proposal {
    let mut proposal = pending_proposal(actor);
    proposal.approve("staff_omar", t0() + Duration::minutes(1));
    proposal
}

fn exemption(status: ExemptionStatus, expires_at: DateTime<Utc>, owner: &str) -> Exemption {
    Exemption {
        id: "ex_1".to_string(),
        capability_id: "firestore.batch.close".to_string(),
        owner_uid: owner.to_string(),
        justification: "glaze firing backlog during staff absence".to_string(),
        approved_by: "staff_omar".to_string(),
        created_at: t0(),
        expires_at,
        status,
    }
}

#[tokio::test]
async fn pending_proposal_denied_approval_required() {
    // P2: requires_approval capability starts pending and is denied absent
    // an exemption.
    let actor = staff("owner_abc");
    let proposal = pending_proposal(&actor);
    let quota = InMemoryQuotaStore::new();

    let decision = evaluate_execution(
        &registry(),
        &actor,
        &proposal,
        &quota,
        &PolicySnapshot::default(),
        t0() + Duration::minutes(5),
    )
    .await
    .unwrap();

    assert!(decision.is_denied_with(reason_codes::APPROVAL_REQUIRED));
}

#[tokio::test]
async fn approved_proposal_allowed() {
    let actor = staff("owner_abc");
    let proposal = approved_proposal(&actor);
    let quota = InMemoryQuotaStore::new();

    let decision = evaluate_execution(
        &registry(),
        &actor,
        &proposal,
        &quota,
        &PolicySnapshot::default(),
        t0() + Duration::minutes(5),
    )
    .await
    .unwrap();

    assert!(decision.allowed);
    assert_eq!(decision.approval_state, Some(ApprovalState::Approved));
    assert_eq!(decision.reason_code, None);
}

#[tokio::test]
async fn kill_switch_denies_everything_first() {
    // Even an approved, exempted, under-quota proposal is denied, and the
    // kill-switch code wins over every later gate's code.
    let actor = staff("owner_abc").with_tenant("studio_east");
    let mut proposal = approved_proposal(&actor);
    proposal.tenant_id = Some("studio_west".to_string());

    let policy = PolicySnapshot {
        kill_switch: KillSwitchState::engaged("runaway agent loop", "staff_omar"),
        exemptions: vec![exemption(
            ExemptionStatus::Active,
            t0() + Duration::hours(2),
            "owner_abc",
        )],
    };
    let quota = InMemoryQuotaStore::new();

    let decision = evaluate_execution(&registry(), &actor, &proposal, &quota, &policy, t0())
        .await
        .unwrap();

    assert!(decision.is_denied_with(reason_codes::KILL_SWITCH_ACTIVE));
}

#[tokio::test]
async fn tenant_mismatch_denied_even_when_approved() {
    // P5
    let creator = staff("owner_abc").with_tenant("studio_east");
    let proposal = approved_proposal(&creator);

    let executor = staff("owner_abc").with_tenant("studio_west");
    let quota = InMemoryQuotaStore::new();

    let decision = evaluate_execution(
        &registry(),
        &executor,
        &proposal,
        &quota,
        &PolicySnapshot::default(),
        t0() + Duration::minutes(5),
    )
    .await
    .unwrap();

    assert!(decision.is_denied_with(reason_codes::TENANT_MISMATCH));
}

#[tokio::test]
async fn tenant_check_skipped_when_either_side_untenanted() {
    let creator = staff("owner_abc");
    let proposal = approved_proposal(&creator);

    let executor = staff("owner_abc").with_tenant("studio_west");
    let quota = InMemoryQuotaStore::new();

    let decision = evaluate_execution(
        &registry(),
        &executor,
        &proposal,
        &quota,
        &PolicySnapshot::default(),
        t0() + Duration::minutes(5),
    )
    .await
    .unwrap();

    assert!(decision.allowed);
}

#[tokio::test]
async fn tenant_mismatch_beats_approval_required() {
    // Gate ordering is a contract: a pending proposal from another tenant
    // reports the tenant code, not the approval code.
    let creator = staff("owner_abc").with_tenant("studio_east");
    let proposal = pending_proposal(&creator);

    let executor = staff("owner_abc").with_tenant("studio_west");
    let quota = InMemoryQuotaStore::new();

    let decision = evaluate_execution(
        &registry(),
        &executor,
        &proposal,
        &quota,
        &PolicySnapshot::default(),
        t0(),
    )
    .await
    .unwrap();

    assert!(decision.is_denied_with(reason_codes::TENANT_MISMATCH));
}

#[tokio::test]
async fn live_exemption_clears_pending_proposal() {
    // P4, allow half
    let actor = staff("owner_abc");
    let proposal = pending_proposal(&actor);
    let policy = PolicySnapshot {
        kill_switch: KillSwitchState::default(),
        exemptions: vec![exemption(
            ExemptionStatus::Active,
            t0() + Duration::hours(2),
            "owner_abc",
        )],
    };
    let quota = InMemoryQuotaStore::new();

    let decision = evaluate_execution(
        &registry(),
        &actor,
        &proposal,
        &quota,
        &policy,
        t0() + Duration::minutes(5),
    )
    .await
    .unwrap();

    assert!(decision.allowed);
    assert_eq!(decision.approval_state, Some(ApprovalState::Exempt));
}

#[tokio::test]
async fn expired_exemption_denies_like_none() {
    // P4, deny half: expired status and past expiry both deny with exactly
    // the approval code.
    let actor = staff("owner_abc");
    let proposal = pending_proposal(&actor);
    let quota = InMemoryQuotaStore::new();

    for ex in [
        exemption(ExemptionStatus::Expired, t0() + Duration::hours(2), "owner_abc"),
        exemption(ExemptionStatus::Revoked, t0() + Duration::hours(2), "owner_abc"),
        exemption(ExemptionStatus::Active, t0() - Duration::minutes(1), "owner_abc"),
    ] {
        let policy = PolicySnapshot {
            kill_switch: KillSwitchState::default(),
            exemptions: vec![ex],
        };

        let decision =
            evaluate_execution(&registry(), &actor, &proposal, &quota, &policy, t0())
                .await
                .unwrap();

        assert!(decision.is_denied_with(reason_codes::APPROVAL_REQUIRED));
    }
}

#[tokio::test]
async fn exemption_for_other_owner_does_not_apply() {
    let actor = staff("owner_abc");
    let proposal = pending_proposal(&actor);
    let policy = PolicySnapshot {
        kill_switch: KillSwitchState::default(),
        exemptions: vec![exemption(
            ExemptionStatus::Active,
            t0() + Duration::hours(2),
            "owner_other",
        )],
    };
    let quota = InMemoryQuotaStore::new();

    let decision = evaluate_execution(&registry(), &actor, &proposal, &quota, &policy, t0())
        .await
        .unwrap();

    assert!(decision.is_denied_with(reason_codes::APPROVAL_REQUIRED));
}

#[tokio::test]
async fn exemption_does_not_bypass_rate_limit() {
    // The exemption lifts the approval gate only; the ceiling still applies.
    let actor = staff("owner_abc");
    let proposal = pending_proposal(&actor);
    let policy = PolicySnapshot {
        kill_switch: KillSwitchState::default(),
        exemptions: vec![exemption(
            ExemptionStatus::Active,
            t0() + Duration::hours(2),
            "owner_abc",
        )],
    };
    let quota = InMemoryQuotaStore::new();

    for i in 0..2 {
        let decision = evaluate_execution(
            &registry(),
            &actor,
            &proposal,
            &quota,
            &policy,
            t0() + Duration::minutes(i),
        )
        .await
        .unwrap();
        assert!(decision.allowed, "call {i}");
        assert_eq!(decision.approval_state, Some(ApprovalState::Exempt));
    }

    let decision = evaluate_execution(
        &registry(),
        &actor,
        &proposal,
        &quota,
        &policy,
        t0() + Duration::minutes(3),
    )
    .await
    .unwrap();

    assert!(decision.is_denied_with(reason_codes::RATE_LIMITED));
    assert!(decision.retry_after_seconds.unwrap() > 0);
}

#[tokio::test]
async fn capability_removed_from_registry_denies_unknown() {
    let actor = staff("owner_abc");
    let proposal = approved_proposal(&actor);
    let quota = InMemoryQuotaStore::new();

    let shrunk = CapabilityRegistry::default();
    let decision = evaluate_execution(
        &shrunk,
        &actor,
        &proposal,
        &quota,
        &PolicySnapshot::default(),
        t0(),
    )
    .await
    .unwrap();

    assert!(decision.is_denied_with(reason_codes::CAPABILITY_UNKNOWN));
}
