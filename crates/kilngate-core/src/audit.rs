//! Audit recorder: exactly one event per execution attempt.
//!
//! The success path records `capability.<id>.executed` with an output hash;
//! denials that matter for compliance (delegation and tenant mismatches
//! especially) record the `.failed` variant and are never silently dropped.
//! Store faults propagate to the caller uninterpreted.

use chrono::{DateTime, Utc};

use kilngate_evidence::crypto::content_hash;
use kilngate_evidence::events::{AuditAction, AuditEvent};
use kilngate_evidence::store::EventStore;

use crate::actor::ActorContext;
use crate::decision::{reason_codes, Decision};
use crate::proposal::Proposal;
use crate::registry::CapabilityDefinition;

fn build_event(
    action: AuditAction,
    actor: &ActorContext,
    capability: &CapabilityDefinition,
    proposal: &Proposal,
    output_hash: Option<String>,
    decision: &Decision,
    at: DateTime<Utc>,
) -> anyhow::Result<AuditEvent> {
    AuditEvent::new(action, &capability.id, &proposal.id, at)
        .with_actor(&actor.actor_id, &proposal.owner_uid)
        .with_tenant(proposal.tenant_id.clone())
        .with_hashes(&proposal.input_hash, output_hash)
        .with_reason_code(decision.reason_code.as_deref().unwrap_or(reason_codes::OK))
        .sealed()
}

/// Record a successful execution.
///
/// `input_hash` is carried from the proposal unchanged since creation;
/// `output_hash` is computed here over the operation output, so a later
/// verifier can prove the output was produced for exactly the input that
/// was approved.
pub async fn append_execution_audit(
    store: &dyn EventStore,
    actor: &ActorContext,
    capability: &CapabilityDefinition,
    proposal: &Proposal,
    output: &serde_json::Value,
    decision: &Decision,
    at: DateTime<Utc>,
) -> anyhow::Result<AuditEvent> {
    let output_hash = content_hash(output)?;
    let event = build_event(
        AuditAction::Executed,
        actor,
        capability,
        proposal,
        Some(output_hash),
        decision,
        at,
    )?;
    store.append(&event).await?;
    Ok(event)
}

/// Record a denied execution attempt (`.failed` variant, no output hash).
pub async fn append_denial_audit(
    store: &dyn EventStore,
    actor: &ActorContext,
    capability: &CapabilityDefinition,
    proposal: &Proposal,
    decision: &Decision,
    at: DateTime<Utc>,
) -> anyhow::Result<AuditEvent> {
    tracing::warn!(
        capability = %capability.id,
        actor = %actor.actor_id,
        reason = decision.reason_code.as_deref().unwrap_or(reason_codes::OK),
        "recording denied execution attempt"
    );
    let event = build_event(
        AuditAction::Failed,
        actor,
        capability,
        proposal,
        None,
        decision,
        at,
    )?;
    store.append(&event).await?;
    Ok(event)
}

/// Record an execution that completed on a degraded path (e.g. a stale
/// connector read served from cache).
pub async fn append_fallback_audit(
    store: &dyn EventStore,
    actor: &ActorContext,
    capability: &CapabilityDefinition,
    proposal: &Proposal,
    output: &serde_json::Value,
    decision: &Decision,
    at: DateTime<Utc>,
) -> anyhow::Result<AuditEvent> {
    let output_hash = content_hash(output)?;
    let event = build_event(
        AuditAction::Fallback,
        actor,
        capability,
        proposal,
        Some(output_hash),
        decision,
        at,
    )?;
    store.append(&event).await?;
    Ok(event)
}
