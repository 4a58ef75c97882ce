//! Execution evaluator: the decision state machine.
//!
//! Gates run in contract order and short-circuit; the first failing gate
//! determines the reason code a caller observes. The ordering is part of
//! the public contract, not an optimization:
//!
//! 1. kill switch
//! 2. tenant isolation
//! 3. capability resolution
//! 4. approval state (with exemption lookup)
//! 5. rate limit (atomic check-and-record)

use chrono::{DateTime, Duration, Utc};

use crate::actor::ActorContext;
use crate::decision::{reason_codes, ApprovalState, Decision};
use crate::policy::PolicySnapshot;
use crate::proposal::{Proposal, ProposalStatus};
use crate::quota::{QuotaError, QuotaOutcome, QuotaStore};
use crate::registry::CapabilityRegistry;

/// Trailing window over which `max_calls_per_hour` is evaluated.
pub fn quota_window() -> Duration {
    Duration::minutes(60)
}

/// Decide whether `actor` may execute `proposal` now.
///
/// Expected denials come back as `Decision { allowed: false, .. }`; only
/// quota store faults surface as `Err`, uninterpreted. The policy snapshot
/// is read immutably for the duration of the call.
pub async fn evaluate_execution(
    registry: &CapabilityRegistry,
    actor: &ActorContext,
    proposal: &Proposal,
    quota: &dyn QuotaStore,
    policy: &PolicySnapshot,
    now: DateTime<Utc>,
) -> Result<Decision, QuotaError> {
    if policy.kill_switch.enabled {
        tracing::warn!(
            capability = %proposal.capability_id,
            actor = %actor.actor_id,
            reason = policy.kill_switch.reason.as_deref().unwrap_or("unspecified"),
            "execution denied: kill switch engaged"
        );
        return Ok(Decision::deny(reason_codes::KILL_SWITCH_ACTIVE));
    }

    if let (Some(proposal_tenant), Some(actor_tenant)) = (&proposal.tenant_id, &actor.tenant_id) {
        if proposal_tenant != actor_tenant {
            tracing::warn!(
                capability = %proposal.capability_id,
                actor = %actor.actor_id,
                proposal_tenant = %proposal_tenant,
                actor_tenant = %actor_tenant,
                "execution denied: tenant mismatch"
            );
            return Ok(Decision::deny(reason_codes::TENANT_MISMATCH));
        }
    }

    // The registry may have shrunk between proposal and execution.
    let Some(capability) = registry.find(&proposal.capability_id) else {
        return Ok(Decision::deny(reason_codes::CAPABILITY_UNKNOWN));
    };

    let approval_state = match proposal.status {
        ProposalStatus::Approved => ApprovalState::Approved,
        ProposalStatus::PendingApproval | ProposalStatus::Rejected => {
            match policy.live_exemption_for(&proposal.capability_id, &proposal.owner_uid, now) {
                Some(exemption) => {
                    tracing::debug!(
                        capability = %proposal.capability_id,
                        exemption = %exemption.id,
                        expires_at = %exemption.expires_at,
                        "approval gate cleared by exemption"
                    );
                    ApprovalState::Exempt
                }
                None => return Ok(Decision::deny(reason_codes::APPROVAL_REQUIRED)),
            }
        }
    };

    // Exemption lifts the approval requirement only; the ceiling still
    // applies. Check and record are one atomic unit per key.
    let outcome = quota
        .try_consume(
            &proposal.capability_id,
            &actor.actor_id,
            now,
            quota_window(),
            capability.max_calls_per_hour,
        )
        .await?;

    match outcome {
        QuotaOutcome::Granted { .. } => Ok(Decision::allow(approval_state)),
        QuotaOutcome::Exhausted { retry_after } => {
            tracing::debug!(
                capability = %proposal.capability_id,
                actor = %actor.actor_id,
                retry_after_seconds = retry_after.num_seconds(),
                "execution denied: rate limited"
            );
            Ok(Decision::rate_limited(retry_after.num_seconds().max(1) as u64))
        }
    }
}
