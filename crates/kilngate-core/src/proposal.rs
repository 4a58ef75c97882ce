//! Proposals: recorded intent to execute one capability with specific input.
//!
//! A proposal is created once by [`create_proposal`], advanced through its
//! approval state machine by an external approval workflow, and never
//! deleted; it remains the audit anchor for any later execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kilngate_evidence::crypto::content_hash;

use crate::actor::ActorContext;
use crate::decision::{reason_codes, Decision};
use crate::errors::EngineError;
use crate::registry::CapabilityRegistry;

/// Approval state machine value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    PendingApproval,
    Approved,
    Rejected,
}

/// Raw request to register intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub capability_id: String,
    pub requested_by: String,
    pub rationale: String,
    pub preview_summary: String,
    #[serde(default)]
    pub expected_effects: Vec<String>,
    /// Opaque payload for the underlying operation; the engine only ever
    /// treats it as a hashable blob.
    pub input: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique proposal id (`prop_` + UUID v4).
    pub id: String,
    pub capability_id: String,
    pub requested_by: String,
    pub owner_uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub rationale: String,
    pub preview_summary: String,
    #[serde(default)]
    pub expected_effects: Vec<String>,
    pub input: serde_json::Value,
    /// Deterministic hash of `input`, computed at creation and never
    /// recomputed afterwards.
    pub input_hash: String,
    pub status: ProposalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    /// Transition into `approved`. Called by the external approval workflow.
    pub fn approve(&mut self, approved_by: impl Into<String>, at: DateTime<Utc>) {
        self.status = ProposalStatus::Approved;
        self.approved_by = Some(approved_by.into());
        self.approved_at = Some(at);
    }

    /// Transition into `rejected`. Called by the external approval workflow.
    pub fn reject(&mut self) {
        self.status = ProposalStatus::Rejected;
    }

    /// Verify that a later-presented input is exactly the payload that was
    /// hashed at creation. A mismatch is an invalid execution attempt, not
    /// a denial.
    pub fn verify_presented_input(&self, presented: &serde_json::Value) -> Result<(), EngineError> {
        let presented_hash = content_hash(presented)?;
        if presented_hash != self.input_hash {
            return Err(EngineError::InputTampered {
                proposal_id: self.id.clone(),
                expected: self.input_hash.clone(),
                presented: presented_hash,
            });
        }
        Ok(())
    }
}

/// Result of [`create_proposal`]: the creation decision plus the proposal
/// when creation succeeded. Creation succeeding is distinct from a later
/// execution being allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalOutcome {
    pub decision: Decision,
    pub proposal: Option<Proposal>,
}

/// Register intent to execute a capability.
///
/// Denies with `CAPABILITY_UNKNOWN` when the capability is not in the
/// catalog, and with `DELEGATION_SCOPE_MISSING` when an agent actor lacks
/// the `capability:<id>:execute` scope. Staff and client actors are not
/// subject to the scope gate at proposal time.
///
/// No store side effects: neither the quota store nor the audit trail is
/// touched here.
pub fn create_proposal(
    registry: &CapabilityRegistry,
    actor: &ActorContext,
    request: &ProposalRequest,
    now: DateTime<Utc>,
) -> Result<ProposalOutcome, EngineError> {
    let Some(capability) = registry.find(&request.capability_id) else {
        tracing::debug!(
            capability = %request.capability_id,
            actor = %actor.actor_id,
            "proposal for unknown capability"
        );
        return Ok(ProposalOutcome {
            decision: Decision::deny(reason_codes::CAPABILITY_UNKNOWN),
            proposal: None,
        });
    };

    if actor.actor_type == crate::actor::ActorType::Agent
        && !actor.holds_execute_scope(&capability.id)
    {
        tracing::warn!(
            capability = %capability.id,
            actor = %actor.actor_id,
            "agent lacks execute scope for requested capability"
        );
        return Ok(ProposalOutcome {
            decision: Decision::deny(reason_codes::DELEGATION_SCOPE_MISSING),
            proposal: None,
        });
    }

    let input_hash = content_hash(&request.input)?;

    let status = if capability.requires_approval {
        ProposalStatus::PendingApproval
    } else {
        ProposalStatus::Approved
    };

    let proposal = Proposal {
        id: format!("prop_{}", uuid::Uuid::new_v4()),
        capability_id: capability.id.clone(),
        requested_by: request.requested_by.clone(),
        owner_uid: actor.owner_uid.clone(),
        tenant_id: actor.tenant_id.clone(),
        rationale: request.rationale.clone(),
        preview_summary: request.preview_summary.clone(),
        expected_effects: request.expected_effects.clone(),
        input: request.input.clone(),
        input_hash,
        status,
        approved_by: None,
        approved_at: None,
        created_at: now,
    };

    Ok(ProposalOutcome {
        decision: Decision {
            allowed: true,
            reason_code: None,
            approval_state: None,
            retry_after_seconds: None,
        },
        proposal: Some(proposal),
    })
}
