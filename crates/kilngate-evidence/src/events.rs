//! Audit event model.
//!
//! One event per execution attempt, linking an actor, a capability, a
//! proposal, and content hashes of the input and output payloads. The event
//! carries its own `event_hash` over a stable field subset so a stored trail
//! can be re-verified (see [`crate::crypto::chain_root`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::content_hash;

/// Outcome class of an audited execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// The underlying operation ran and produced output.
    Executed,
    /// The attempt was denied or the operation failed.
    Failed,
    /// The operation completed on a degraded path (e.g. stale read).
    Fallback,
}

impl AuditAction {
    fn suffix(self) -> &'static str {
        match self {
            AuditAction::Executed => "executed",
            AuditAction::Failed => "failed",
            AuditAction::Fallback => "fallback",
        }
    }

    /// Render the dotted action string, e.g.
    /// `capability.firestore.batch.close.executed`.
    pub fn render(self, capability_id: &str) -> String {
        format!("capability.{}.{}", capability_id, self.suffix())
    }
}

/// Input struct for event hash computation.
///
/// Defines EXACTLY what the event hash covers. It deliberately excludes:
/// - `event_hash` (would be self-referential)
/// - `id` and `at` (operational metadata; allows deterministic re-export)
#[derive(Serialize)]
struct EventHashInput<'a> {
    action: &'a str,
    actor_id: &'a str,
    owner_uid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_id: Option<&'a str>,
    capability_id: &'a str,
    proposal_id: &'a str,
    input_hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_hash: Option<&'a str>,
    decision_reason_code: &'a str,
}

/// Append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEvent {
    /// Unique event id (`evt_` + UUID v4).
    pub id: String,
    /// When the attempt was recorded (UTC, caller-supplied).
    pub at: DateTime<Utc>,
    /// Dotted action string: `capability.<capability_id>.<outcome>`.
    pub action: String,
    /// The principal that made the call.
    pub actor_id: String,
    /// The account on whose behalf the action was taken.
    pub owner_uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub capability_id: String,
    pub proposal_id: String,
    /// The proposal's input hash, unchanged since proposal creation.
    pub input_hash: String,
    /// Hash of the operation output; absent on denial records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_hash: Option<String>,
    /// Machine-parseable reason code for the recorded decision.
    pub decision_reason_code: String,
    /// Content hash of this event; excluded from its own hash input.
    /// `None` until [`AuditEvent::sealed`] is called.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_hash: Option<String>,
}

impl AuditEvent {
    /// Create a new event. `event_hash` is left unset; call
    /// [`AuditEvent::sealed`] before appending to a store.
    pub fn new(
        action: AuditAction,
        capability_id: impl Into<String>,
        proposal_id: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let capability_id = capability_id.into();
        Self {
            id: format!("evt_{}", uuid::Uuid::new_v4()),
            at,
            action: action.render(&capability_id),
            actor_id: String::new(),
            owner_uid: String::new(),
            tenant_id: None,
            capability_id,
            proposal_id: proposal_id.into(),
            input_hash: String::new(),
            output_hash: None,
            decision_reason_code: String::new(),
            event_hash: None,
        }
    }

    /// Set the acting principal and owning account.
    pub fn with_actor(mut self, actor_id: impl Into<String>, owner_uid: impl Into<String>) -> Self {
        self.actor_id = actor_id.into();
        self.owner_uid = owner_uid.into();
        self
    }

    /// Set the tenant the proposal was created under.
    pub fn with_tenant(mut self, tenant_id: Option<String>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    /// Set the input hash (from the proposal) and optional output hash.
    pub fn with_hashes(mut self, input_hash: impl Into<String>, output_hash: Option<String>) -> Self {
        self.input_hash = input_hash.into();
        self.output_hash = output_hash;
        self
    }

    /// Set the decision reason code.
    pub fn with_reason_code(mut self, code: impl Into<String>) -> Self {
        self.decision_reason_code = code.into();
        self
    }

    /// Compute the event hash over the stable field subset.
    pub fn compute_event_hash(&self) -> anyhow::Result<String> {
        let input = EventHashInput {
            action: &self.action,
            actor_id: &self.actor_id,
            owner_uid: &self.owner_uid,
            tenant_id: self.tenant_id.as_deref(),
            capability_id: &self.capability_id,
            proposal_id: &self.proposal_id,
            input_hash: &self.input_hash,
            output_hash: self.output_hash.as_deref(),
            decision_reason_code: &self.decision_reason_code,
        };
        content_hash(&input)
    }

    /// Fill `event_hash` and return the sealed event.
    pub fn sealed(mut self) -> anyhow::Result<Self> {
        self.event_hash = Some(self.compute_event_hash()?);
        Ok(self)
    }
}
