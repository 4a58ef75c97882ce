//! Decision outcomes and reason codes.
//!
//! Every expected denial is modeled as a `Decision` value, never as an
//! error; store faults are the only thing that surfaces as `Err`.

use serde::{Deserialize, Serialize};

/// Machine-parseable reason codes (closed set).
pub mod reason_codes {
    /// Requested capability id is not in the registry.
    pub const CAPABILITY_UNKNOWN: &str = "CAPABILITY_UNKNOWN";
    /// Agent actor lacks the `capability:<id>:execute` scope.
    pub const DELEGATION_SCOPE_MISSING: &str = "DELEGATION_SCOPE_MISSING";
    /// Proposal is not approved and no live exemption covers it.
    pub const APPROVAL_REQUIRED: &str = "APPROVAL_REQUIRED";
    /// Per-capability, per-actor hourly ceiling reached.
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    /// Actor and proposal belong to different tenants.
    pub const TENANT_MISMATCH: &str = "TENANT_MISMATCH";
    /// Global kill switch is engaged.
    pub const KILL_SWITCH_ACTIVE: &str = "KILL_SWITCH_ACTIVE";
    /// Allowed; used by the audit recorder when a decision carries no code.
    pub const OK: &str = "OK";
}

/// How an allowed execution cleared the approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// The proposal was approved by the approval workflow.
    Approved,
    /// A live exemption covered the pending proposal.
    Exempt,
}

/// Terminal outcome of a proposal-creation or execution evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_state: Option<ApprovalState>,

    /// Caller-side backoff hint; present (and positive) only with
    /// [`reason_codes::RATE_LIMITED`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl Decision {
    pub fn allow(approval_state: ApprovalState) -> Self {
        Self {
            allowed: true,
            reason_code: None,
            approval_state: Some(approval_state),
            retry_after_seconds: None,
        }
    }

    pub fn deny(reason_code: &str) -> Self {
        Self {
            allowed: false,
            reason_code: Some(reason_code.to_string()),
            approval_state: None,
            retry_after_seconds: None,
        }
    }

    /// Rate-limit denial. `retry_after_seconds` is clamped to at least 1 so
    /// the hint is always positive.
    pub fn rate_limited(retry_after_seconds: u64) -> Self {
        Self {
            allowed: false,
            reason_code: Some(reason_codes::RATE_LIMITED.to_string()),
            approval_state: None,
            retry_after_seconds: Some(retry_after_seconds.max(1)),
        }
    }

    pub fn is_denied_with(&self, reason_code: &str) -> bool {
        !self.allowed && self.reason_code.as_deref() == Some(reason_code)
    }
}
