//! Policy configuration snapshot: kill switch and exemptions.
//!
//! The engine reads one immutable snapshot per evaluation. It never caches
//! or mutates policy state; concurrent policy edits can never produce a torn
//! read within a single decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Global emergency override. When engaged, every execution is denied
/// regardless of any other state; no exemption bypasses it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSwitchState {
    #[serde(default)]
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub engaged_by: Option<String>,
}

impl KillSwitchState {
    pub fn engaged(reason: impl Into<String>, engaged_by: impl Into<String>) -> Self {
        Self {
            enabled: true,
            reason: Some(reason.into()),
            engaged_by: Some(engaged_by.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExemptionStatus {
    Active,
    Expired,
    Revoked,
}

/// Time-bounded, capability-specific override that bypasses the approval
/// gate without bypassing rate limiting. Never widens scope beyond the one
/// capability it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemption {
    pub id: String,
    pub capability_id: String,
    pub owner_uid: String,
    pub justification: String,
    pub approved_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: ExemptionStatus,
}

impl Exemption {
    /// Honored only while status is `active` and `now` is before
    /// `expires_at`. An expired exemption denies exactly like a missing one.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == ExemptionStatus::Active && now < self.expires_at
    }
}

/// Read-only policy snapshot injected per evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySnapshot {
    #[serde(default)]
    pub kill_switch: KillSwitchState,

    #[serde(default)]
    pub exemptions: Vec<Exemption>,
}

impl PolicySnapshot {
    /// Parse a snapshot from YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Find a live exemption for exactly `(capability_id, owner_uid)`.
    pub fn live_exemption_for(
        &self,
        capability_id: &str,
        owner_uid: &str,
        now: DateTime<Utc>,
    ) -> Option<&Exemption> {
        self.exemptions.iter().find(|e| {
            e.capability_id == capability_id && e.owner_uid == owner_uid && e.is_live(now)
        })
    }
}
