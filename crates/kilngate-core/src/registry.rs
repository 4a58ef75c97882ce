//! Capability registry: the fixed catalog of operations the engine may
//! authorize. Entries are data; the registry itself carries no gating logic.

use serde::{Deserialize, Serialize};

/// Risk classification used for audit triage, not for gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// One pre-registered operation, with its approval and quota metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDefinition {
    /// Stable, globally unique identifier (e.g. `firestore.batch.close`).
    pub id: String,

    /// Logical subsystem the capability reaches (e.g. `firestore`, `hubitat`).
    pub target: String,

    /// Informational only; does not itself gate execution.
    #[serde(default)]
    pub read_only: bool,

    /// When true, a proposal using this capability starts in
    /// `pending_approval`.
    #[serde(default)]
    pub requires_approval: bool,

    /// Quota ceiling, evaluated per capability and per actor.
    pub max_calls_per_hour: u32,

    pub risk: RiskTier,
}

/// The capability catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityRegistry {
    pub capabilities: Vec<CapabilityDefinition>,
}

impl CapabilityRegistry {
    pub fn new(capabilities: Vec<CapabilityDefinition>) -> Self {
        Self { capabilities }
    }

    /// Parse a registry from YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn find(&self, id: &str) -> Option<&CapabilityDefinition> {
        self.capabilities.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// The built-in studio catalog.
    pub fn builtin() -> Self {
        fn cap(
            id: &str,
            target: &str,
            read_only: bool,
            requires_approval: bool,
            max_calls_per_hour: u32,
            risk: RiskTier,
        ) -> CapabilityDefinition {
            CapabilityDefinition {
                id: id.to_string(),
                target: target.to_string(),
                read_only,
                requires_approval,
                max_calls_per_hour,
                risk,
            }
        }

        Self::new(vec![
            cap("firestore.batch.close", "firestore", false, true, 4, RiskTier::High),
            cap("firestore.batch.reopen", "firestore", false, true, 4, RiskTier::High),
            cap(
                "firestore.reservation.cancel",
                "firestore",
                false,
                true,
                6,
                RiskTier::Medium,
            ),
            cap(
                "hubitat.device.status",
                "hubitat",
                true,
                false,
                120,
                RiskTier::Low,
            ),
            cap(
                "hubitat.device.command",
                "hubitat",
                false,
                true,
                30,
                RiskTier::Medium,
            ),
            cap(
                "messaging.member.notify",
                "messaging",
                false,
                false,
                20,
                RiskTier::Medium,
            ),
        ])
    }
}
