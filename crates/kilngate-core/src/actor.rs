//! Actor identity and delegation scopes.
//!
//! A delegation scope is a string grant of the form
//! `capability:<capability_id>:execute`. Scopes exist to bound what an
//! autonomous agent may request on an owner's behalf; staff and client
//! actors are authorized through their own session, not through scopes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Kind of principal making the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    /// Autonomous agent acting under delegated scopes.
    Agent,
    /// Studio staff acting through automation.
    Staff,
    /// Client/member acting through automation.
    Client,
}

/// Per-request calling context, caller-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_type: ActorType,
    /// Stable identifier of the calling principal (opaque, no PII).
    pub actor_id: String,
    /// The account on whose behalf the action is taken.
    pub owner_uid: String,
    /// When present, constrains execution to proposals created under the
    /// same tenant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Delegation-scope strings the actor currently holds.
    #[serde(default)]
    pub effective_scopes: BTreeSet<String>,
}

/// Format the execute scope for a capability.
pub fn execute_scope(capability_id: &str) -> String {
    format!("capability:{}:execute", capability_id)
}

impl ActorContext {
    pub fn new(actor_type: ActorType, actor_id: impl Into<String>, owner_uid: impl Into<String>) -> Self {
        Self {
            actor_type,
            actor_id: actor_id.into(),
            owner_uid: owner_uid.into(),
            tenant_id: None,
            effective_scopes: BTreeSet::new(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.effective_scopes.insert(scope.into());
        self
    }

    /// Grant the execute scope for one capability.
    pub fn with_execute_scope(self, capability_id: &str) -> Self {
        self.with_scope(execute_scope(capability_id))
    }

    pub fn holds_execute_scope(&self, capability_id: &str) -> bool {
        self.effective_scopes.contains(&execute_scope(capability_id))
    }
}
