pub mod actor;
pub mod audit;
pub mod decision;
pub mod errors;
pub mod evaluator;
pub mod policy;
pub mod proposal;
pub mod quota;
pub mod registry;

// Convenience re-exports
pub use actor::{ActorContext, ActorType};
pub use audit::{append_denial_audit, append_execution_audit, append_fallback_audit};
pub use decision::{reason_codes, ApprovalState, Decision};
pub use errors::EngineError;
pub use evaluator::{evaluate_execution, quota_window};
pub use policy::{Exemption, ExemptionStatus, KillSwitchState, PolicySnapshot};
pub use proposal::{create_proposal, Proposal, ProposalOutcome, ProposalRequest, ProposalStatus};
pub use quota::{InMemoryQuotaStore, QuotaError, QuotaOutcome, QuotaStore};
pub use registry::{CapabilityDefinition, CapabilityRegistry, RiskTier};
