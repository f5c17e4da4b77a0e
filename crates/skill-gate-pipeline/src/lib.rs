// crates/skill-gate-pipeline/src/lib.rs
// ============================================================================
// Module: Skill Gate Pipeline
// Description: Queue-to-prod orchestration over the trust gates.
// Purpose: Drive generation, validation, staging, promotion, and rollback.
// Dependencies: regex, serde, serde_json, skill-gate-{core,eval,policy,registry}, tempfile, thiserror
// ============================================================================

//! ## Overview
//! The pipeline crate hosts the orchestrators: log intake that feeds the
//! work queue, the evolution controller that drives each pending item
//! through the gates into staging, the promoter and rollbacker that manage
//! the prod lifecycle, and the prod artifact loader consumed by the
//! runtime. Collaborators (generator, sandbox, artifact backend) are
//! injected through the core interfaces.
//!
//! Propagation policy: the controller never aborts a batch because one item
//! failed; the promoter never performs partial promotion; the rollbacker
//! fails fast on bad preconditions before any mutation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod evolver;
pub mod generator;
pub mod intake;
pub mod loader;
pub mod promote;
pub mod queue_io;
pub mod rollback;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use evolver::EvolutionController;
pub use evolver::EvolveConfig;
pub use evolver::EvolveError;
pub use evolver::EvolveReport;
pub use evolver::EvolveSummary;
pub use generator::MockGenerator;
pub use intake::IntakeError;
pub use intake::build_queue;
pub use intake::parse_log;
pub use loader::ActionHandle;
pub use loader::LoadError;
pub use loader::LoadedSkill;
pub use loader::SkillLoader;
pub use loader::VerifyHandle;
pub use promote::PromoteAllReport;
pub use promote::PromoteError;
pub use promote::Promoter;
pub use promote::PromoterConfig;
pub use promote::PromotionDecision;
pub use queue_io::QueueError;
pub use queue_io::QueueStore;
pub use rollback::RollbackError;
pub use rollback::rollback_skill;
