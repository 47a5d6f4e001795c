//! Core domain logic for skillseeker.
//!
//! Splits large source configs into focused sub-configs, synthesizes router
//! configs over them, reports what exists under a project root, and drives
//! the external scrape/build/package collaborators.

pub mod clean;
pub mod estimate;
pub mod inventory;
pub mod router;
pub mod splitter;
pub mod workflow;

pub use clean::{CleanItem, CleanKind, CleanReport, CleanTarget, clean, plan_clean};
pub use estimate::{CategoryEstimate, GENERAL_CATEGORY, estimate_category_pages, round_up_to_ten};
pub use inventory::{
    BuiltSkill, CachedData, ConfigEntry, InventoryState, MAX_SUGGESTIONS, PackagedSkill,
    Suggestion, inventory, select_built, select_packaged, suggest, suggest_all,
};
pub use router::{generate_router, synthesize};
pub use splitter::{PlanDocument, SplitPlan, Strategy, save_configs, split};
pub use workflow::{
    BatchReport, Collaborator, EnhanceMode, ExternalCommand, SilentProgress, StepKind,
    StepRequest, WorkflowContext, WorkflowKind, WorkflowProgress, WorkflowResult, plan_steps,
    run_batch, run_workflow,
};
