//! C9: the five fixed autonomous git roles and their PI-sorted, circuit
//! breaker-gated dispatcher, grounded on `git_role_dispatcher.py`.

mod context;
mod dispatcher;
mod role;

pub use context::{PrStatus, RoleContext};
pub use dispatcher::GitRoleDispatcher;
pub use role::{
    BranchManagerRole, CodeAuditorRole, FeatureScoutRole, GitAgentRole, GitRoleKind,
    IssueTriageRole, ProjectLifecycleRole,
};
