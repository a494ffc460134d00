use serde::{Deserialize, Serialize};

/// Replaces the source system's duck-typed bag of ~15 boolean dispatch
/// flags with a tagged variant per task. The kernel dispatches on the set
/// of intents a task carries (see `hippoforge-kernel::dispatch`), in the
/// fixed order spec.md §4.10 step 5 defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Context,
    Consensus,
    Debate,
    Verification,
    TestsFailing,
    GitCommit,
    GitPullRequest,
    FeatureDiscovery,
    CodeAudit,
    IssueTriage,
    BranchManager,
    ProjectBootstrap,
}

impl Intent {
    /// The fixed dispatch order from spec.md §4.10 step 5. The first intent
    /// present on a task whose dispatch succeeds ends the tick.
    pub const DISPATCH_ORDER: &'static [Intent] = &[
        Intent::Context,
        Intent::Consensus,
        Intent::Debate,
        Intent::Verification,
        Intent::TestsFailing,
        Intent::GitCommit,
        Intent::GitPullRequest,
    ];
}

/// Git-specific metadata, split out of the tagged intent set per SPEC_FULL
/// since branch/base/title/body are not booleans and don't vary the
/// dispatch path by themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitMeta {
    pub branch_name: Option<String>,
    pub base_branch: Option<String>,
    pub pr_title: Option<String>,
    pub pr_body: Option<String>,
    pub auto_push: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_order_starts_with_context_and_ends_with_pr() {
        assert_eq!(Intent::DISPATCH_ORDER.first(), Some(&Intent::Context));
        assert_eq!(
            Intent::DISPATCH_ORDER.last(),
            Some(&Intent::GitPullRequest)
        );
    }
}
