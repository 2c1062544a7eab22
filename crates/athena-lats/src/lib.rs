// ABOUTME: LATS (Language Agent Tree Search) engine for improving agent output quality
// ABOUTME: Provides the search tree, search trace, collaborator traits and the reflection search loop

pub mod collaborators;
pub mod engine;
pub mod search_tree;
pub mod trace;

pub use collaborators::{
    CandidateGenerator, FnGenerator, FnReflect, FnValue, ReflectFunction, ValueFunction,
};
pub use engine::{
    build_improved_prompt, LatsConfig, LatsEngine, LatsError, SearchOutcome, TerminationReason,
    DEFAULT_EXPLORATION_WEIGHT, FALLBACK_REFLECTION, NEUTRAL_SCORE, QUALITY_FEEDBACK_HEADER,
};
pub use search_tree::{NodeId, SearchTree, SearchTreeError, TreeNode, PROMISING_SCORE};
pub use trace::{SearchTrace, TraceNode};
